//! Drop near-duplicate stories.

use crate::models::Article;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Number of body characters compared between articles.
pub const BODY_PREFIX_CHARS: usize = 200;

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn body_key(body: &str) -> String {
    let prefix: String = body.chars().take(BODY_PREFIX_CHARS).collect();
    normalize(&prefix)
}

/// Indices of the articles to keep, in input order.
///
/// An article is dropped when its normalized title or its normalized body
/// prefix was already seen on an earlier article. Empty titles and empty
/// bodies never count as a match.
#[instrument(level = "info", skip_all, fields(input = articles.len()))]
pub fn deduplicate(articles: &[Article]) -> Vec<usize> {
    let mut titles = HashSet::new();
    let mut bodies = HashSet::new();
    let mut keep = Vec::with_capacity(articles.len());

    for (i, article) in articles.iter().enumerate() {
        let title = normalize(&article.title);
        let body = body_key(&article.body);

        let seen_title = !title.is_empty() && titles.contains(&title);
        let seen_body = !body.is_empty() && bodies.contains(&body);
        if seen_title || seen_body {
            debug!(index = i, title = %article.title, seen_title, seen_body, "Dropping duplicate");
            continue;
        }

        if !title.is_empty() {
            titles.insert(title);
        }
        if !body.is_empty() {
            bodies.insert(body);
        }
        keep.push(i);
    }

    debug!(kept = keep.len(), "Deduplicated articles");
    keep
}

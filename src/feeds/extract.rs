//! Cut one newsletter entry into individual stories.
//!
//! An AI newsletter issue bundles many stories in a single feed item. Each
//! story starts with a heading (`<h1>`..`<h6>`) and ends at the next
//! horizontal rule (`<hr>`). A heading that reaches the next heading (or the
//! end of the body) without a rule is malformed and skipped, so a story can
//! never swallow its neighbour.

use crate::models::Article;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use tracing::{debug, instrument};

static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<h[1-6](?:\s[^>]*)?>(?P<headline>.*?)</h[1-6]\s*>")
        .expect("valid heading regex")
});

static DIVIDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<hr(?:\s[^>]*)?/?>").expect("valid divider regex"));

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("valid link regex"));

/// Remove markup, decode entities and trim.
pub fn strip_markup(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    html.root_element().text().collect::<String>().trim().to_string()
}

/// First `http(s)://` link in raw markup, or an empty string.
pub fn first_link(markup: &str) -> String {
    LINK_RE
        .find(markup)
        .map(|m| {
            m.as_str()
                .trim_end_matches(['.', ',', ';', ':', '!', '?', ')'])
                .replace("&amp;", "&")
        })
        .unwrap_or_default()
}

/// Split a feed entry body into articles, one per heading/divider pair.
#[instrument(level = "debug", skip_all, fields(bytes = body.len()))]
pub fn extract_articles(body: &str) -> Vec<Article> {
    let headings: Vec<_> = HEADING_RE.captures_iter(body).collect();
    let mut articles = Vec::new();

    for (i, caps) in headings.iter().enumerate() {
        let (Some(whole), Some(headline)) = (caps.get(0), caps.name("headline")) else {
            continue;
        };
        let region_end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(body.len());
        let region = &body[whole.end()..region_end];

        let Some(divider) = DIVIDER_RE.find(region) else {
            debug!(heading = %strip_markup(headline.as_str()), "Heading without divider; skipping");
            continue;
        };
        let segment = &region[..divider.start()];

        articles.push(Article::new(
            strip_markup(headline.as_str()),
            strip_markup(segment),
            first_link(segment),
        ));
    }

    debug!(count = articles.len(), "Extracted articles from feed entry");
    articles
}

//! Let the operator pick one of the ranked candidates.

use crate::console::Operator;
use crate::errors::WorkflowError;
use crate::models::Article;
use crate::utils::preview;
use std::fmt::Write;
use tracing::{info, instrument};

/// Characters of body shown per candidate.
pub const PREVIEW_CHARS: usize = 280;

/// Candidate list as shown to the operator, numbered from 1.
pub fn render_candidates(articles: &[&Article]) -> String {
    let mut out = String::from("\nTop candidates:\n");
    for (i, article) in articles.iter().enumerate() {
        let _ = writeln!(out, "\n[{}] {}", i + 1, article.title);
        let body = preview(&article.body, PREVIEW_CHARS);
        if !body.is_empty() {
            let _ = writeln!(out, "    {}", body);
        }
        if !article.source_url.is_empty() {
            match article.source_domain() {
                Some(domain) => {
                    let _ = writeln!(out, "    {} ({})", article.source_url, domain);
                }
                None => {
                    let _ = writeln!(out, "    {}", article.source_url);
                }
            }
        }
    }
    out
}

/// Block until the operator enters a number in `1..=articles.len()`.
///
/// Returns the 0-based position. Re-prompts without limit on bad input;
/// only a closed channel ends the loop early.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn select<O: Operator>(
    operator: &mut O,
    articles: &[&Article],
) -> Result<usize, WorkflowError> {
    if articles.is_empty() {
        return Err(WorkflowError::EmptyInput);
    }
    operator.say(&render_candidates(articles)).await?;

    let prompt = format!("\nChoose an article [1-{}]: ", articles.len());
    loop {
        let line = operator.ask_line(&prompt).await?;
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=articles.len()).contains(&n) => {
                info!(choice = n, title = %articles[n - 1].title, "Operator chose article");
                return Ok(n - 1);
            }
            _ => {
                operator
                    .say(&format!(
                        "Please enter a number between 1 and {}.",
                        articles.len()
                    ))
                    .await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::{scripted, transcript};

    fn candidates() -> Vec<Article> {
        vec![
            Article::new("Alpha", "first story", "https://www.alpha.com/a"),
            Article::new("Beta", "second story", ""),
            Article::new("Gamma", "x".repeat(400), ""),
        ]
    }

    #[tokio::test]
    async fn test_select_maps_to_zero_based() {
        let owned = candidates();
        let refs: Vec<&Article> = owned.iter().collect();
        let mut console = scripted("2\n");
        assert_eq!(select(&mut console, &refs).await.unwrap(), 1);

        let out = transcript(&console);
        assert!(out.contains("[1] Alpha"));
        assert!(out.contains("https://www.alpha.com/a (alpha)"));
        assert!(out.contains("[3] Gamma"));
        assert!(!out.contains(&"x".repeat(PREVIEW_CHARS + 1)));
    }

    #[tokio::test]
    async fn test_select_reprompts_on_bad_input() {
        let owned = candidates();
        let refs: Vec<&Article> = owned.iter().collect();
        let mut console = scripted("zero\n0\n4\n\n 3 \n");
        assert_eq!(select(&mut console, &refs).await.unwrap(), 2);
        assert_eq!(
            transcript(&console).matches("Please enter a number between 1 and 3.").count(),
            4
        );
    }

    #[tokio::test]
    async fn test_select_channel_closed() {
        let owned = candidates();
        let refs: Vec<&Article> = owned.iter().collect();
        let mut console = scripted("nope\n");
        assert_eq!(
            select(&mut console, &refs).await,
            Err(WorkflowError::InputChannelClosed)
        );
    }
}

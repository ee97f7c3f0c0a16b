//! Relevance ranking with a single language-model call.
//!
//! The model answer is untrusted free text. It is read with a small grammar:
//!
//! - single pick: the whole answer, trimmed, must be one integer
//! - multi pick: every integer in the answer, read as a comma-separated list
//!
//! The order the model gives is the ranking; nothing is re-sorted.

use crate::api::AskAsync;
use crate::errors::WorkflowError;
use crate::models::Article;
use crate::prompts::ranking_prompt;
use crate::utils::truncate_for_log;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{info, instrument, warn};

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+").expect("valid integer regex"));

/// Default number of candidates kept in multi-pick mode.
pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMode {
    /// Ask for exactly one index; anything invalid fails the run.
    Single,
    /// Ask for a ranked list; invalid indices are dropped, at most `max` kept.
    Multi { max: usize },
}

impl RankMode {
    /// `1` means single pick, anything larger a ranked list of that size.
    pub fn from_top_n(top_n: usize) -> Self {
        if top_n <= 1 {
            RankMode::Single
        } else {
            RankMode::Multi { max: top_n }
        }
    }
}

/// Parse an integer token, saturating on overflow.
fn parse_integer(tok: &str) -> i64 {
    tok.parse::<i64>()
        .unwrap_or(if tok.starts_with('-') { i64::MIN } else { i64::MAX })
}

fn integers(response: &str) -> Vec<i64> {
    INTEGER_RE
        .find_iter(response)
        .map(|m| parse_integer(m.as_str()))
        .collect()
}

/// The trimmed response as one integer, or `None` if anything else is in it.
fn sole_integer(response: &str) -> Option<i64> {
    let trimmed = response.trim();
    INTEGER_RE
        .find(trimmed)
        .filter(|m| m.start() == 0 && m.end() == trimmed.len())
        .map(|m| parse_integer(m.as_str()))
}

/// Validate a model answer against `count` candidates.
///
/// # Arguments
///
/// * `response` - Raw model answer
/// * `count` - Number of candidates that were shown to the model
/// * `mode` - Single or multi pick grammar
///
/// # Returns
///
/// Candidate positions, best first. Single pick always yields exactly one.
pub fn parse_selection(
    response: &str,
    count: usize,
    mode: RankMode,
) -> Result<Vec<usize>, WorkflowError> {
    let unparsable = || WorkflowError::SelectionParse {
        response: response.to_string(),
    };
    let in_range = |i: i64| i >= 0 && (i as u64) < count as u64;

    match mode {
        RankMode::Single => {
            let index = sole_integer(response).ok_or_else(unparsable)?;
            if !in_range(index) {
                return Err(WorkflowError::SelectionOutOfRange {
                    index,
                    max: count.saturating_sub(1),
                });
            }
            Ok(vec![index as usize])
        }
        RankMode::Multi { max } => {
            let parsed = integers(response);
            if parsed.is_empty() {
                return Err(unparsable());
            }
            let picks: Vec<usize> = parsed
                .into_iter()
                .filter(|&i| in_range(i))
                .map(|i| i as usize)
                .unique()
                .take(max)
                .collect();
            if picks.is_empty() {
                return Err(WorkflowError::NoCandidates {
                    response: response.to_string(),
                });
            }
            Ok(picks)
        }
    }
}

/// Ranks candidates with an injected model.
#[derive(Debug)]
pub struct Ranker<M> {
    model: M,
    mode: RankMode,
}

impl<M> Ranker<M>
where
    M: AskAsync<Response = String>,
{
    /// Create a ranker.
    ///
    /// # Arguments
    ///
    /// * `model` - Client the ranking prompt is sent to
    /// * `mode` - Whether to ask for one index or a ranked list
    pub fn new(model: M, mode: RankMode) -> Self {
        Self { model, mode }
    }

    /// Positions in `articles`, best first.
    #[instrument(level = "info", skip_all, fields(count = articles.len(), mode = ?self.mode))]
    pub async fn rank(&self, articles: &[&Article]) -> Result<Vec<usize>, WorkflowError> {
        if articles.is_empty() {
            return Err(WorkflowError::EmptyInput);
        }

        let max = match self.mode {
            RankMode::Single => None,
            RankMode::Multi { max } => Some(max),
        };
        let prompt = ranking_prompt(articles, max);

        let t0 = Instant::now();
        let response = self.model.ask(&prompt).await.map_err(|e| {
            warn!(error = %e, "Ranking call failed");
            WorkflowError::Generation(e.to_string())
        })?;
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            response = %truncate_for_log(&response, 200),
            "Model ranked candidates"
        );

        let picks = parse_selection(&response, articles.len(), self.mode)?;
        info!(picks = ?picks, "Ranking accepted");
        Ok(picks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedModel;

    fn articles(n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| Article::new(format!("title {i}"), format!("body {i}"), ""))
            .collect()
    }

    #[test]
    fn test_multi_pick_drops_out_of_range_and_keeps_order() {
        let picks = parse_selection("2,0,7,1", 5, RankMode::Multi { max: 5 }).unwrap();
        assert_eq!(picks, vec![2, 0, 1]);
    }

    #[test]
    fn test_multi_pick_truncates_and_dedups() {
        let picks = parse_selection("4, 4, 3, 2, 1, 0", 5, RankMode::Multi { max: 3 }).unwrap();
        assert_eq!(picks, vec![4, 3, 2]);
    }

    #[test]
    fn test_multi_pick_all_invalid() {
        assert!(matches!(
            parse_selection("9, -1, 12", 3, RankMode::Multi { max: 5 }),
            Err(WorkflowError::NoCandidates { .. })
        ));
    }

    #[test]
    fn test_single_pick_parse_errors() {
        assert!(matches!(
            parse_selection("abc", 3, RankMode::Single),
            Err(WorkflowError::SelectionParse { .. })
        ));
        assert_eq!(
            parse_selection("-1", 3, RankMode::Single),
            Err(WorkflowError::SelectionOutOfRange { index: -1, max: 2 })
        );
        assert_eq!(
            parse_selection("3", 3, RankMode::Single),
            Err(WorkflowError::SelectionOutOfRange { index: 3, max: 2 })
        );
    }

    #[test]
    fn test_single_pick_accepts_bare_integer() {
        assert_eq!(parse_selection(" 1\n", 3, RankMode::Single).unwrap(), vec![1]);
        assert_eq!(parse_selection("0", 3, RankMode::Single).unwrap(), vec![0]);
    }

    #[test]
    fn test_single_pick_rejects_anything_but_one_integer() {
        for answer in ["1,2", "1.9", "Article 2 is best.", "I can't decide between 2 and 0"] {
            assert!(
                matches!(
                    parse_selection(answer, 3, RankMode::Single),
                    Err(WorkflowError::SelectionParse { .. })
                ),
                "{answer:?} should not parse"
            );
        }
    }

    #[test]
    fn test_huge_index_is_out_of_range() {
        assert!(matches!(
            parse_selection("99999999999999999999999", 3, RankMode::Single),
            Err(WorkflowError::SelectionOutOfRange { .. })
        ));
    }

    #[test]
    fn test_mode_from_top_n() {
        assert_eq!(RankMode::from_top_n(1), RankMode::Single);
        assert_eq!(RankMode::from_top_n(0), RankMode::Single);
        assert_eq!(RankMode::from_top_n(5), RankMode::Multi { max: 5 });
    }

    #[tokio::test]
    async fn test_rank_calls_model_once() {
        let model = ScriptedModel::new(["2,0,7,1"]);
        let ranker = Ranker::new(&model, RankMode::Multi { max: 5 });
        let owned = articles(5);
        let refs: Vec<&Article> = owned.iter().collect();

        let picks = ranker.rank(&refs).await.unwrap();
        assert_eq!(picks, vec![2, 0, 1]);

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("0. title 0\nbody 0"));
        assert!(prompts[0].contains("4. title 4\nbody 4"));
    }

    #[tokio::test]
    async fn test_rank_empty_input_skips_model() {
        let model = ScriptedModel::new(["0"]);
        let ranker = Ranker::new(&model, RankMode::Single);
        assert_eq!(ranker.rank(&[]).await, Err(WorkflowError::EmptyInput));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_rank_model_failure() {
        let model = ScriptedModel::failing("connection refused");
        let ranker = Ranker::new(&model, RankMode::Single);
        let owned = articles(2);
        let refs: Vec<&Article> = owned.iter().collect();
        assert_eq!(
            ranker.rank(&refs).await,
            Err(WorkflowError::Generation("connection refused".into()))
        );
    }
}

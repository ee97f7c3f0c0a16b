//! Data models shared by every workflow step.
//!
//! - [`Article`]: one story cut out of the newsletter feed
//! - [`ReviewFeedback`]: what the operator asked to change in a draft
//! - [`Stage`]: the workflow step labels
//! - [`WorkflowState`]: the single record threaded through the run
//!
//! Later steps never copy an [`Article`]. They keep indices into
//! [`WorkflowState::articles`], so the chosen story is always the one the
//! extractor produced.

use crate::errors::WorkflowError;
use serde::{Deserialize, Serialize};

/// Category given to articles when nothing more specific is known.
pub const DEFAULT_CATEGORY: &str = "general";

/// A single news story extracted from a feed entry.
///
/// Every field has a default, so `Article::default()` is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Article {
    /// Headline with markup removed.
    pub title: String,
    /// Story text with markup removed.
    pub body: String,
    /// Kind of story (e.g. "general", "scientific publication", "X / Twitter feed").
    pub category: String,
    /// First link found in the story, or empty.
    pub source_url: String,
}

impl Default for Article {
    fn default() -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            source_url: String::new(),
        }
    }
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            source_url: source_url.into(),
            ..Self::default()
        }
    }

    /// Extract the domain name (before .com/.org/etc) from the source URL.
    /// For example: "https://www.theverge.com/x" -> "theverge"
    pub fn source_domain(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.source_url).ok()?;
        let host = parsed.host_str()?;
        let parts: Vec<&str> = host.split('.').collect();
        if parts.len() >= 2 {
            Some(parts[parts.len() - 2].to_string())
        } else {
            None
        }
    }
}

/// Operator feedback attached to a draft.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReviewFeedback {
    /// Free text exactly as typed.
    pub text: String,
    /// Which draft (1-based) the feedback was given on.
    pub revision: usize,
}

/// Workflow step labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Start,
    Fetching,
    Deduplicating,
    Ranking,
    Selecting,
    Drafting,
    Reviewing,
    Persisting,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Fetching => "fetching",
            Stage::Deduplicating => "deduplicating",
            Stage::Ranking => "ranking",
            Stage::Selecting => "selecting",
            Stage::Drafting => "drafting",
            Stage::Reviewing => "reviewing",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared by all steps of one workflow run.
///
/// `unique`, `candidates` and `chosen` are indices into `articles`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkflowState {
    /// Everything extracted from the feed entry, in document order.
    pub articles: Vec<Article>,
    /// Articles that survived deduplication.
    pub unique: Vec<usize>,
    /// Ranked candidates, best first.
    pub candidates: Vec<usize>,
    /// Set once by [`WorkflowState::choose`].
    chosen: Option<usize>,
    /// Latest draft. Replaced on every revision.
    pub draft: Option<String>,
    /// Feedback on the latest draft, cleared on accept.
    pub feedback: Option<ReviewFeedback>,
    /// True only between a revise decision and the next draft decision.
    pub rewrite: bool,
    /// Number of drafts generated so far.
    pub revisions: usize,
    /// First error recorded; the run is failed once this is set.
    error: Option<String>,
    /// Most recently executed step.
    pub current_step: Stage,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn chosen(&self) -> Option<usize> {
        self.chosen
    }

    pub fn chosen_article(&self) -> Option<&Article> {
        self.chosen.and_then(|i| self.articles.get(i))
    }

    /// Fix the chosen article. Allowed exactly once per run.
    pub fn choose(&mut self, index: usize) -> Result<(), WorkflowError> {
        if self.chosen.is_some() {
            return Err(WorkflowError::ChosenReassigned);
        }
        self.chosen = Some(index);
        Ok(())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record a failure. The first error wins; later ones are ignored.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Articles that survived deduplication, in order.
    pub fn unique_articles(&self) -> Vec<&Article> {
        self.unique.iter().filter_map(|&i| self.articles.get(i)).collect()
    }

    /// Ranked candidates, best first.
    pub fn candidate_articles(&self) -> Vec<&Article> {
        self.candidates
            .iter()
            .filter_map(|&i| self.articles.get(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_defaults() {
        let article = Article::default();
        assert_eq!(article.title, "");
        assert_eq!(article.body, "");
        assert_eq!(article.category, "general");
        assert_eq!(article.source_url, "");
    }

    #[test]
    fn test_article_deserialization_fills_missing_fields() {
        let article: Article = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        assert_eq!(article.title, "Only a title");
        assert_eq!(article.category, DEFAULT_CATEGORY);
        assert!(article.source_url.is_empty());
    }

    #[test]
    fn test_source_domain() {
        let article = Article::new("t", "b", "https://www.theverge.com/2025/ai");
        assert_eq!(article.source_domain(), Some("theverge".to_string()));

        let article = Article::new("t", "b", "");
        assert_eq!(article.source_domain(), None);

        let article = Article::new("t", "b", "http://localhost:8080/x");
        assert_eq!(article.source_domain(), None);
    }

    #[test]
    fn test_chosen_is_write_once() {
        let mut state = WorkflowState::new();
        state.articles = vec![Article::default(), Article::default()];
        assert!(state.choose(1).is_ok());
        assert_eq!(state.choose(0), Err(WorkflowError::ChosenReassigned));
        assert_eq!(state.chosen(), Some(1));
    }

    #[test]
    fn test_first_error_wins() {
        let mut state = WorkflowState::new();
        assert!(!state.is_failed());
        state.fail("first");
        state.fail("second");
        assert_eq!(state.error(), Some("first"));
    }

    #[test]
    fn test_candidate_articles_follow_indices() {
        let mut state = WorkflowState::new();
        state.articles = vec![
            Article::new("a", "", ""),
            Article::new("b", "", ""),
            Article::new("c", "", ""),
        ];
        state.candidates = vec![2, 0];
        let titles: Vec<&str> = state
            .candidate_articles()
            .iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(titles, vec!["c", "a"]);
    }

    #[test]
    fn test_state_serialization() {
        let mut state = WorkflowState::new();
        state.current_step = Stage::Reviewing;
        state.draft = Some("hello".into());
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"current_step\":\"reviewing\""));
        assert!(json.contains("\"draft\":\"hello\""));
    }
}

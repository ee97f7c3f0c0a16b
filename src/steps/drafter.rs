//! Draft the post with the language model.
//!
//! The raw model output becomes the draft. Style rules live in the prompt
//! only; nothing here checks or edits what comes back.

use crate::api::AskAsync;
use crate::errors::WorkflowError;
use crate::models::{Article, ReviewFeedback};
use crate::prompts::{draft_prompt, revision_prompt};
use crate::utils::truncate_for_log;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Writes the post for the chosen article with one model call per draft.
#[derive(Debug)]
pub struct DraftGenerator<M> {
    model: M,
}

impl<M> DraftGenerator<M>
where
    M: AskAsync<Response = String>,
{
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Produce the next draft. `revise` carries the previous draft and the
    /// feedback on it when called from the review loop.
    #[instrument(
        level = "info",
        skip_all,
        fields(title = %article.title, revise = revise.is_some())
    )]
    pub async fn draft(
        &self,
        article: &Article,
        revise: Option<(&str, &ReviewFeedback)>,
    ) -> Result<String, WorkflowError> {
        let prompt = match revise {
            None => draft_prompt(article),
            Some((previous, feedback)) => revision_prompt(article, previous, feedback),
        };

        let t0 = Instant::now();
        let draft = self.model.ask(&prompt).await.map_err(|e| {
            warn!(error = %e, "Draft call failed");
            WorkflowError::Generation(e.to_string())
        })?;

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            chars = draft.chars().count(),
            "Draft generated"
        );
        debug!(draft = %truncate_for_log(&draft, 300), "Draft preview");
        Ok(draft)
    }
}

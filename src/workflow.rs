//! Workflow controller.
//!
//! Runs the steps in order over one [`WorkflowState`]:
//!
//! ```text
//! Fetching -> Deduplicating -> Ranking -> Selecting -> Drafting -> Reviewing -> Persisting -> Done
//!                                                         ^             |
//!                                                         +-- rewrite --+
//! ```
//!
//! Each step reads the fields it needs and returns a value or an error;
//! the controller is the only place that writes to the state. The next stage
//! is decided by [`next_stage`] from the state alone. Any step error is
//! recorded in the state and moves the run to `Failed`, except a closed
//! operator channel, which aborts [`Workflow::run_with`] with `Err`.

use crate::api::AskAsync;
use crate::console::Operator;
use crate::errors::WorkflowError;
use crate::feeds::FeedSource;
use crate::feeds::extract::extract_articles;
use crate::models::{ReviewFeedback, Stage, WorkflowState};
use crate::outputs::file::PostSink;
use crate::steps::dedup::deduplicate;
use crate::steps::drafter::DraftGenerator;
use crate::steps::ranker::Ranker;
use crate::steps::review::{ReviewDecision, review};
use crate::steps::selector::select;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Behaviour switches for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Ask the operator to pick among the ranked candidates. Otherwise the
    /// top-ranked one is taken.
    pub operator_selects: bool,
    /// Show each draft to the operator for accept/revise.
    pub review: bool,
    /// Most revise cycles allowed before the run fails. `None` is unbounded.
    pub max_revisions: Option<usize>,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            operator_selects: true,
            review: true,
            max_revisions: None,
        }
    }
}

/// Stage that follows `stage` given the current state.
pub fn next_stage(stage: Stage, state: &WorkflowState, options: &WorkflowOptions) -> Stage {
    if state.is_failed() {
        return Stage::Failed;
    }
    match stage {
        Stage::Start => Stage::Fetching,
        Stage::Fetching => Stage::Deduplicating,
        Stage::Deduplicating => Stage::Ranking,
        Stage::Ranking => Stage::Selecting,
        Stage::Selecting => Stage::Drafting,
        Stage::Drafting if options.review => Stage::Reviewing,
        Stage::Drafting => Stage::Persisting,
        Stage::Reviewing if state.rewrite => Stage::Drafting,
        Stage::Reviewing => Stage::Persisting,
        Stage::Persisting => Stage::Done,
        Stage::Done => Stage::Done,
        Stage::Failed => Stage::Failed,
    }
}

/// The step graph in Mermaid syntax.
pub fn graph_mermaid(options: &WorkflowOptions) -> String {
    let mut lines = vec![
        "graph TD".to_string(),
        "    __start__([start]) --> fetching".to_string(),
        "    fetching --> deduplicating".to_string(),
        "    deduplicating --> ranking".to_string(),
    ];
    if options.operator_selects {
        lines.push("    ranking --> selecting".to_string());
        lines.push("    selecting --> drafting".to_string());
    } else {
        lines.push("    ranking --> drafting".to_string());
    }
    if options.review {
        lines.push("    drafting --> reviewing".to_string());
        lines.push("    reviewing -. revise .-> drafting".to_string());
        lines.push("    reviewing -. accept .-> persisting".to_string());
    } else {
        lines.push("    drafting --> persisting".to_string());
    }
    lines.push("    persisting --> __end__([end])".to_string());
    lines.join("\n")
}

/// Drives one run from fetching to a saved post.
///
/// Every collaborator is injected, so the same controller runs against the
/// live feed, model, terminal and file in `main`, and against scripted
/// doubles in tests.
pub struct Workflow<F, RM, DM, O, P> {
    feed: F,
    ranker: Ranker<RM>,
    drafter: DraftGenerator<DM>,
    operator: O,
    sink: P,
    options: WorkflowOptions,
}

impl<F, RM, DM, O, P> Workflow<F, RM, DM, O, P>
where
    F: FeedSource,
    RM: AskAsync<Response = String>,
    DM: AskAsync<Response = String>,
    O: Operator,
    P: PostSink,
{
    /// Assemble a controller.
    ///
    /// # Arguments
    ///
    /// * `feed` - Source of the newest newsletter entry
    /// * `ranker` - Relevance ranker, already configured for single or multi pick
    /// * `drafter` - Post writer used for the first draft and every revision
    /// * `operator` - Channel to the human who selects and reviews
    /// * `sink` - Where the approved post is written
    /// * `options` - Selection, review and revision-cap switches
    pub fn new(
        feed: F,
        ranker: Ranker<RM>,
        drafter: DraftGenerator<DM>,
        operator: O,
        sink: P,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            feed,
            ranker,
            drafter,
            operator,
            sink,
            options,
        }
    }

    #[cfg(test)]
    pub fn operator(&self) -> &O {
        &self.operator
    }

    #[cfg(test)]
    pub fn sink(&self) -> &P {
        &self.sink
    }

    /// Run from a fresh state.
    #[cfg(test)]
    pub async fn run(&mut self) -> Result<WorkflowState, WorkflowError> {
        let mut state = WorkflowState::new();
        self.run_with(&mut state).await?;
        Ok(state)
    }

    /// Run until `Done` or `Failed`, starting after `state.current_step`.
    ///
    /// Returns the terminal stage. `Err` only for a closed operator channel;
    /// the state then carries that error too.
    #[instrument(level = "info", skip_all)]
    pub async fn run_with(&mut self, state: &mut WorkflowState) -> Result<Stage, WorkflowError> {
        let t0 = Instant::now();
        let mut stage = next_stage(state.current_step, state, &self.options);

        while !stage.is_terminal() {
            state.current_step = stage;
            if let Err(e) = self.execute(stage, state).await {
                state.fail(e.to_string());
                if e.is_fatal() {
                    error!(%stage, error = %e, "Operator channel closed; aborting");
                    return Err(e);
                }
                warn!(%stage, error = %e, "Step failed; halting workflow");
            }
            stage = next_stage(stage, state, &self.options);
        }

        info!(
            final_stage = %stage,
            last_step = %state.current_step,
            revisions = state.revisions,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Workflow finished"
        );
        Ok(stage)
    }

    /// Do the work of one stage.
    async fn execute(
        &mut self,
        stage: Stage,
        state: &mut WorkflowState,
    ) -> Result<(), WorkflowError> {
        match stage {
            Stage::Fetching => {
                let body = self.feed.first_entry_body().await?;
                state.articles = extract_articles(&body);
                info!(count = state.articles.len(), "Fetched articles");
            }
            Stage::Deduplicating => {
                state.unique = deduplicate(&state.articles);
                info!(
                    before = state.articles.len(),
                    after = state.unique.len(),
                    "Removed duplicate articles"
                );
            }
            Stage::Ranking => {
                let picks = self.ranker.rank(&state.unique_articles()).await?;
                state.candidates = picks.into_iter().map(|p| state.unique[p]).collect();
            }
            Stage::Selecting => {
                let index = if self.options.operator_selects {
                    let position = select(&mut self.operator, &state.candidate_articles()).await?;
                    state.candidates[position]
                } else {
                    *state.candidates.first().ok_or(WorkflowError::EmptyInput)?
                };
                state.choose(index)?;
                if let Some(article) = state.chosen_article() {
                    info!(
                        index,
                        title = %article.title,
                        url = %article.source_url,
                        "Article chosen"
                    );
                }
            }
            Stage::Drafting => {
                let article = state.chosen_article().ok_or(WorkflowError::EmptyInput)?;
                let revise = match (
                    state.rewrite,
                    state.draft.as_deref(),
                    state.feedback.as_ref(),
                ) {
                    (true, Some(previous), Some(feedback)) => Some((previous, feedback)),
                    _ => None,
                };
                let draft = self.drafter.draft(article, revise).await?;
                state.draft = Some(draft);
                state.revisions += 1;
            }
            Stage::Reviewing => {
                let draft = state.draft.as_deref().unwrap_or_default();
                let can_revise = self
                    .options
                    .max_revisions
                    .is_none_or(|limit| state.revisions <= limit);
                match review(&mut self.operator, draft, can_revise).await? {
                    ReviewDecision::Accept => {
                        state.rewrite = false;
                        state.feedback = None;
                    }
                    ReviewDecision::LimitReached => {
                        let limit = self.options.max_revisions.unwrap_or_default();
                        return Err(WorkflowError::RevisionLimit { limit });
                    }
                    ReviewDecision::Revise { feedback } => {
                        state.feedback = Some(ReviewFeedback {
                            text: feedback,
                            revision: state.revisions,
                        });
                        state.rewrite = true;
                    }
                }
            }
            Stage::Persisting => {
                let draft = state.draft.as_deref().unwrap_or_default();
                self.sink.write_post(draft).await?;
                info!(destination = %self.sink.destination(), "Post saved");
            }
            Stage::Start | Stage::Done | Stage::Failed => {}
        }
        Ok(())
    }
}

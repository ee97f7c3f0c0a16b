//! Error taxonomy for the post-writing workflow.
//!
//! Every step either advances the [`WorkflowState`](crate::models::WorkflowState)
//! or returns one of these. The controller writes the message of any error
//! into the state's error slot and stops, except for
//! [`WorkflowError::InputChannelClosed`], which aborts the run outright
//! because the operator is gone.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The feed could not be downloaded or parsed.
    #[error("Failed to fetch news feed: {0}")]
    FeedFetch(String),

    /// The feed parsed but had no entries.
    #[error("No entries found in the news feed")]
    FeedEmpty,

    /// The ranker was handed nothing to rank.
    #[error("No articles available to choose from")]
    EmptyInput,

    /// The model answer had no integer in it.
    #[error("Could not parse a selection from the model response: {response:?}")]
    SelectionParse { response: String },

    /// Single-pick answer pointed outside the candidate list.
    #[error("Selected index {index} is out of bounds, must be between 0 and {max}")]
    SelectionOutOfRange { index: i64, max: usize },

    /// Multi-pick answer had integers but none of them were usable.
    #[error("Model response contained no valid candidate index: {response:?}")]
    NoCandidates { response: String },

    /// A language-model invocation failed.
    #[error("Language model call failed: {0}")]
    Generation(String),

    /// The final post could not be written.
    #[error("Failed to save post to {path}: {reason}")]
    Persistence { path: String, reason: String },

    /// The operator's input stream ended.
    #[error("Operator input channel closed")]
    InputChannelClosed,

    /// The operator asked for more revisions than the configured cap.
    #[error("Revision limit of {limit} reached without approval")]
    RevisionLimit { limit: usize },

    #[error("Chosen article is already set and cannot be reassigned")]
    ChosenReassigned,
}

impl WorkflowError {
    /// Whether this error ends the process instead of failing the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkflowError::InputChannelClosed)
    }
}

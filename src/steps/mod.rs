//! The individual workflow steps.
//!
//! | Step | Module | Talks to |
//! |------|--------|----------|
//! | Deduplicate | [`dedup`] | nothing, pure |
//! | Rank | [`ranker`] | language model, once |
//! | Select | [`selector`] | operator |
//! | Draft | [`drafter`] | language model, once per draft |
//! | Review | [`review`] | operator |
//!
//! Steps return values or a [`WorkflowError`](crate::errors::WorkflowError);
//! only [`crate::workflow`] writes to the shared state.

pub mod dedup;
pub mod drafter;
pub mod ranker;
pub mod review;
pub mod selector;

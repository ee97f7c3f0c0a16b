//! Accept or revise a draft.

use crate::console::Operator;
use crate::errors::WorkflowError;
use tracing::{info, instrument};

/// What the operator decided about a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Accept,
    Revise { feedback: String },
    /// Revise was chosen but no revisions are left; no feedback was asked for.
    LimitReached,
}

const RULE: &str = "----------------------------------------";

fn parse_choice(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "a" | "accept" => Some(true),
        "r" | "revise" => Some(false),
        _ => None,
    }
}

/// Show `draft` verbatim and block for a decision.
///
/// Invalid choices and blank feedback are asked again. When `can_revise` is
/// false a revise answer ends the review with [`ReviewDecision::LimitReached`]
/// before any feedback is typed.
#[instrument(
    level = "info",
    skip_all,
    fields(chars = draft.chars().count(), can_revise = can_revise)
)]
pub async fn review<O: Operator>(
    operator: &mut O,
    draft: &str,
    can_revise: bool,
) -> Result<ReviewDecision, WorkflowError> {
    operator
        .say(&format!("\nDraft:\n{RULE}\n{draft}\n{RULE}"))
        .await?;

    let accepted = loop {
        let line = operator.ask_line("Accept or revise? [accept/revise]: ").await?;
        match parse_choice(&line) {
            Some(choice) => break choice,
            None => operator.say("Please answer 'accept' or 'revise'.").await?,
        }
    };

    if accepted {
        info!("Draft accepted");
        return Ok(ReviewDecision::Accept);
    }

    if !can_revise {
        operator
            .say("Revision limit reached; this draft will not be saved.")
            .await?;
        return Ok(ReviewDecision::LimitReached);
    }

    loop {
        let feedback = operator.ask_line("What should change? ").await?;
        if !feedback.trim().is_empty() {
            info!(feedback = %feedback, "Revision requested");
            return Ok(ReviewDecision::Revise { feedback });
        }
        operator.say("Feedback cannot be empty.").await?;
    }
}

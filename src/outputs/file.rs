//! Persist the approved post.

use crate::errors::WorkflowError;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Default file the post is written to.
pub const DEFAULT_OUTPUT: &str = "linkedin_post.txt";

/// Final destination for the post text.
pub trait PostSink {
    /// Human-readable name of where the post goes.
    fn destination(&self) -> String;

    /// Replace whatever is at the destination with `text`.
    async fn write_post(&self, text: &str) -> Result<(), WorkflowError>;
}

/// Writes the post to a single file, overwriting prior content.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl PostSink for FileSink {
    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn write_post(&self, text: &str) -> Result<(), WorkflowError> {
        if let Err(e) = fs::write(&self.path, text).await {
            error!(error = %e, "Failed writing post");
            return Err(WorkflowError::Persistence {
                path: self.destination(),
                reason: e.to_string(),
            });
        }
        info!(bytes = text.len(), "Wrote post");
        Ok(())
    }
}

//! JSON dump of a finished run.
//!
//! Written only when `--state-dump` is given. Useful to see which step a
//! failed run stopped at and what the model returned along the way.

use crate::models::WorkflowState;
use chrono::Local;
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
struct StateDump<'a> {
    finished_at: String,
    succeeded: bool,
    state: &'a WorkflowState,
}

/// Serialize `state` to pretty JSON at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_state(state: &WorkflowState, path: &Path) -> Result<(), Box<dyn Error>> {
    let dump = StateDump {
        finished_at: Local::now().to_rfc3339(),
        succeeded: !state.is_failed(),
        state,
    };
    let json = serde_json::to_string_pretty(&dump)?;

    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }
    fs::write(path, json).await?;
    info!("Wrote state dump");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, Stage};

    #[tokio::test]
    async fn test_write_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("state.json");

        let mut state = WorkflowState::new();
        state.articles.push(Article::new("Title", "Body", "https://example.com"));
        state.current_step = Stage::Failed;
        state.fail("boom");

        write_state(&state, &path).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["succeeded"], false);
        assert_eq!(value["state"]["error"], "boom");
        assert_eq!(value["state"]["current_step"], "failed");
        assert_eq!(value["state"]["articles"][0]["title"], "Title");
    }
}

//! Line-oriented operator channel.
//!
//! The selector and the review gate talk to a human through [`Operator`]:
//! write some text, block for one line. In production that is stdin/stdout;
//! tests drive it from an in-memory script. Logs go to stderr so they never
//! interleave with this channel.

use crate::errors::WorkflowError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tracing::debug;

/// A human on the other end of a line-oriented channel.
///
/// Both methods fail with [`WorkflowError::InputChannelClosed`] once the
/// channel is gone; callers treat that as the end of the run.
pub trait Operator {
    /// Show text to the operator.
    async fn say(&mut self, text: &str) -> Result<(), WorkflowError>;

    /// Show `prompt` and block for one line, without its line ending.
    ///
    /// Returns [`WorkflowError::InputChannelClosed`] at end of input.
    async fn ask_line(&mut self, prompt: &str) -> Result<String, WorkflowError>;
}

/// [`Operator`] over any async reader/writer pair.
#[derive(Debug)]
pub struct Console<R, W> {
    reader: R,
    writer: W,
}

impl Console<BufReader<Stdin>, Stdout> {
    /// Console on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.writer
    }

    async fn write_all(&mut self, text: &str) -> Result<(), WorkflowError> {
        self.writer
            .write_all(text.as_bytes())
            .await
            .map_err(|_| WorkflowError::InputChannelClosed)?;
        self.writer
            .flush()
            .await
            .map_err(|_| WorkflowError::InputChannelClosed)
    }
}

impl<R, W> Operator for Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn say(&mut self, text: &str) -> Result<(), WorkflowError> {
        self.write_all(text).await?;
        if !text.ends_with('\n') {
            self.write_all("\n").await?;
        }
        Ok(())
    }

    async fn ask_line(&mut self, prompt: &str) -> Result<String, WorkflowError> {
        self.write_all(prompt).await?;

        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|_| WorkflowError::InputChannelClosed)?;
        if n == 0 {
            debug!("Operator input reached end of stream");
            return Err(WorkflowError::InputChannelClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Console;

    pub type ScriptConsole<'a> = Console<&'a [u8], Vec<u8>>;

    /// Console fed from a fixed script, capturing everything written.
    pub fn scripted(script: &str) -> ScriptConsole<'_> {
        Console::new(script.as_bytes(), Vec::new())
    }

    pub fn transcript(console: &ScriptConsole<'_>) -> String {
        String::from_utf8_lossy(console.writer()).into_owned()
    }
}

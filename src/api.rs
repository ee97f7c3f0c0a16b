//! Language-model access for the ranking and writing steps.
//!
//! Steps only see [`AskAsync`]: a prompt goes in, text comes out. The
//! provider behind it is fixed at startup from the `awful_aj` configuration.
//!
//! [`RetryAsk`] is the only place a failed call is repeated. The workflow
//! itself never retries, and `max_retries = 0` means one attempt.

use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Longest wait between two attempts, before jitter.
const MAX_BACKOFF: StdDuration = StdDuration::from_secs(30);
/// Upper bound of the random jitter added to each wait, in milliseconds.
const JITTER_MS: u64 = 250;

/// One prompt, one completion.
pub trait AskAsync {
    type Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

impl<T> AskAsync for &T
where
    T: AskAsync + ?Sized,
{
    type Response = T::Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        (**self).ask(text).await
    }
}

/// Repeats failed calls to `inner` with exponential backoff.
///
/// Wait before retry `n` is `min(base_delay * 2^(n-1), 30s)` plus up to
/// 250ms of jitter.
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
        }
    }

    /// Wait before retry number `attempt` (1-based), without jitter.
    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        self.base_delay.saturating_mul(1 << shift).min(MAX_BACKOFF)
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .finish_non_exhaustive()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all, fields(max_retries = self.max_retries))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let started = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let err = match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };

            if attempt > self.max_retries {
                error!(
                    attempts = attempt,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "Model call failed; giving up"
                );
                return Err(err);
            }

            let jitter = StdDuration::from_millis(rng().random_range(0..=JITTER_MS));
            let delay = self.backoff(attempt) + jitter;
            warn!(attempt, ?delay, error = %err, "Model call failed; retrying");
            sleep(delay).await;
        }
    }
}

/// [`AskAsync`] over `awful_aj::api::ask` with one chat template.
///
/// The ranker and the writer each get their own wrapper so they can use
/// different templates against the same provider configuration.
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    pub config: &'a AwfulJadeConfig,
    pub template: &'a ChatTemplate,
}

impl AskAsync for AskFnWrapper<'_> {
    type Response = String;

    #[instrument(level = "debug", skip_all, fields(prompt_chars = text.chars().count()))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(self.config, text.to_string(), self.template, None, None).await;
        if let Err(e) = &res {
            warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "Provider call failed");
        }
        res
    }
}

/// Build the client a step uses: one template, provider-level retries.
pub fn client<'a>(
    config: &'a AwfulJadeConfig,
    template: &'a ChatTemplate,
    max_retries: usize,
) -> RetryAsk<AskFnWrapper<'a>> {
    RetryAsk::new(
        AskFnWrapper { config, template },
        max_retries,
        StdDuration::from_secs(1),
    )
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;

    #[tokio::test]
    async fn test_no_retries_makes_one_attempt() {
        let model = ScriptedModel::failing("down");
        model.push_err("still down");
        let api = RetryAsk::new(&model, 0, StdDuration::from_millis(1));
        assert!(api.ask("hi").await.is_err());
        assert_eq!(model.prompts().len(), 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let api = RetryAsk::new(ScriptedModel::default(), 3, StdDuration::from_secs(1));
        assert_eq!(api.backoff(1), StdDuration::from_secs(1));
        assert_eq!(api.backoff(3), StdDuration::from_secs(4));
        assert_eq!(api.backoff(40), StdDuration::from_secs(30));
    }

    #[tokio::test]
    async fn test_retry_recovers_after_failure() {
        let model = ScriptedModel::failing("down");
        model.push_ok("ok");
        let api = RetryAsk::new(&model, 2, StdDuration::from_millis(1));
        assert_eq!(api.ask("hi").await.unwrap(), "ok");
        assert_eq!(model.prompts().len(), 2);
    }
}

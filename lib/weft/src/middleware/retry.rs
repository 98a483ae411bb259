//! Retry middleware.
//!
//! Re-sends a request down the rest of the chain when the server answers
//! with a transient status (`429`, `503`, `504`) or when the transport fails
//! to connect or times out.

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use http::header::RETRY_AFTER;
use tracing::debug;

use crate::{BoxFuture, Error, HandlerOption, Interceptor, Next, Request, Response, Result};

/// Default maximum number of retries.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Upper bound accepted for [`RetryOptions::with_max_retries`].
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Default delay between two attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// Upper bound for any delay, including one asked by `Retry-After`.
pub const MAX_DELAY: Duration = Duration::from_secs(180);

/// Header carrying the attempt number on retried requests.
pub const RETRY_ATTEMPT_HEADER: &str = "retry-attempt";

type RetryPredicate = Arc<dyn Fn(Duration, u32, &Response) -> bool + Send + Sync>;

/// Options for [`RetryHandler`].
#[derive(Clone)]
pub struct RetryOptions {
    max_retries: u32,
    delay: Duration,
    retry_on_connection_failure: bool,
    should_retry: RetryPredicate,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_DELAY,
            retry_on_connection_failure: true,
            should_retry: Arc::new(|_, _, _| true),
        }
    }
}

impl RetryOptions {
    /// Set the maximum number of retries, capped at [`MAX_RETRIES_LIMIT`].
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.min(MAX_RETRIES_LIMIT);
        self
    }

    /// Set the delay between attempts, capped at [`MAX_DELAY`].
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay.min(MAX_DELAY);
        self
    }

    /// Whether connection failures and timeouts are retried.
    #[must_use]
    pub const fn with_retry_on_connection_failure(mut self, retry: bool) -> Self {
        self.retry_on_connection_failure = retry;
        self
    }

    /// Final say on retrying a retryable response.
    ///
    /// The predicate receives the delay about to be waited, the number of
    /// retries already done and the response.
    #[must_use]
    pub fn with_should_retry(
        mut self,
        should_retry: impl Fn(Duration, u32, &Response) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_retry = Arc::new(should_retry);
        self
    }

    /// Maximum number of retries.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay between attempts.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    fn retry_delay(&self, attempt: u32, result: &Result<Response>) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        match result {
            Ok(response) if is_retryable(response.status()) => {
                let delay = retry_after(response).unwrap_or(self.delay).min(MAX_DELAY);
                (self.should_retry)(delay, attempt, response).then_some(delay)
            }
            Err(error) if self.retry_on_connection_failure && is_transient(error) => {
                Some(self.delay)
            }
            _ => None,
        }
    }
}

impl HandlerOption for RetryOptions {}

impl std::fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("delay", &self.delay)
            .field(
                "retry_on_connection_failure",
                &self.retry_on_connection_failure,
            )
            .finish_non_exhaustive()
    }
}

/// Retries transient failures.
#[derive(Debug, Clone, Default)]
pub struct RetryHandler {
    options: RetryOptions,
}

impl RetryHandler {
    /// Create a retry handler; `None` uses [`RetryOptions::default`].
    #[must_use]
    pub fn new(options: Option<RetryOptions>) -> Self {
        Self {
            options: options.unwrap_or_default(),
        }
    }

    /// The options resolved at construction.
    #[must_use]
    pub const fn options(&self) -> &RetryOptions {
        &self.options
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_transient(error: &Error) -> bool {
    error.is_connection() || error.is_timeout()
}

/// `Retry-After` as delta-seconds; HTTP dates are ignored.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .header(RETRY_AFTER.as_str())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl Interceptor for RetryHandler {
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response>> {
        let options = RetryOptions::resolve(&self.options, &request);

        Box::pin(async move {
            let mut attempt = 0;
            loop {
                let mut sent = request.clone();
                if attempt > 0 {
                    sent.insert_header(RETRY_ATTEMPT_HEADER, &attempt.to_string())?;
                }

                let result = next.clone().run(sent).await;
                let Some(delay) = options.retry_delay(attempt, &result) else {
                    return result;
                };

                attempt += 1;
                debug!(attempt, ?delay, "retrying request");
                tokio::time::sleep(delay).await;
            }
        })
    }

    fn name(&self) -> &'static str {
        "retry"
    }
}

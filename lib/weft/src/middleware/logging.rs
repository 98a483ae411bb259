//! Request/response logging middleware.
//!
//! Logs each traversal below this handler using the `tracing` crate.

use std::time::Instant;

use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{BoxFuture, HandlerOption, Interceptor, Next, Request, Response, Result};

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level (request/response details).
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

/// Options for [`LoggingHandler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Detail level.
    pub level: LogLevel,
}

impl LoggingOptions {
    /// Options logging at debug level.
    #[must_use]
    pub const fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl HandlerOption for LoggingOptions {}

/// Logs requests and responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler {
    options: LoggingOptions,
}

impl LoggingHandler {
    /// Create a logging handler; `None` uses [`LoggingOptions::default`].
    #[must_use]
    pub fn new(options: Option<LoggingOptions>) -> Self {
        Self {
            options: options.unwrap_or_default(),
        }
    }

    /// The options resolved at construction.
    #[must_use]
    pub const fn options(&self) -> LoggingOptions {
        self.options
    }
}

impl Interceptor for LoggingHandler {
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response>> {
        let level = LoggingOptions::resolve(&self.options, &request).level;
        let method = request.method().clone();
        let url = request.url().to_string();

        let span = span!(Level::INFO, "http_request", %method, %url);

        Box::pin(
            async move {
                let start = Instant::now();

                match level {
                    LogLevel::Debug => {
                        debug!(
                            method = %method,
                            url = %url,
                            headers = ?request.headers(),
                            "sending request"
                        );
                    }
                    LogLevel::Info => {
                        info!(method = %method, url = %url, "sending request");
                    }
                }

                let result = next.run(request).await;

                // Saturating conversion to u64 (truncates after ~584 million years)
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        if response.is_success() {
                            info!(status, elapsed_ms, "request completed");
                        } else {
                            warn!(status, elapsed_ms, "request failed with HTTP error");
                        }
                        if level == LogLevel::Debug {
                            debug!(headers = ?response.headers(), "response headers");
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, elapsed_ms, "request failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }

    fn name(&self) -> &'static str {
        "logging"
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::test_support::{ScriptedTransport, chain, request, response};
    use crate::{Error, Method};

    #[test]
    fn logging_options_default() {
        check!(LoggingHandler::new(None).options().level == LogLevel::Info);
        check!(LoggingHandler::new(Some(LoggingOptions::debug())).options().level == LogLevel::Debug);
    }

    #[tokio::test]
    async fn logging_is_transparent() {
        let transport = ScriptedTransport::new([
            Ok(response(404, &[])),
            Err(Error::connection("refused")),
        ]);
        let chain = chain(LoggingHandler::new(Some(LoggingOptions::debug())), &transport);

        let received = chain
            .dispatch(request(Method::GET, "/missing"))
            .await
            .expect("response");
        check!(received.status() == 404);

        let_assert!(Err(Error::Connection(_)) = chain.dispatch(request(Method::GET, "/")).await);
    }
}

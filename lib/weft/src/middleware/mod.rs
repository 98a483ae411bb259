//! Interceptors shipped with the weft HTTP client.
//!
//! Every handler implements [`Interceptor`](crate::Interceptor) and takes its
//! options once at construction (`None` means the options' `Default`). A
//! request may carry its own options of the same type, which then win for that
//! request only (see [`HandlerOption`](crate::HandlerOption)).
//!
//! Interceptors run in registration order on the way down and in reverse order
//! on the way up.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `handler-compression` | [`CompressionHandler`] and [`DecompressionHandler`] |
//! | `handler-metrics` | [`MetricsHandler`] |
//!
//! # Available Handlers
//!
//! - [`PassThroughHandler`] - Forwards everything untouched
//! - [`TelemetryHandler`] - Hook to tag outgoing requests
//! - [`HeadersHandler`] - Injects default headers (`User-Agent`, ...)
//! - [`RedirectHandler`] - Follows 3xx responses
//! - [`RetryHandler`] - Retries throttled, unavailable and failed requests
//! - [`LoggingHandler`] - Logs requests/responses using `tracing`
//!
//! # Example
//!
//! ```ignore
//! use weft::Client;
//! use weft::middleware::{RetryHandler, RetryOptions};
//!
//! let client = Client::builder()
//!     .interceptor(RetryHandler::new(Some(RetryOptions::default().with_max_retries(5))))
//!     .build()?;
//! ```

#[cfg(feature = "handler-compression")]
mod compression;
mod headers;
mod logging;
#[cfg(feature = "handler-metrics")]
mod metrics;
mod pass_through;
mod redirect;
mod retry;
mod telemetry;

#[cfg(feature = "handler-compression")]
pub use compression::{
    ACCEPTED_ENCODINGS, CompressionHandler, CompressionOptions, DecompressionHandler,
};
pub use headers::{DEFAULT_USER_AGENT, HeadersHandler, HeadersOptions};
pub use logging::{LogLevel, LoggingHandler, LoggingOptions};
#[cfg(feature = "handler-metrics")]
pub use metrics::{
    METRIC_REQUEST_DURATION, METRIC_REQUESTS_IN_FLIGHT, METRIC_REQUESTS_TOTAL, MetricsHandler,
};
pub use pass_through::PassThroughHandler;
pub use redirect::{DEFAULT_MAX_REDIRECTS, MAX_REDIRECTS_LIMIT, RedirectHandler, RedirectOptions};
pub use retry::{
    DEFAULT_DELAY, DEFAULT_MAX_RETRIES, MAX_DELAY, MAX_RETRIES_LIMIT, RETRY_ATTEMPT_HEADER,
    RetryHandler, RetryOptions,
};
pub use telemetry::{TelemetryHandler, TelemetryOptions};


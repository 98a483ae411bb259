//! HTTP client: an interceptor chain in front of a transport.

use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::limit::ConcurrencyLimit;
use tower_service::Service;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::middleware::{
    HeadersHandler, HeadersOptions, LoggingHandler, LoggingOptions, RedirectHandler,
    RedirectOptions, RetryHandler, RetryOptions, TelemetryHandler,
};
#[cfg(feature = "handler-compression")]
use crate::middleware::{CompressionHandler, DecompressionHandler};
#[cfg(feature = "handler-metrics")]
use crate::middleware::MetricsHandler;
use crate::{
    BoxFuture, Chain, Error, HyperTransport, Interceptor, Request, Response, Result,
    ServiceTransport, Transport,
};

/// HTTP client dispatching every request through its interceptor chain.
///
/// Cloning is cheap, clones share the chain and the connection pool.
///
/// # Example
///
/// ```ignore
/// use weft::{Client, Method, Request};
///
/// let client = Client::builder()
///     .with_defaults()
///     .with_logging()
///     .build();
///
/// let request = Request::new(Method::GET, "https://api.example.com/users".parse()?);
/// let response = client.execute(request).await?;
/// ```
#[derive(Clone)]
pub struct Client {
    chain: Chain,
    config: ClientConfig,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("chain", &self.chain)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a client with the default interceptors and configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().with_defaults().build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The interceptors installed by [`ClientBuilder::with_defaults`], outermost first.
    ///
    /// Telemetry, headers, redirect, retry, then decompression when the
    /// `handler-compression` feature is enabled.
    #[must_use]
    pub fn default_interceptors() -> Vec<Arc<dyn Interceptor>> {
        let mut interceptors: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(TelemetryHandler::new(None)),
            Arc::new(HeadersHandler::new(None)),
            Arc::new(RedirectHandler::new(None)),
            Arc::new(RetryHandler::new(None)),
        ];
        #[cfg(feature = "handler-compression")]
        interceptors.push(Arc::new(DecompressionHandler::new()));
        interceptors
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The interceptor chain.
    #[must_use]
    pub const fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Send a request through the chain.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        self.chain.dispatch(request).await
    }

    /// Send a request through the chain, giving up when `cancel` completes first.
    ///
    /// Returns [`Error::Cancelled`] on cancellation.
    pub async fn execute_with_cancellation<C>(&self, request: Request, cancel: C) -> Result<Response>
    where
        C: Future<Output = ()>,
    {
        self.chain.dispatch_with_cancellation(request, cancel).await
    }
}

impl Service<Request> for Client {
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Response>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.chain.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.chain.call(request)
    }
}

/// Lets a shared [`Transport`] sit under tower middleware.
#[derive(Clone)]
struct SharedTransport(Arc<dyn Transport>);

impl Service<Request> for SharedTransport {
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Response>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let transport = Arc::clone(&self.0);
        Box::pin(async move { transport.send(request).await })
    }
}

/// Builder for [`Client`].
///
/// Interceptors run in the order they are added, after the defaults when
/// [`with_defaults`](Self::with_defaults) is set. An added interceptor with
/// the [`name`](Interceptor::name) of a default one takes that default's
/// place instead, so `.with_defaults().with_retry(1)` keeps a single retry
/// handler.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use weft::Client;
///
/// let client = Client::builder()
///     .timeout(Duration::from_secs(10))
///     .with_retry(5)
///     .with_redirects(3)
///     .with_concurrency_limit(16)
///     .build();
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfigBuilder,
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Option<Arc<dyn Transport>>,
    concurrency_limit: Option<usize>,
    use_defaults: bool,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("interceptors_count", &self.interceptors.len())
            .field("custom_transport", &self.transport.is_some())
            .field("concurrency_limit", &self.concurrency_limit)
            .field("use_defaults", &self.use_defaults)
            .finish()
    }
}

impl ClientBuilder {
    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Set the request timeout (enforced by the transport).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Replace the hyper transport, e.g. with a test double.
    ///
    /// Timeouts and pool settings are then up to that transport.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    // ========================================================================
    // Generic Interceptor API
    // ========================================================================

    /// Append an interceptor. First added = outermost.
    #[must_use]
    pub fn interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Append an already shared interceptor.
    #[must_use]
    pub fn shared(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    // ========================================================================
    // Defaults Control
    // ========================================================================

    /// Install [`Client::default_interceptors`] in front of the added ones.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.use_defaults = true;
        self
    }

    /// Disable the default interceptors.
    #[must_use]
    pub fn without_defaults(mut self) -> Self {
        self.use_defaults = false;
        self
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Add retry handling with the given number of retries.
    ///
    /// Replaces the default retry handler when defaults are enabled.
    #[must_use]
    pub fn with_retry(self, max_retries: u32) -> Self {
        let options = RetryOptions::default().with_max_retries(max_retries);
        self.interceptor(RetryHandler::new(Some(options)))
    }

    /// Follow up to `max_redirects` redirects.
    ///
    /// Replaces the default redirect handler when defaults are enabled.
    #[must_use]
    pub fn with_redirects(self, max_redirects: usize) -> Self {
        let options = RedirectOptions::default().with_max_redirects(max_redirects);
        self.interceptor(RedirectHandler::new(Some(options)))
    }

    /// Inject headers into every request.
    #[must_use]
    pub fn with_headers(self, options: HeadersOptions) -> Self {
        self.interceptor(HeadersHandler::new(Some(options)))
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.interceptor(LoggingHandler::new(None))
    }

    /// Add debug-level logging (includes headers).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.interceptor(LoggingHandler::new(Some(LoggingOptions::debug())))
    }

    /// Gzip request bodies.
    #[cfg(feature = "handler-compression")]
    #[must_use]
    pub fn with_compression(self) -> Self {
        self.interceptor(CompressionHandler::new(None))
    }

    /// Decode compressed responses.
    #[cfg(feature = "handler-compression")]
    #[must_use]
    pub fn with_decompression(self) -> Self {
        self.interceptor(DecompressionHandler::new())
    }

    /// Add metrics recording.
    #[cfg(feature = "handler-metrics")]
    #[must_use]
    pub fn with_metrics(self) -> Self {
        self.interceptor(MetricsHandler::new())
    }

    /// Allow at most `max` requests in flight on the transport.
    ///
    /// Retries and redirects each take a slot while they are sent.
    #[must_use]
    pub const fn with_concurrency_limit(mut self, max: usize) -> Self {
        self.concurrency_limit = Some(max);
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the client.
    #[must_use]
    pub fn build(self) -> Client {
        let config = self.config.build();

        let mut transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperTransport::new(config.clone())),
        };
        if let Some(max) = self.concurrency_limit {
            let limited = ConcurrencyLimit::new(SharedTransport(transport), max);
            transport = Arc::new(ServiceTransport::new(limited));
        }

        let mut interceptors = if self.use_defaults {
            Client::default_interceptors()
        } else {
            Vec::new()
        };
        let mut replaceable = vec![true; interceptors.len()];
        for interceptor in self.interceptors {
            let slot = (0..replaceable.len())
                .find(|&i| replaceable[i] && interceptors[i].name() == interceptor.name());
            match slot {
                Some(i) => {
                    tracing::debug!(name = interceptor.name(), "replacing default interceptor");
                    replaceable[i] = false;
                    interceptors[i] = interceptor;
                }
                None => interceptors.push(interceptor),
            }
        }

        Client {
            chain: Chain::new(interceptors, transport),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert2::check;

    use super::*;
    use crate::{Method, StatusCode, transport_fn};

    fn ok_transport() -> impl Transport {
        transport_fn(|_request| async { Ok(Response::with_status(StatusCode::OK)) })
    }

    #[test]
    fn client_default_config() {
        let client = Client::builder().transport(ok_transport()).build();
        check!(client.config().timeout == Duration::from_secs(30));
        check!(client.chain().is_empty());
    }

    #[test]
    fn client_builder_config() {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .pool_idle_per_host(16)
            .build();

        check!(client.config().timeout == Duration::from_secs(60));
        check!(client.config().pool_idle_per_host == 16);
        check!(format!("{client:?}").contains("Client"));
    }

    #[test]
    fn default_interceptors_order() {
        let names: Vec<_> = Client::default_interceptors()
            .iter()
            .map(|interceptor| interceptor.name())
            .collect();

        #[cfg(feature = "handler-compression")]
        check!(names == ["telemetry", "headers", "redirect", "retry", "decompression"]);
        #[cfg(not(feature = "handler-compression"))]
        check!(names == ["telemetry", "headers", "redirect", "retry"]);
    }

    #[test]
    fn added_interceptors_follow_defaults() {
        let client = Client::builder()
            .transport(ok_transport())
            .with_logging()
            .with_defaults()
            .with_retry(1)
            .with_redirects(2)
            .build();

        let names = client.chain().names();
        check!(names.first() == Some(&"telemetry"));
        check!(names.last() == Some(&"logging"));
        check!(names.iter().filter(|name| **name == "retry").count() == 1);
        check!(names.iter().filter(|name| **name == "redirect").count() == 1);
        check!(names[2..4] == ["redirect", "retry"]);
    }

    #[tokio::test(start_paused = true)]
    async fn configured_retry_replaces_default_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = {
            let calls = Arc::clone(&calls);
            transport_fn(move |_request| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Response::with_status(StatusCode::SERVICE_UNAVAILABLE)) }
            })
        };
        let client = Client::builder()
            .transport(transport)
            .with_defaults()
            .with_retry(1)
            .build();

        let request = Request::new(
            Method::GET,
            url::Url::parse("https://api.example.com/").expect("url"),
        );
        let response = client.execute(request).await.expect("response");

        check!(response.status() == StatusCode::SERVICE_UNAVAILABLE);
        check!(calls.load(Ordering::SeqCst) == 2);
    }

    #[test]
    fn repeated_interceptor_is_appended_after_replacing_default() {
        let client = Client::builder()
            .transport(ok_transport())
            .with_defaults()
            .with_retry(1)
            .with_retry(2)
            .build();

        let names = client.chain().names();
        check!(names.iter().filter(|name| **name == "retry").count() == 2);
        check!(names.last() == Some(&"retry"));
    }

    #[tokio::test]
    async fn executes_through_custom_transport() {
        let client = Client::builder()
            .transport(ok_transport())
            .with_defaults()
            .build();

        let request = Request::new(
            Method::GET,
            url::Url::parse("https://api.example.com/").expect("url"),
        );
        let response = client.execute(request).await.expect("response");

        check!(response.status() == StatusCode::OK);
        check!(response.request().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_limit_bounds_in_flight_requests() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let transport = {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            transport_fn(move |_request| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(current, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(Response::with_status(StatusCode::OK))
                }
            })
        };
        let client = Client::builder()
            .transport(transport)
            .with_concurrency_limit(2)
            .build();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move {
                    let request = Request::new(
                        Method::GET,
                        url::Url::parse("https://api.example.com/").expect("url"),
                    );
                    client.execute(request).await
                })
            })
            .collect();
        for task in tasks {
            task.await.expect("join").expect("response");
        }

        check!(peak.load(Ordering::SeqCst) <= 2);
    }
}

//! Telemetry tagging hook.
//!
//! Out of the box the handler is a pure pass-through: no telemetry schema is
//! imposed. Attach a configurator to tag outgoing requests (identifying
//! headers, client version, ...) before they go down the chain.

use std::sync::Arc;

use crate::{BoxFuture, HandlerOption, Interceptor, Next, Request, Response, Result};

type Configurator = Arc<dyn Fn(Request) -> Result<Request> + Send + Sync>;

/// Options for [`TelemetryHandler`].
///
/// # Example
///
/// ```ignore
/// use weft::middleware::{TelemetryHandler, TelemetryOptions};
///
/// let options = TelemetryOptions::default().with_configurator(|mut request| {
///     request.insert_header("x-client-name", "inventory-sync")?;
///     Ok(request)
/// });
/// let handler = TelemetryHandler::new(Some(options));
/// ```
#[derive(Clone, Default)]
pub struct TelemetryOptions {
    configurator: Option<Configurator>,
}

impl TelemetryOptions {
    /// Set the function applied to every request before it is sent.
    ///
    /// An error from the configurator fails the request before it goes down
    /// the chain.
    #[must_use]
    pub fn with_configurator(
        mut self,
        configurator: impl Fn(Request) -> Result<Request> + Send + Sync + 'static,
    ) -> Self {
        self.configurator = Some(Arc::new(configurator));
        self
    }

    /// Returns `true` if a configurator is set.
    #[must_use]
    pub fn has_configurator(&self) -> bool {
        self.configurator.is_some()
    }

    fn configure(&self, request: Request) -> Result<Request> {
        match &self.configurator {
            Some(configurator) => configurator(request),
            None => Ok(request),
        }
    }
}

impl HandlerOption for TelemetryOptions {}

impl std::fmt::Debug for TelemetryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryOptions")
            .field("configurator", &self.has_configurator())
            .finish()
    }
}

/// Applies the telemetry configurator, then forwards the request.
#[derive(Debug, Clone, Default)]
pub struct TelemetryHandler {
    options: TelemetryOptions,
}

impl TelemetryHandler {
    /// Create a telemetry handler; `None` uses [`TelemetryOptions::default`].
    #[must_use]
    pub fn new(options: Option<TelemetryOptions>) -> Self {
        Self {
            options: options.unwrap_or_default(),
        }
    }

    /// The options resolved at construction.
    #[must_use]
    pub const fn options(&self) -> &TelemetryOptions {
        &self.options
    }
}

impl Interceptor for TelemetryHandler {
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response>> {
        let options = TelemetryOptions::resolve(&self.options, &request);
        match options.configure(request) {
            Ok(request) => next.run(request),
            Err(err) => Box::pin(std::future::ready(Err(err))),
        }
    }

    fn name(&self) -> &'static str {
        "telemetry"
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::{Error, Method};
    use crate::test_support::{ScriptedTransport, chain, request, response};

    fn tagged(value: &'static str) -> TelemetryOptions {
        TelemetryOptions::default().with_configurator(move |mut request| {
            request.insert_header("x-telemetry", value)?;
            Ok(request)
        })
    }

    #[tokio::test]
    async fn default_options_pass_through() {
        let transport = ScriptedTransport::new([Ok(response(200, &[("x-test", "ok")]))]);
        let chain = chain(TelemetryHandler::new(None), &transport);
        let sent = request(Method::GET, "/foo");
        let original = sent.head();

        let received = chain.dispatch(sent).await.expect("response");

        check!(received.header("x-test") == Some("ok"));
        check!(received.request() == Some(&original));
        check!(transport.requests()[0].head() == original);
    }

    #[tokio::test]
    async fn absent_options_match_explicit_defaults() {
        let implicit = ScriptedTransport::new([Ok(response(204, &[]))]);
        let explicit = ScriptedTransport::new([Ok(response(204, &[]))]);

        let implicit_response = chain(TelemetryHandler::new(None), &implicit)
            .dispatch(request(Method::POST, "/items"))
            .await
            .expect("response");
        let explicit_response = chain(
            TelemetryHandler::new(Some(TelemetryOptions::default())),
            &explicit,
        )
        .dispatch(request(Method::POST, "/items"))
        .await
        .expect("response");

        check!(implicit_response.status() == explicit_response.status());
        check!(implicit_response.headers() == explicit_response.headers());
        check!(implicit_response.request() == explicit_response.request());
        check!(implicit.requests()[0].head() == explicit.requests()[0].head());
    }

    #[tokio::test]
    async fn configurator_tags_outgoing_request() {
        let transport = ScriptedTransport::new([Ok(response(200, &[]))]);
        let chain = chain(TelemetryHandler::new(Some(tagged("handler"))), &transport);

        let received = chain
            .dispatch(request(Method::GET, "/"))
            .await
            .expect("response");

        check!(transport.requests()[0].header("x-telemetry") == Some("handler"));
        check!(
            received
                .request()
                .and_then(|head| head.headers.get("x-telemetry"))
                .is_some()
        );
    }

    #[tokio::test]
    async fn request_options_override_handler_options() {
        let transport = ScriptedTransport::new([Ok(response(200, &[])), Ok(response(200, &[]))]);
        let chain = chain(TelemetryHandler::new(Some(tagged("handler"))), &transport);

        let mut overridden = request(Method::GET, "/");
        overridden.set_option(tagged("request"));
        chain.dispatch(overridden).await.expect("response");
        chain
            .dispatch(request(Method::GET, "/"))
            .await
            .expect("response");

        let seen = transport.requests();
        check!(seen[0].header("x-telemetry") == Some("request"));
        check!(seen[1].header("x-telemetry") == Some("handler"));
    }

    #[tokio::test]
    async fn configurator_error_fails_request_before_sending() {
        let transport = ScriptedTransport::new([Ok(response(200, &[]))]);
        let options = TelemetryOptions::default().with_configurator(|mut request| {
            request.insert_header("x-telemetry", "line\nbreak")?;
            Ok(request)
        });
        let chain = chain(TelemetryHandler::new(Some(options)), &transport);

        let result = chain.dispatch(request(Method::GET, "/")).await;

        let_assert!(Err(Error::InvalidHeader(_)) = result);
        check!(transport.requests().is_empty());
    }
}

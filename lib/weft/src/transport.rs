//! Network transport using hyper-util.

use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower_service::Service;

use crate::{BoxFuture, ClientConfig, Error, Request, Response, Result, Transport};

/// Create an HTTPS connector with rustls.
///
/// This connector supports both HTTP/1.1 and HTTP/2, with TLS enabled
/// using the Mozilla root certificates.
fn https_connector(config: &ClientConfig) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(config.connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

/// Terminal stage sending requests with a pooled hyper client over rustls.
///
/// Cloning shares the connection pool.
#[derive(Clone)]
pub struct HyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl HyperTransport {
    /// Create a transport with the given configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let connector = https_connector(&config);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    /// The transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a hyper request from a weft request.
    fn build_hyper_request(request: Request) -> Result<http::Request<Full<Bytes>>> {
        let (head, body, extensions) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(head.method)
            .uri(head.url.as_str());
        if let Some(headers) = builder.headers_mut() {
            *headers = head.headers;
        }

        let body = body.map_or_else(Full::default, Full::new);
        let mut http_request = builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))?;

        *http_request.extensions_mut() = extensions;

        Ok(http_request)
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let head = request.head();
        let hyper_request = Self::build_hyper_request(request)?;

        // One deadline for the head and the body
        let exchange = async {
            let response = self
                .inner
                .request(hyper_request)
                .await
                .map_err(map_hyper_error)?;

            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| Error::connection(e.to_string()))?
                .to_bytes();
            Ok::<_, Error>((parts, body))
        };

        let (parts, body) = tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)??;

        Ok(Response::new(parts.status, parts.headers, body).with_request(head))
    }
}

#[allow(clippy::needless_pass_by_value)]
fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
    // The source chain carries the rustls details
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }

    let lower = msg.to_ascii_lowercase();
    if lower.contains("ssl") || lower.contains("tls") || lower.contains("certificate") {
        return Error::tls(msg);
    }

    Error::connection(msg)
}

impl Transport for HyperTransport {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        Box::pin(self.execute(request))
    }
}

impl Service<Request> for HyperTransport {
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Response>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.execute(request).await })
    }
}

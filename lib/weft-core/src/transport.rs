//! Terminal stage of the chain.
//!
//! The transport performs the actual network I/O. It is supplied by the client
//! runtime; this crate only defines the seam.

use std::future::{Future, poll_fn};
use std::sync::{Arc, Mutex};

use tower_service::Service;

use crate::{BoxFuture, Error, Request, Response, Result};

/// Sends a request on the wire and produces its response.
///
/// Timeouts are the transport's concern; report them as [`Error::Timeout`].
pub trait Transport: Send + Sync + 'static {
    /// Send the request.
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response>>;
}

impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        (**self).send(request)
    }
}

/// Transport built from a closure, see [`transport_fn`].
#[derive(Debug, Clone)]
pub struct TransportFn<F> {
    f: F,
}

/// Create a transport from an async closure.
///
/// # Example
///
/// ```
/// use weft_core::{Response, StatusCode, transport_fn};
///
/// let transport = transport_fn(|_request| async { Ok(Response::with_status(StatusCode::OK)) });
/// ```
pub fn transport_fn<F, Fut>(f: F) -> TransportFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    TransportFn { f }
}

impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        Box::pin((self.f)(request))
    }
}

/// Adapts a tower [`Service`] into a [`Transport`].
///
/// The service is kept behind a mutex only long enough to clone it, so
/// concurrent sends each drive their own clone.
pub struct ServiceTransport<S> {
    service: Arc<Mutex<S>>,
}

impl<S> ServiceTransport<S> {
    /// Wrap a service.
    pub fn new(service: S) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
        }
    }
}

impl<S> Clone for ServiceTransport<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S> std::fmt::Debug for ServiceTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceTransport").finish_non_exhaustive()
    }
}

impl<S> Transport for ServiceTransport<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        let mut service = self
            .service
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move {
            poll_fn(|cx| service.poll_ready(cx)).await?;
            service.call(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use assert2::{check, let_assert};
    use http::StatusCode;

    use super::*;
    use crate::Method;

    #[derive(Clone, Default)]
    struct CountingService {
        calls: Arc<AtomicUsize>,
    }

    impl Service<Request> for CountingService {
        type Response = Response;
        type Error = Error;
        type Future = Pin<Box<dyn Future<Output = Result<Response>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: Request) -> Self::Future {
            let calls = Arc::clone(&self.calls);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if request.url().path() == "/fail" {
                    Err(Error::Timeout)
                } else {
                    Ok(Response::with_status(StatusCode::ACCEPTED))
                }
            })
        }
    }

    fn request(path: &str) -> Request {
        let url = url::Url::parse(&format!("https://example.com{path}")).expect("valid URL");
        Request::new(Method::GET, url)
    }

    #[tokio::test]
    async fn service_transport_delegates() {
        let service = CountingService::default();
        let transport = ServiceTransport::new(service.clone());

        let response = transport.send(request("/ok")).await.expect("response");
        check!(response.status() == StatusCode::ACCEPTED);

        let_assert!(Err(Error::Timeout) = transport.send(request("/fail")).await);
        check!(service.calls.load(Ordering::SeqCst) == 2);
    }

    #[tokio::test]
    async fn arc_transport_delegates() {
        let transport: Arc<dyn Transport> = Arc::new(transport_fn(|_request| async {
            Ok(Response::with_status(StatusCode::NO_CONTENT))
        }));

        let response = transport.send(request("/")).await.expect("response");
        check!(response.status() == StatusCode::NO_CONTENT);
    }
}

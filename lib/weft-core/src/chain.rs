//! The ordered interceptor chain and its dispatcher.
//!
//! A [`Chain`] owns an immutable list of interceptors plus the terminal
//! [`Transport`]. Each call to [`Chain::dispatch`] builds a fresh [`Next`]
//! over that list, so concurrent traversals share nothing mutable.
//!
//! Requests go down in construction order (index 0 first) and responses come
//! back up in the exact reverse order.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::{Either, select};
use tower_service::Service;
use tracing::debug;

use crate::{BoxFuture, Error, Interceptor, Next, Request, Response, Result, Transport};

/// Ordered interceptors in front of a transport.
///
/// Cloning is cheap: the interceptor list and transport are shared.
///
/// # Example
///
/// ```
/// use weft_core::{Chain, Method, Request, Response, StatusCode, transport_fn};
///
/// async fn get_root() -> weft_core::Result<Response> {
///     let chain = Chain::builder(transport_fn(|_request| async {
///         Ok(Response::with_status(StatusCode::OK))
///     }))
///     .build();
///
///     let request = Request::new(Method::GET, "https://example.com/".parse()?);
///     chain.dispatch(request).await
/// }
/// ```
#[derive(Clone)]
pub struct Chain {
    interceptors: Arc<[Arc<dyn Interceptor>]>,
    transport: Arc<dyn Transport>,
}

impl Chain {
    /// Create a chain from interceptors (outermost first) and a transport.
    pub fn new<I>(interceptors: I, transport: Arc<dyn Transport>) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Interceptor>>,
    {
        Self {
            interceptors: interceptors.into_iter().collect(),
            transport,
        }
    }

    /// Create a new [`ChainBuilder`] ending at `transport`.
    #[must_use]
    pub fn builder(transport: impl Transport) -> ChainBuilder {
        ChainBuilder::new(transport)
    }

    /// Number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if requests go straight to the transport.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Interceptor names, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Thread `request` through every interceptor and the transport.
    ///
    /// The response carries a back-reference to the request as the transport
    /// saw it. The first error raised by any stage is returned unchanged.
    pub async fn dispatch(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();

        let result = Next::new(&self.interceptors, self.transport.as_ref())
            .run(request)
            .await;

        match &result {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "traversal completed");
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "traversal failed");
            }
        }

        result
    }

    /// Like [`Chain::dispatch`], but gives up when `cancel` completes first.
    ///
    /// On cancellation the in-flight traversal is dropped, which cancels every
    /// stage down to the transport, and [`Error::Cancelled`] is returned.
    pub async fn dispatch_with_cancellation<C>(&self, request: Request, cancel: C) -> Result<Response>
    where
        C: Future<Output = ()>,
    {
        let traversal = pin!(self.dispatch(request));
        let cancel = pin!(cancel);

        match select(traversal, cancel).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => {
                debug!("traversal cancelled");
                Err(Error::Cancelled)
            }
        }
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("interceptors", &self.names())
            .finish_non_exhaustive()
    }
}

impl Service<Request> for Chain {
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Response>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let chain = self.clone();
        Box::pin(async move { chain.dispatch(request).await })
    }
}

/// Builder for [`Chain`].
pub struct ChainBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Arc<dyn Transport>,
}

impl ChainBuilder {
    /// Creates a builder with no interceptors.
    #[must_use]
    pub fn new(transport: impl Transport) -> Self {
        Self {
            interceptors: Vec::new(),
            transport: Arc::new(transport),
        }
    }

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

    /// Build the chain.
    #[must_use]
    pub fn build(self) -> Chain {
        Chain::new(self.interceptors, self.transport)
    }
}

impl std::fmt::Debug for ChainBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainBuilder")
            .field("interceptors_count", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

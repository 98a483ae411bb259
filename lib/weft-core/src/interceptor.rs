//! Interceptor contract and the continuation handed to each interceptor.
//!
//! An [`Interceptor`] receives the request and a [`Next`] representing the
//! rest of the chain down to the transport. It may change the request, run
//! `next`, then change the response on its way back up.
//!
//! # Example
//!
//! ```
//! use weft_core::{BoxFuture, Interceptor, Next, Request, Response, Result};
//!
//! struct RequestId;
//!
//! impl Interceptor for RequestId {
//!     fn process<'a>(&'a self, mut request: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response>> {
//!         Box::pin(async move {
//!             request.insert_header("X-Request-Id", "42")?;
//!             let mut response = next.run(request).await?;
//!             response.headers_mut().remove("server");
//!             Ok(response)
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::trace;

use crate::{Request, Response, Result, Transport};

/// Boxed future returned by interceptors and transports.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A unit of behavior participating in a [`Chain`](crate::Chain).
///
/// Implementations are shared by every traversal of the chain, so they must
/// not keep per-request state in `self`.
///
/// Errors returned by `next` should be passed through unchanged (`?`) unless
/// recovering from them is the interceptor's documented purpose. Returning a
/// response without running `next` short-circuits the rest of the chain.
pub trait Interceptor: Send + Sync + 'static {
    /// Process one request.
    fn process<'a>(&'a self, request: Request, next: Next<'a>)
    -> BoxFuture<'a, Result<Response>>;

    /// Name used in logs and errors.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Continuation over the remaining stages of one traversal.
///
/// [`Next::run`] consumes the continuation, so a stage runs the rest of the
/// chain at most once. Handlers whose purpose is to re-send (retry, redirect)
/// keep a copy with [`Clone::clone`] before each run.
#[derive(Clone)]
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    /// Continuation over `interceptors`, ending at `transport`.
    #[must_use]
    pub fn new(interceptors: &'a [Arc<dyn Interceptor>], transport: &'a dyn Transport) -> Self {
        Self {
            interceptors,
            transport,
        }
    }

    /// Number of interceptors still ahead of the transport.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.interceptors.len()
    }

    /// Run the rest of the chain with `request`.
    pub fn run(self, request: Request) -> BoxFuture<'a, Result<Response>> {
        match self.interceptors.split_first() {
            Some((current, rest)) => {
                trace!(
                    interceptor = current.name(),
                    remaining = rest.len(),
                    "entering interceptor"
                );
                let next = Next {
                    interceptors: rest,
                    transport: self.transport,
                };
                current.process(request, next)
            }
            None => {
                let head = request.head();
                let sent = self.transport.send(request);
                Box::pin(async move {
                    let response = sent.await?;
                    trace!(status = %response.status(), "transport responded");
                    if response.request().is_some() {
                        Ok(response)
                    } else {
                        Ok(response.with_request(head))
                    }
                })
            }
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field(
                "interceptors",
                &self.interceptors.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Interceptor built from a closure, see [`interceptor_fn`].
#[derive(Clone)]
pub struct InterceptorFn<F> {
    name: &'static str,
    f: F,
}

/// Create an interceptor from a closure.
///
/// # Example
///
/// ```
/// use weft_core::interceptor_fn;
///
/// let tag = interceptor_fn("tag", |mut request, next| {
///     Box::pin(async move {
///         request.insert_header("X-Tag", "demo")?;
///         next.run(request).await
///     })
/// });
/// ```
pub fn interceptor_fn<F>(name: &'static str, f: F) -> InterceptorFn<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Result<Response>> + Send + Sync + 'static,
{
    InterceptorFn { name, f }
}

impl<F> Interceptor for InterceptorFn<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Result<Response>> + Send + Sync + 'static,
{
    fn process<'a>(
        &'a self,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Response>> {
        (self.f)(request, next)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<F> std::fmt::Debug for InterceptorFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

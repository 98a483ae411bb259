//! HTTP client with a composable interceptor chain.
//!
//! Requests flow through an ordered list of [`Interceptor`]s down to a
//! [`Transport`] (by default [`HyperTransport`], hyper over rustls), and
//! responses flow back up in reverse order. The chain types live in
//! [`weft_core`] and are re-exported here; [`middleware`] provides the
//! stock handlers.
//!
//! # Example
//!
//! ```ignore
//! use weft::prelude::*;
//! use weft::middleware::{RetryHandler, RetryOptions};
//!
//! let client = Client::builder()
//!     .with_defaults()
//!     .interceptor(interceptor_fn("tag", |mut request, next| {
//!         Box::pin(async move {
//!             request.insert_header("x-request-source", "inventory")?;
//!             next.run(request).await
//!         })
//!     }))
//!     .build();
//!
//! let request = Request::builder(Method::GET, "https://api.example.com/items".parse()?)
//!     .query("page", "2")
//!     .option(RetryOptions::default().with_max_retries(1))
//!     .build()?;
//! let response = client.execute(request).await?;
//! ```

mod client;
mod config;
pub mod middleware;
pub mod prelude;
#[cfg(test)]
mod test_support;
mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{
    ClientConfig, ClientConfigBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_POOL_IDLE_PER_HOST,
    DEFAULT_POOL_IDLE_TIMEOUT, DEFAULT_TIMEOUT,
};
pub use transport::HyperTransport;

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use weft_core::{
    BoxFuture, Chain, ChainBuilder, Error, Extensions, HandlerOption, Interceptor, InterceptorFn,
    Method, Next, Request, RequestBuilder, RequestHead, Response, Result, ServiceTransport,
    StatusCode, Transport, TransportFn, header, interceptor_fn, transport_fn,
};

// Re-export url for building requests
pub use url;

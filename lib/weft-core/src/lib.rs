//! Core types and the interceptor chain for the weft HTTP client.
//!
//! This crate provides the foundational types used by weft:
//! - [`Request`], [`RequestBuilder`] and [`RequestHead`] - outgoing request
//! - [`Response`] - response with a back-reference to its request
//! - [`Error`] and [`Result`] - error handling
//! - [`Interceptor`] and [`Next`] - a stage of the chain and its continuation
//! - [`Transport`] - terminal stage performing the network call
//! - [`Chain`] - ordered interceptors in front of a transport
//! - [`HandlerOption`] - per-handler configuration, overridable per request
//! - [`Method`], [`StatusCode`] and [`header`] - re-exported from the `http` crate

mod chain;
mod error;
mod interceptor;
mod options;
pub mod prelude;
mod request;
mod response;
mod transport;

pub use chain::{Chain, ChainBuilder};
pub use error::{Error, Result};
pub use interceptor::{BoxFuture, Interceptor, InterceptorFn, Next, interceptor_fn};
pub use options::HandlerOption;
pub use request::{Request, RequestBuilder, RequestHead, parse_header};
pub use response::Response;
pub use transport::{ServiceTransport, Transport, TransportFn, transport_fn};

// Re-export http crate types for methods, status codes and headers
pub use http::{Extensions, Method, StatusCode, header};

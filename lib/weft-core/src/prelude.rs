//! Prelude module for convenient imports.
//!
//! ```ignore
//! use weft_core::prelude::*;
//! ```

pub use crate::{
    BoxFuture, Chain, Error, HandlerOption, Interceptor, Method, Next, Request, RequestBuilder,
    Response, Result, StatusCode, Transport, interceptor_fn, transport_fn,
};

//! Prelude module for convenient imports.
//!
//! ```ignore
//! use weft::prelude::*;
//! ```

pub use crate::{
    Client, ClientBuilder, ClientConfig, Error, HandlerOption, Interceptor, Method, Next, Request,
    RequestBuilder, Response, Result, StatusCode, Transport, header, interceptor_fn, transport_fn,
};

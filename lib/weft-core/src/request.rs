//! Outgoing HTTP request.
//!
//! A [`Request`] is owned by whichever stage of the chain currently holds it.
//! Handing it to [`Next::run`](crate::Next::run) moves it downstream, so a stage
//! cannot touch a request it already passed on.
//!
//! # Example
//!
//! ```
//! use weft_core::{Method, Request};
//!
//! let request = Request::builder(Method::GET, "https://api.example.com/users".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .query("page", "1")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.header("accept"), Some("application/json"));
//! ```

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Extensions, Method};
use url::Url;

use crate::{Error, HandlerOption, Result};

/// An HTTP request with method, URL, headers, optional body and per-request options.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    extensions: Extensions,
}

/// Method, URL and headers of a request, without its body.
///
/// Responses keep one of these as a back-reference to the request that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// HTTP method.
    pub method: Method,
    /// Request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
}

impl Request {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            extensions: Extensions::new(),
        }
    }

    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Replace the HTTP method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Replace the request URL.
    pub fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Single header value by name (case-insensitive).
    ///
    /// Values that are not visible ASCII are reported as absent.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn insert_header(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Replace the request body.
    pub fn set_body(&mut self, body: Option<Bytes>) {
        self.body = body;
    }

    /// Per-request extensions.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to per-request extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Options of type `T` attached to this request, if any.
    ///
    /// Handlers use this to let a single request override their configured options.
    #[must_use]
    pub fn option<T: HandlerOption>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Attach handler options to this request, returning the previous value.
    pub fn set_option<T: HandlerOption>(&mut self, option: T) -> Option<T> {
        self.extensions.insert(option)
    }

    /// Snapshot of method, URL and headers.
    #[must_use]
    pub fn head(&self) -> RequestHead {
        RequestHead {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
        }
    }

    /// Consume into head, body and extensions.
    #[must_use]
    pub fn into_parts(self) -> (RequestHead, Option<Bytes>, Extensions) {
        let head = RequestHead {
            method: self.method,
            url: self.url,
            headers: self.headers,
        };
        (head, self.body, self.extensions)
    }

    /// Rebuild a request from the parts returned by [`Request::into_parts`].
    #[must_use]
    pub fn from_parts(head: RequestHead, body: Option<Bytes>, extensions: Extensions) -> Self {
        Self {
            method: head.method,
            url: head.url,
            headers: head.headers,
            body,
            extensions,
        }
    }
}

/// Validate a header name and value, reporting failures as [`Error::InvalidHeader`].
#[doc(hidden)]
pub fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::invalid_header(format!("{name}: {e}")))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|e| Error::invalid_header(format!("{name}: {e}")))?;
    Ok((header_name, header_value))
}

/// Builder for constructing [`Request`] instances.
///
/// Invalid headers are reported by [`RequestBuilder::build`].
#[derive(Debug)]
pub struct RequestBuilder {
    inner: Result<Request>,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            inner: Ok(Request::new(method, url)),
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.and_then(|mut request| {
            request.insert_header(name.as_ref(), value.as_ref())?;
            Ok(request)
        })
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers<K, V>(self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.header(name, value))
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn query(self, name: &str, value: &str) -> Self {
        self.and_then(|mut request| {
            request.url.query_pairs_mut().append_pair(name, value);
            Ok(request)
        })
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.and_then(|mut request| {
            request.body = Some(body);
            Ok(request)
        })
    }

    /// Attaches handler options that apply to this request only.
    #[must_use]
    pub fn option<T: HandlerOption>(self, option: T) -> Self {
        self.and_then(|mut request| {
            request.set_option(option);
            Ok(request)
        })
    }

    /// Builds the [`Request`].
    pub fn build(self) -> Result<Request> {
        self.inner
    }

    fn and_then(self, f: impl FnOnce(Request) -> Result<Request>) -> Self {
        Self {
            inner: self.inner.and_then(f),
        }
    }
}

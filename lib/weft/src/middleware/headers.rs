//! Header injection middleware.
//!
//! Adds a fixed set of headers to every outgoing request, such as a
//! `User-Agent` or an API key.

use http::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::{BoxFuture, HandlerOption, Interceptor, Next, Request, Response, Result};

/// `User-Agent` sent by default.
pub const DEFAULT_USER_AGENT: &str = concat!("weft/", env!("CARGO_PKG_VERSION"));

/// Options for [`HeadersHandler`].
///
/// Defaults to `User-Agent: weft/<version>` without overwriting headers the
/// request already carries.
#[derive(Debug, Clone)]
pub struct HeadersOptions {
    headers: HeaderMap,
    overwrite: bool,
}

impl Default for HeadersOptions {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        Self {
            headers,
            overwrite: false,
        }
    }
}

impl HeadersOptions {
    /// Options injecting no header at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            headers: HeaderMap::new(),
            overwrite: false,
        }
    }

    /// Add a header to inject.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let (header_name, header_value) = weft_core::parse_header(name, value)?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Replace values the request already has for the same header names.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Headers to inject.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            if self.overwrite || !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
    }
}

impl HandlerOption for HeadersOptions {}

/// Injects the configured headers into every request.
#[derive(Debug, Clone, Default)]
pub struct HeadersHandler {
    options: HeadersOptions,
}

impl HeadersHandler {
    /// Create a headers handler; `None` uses [`HeadersOptions::default`].
    #[must_use]
    pub fn new(options: Option<HeadersOptions>) -> Self {
        Self {
            options: options.unwrap_or_default(),
        }
    }
}

impl Interceptor for HeadersHandler {
    fn process<'a>(
        &'a self,
        mut request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Response>> {
        let options = HeadersOptions::resolve(&self.options, &request);
        options.apply(request.headers_mut());
        next.run(request)
    }

    fn name(&self) -> &'static str {
        "headers"
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::{Error, Method};
    use crate::test_support::{ScriptedTransport, chain, request, response};

    #[tokio::test]
    async fn injects_default_user_agent() {
        let transport = ScriptedTransport::new([Ok(response(200, &[]))]);
        let chain = chain(HeadersHandler::new(None), &transport);

        chain
            .dispatch(request(Method::GET, "/"))
            .await
            .expect("response");

        check!(transport.requests()[0].header("user-agent") == Some(DEFAULT_USER_AGENT));
    }

    #[tokio::test]
    async fn keeps_existing_headers_unless_overwriting() {
        let options = HeadersOptions::empty()
            .header("X-Api-Key", "configured")
            .expect("valid header");
        let transport = ScriptedTransport::new([Ok(response(200, &[])), Ok(response(200, &[]))]);
        let keep = chain(HeadersHandler::new(Some(options.clone())), &transport);
        let replace = chain(HeadersHandler::new(Some(options.overwrite(true))), &transport);

        let mut sent = request(Method::GET, "/");
        sent.insert_header("x-api-key", "caller").expect("header");
        keep.dispatch(sent.clone()).await.expect("response");
        replace.dispatch(sent).await.expect("response");

        let seen = transport.requests();
        check!(seen[0].header("x-api-key") == Some("caller"));
        check!(seen[1].header("x-api-key") == Some("configured"));
    }

    #[test]
    fn rejects_invalid_header() {
        let_assert!(Err(Error::InvalidHeader(_)) = HeadersOptions::empty().header("x-bad", "line\nbreak"));
    }
}

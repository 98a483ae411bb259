//! Follow redirect middleware.
//!
//! Follows 3xx responses carrying a `Location` header by re-running the rest
//! of the chain with the redirected request. Relative and absolute locations
//! are both supported.

use std::sync::Arc;

use http::StatusCode;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use tracing::debug;
use url::Url;

use crate::{BoxFuture, Error, HandlerOption, Interceptor, Method, Next, Request, Response, Result};

/// Default maximum number of redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Upper bound accepted for [`RedirectOptions::with_max_redirects`].
pub const MAX_REDIRECTS_LIMIT: usize = 20;

type RedirectPredicate = Arc<dyn Fn(&Response) -> bool + Send + Sync>;

/// Options for [`RedirectHandler`].
#[derive(Clone)]
pub struct RedirectOptions {
    max_redirects: usize,
    should_redirect: RedirectPredicate,
}

impl Default for RedirectOptions {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            should_redirect: Arc::new(|_| true),
        }
    }
}

impl RedirectOptions {
    /// Set the maximum number of redirects, capped at [`MAX_REDIRECTS_LIMIT`].
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects.min(MAX_REDIRECTS_LIMIT);
        self
    }

    /// Decide per redirect response whether to follow it.
    #[must_use]
    pub fn with_should_redirect(
        mut self,
        should_redirect: impl Fn(&Response) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_redirect = Arc::new(should_redirect);
        self
    }

    /// Maximum number of redirects.
    #[must_use]
    pub const fn max_redirects(&self) -> usize {
        self.max_redirects
    }
}

impl HandlerOption for RedirectOptions {}

impl std::fmt::Debug for RedirectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectOptions")
            .field("max_redirects", &self.max_redirects)
            .finish_non_exhaustive()
    }
}

/// Follows HTTP redirects.
#[derive(Debug, Clone, Default)]
pub struct RedirectHandler {
    options: RedirectOptions,
}

impl RedirectHandler {
    /// Create a redirect handler; `None` uses [`RedirectOptions::default`].
    #[must_use]
    pub fn new(options: Option<RedirectOptions>) -> Self {
        Self {
            options: options.unwrap_or_default(),
        }
    }

    /// The options resolved at construction.
    #[must_use]
    pub const fn options(&self) -> &RedirectOptions {
        &self.options
    }
}

/// Check if a status code is a followed redirect.
fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Determine the method for the redirected request.
///
/// - 307, 308: preserve original method
/// - 301, 302, 303: GET (HEAD stays HEAD)
fn redirect_method(status: StatusCode, original: &Method) -> Method {
    match status.as_u16() {
        307 | 308 => original.clone(),
        _ if *original == Method::HEAD => Method::HEAD,
        _ => Method::GET,
    }
}

/// Resolve a redirect Location URL relative to the current request URL.
fn resolve_redirect_url(base_url: &Url, location: &str) -> Result<Url> {
    base_url
        .join(location)
        .map_err(|e| Error::InvalidRedirect(format!("bad location `{location}`: {e}")))
}

/// Credentials only follow redirects within the same scheme, host and port.
fn same_authority(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

impl Interceptor for RedirectHandler {
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response>> {
        let options = RedirectOptions::resolve(&self.options, &request);

        Box::pin(async move {
            let mut current = request;
            let mut redirects = 0;

            loop {
                let response = next.clone().run(current.clone()).await?;

                if !is_redirect(response.status()) || !(options.should_redirect)(&response) {
                    return Ok(response);
                }

                let Some(location) = response.header(LOCATION.as_str()) else {
                    // Nothing to follow
                    return Ok(response);
                };

                if redirects >= options.max_redirects {
                    return Err(Error::TooManyRedirects {
                        count: redirects,
                        max: options.max_redirects,
                    });
                }

                let new_url = resolve_redirect_url(current.url(), location)?;
                let new_method = redirect_method(response.status(), current.method());

                debug!(
                    status = %response.status(),
                    from = %current.url(),
                    to = %new_url,
                    "following redirect"
                );

                if new_method != *current.method() {
                    current.set_body(None);
                    current.headers_mut().remove(CONTENT_TYPE);
                    current.headers_mut().remove(CONTENT_LENGTH);
                }
                if !same_authority(current.url(), &new_url) {
                    current.headers_mut().remove(AUTHORIZATION);
                }
                current.set_method(new_method);
                current.set_url(new_url);

                redirects += 1;
            }
        })
    }

    fn name(&self) -> &'static str {
        "redirect"
    }
}

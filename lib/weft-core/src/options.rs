//! Handler options contract.
//!
//! Every handler stores an immutable options value resolved once at
//! construction (`None` becomes `Default::default()`). The same type can be
//! attached to a single [`Request`] to override the handler's options for that
//! traversal only.

use crate::Request;

/// Marker for per-handler configuration values.
///
/// # Example
///
/// ```
/// use weft_core::{HandlerOption, Method, Request};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct CacheOptions {
///     max_age: u32,
/// }
///
/// impl HandlerOption for CacheOptions {}
///
/// let configured = CacheOptions { max_age: 60 };
/// let request = Request::builder(Method::GET, "https://example.com".parse().unwrap())
///     .option(CacheOptions { max_age: 0 })
///     .build()
///     .unwrap();
///
/// assert_eq!(CacheOptions::resolve(&configured, &request).max_age, 0);
/// ```
pub trait HandlerOption: Clone + Send + Sync + 'static {
    /// Options for one traversal: the request-scoped value if present,
    /// otherwise the handler's configured value.
    #[must_use]
    fn resolve(configured: &Self, request: &Request) -> Self {
        request.option::<Self>().unwrap_or(configured).clone()
    }
}

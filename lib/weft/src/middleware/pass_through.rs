//! Interceptor that forwards requests and responses untouched.

use crate::{BoxFuture, Interceptor, Next, Request, Response, Result};

/// Forwards the request to the next stage and returns its response as is.
///
/// Useful as a placeholder in a chain; it is indistinguishable from its absence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughHandler;

impl PassThroughHandler {
    /// Create a new pass-through handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for PassThroughHandler {
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response>> {
        next.run(request)
    }

    fn name(&self) -> &'static str {
        "pass-through"
    }
}

//! Scripted transport shared by handler unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use http::StatusCode;
use http::header::{HeaderName, HeaderValue};

use crate::{BoxFuture, Chain, Error, Interceptor, Method, Request, Response, Result, Transport};

/// Replays canned results in order and records every request it receives.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Response>>>,
    seen: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: impl IntoIterator<Item = Result<Response>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.seen.lock().expect("seen lock").clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().expect("seen lock").len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        self.seen.lock().expect("seen lock").push(request);
        let next = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(Error::connection("script exhausted")));
        Box::pin(async move { next })
    }
}

pub(crate) fn chain(interceptor: impl Interceptor, transport: &Arc<ScriptedTransport>) -> Chain {
    Chain::builder(Arc::clone(transport))
        .interceptor(interceptor)
        .build()
}

pub(crate) fn request(method: Method, path: &str) -> Request {
    let url = url::Url::parse(&format!("https://api.example.com{path}")).expect("valid URL");
    Request::new(method, url)
}

pub(crate) fn response(status: u16, headers: &[(&'static str, &'static str)]) -> Response {
    let mut response =
        Response::with_status(StatusCode::from_u16(status).expect("valid status code"));
    for (name, value) in headers {
        response.headers_mut().insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    response
}

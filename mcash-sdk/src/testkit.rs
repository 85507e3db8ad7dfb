//! Scripted transport for tests.
//!
//! [`ScriptedTransport`] answers requests from canned replies registered per
//! method and path suffix, and records every request it sees. The last reply
//! of a route repeats forever, so a route scripted with a single reply always
//! answers the same way.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use url::Url;

use crate::client::{ApiRequest, ApiResponse, ClientError, Transport};

/// One canned answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Response { status: u16, body: String },
    /// Fail as if the connection was refused.
    NetworkFailure,
}

impl Reply {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Reply::Response {
            status,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Reply::Response {
            status,
            body: String::new(),
        }
    }
}

/// A request as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<String>,
}

struct Route {
    method: Method,
    path_suffix: String,
    replies: VecDeque<Reply>,
}

#[derive(Default)]
struct Inner {
    routes: Vec<Route>,
    log: Vec<RecordedRequest>,
}

/// In-memory [`Transport`]; clones share routes and the request log.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register replies for requests whose method matches and whose URL path
    /// ends with `path_suffix`. Later registrations for the same route
    /// replace earlier ones.
    pub fn on(self, method: Method, path_suffix: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.set(method, path_suffix, replies);
        self
    }

    /// Same as [`on`](Self::on) but usable through a shared handle.
    pub fn set(&self, method: Method, path_suffix: &str, replies: impl IntoIterator<Item = Reply>) {
        let mut inner = self.inner.lock();
        inner
            .routes
            .retain(|r| !(r.method == method && r.path_suffix == path_suffix));
        inner.routes.push(Route {
            method,
            path_suffix: path_suffix.to_owned(),
            replies: replies.into_iter().collect(),
        });
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().log.clone()
    }

    /// Total number of requests received.
    pub fn total(&self) -> usize {
        self.inner.lock().log.len()
    }

    /// Number of requests that matched `method` and `path_suffix`.
    pub fn count(&self, method: Method, path_suffix: &str) -> usize {
        self.inner
            .lock()
            .log
            .iter()
            .filter(|r| r.method == method && r.url.path().ends_with(path_suffix))
            .count()
    }

    fn next_reply(&self, request: &ApiRequest) -> Reply {
        let mut inner = self.inner.lock();
        inner.log.push(RecordedRequest {
            method: request.method.clone(),
            url: request.url.clone(),
            body: request.body.clone(),
        });
        let path = request.url.path();
        let Some(route) = inner
            .routes
            .iter_mut()
            .find(|r| r.method == request.method && path.ends_with(&r.path_suffix))
        else {
            return Reply::json(404, "no scripted route");
        };
        if route.replies.len() > 1 {
            route.replies.pop_front().unwrap_or(Reply::status(404))
        } else {
            route.replies.front().cloned().unwrap_or(Reply::status(404))
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        match self.next_reply(request) {
            Reply::Response { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Ok(ApiResponse::new(status, body))
            }
            Reply::NetworkFailure => Err(ClientError::Network("connection refused".into())),
        }
    }
}

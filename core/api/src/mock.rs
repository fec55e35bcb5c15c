//! Scripted in-memory transport for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use vaultsync_common::{Error, Result};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method};

type Handler = Arc<dyn Fn(&ApiRequest) -> Result<ApiResponse> + Send + Sync>;

#[derive(Clone)]
enum Reply {
    Respond(ApiResponse),
    Unreachable,
    Handler(Handler),
}

struct Route {
    method: Method,
    endpoint: String,
    queued: VecDeque<Reply>,
    sticky: Option<Reply>,
    delay: Option<Duration>,
}

impl Route {
    fn matches(&self, request: &ApiRequest) -> bool {
        self.method == request.method
            && request
                .url
                .path()
                .ends_with(&format!("/{}", self.endpoint))
    }
}

#[derive(Default)]
struct State {
    routes: Vec<Route>,
    requests: Vec<ApiRequest>,
    offline: bool,
}

impl State {
    fn route_mut(&mut self, method: Method, endpoint: &str) -> &mut Route {
        let index = match self
            .routes
            .iter()
            .position(|r| r.method == method && r.endpoint == endpoint)
        {
            Some(index) => index,
            None => {
                self.routes.push(Route {
                    method,
                    endpoint: endpoint.to_string(),
                    queued: VecDeque::new(),
                    sticky: None,
                    delay: None,
                });
                self.routes.len() - 1
            }
        };
        &mut self.routes[index]
    }
}

/// Transport that answers from scripted replies and records every request.
///
/// Queued replies are consumed first, then the route's standing reply is
/// used. Unmatched requests receive 404.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// Create a transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer every call to `endpoint` with `response`.
    pub fn respond(&self, method: Method, endpoint: &str, response: ApiResponse) {
        self.lock().route_mut(method, endpoint).sticky = Some(Reply::Respond(response));
    }

    /// Answer the next call to `endpoint` with `response`.
    pub fn enqueue(&self, method: Method, endpoint: &str, response: ApiResponse) {
        self.lock()
            .route_mut(method, endpoint)
            .queued
            .push_back(Reply::Respond(response));
    }

    /// Fail every call to `endpoint` as if the server were unreachable.
    pub fn fail(&self, method: Method, endpoint: &str) {
        self.lock().route_mut(method, endpoint).sticky = Some(Reply::Unreachable);
    }

    /// Answer every call to `endpoint` by running `handler`.
    pub fn handle<F>(&self, method: Method, endpoint: &str, handler: F)
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse> + Send + Sync + 'static,
    {
        self.lock().route_mut(method, endpoint).sticky = Some(Reply::Handler(Arc::new(handler)));
    }

    /// Delay every reply for `endpoint`.
    pub fn delay(&self, method: Method, endpoint: &str, delay: Duration) {
        self.lock().route_mut(method, endpoint).delay = Some(delay);
    }

    /// Make every request fail as unreachable, or restore routing.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received for `endpoint`.
    pub fn count(&self, method: Method, endpoint: &str) -> usize {
        let suffix = format!("/{}", endpoint);
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.url.path().ends_with(&suffix))
            .count()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let (reply, delay) = {
            let mut state = self.lock();
            state.requests.push(request.clone());

            if state.offline {
                (Some(Reply::Unreachable), None)
            } else {
                match state.routes.iter_mut().find(|r| r.matches(&request)) {
                    Some(route) => {
                        let reply = route.queued.pop_front().or_else(|| route.sticky.clone());
                        (reply, route.delay)
                    }
                    None => (None, None),
                }
            }
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Unreachable) => Err(Error::ServerUnreachable(
                "Connection refused".to_string(),
            )),
            Some(Reply::Handler(handler)) => handler(&request),
            None => Ok(ApiResponse::empty(404)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(method: Method, path: &str) -> ApiRequest {
        ApiRequest {
            method,
            url: Url::parse(&format!("https://example.com/api/v1/{}", path)).unwrap(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_queued_before_sticky() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "Vault", ApiResponse::empty(200));
        mock.enqueue(Method::Get, "Vault", ApiResponse::empty(503));

        let first = mock.send(request(Method::Get, "Vault")).await.unwrap();
        let second = mock.send(request(Method::Get, "Vault")).await.unwrap();

        assert_eq!(first.status, 503);
        assert_eq!(second.status, 200);
        assert_eq!(mock.count(Method::Get, "Vault"), 2);
    }

    #[tokio::test]
    async fn test_unmatched_is_not_found() {
        let mock = MockTransport::new();
        let response = mock.send(request(Method::Post, "Vault")).await.unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_offline() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "Auth/status", ApiResponse::empty(200));
        mock.set_offline(true);

        assert!(matches!(
            mock.send(request(Method::Get, "Auth/status")).await,
            Err(Error::ServerUnreachable(_))
        ));
    }
}

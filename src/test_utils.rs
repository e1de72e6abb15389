// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

type Responses = HashMap<(String, String), (u16, String)>;

/// A mock HTTP service that returns predefined responses based on request method
/// and path, and records every request it receives.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<Responses>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Every `(method, path)` received so far, in order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));
        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("resource", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

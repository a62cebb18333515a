// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
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

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PATCH requests matching the exact path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Add a response for DELETE requests matching the exact path
    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Requests received so far, as (method, path)
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

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
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

/// Node list where each entry carries a Ready condition with the given status
pub fn node_list_json(ready: &[bool]) -> String {
    let items: Vec<_> = ready
        .iter()
        .enumerate()
        .map(|(i, ready)| {
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "Node",
                "metadata": { "name": format!("node-{}", i) },
                "status": {
                    "conditions": [
                        { "type": "MemoryPressure", "status": "False" },
                        { "type": "Ready", "status": if *ready { "True" } else { "False" } }
                    ]
                }
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "NodeList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

pub fn deployment_json(name: &str, namespace: &str, replicas: i32, available: i32) -> String {
    serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": name, "namespace": namespace },
        "spec": {
            "replicas": replicas,
            "selector": { "matchLabels": { "app": name } },
            "template": { "metadata": { "labels": { "app": name } } }
        },
        "status": {
            "replicas": replicas,
            "availableReplicas": available,
            "conditions": [
                {
                    "type": "Available",
                    "status": if available >= replicas && replicas > 0 { "True" } else { "False" }
                }
            ]
        }
    })
    .to_string()
}

/// Pod list with one pod per phase
pub fn pod_list_json(namespace: &str, phases: &[&str]) -> String {
    let items: Vec<_> = phases
        .iter()
        .enumerate()
        .map(|(i, phase)| {
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": { "name": format!("awx-pod-{}", i), "namespace": namespace },
                "status": { "phase": phase }
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "PodList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

/// Secret with a single base64-encoded data entry
pub fn secret_json(name: &str, namespace: &str, key: &str, value_b64: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": { "name": name, "namespace": namespace },
        "type": "Opaque",
        "data": { key: value_b64 }
    })
    .to_string()
}

pub fn node_port_service_json(name: &str, namespace: &str, node_port: Option<i32>) -> String {
    let mut port = serde_json::json!({ "name": "http", "port": 80, "protocol": "TCP" });
    if let Some(node_port) = node_port {
        port["nodePort"] = serde_json::json!(node_port);
    }

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "type": "NodePort", "ports": [port] }
    })
    .to_string()
}

/// AWX resource; `successful` sets the condition the operator reports after a finished reconciliation
pub fn awx_json(name: &str, namespace: &str, admin_secret: Option<&str>, successful: bool) -> String {
    let mut status = serde_json::json!({
        "conditions": [
            { "type": "Running", "status": "True" },
            { "type": "Successful", "status": if successful { "True" } else { "False" } }
        ]
    });
    if let Some(secret) = admin_secret {
        status["adminPasswordSecret"] = serde_json::json!(secret);
    }

    serde_json::json!({
        "apiVersion": "awx.ansible.com/v1beta1",
        "kind": "AWX",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "service_type": "nodeport" },
        "status": status
    })
    .to_string()
}

/// Serve a single canned HTTP response on a local port
pub async fn serve_http_once(status_line: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await.unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
    });

    addr
}

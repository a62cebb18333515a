// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTP health check of the AWX API

use crate::error::{InstallerError, Result};
use bytes::Bytes;
use http::{header, Method, Request, StatusCode};
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Subset of the `/api/v2/ping/` payload
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PingStatus {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub active_node: Option<String>,
}

/// GET `url` once.
///
/// A 200 answer is ready, any other status is not ready yet, and a connection
/// failure is an error. Only plain HTTP is supported: the endpoint is always
/// local to the host.
#[instrument]
pub async fn ping(url: &str) -> Result<Option<PingStatus>> {
    let url = Url::parse(url).map_err(|e| InstallerError::InvalidInput(format!("invalid URL {}: {}", url, e)))?;
    if url.scheme() != "http" {
        return Err(InstallerError::InvalidInput(format!(
            "unsupported scheme '{}' for health check",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| InstallerError::InvalidInput(format!("URL {} has no host", url)))?
        .to_string();
    let port = url.port_or_known_default().unwrap_or(80);

    timeout(REQUEST_TIMEOUT, get(&url, &host, port))
        .await
        .map_err(|_| InstallerError::HttpError(format!("no response from {} within {:?}", url, REQUEST_TIMEOUT)))?
}

async fn get(url: &Url, host: &str, port: u16) -> Result<Option<PingStatus>> {
    let stream = TcpStream::connect((host, port)).await?;
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| InstallerError::HttpError(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!("Health check connection closed: {}", e);
        }
    });

    let path = match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    };
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(header::HOST, format!("{}:{}", host, port))
        .header(header::ACCEPT, "application/json")
        .body(Empty::<Bytes>::new())
        .map_err(|e| InstallerError::HttpError(e.to_string()))?;

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| InstallerError::HttpError(e.to_string()))?;

    let status = response.status();
    if status != StatusCode::OK {
        debug!("Health check answered {}", status);
        return Ok(None);
    }

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| InstallerError::HttpError(e.to_string()))?
        .to_bytes();

    // A 200 with an unexpected payload still means the API is serving
    Ok(Some(serde_json::from_slice(&body).unwrap_or_default()))
}

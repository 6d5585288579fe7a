//! Job backend repository
//!
//! The HTTP seam for invoking one work unit against a job's backend. The
//! invoker builds a [`BackendRequest`] with the job-specific protocol
//! shape; this layer only performs the call and reports what happened at
//! the transport level. Timeouts and connection failures are distinguished
//! because the classification policy treats them differently.

use async_trait::async_trait;
use junkai_core::domain::job::HttpMethod;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure of a backend call
#[derive(Debug, Error)]
pub enum BackendError {
    /// The client-side timeout elapsed; the backend may still be working.
    #[error("backend call timed out")]
    Timeout,

    /// The backend was unreachable or its name did not resolve.
    #[error("failed to reach backend: {0}")]
    Connect(String),

    /// Any other transport failure.
    #[error("backend request failed: {0}")]
    Other(String),
}

/// One fully-shaped backend call
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub method: HttpMethod,
    pub url: String,
    pub timeout: Duration,
    /// Query parameters (GET-shaped protocols).
    pub query: Vec<(String, String)>,
    /// JSON body (POST-shaped protocols).
    pub body: Option<serde_json::Value>,
}

/// Raw backend answer; classification happens in the invoker.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

/// Repository trait for backend calls
#[async_trait]
pub trait JobBackend: Send + Sync {
    async fn call(&self, request: BackendRequest) -> Result<BackendResponse, BackendError>;
}

/// reqwest implementation of [`JobBackend`]
pub struct HttpJobBackend {
    client: reqwest::Client,
}

impl HttpJobBackend {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpJobBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobBackend for HttpJobBackend {
    async fn call(&self, request: BackendRequest) -> Result<BackendResponse, BackendError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        builder = builder.timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Other(format!("failed to read response body: {}", e)))?;

        Ok(BackendResponse { status, body })
    }
}

fn classify_transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::Connect(e.to_string())
    } else {
        BackendError::Other(e.to_string())
    }
}

//! Junkai Store Client
//!
//! A small, typed HTTP client for the pending-work record store. The store
//! exposes a PostgREST-style REST interface: equality/range/order/limit
//! filters over named tables, and equality-keyed PATCH updates for status
//! transitions.
//!
//! # Example
//!
//! ```no_run
//! use junkai_client::StoreClient;
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), junkai_client::ClientError> {
//!     let store = StoreClient::new("https://store.example.com", "api-key");
//!
//!     let rows: Vec<Value> = store
//!         .select("audio_files")
//!         .columns("file_path,created_at,device_id")
//!         .eq("transcriptions_status", "pending")
//!         .order_asc("created_at")
//!         .limit(100)
//!         .fetch()
//!         .await?;
//!
//!     println!("{} pending rows", rows.len());
//!     Ok(())
//! }
//! ```

pub mod error;

pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client for the record store
#[derive(Debug, Clone)]
pub struct StoreClient {
    /// Base URL of the store (e.g., "https://store.example.com")
    base_url: String,
    /// API key sent on every request
    api_key: String,
    /// HTTP client instance
    client: Client,
}

impl StoreClient {
    /// Create a new store client
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    /// Create a store client with a custom HTTP client
    ///
    /// Allows configuring timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Get the base URL of the store
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a row query against `table`
    pub fn select(&self, table: &str) -> SelectBuilder<'_> {
        SelectBuilder {
            client: self,
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Start an equality-keyed field update against `table`
    pub fn update(&self, table: &str) -> UpdateBuilder<'_> {
        UpdateBuilder {
            client: self,
            table: table.to_string(),
            filters: Vec::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), body));
        }
        Ok(response)
    }
}

/// Builder for a filtered row query
pub struct SelectBuilder<'a> {
    client: &'a StoreClient,
    table: String,
    columns: String,
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<usize>,
}

impl<'a> SelectBuilder<'a> {
    /// Restrict the returned columns (comma-separated list)
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    /// Keep rows where `column` equals `value`
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// Keep rows where `column` is greater than or equal to `value`
    pub fn gte(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("gte.{}", value)));
        self
    }

    /// Keep rows where `column` is less than or equal to `value`
    pub fn lte(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("lte.{}", value)));
        self
    }

    /// Keep rows where `column` is not null
    pub fn not_null(mut self, column: &str) -> Self {
        self.filters
            .push((column.to_string(), "not.is.null".to_string()));
        self
    }

    /// Order rows by `column` ascending
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(format!("{}.asc", column));
        self
    }

    /// Cap the number of returned rows
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query parameters this builder will send, in order
    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        params.extend(self.filters.iter().cloned());
        if let Some(order) = &self.order {
            params.push(("order".to_string(), order.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Execute the query and decode the rows
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let url = self.client.table_url(&self.table);
        let params = self.query_params();

        debug!(table = %self.table, ?params, "store select");

        let response = self
            .client
            .client
            .get(&url)
            .header("apikey", &self.client.api_key)
            .bearer_auth(&self.client.api_key)
            .query(&params)
            .send()
            .await?;

        let response = self.client.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("failed to decode rows: {}", e)))
    }
}

/// Builder for an equality-keyed field update
pub struct UpdateBuilder<'a> {
    client: &'a StoreClient,
    table: String,
    filters: Vec<(String, String)>,
}

impl<'a> UpdateBuilder<'a> {
    /// Key the update on rows where `column` equals `value`
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// Apply the patch to every matched row
    pub async fn apply(self, patch: &serde_json::Value) -> Result<()> {
        let url = self.client.table_url(&self.table);

        debug!(table = %self.table, filters = ?self.filters, "store update");

        let response = self
            .client
            .client
            .patch(&url)
            .header("apikey", &self.client.api_key)
            .bearer_auth(&self.client.api_key)
            .query(&self.filters)
            .json(patch)
            .send()
            .await?;

        self.client.check_status(response).await?;
        Ok(())
    }
}

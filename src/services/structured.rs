use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::error::ServiceError;
use super::types::{StructuredRows, StructuredSchema};

const SERVICE: &str = "structured executor";

/// Turns a natural-language question into rows (text-to-SQL or similar).
#[async_trait]
pub trait StructuredExecutor: Send + Sync {
    async fn execute(
        &self,
        question: &str,
        schema: &StructuredSchema,
    ) -> Result<StructuredRows, ServiceError>;
}

/// POSTs `{question, schema}` and expects `{sql, columns, rows}` back.
#[derive(Debug, Clone)]
pub struct HttpStructuredExecutor {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    question: &'a str,
    schema: &'a str,
}

impl HttpStructuredExecutor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ServiceError::NotConfigured { service: SERVICE });
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Unavailable {
                service: SERVICE,
                reason: format!("failed to build http client: {e}"),
            })?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl StructuredExecutor for HttpStructuredExecutor {
    async fn execute(
        &self,
        question: &str,
        schema: &StructuredSchema,
    ) -> Result<StructuredRows, ServiceError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ExecuteRequest {
                question,
                schema: &schema.description,
            })
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(SERVICE, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::RateLimited { service: SERVICE });
        }
        if status.is_server_error() {
            return Err(ServiceError::Unavailable {
                service: SERVICE,
                reason: format!("status {status}"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Rejected {
                service: SERVICE,
                reason: format!("status {status}: {body}"),
            });
        }

        let rows: StructuredRows = response
            .json()
            .await
            .map_err(|e| ServiceError::from_reqwest(SERVICE, e))?;

        debug!(rows = rows.len(), columns = rows.columns.len(), "Structured query executed");
        Ok(rows)
    }
}

/// Placeholder when no structured backend is configured. Always fails permanently,
/// so statistical routes fall back to retrieval.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredExecutor;

#[async_trait]
impl StructuredExecutor for UnconfiguredExecutor {
    async fn execute(
        &self,
        _question: &str,
        _schema: &StructuredSchema,
    ) -> Result<StructuredRows, ServiceError> {
        Err(ServiceError::NotConfigured { service: SERVICE })
    }
}

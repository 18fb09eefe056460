//! Capture API client and downstream delivery
//!
//! One-shot request/response calls only: login, export fetch, schema fetch,
//! and delivery. There is no retry or backoff here; the single token-refresh
//! retry lives in the pipeline. The [`Upstream`] trait is the seam tests use
//! to substitute an in-memory fake for the network.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client as ReqwestClient;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Error, Result};

/// Connection settings for the capture API and the delivery receiver.
///
/// Built explicitly by the caller; the client reads nothing from the
/// environment.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Capture API base, e.g. `https://acme.example/api/v1`
    pub base_url: Url,
    /// Receiver accepting converted documents
    pub delivery_url: Url,
    /// Login username, required when no preset token is usable
    pub username: Option<String>,
    /// Login password
    pub password: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Seam over the capture API and the delivery receiver.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Obtain a fresh bearer token from the login endpoint.
    async fn login(&self) -> Result<String>;

    /// Fetch the XML export of one annotated document.
    ///
    /// Returns the response status and body; judging the status is the
    /// caller's job.
    async fn fetch_export(
        &self,
        queue_id: &str,
        annotation_id: &str,
        token: &str,
    ) -> Result<(u16, String)>;

    /// Fetch schema JSON from the URL embedded in the export document.
    async fn fetch_schema(&self, url: &str, token: &str) -> Result<Value>;

    /// Deliver the converted document, keyed by its annotation id.
    async fn deliver(&self, xml: &str, annotation_id: &str) -> Result<()>;
}

/// Production [`Upstream`] implementation backed by reqwest.
pub struct CaptureClient {
    client: ReqwestClient,
    config: CaptureConfig,
}

impl CaptureClient {
    /// Create a client with the given connection settings.
    pub fn new(config: CaptureConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            path
        )
    }
}

#[async_trait]
impl Upstream for CaptureClient {
    #[instrument(skip(self))]
    async fn login(&self) -> Result<String> {
        let (username, password) = match (&self.config.username, &self.config.password) {
            (Some(u), Some(p)) => (u, p),
            _ => {
                return Err(Error::Auth {
                    message: "no login credentials configured".to_string(),
                    source: None,
                })
            }
        };

        let response = self
            .client
            .post(self.endpoint("auth/login"))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await
            .map_err(|e| Error::Auth {
                message: e.to_string(),
                source: Some(anyhow::Error::new(e)),
            })?;

        if response.status().as_u16() != 200 {
            return Err(Error::Auth {
                message: format!("login rejected with status {}", response.status().as_u16()),
                source: None,
            });
        }

        let body: Value = response.json().await.map_err(|e| Error::Auth {
            message: format!("login response was not JSON: {}", e),
            source: Some(anyhow::Error::new(e)),
        })?;

        body.get("key")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Auth {
                message: "login response carried no token key".to_string(),
                source: None,
            })
    }

    #[instrument(skip(self, token))]
    async fn fetch_export(
        &self,
        queue_id: &str,
        annotation_id: &str,
        token: &str,
    ) -> Result<(u16, String)> {
        let response = self
            .client
            .get(self.endpoint(&format!("queues/{}/export", queue_id)))
            .query(&[("format", "xml"), ("id", annotation_id)])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "export fetched");
        Ok((status, body))
    }

    #[instrument(skip(self, token))]
    async fn fetch_schema(&self, url: &str, token: &str) -> Result<Value> {
        let response = self.client.get(url).bearer_auth(token).send().await?;

        let status = response.status().as_u16();
        if status != 200 {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                message: format!("failed to download schema: {}", detail),
                status: Some(status),
                source: None,
            });
        }

        response.json::<Value>().await.map_err(|e| Error::Upstream {
            message: format!("schema response was not JSON: {}", e),
            status: None,
            source: Some(anyhow::Error::new(e)),
        })
    }

    #[instrument(skip(self, xml))]
    async fn deliver(&self, xml: &str, annotation_id: &str) -> Result<()> {
        let payload = delivery_payload(xml, annotation_id);

        let response = self
            .client
            .post(self.config.delivery_url.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Delivery {
                message: e.to_string(),
                status: None,
                source: Some(anyhow::Error::new(e)),
            })?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(Error::Delivery {
                message: format!(
                    "receiver answered {}",
                    status
                        .canonical_reason()
                        .unwrap_or_else(|| status.as_str())
                ),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        debug!(annotation_id, "converted document delivered");
        Ok(())
    }
}

/// Wire payload for the delivery receiver: the annotation id plus the
/// converted XML, base64-encoded.
fn delivery_payload(xml: &str, annotation_id: &str) -> Value {
    json!({
        "annotationId": annotation_id,
        "content": STANDARD.encode(xml),
    })
}

use super::{CollectorClient, EndSessionRequest, StartSessionRequest};
use crate::config::CollectorConfig;
use crate::error::{SimError, Result};
use crate::logging::get_logger;
use crate::telemetry::{TelemetryRecord, round2};
use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;

/// Longest response body quoted back in an error message
const MAX_ERROR_BODY_CHARS: usize = 200;

/// JSON-over-HTTP collector client
pub struct HttpCollector {
    base_url: Url,
    client: reqwest::Client,
    logger: crate::logging::StructuredLogger,
}

impl HttpCollector {
    /// Create a client for `config.base_url`
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            SimError::validation(
                "collector.base_url".to_string(),
                format!("Invalid URL {}: {}", config.base_url, e),
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SimError::validation(
                "collector.base_url",
                "URL cannot be used as a base",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("chargesim/", env!("APP_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            client,
            logger: get_logger("collector"),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SimError::config("collector base URL cannot take path segments"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<reqwest::Response> {
        self.logger.trace(&format!("POST {}", url));
        let resp = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let snippet: String = text.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(SimError::collector(if snippet.is_empty() {
                format!("POST {} returned {}", url.path(), status)
            } else {
                format!("POST {} returned {}: {}", url.path(), status, snippet)
            }));
        }
        Ok(resp)
    }
}

/// Pull the transaction id out of a start-session response.
///
/// Accepts both string and numeric ids.
pub fn parse_transaction_id(body: &serde_json::Value) -> Result<String> {
    match body.get("transactionId") {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(SimError::collector(
            "start session response has no transactionId",
        )),
    }
}

#[async_trait::async_trait]
impl CollectorClient for HttpCollector {
    async fn start_session(&self, started_at: DateTime<Utc>, soc_start: f64) -> Result<String> {
        let body = StartSessionRequest {
            started_at,
            soc_start: round2(soc_start),
        };
        let resp = self.post_json(self.endpoint(&["sessions"])?, &body).await?;
        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SimError::collector(format!("invalid start session response: {}", e)))?;
        let transaction_id = parse_transaction_id(&json)?;
        self.logger
            .debug(&format!("Collector opened transaction {}", transaction_id));
        Ok(transaction_id)
    }

    async fn send_update(&self, transaction_id: &str, record: &TelemetryRecord) -> Result<()> {
        let url = self.endpoint(&["sessions", transaction_id, "updates"])?;
        self.post_json(url, record).await?;
        Ok(())
    }

    async fn end_session(
        &self,
        transaction_id: &str,
        final_record: Option<&TelemetryRecord>,
    ) -> Result<()> {
        let body = EndSessionRequest {
            final_record: final_record.copied(),
        };
        let url = self.endpoint(&["sessions", transaction_id, "end"])?;
        self.post_json(url, &body).await?;
        Ok(())
    }
}

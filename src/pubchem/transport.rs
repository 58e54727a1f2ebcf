//! HTTP transport to the PubChem REST service

use crate::config::ClientSettings;
use crate::pubchem::request::{HttpMethod, PubChemRequest};
use crate::types::PubChemError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Body returned by PubChem
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// Non-JSON output formats (SDF, XML, ASNT)
    Text(String),
}

impl Payload {
    /// Pretty-printed JSON, or the raw text as received
    pub fn to_text(&self) -> String {
        match self {
            Payload::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Payload::Text(text) => text.clone(),
        }
    }

    pub fn into_json(self) -> Result<Value, PubChemError> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Text(text) => Err(PubChemError::UnexpectedResponse(format!(
                "expected JSON, got {} bytes of text",
                text.len()
            ))),
        }
    }
}

/// One round trip to the upstream service
#[async_trait]
pub trait PubChemTransport: Send + Sync {
    async fn send(&self, request: &PubChemRequest) -> Result<Payload, PubChemError>;
}

/// reqwest-backed transport. Configuration is fixed at construction.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self, PubChemError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| PubChemError::ConfigError(format!("Invalid base_url: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent).map_err(|e| {
                PubChemError::ConfigError(format!("Invalid user_agent: {}", e))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout_secs: settings.timeout_secs,
        })
    }

    fn classify(&self, error: reqwest::Error) -> PubChemError {
        if error.is_timeout() {
            PubChemError::Timeout(self.timeout_secs)
        } else {
            PubChemError::Http(error)
        }
    }
}

#[async_trait]
impl PubChemTransport for HttpTransport {
    async fn send(&self, request: &PubChemRequest) -> Result<Payload, PubChemError> {
        let url = request.url(&self.base_url)?;
        debug!("{:?} {}", request.method, url);

        let builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url).form(&request.form),
        };

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            warn!("PubChem returned {} for {}", status, request.path());
            return Err(PubChemError::Upstream {
                status: status.as_u16(),
                message: fault_message(&body).unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                }),
            });
        }

        Ok(parse_body(body))
    }
}

fn parse_body(body: String) -> Payload {
    match serde_json::from_str(&body) {
        Ok(value) => Payload::Json(value),
        Err(_) => Payload::Text(body),
    }
}

/// Extracts `Fault.Message` (plus details) from a PubChem error body
fn fault_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let fault = value.get("Fault")?;
    let message = fault.get("Message")?.as_str()?;

    let details = fault
        .get("Details")
        .and_then(Value::as_array)
        .map(|details| {
            details
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ")
        })
        .filter(|d| !d.is_empty());

    Some(match details {
        Some(details) => format!("{} ({})", message, details),
        None => message.to_string(),
    })
}

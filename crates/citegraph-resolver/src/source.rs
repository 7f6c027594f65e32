use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unusable base url: {0}")]
    InvalidBase(String),
    #[error("request failed: {0}")]
    Network(String),
    #[error("service answered HTTP {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("no query forms configured")]
    NoQueryForms,
}

/// Something that can fetch a work record as JSON.
#[async_trait]
pub trait WorkSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Value, FetchError>;
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct HttpWorkSource {
    client: reqwest::Client,
}

impl HttpWorkSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("citegraph/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WorkSource for HttpWorkSource {
    async fn fetch(&self, url: &Url) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

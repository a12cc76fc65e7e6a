// Network seam between the booking client and the remote service
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{BookingError, BookingResult, ClientError};
use crate::request::{BookingOperation, QueryParams};

/// Sends one operation to the booking service and returns the raw reply body.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, operation: BookingOperation, params: &QueryParams)
        -> BookingResult<String>;
}

/// HTTPS transport authenticating every request with HTTP Basic credentials.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::ConfigError(format!("invalid base url: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// `{base_url}/{Operation}?{query}`
    pub fn request_url(&self, operation: BookingOperation, params: &QueryParams) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), operation.as_str());
        url.set_path(&path);

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&params.to_query_string()));
        }
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        operation: BookingOperation,
        params: &QueryParams,
    ) -> BookingResult<String> {
        let url = self.request_url(operation, params);
        debug!(%operation, query = %params.to_query_string(), "sending booking request");

        let response = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BookingError::HttpStatus {
                status_code: status.as_u16(),
                message: body,
            });
        }

        debug!(%operation, bytes = body.len(), "received booking reply");
        Ok(body)
    }
}

//! Request/response boundary to the remote optimizer, assistant and report services.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use shared::{
    domain::{ChatMessage, OptimizationResult, ProcessParameters},
    error::ApiError,
    protocol::{ChatRequest, ChatResponse, ReportRequest, CHAT_PATH, PREDICT_PATH, REPORT_PATH},
};
use tracing::debug;
use url::Url;

use crate::error::ServiceError;

#[async_trait]
pub trait PrecastService: Send + Sync {
    async fn optimize(
        &self,
        parameters: &ProcessParameters,
    ) -> Result<OptimizationResult, ServiceError>;
    /// The service keeps no history; `transcript` is the whole conversation so far.
    async fn chat(&self, transcript: &[ChatMessage]) -> Result<String, ServiceError>;
    async fn report(&self, request: &ReportRequest) -> Result<Vec<u8>, ServiceError>;
}

pub struct HttpPrecastService {
    http: Client,
    base_url: Url,
}

impl HttpPrecastService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ServiceError> {
        let mut parsed = Url::parse(base_url.trim()).map_err(|err| ServiceError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ServiceError::InvalidUrl {
                url: base_url.to_string(),
                reason: "url cannot be used as a base".into(),
            });
        }
        // Url::join replaces the last path segment unless the base ends with '/'.
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &'static str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|err| ServiceError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                reason: err.to_string(),
            })
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &'static str,
        body: &B,
    ) -> Result<Response, ServiceError> {
        let url = self.endpoint(path)?;
        debug!(endpoint = path, %url, "posting service request");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| ServiceError::Transport {
                endpoint: path,
                reason: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ApiError>()
                .await
                .ok()
                .map(|body| body.detail);
            return Err(ServiceError::Status {
                endpoint: path,
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl PrecastService for HttpPrecastService {
    async fn optimize(
        &self,
        parameters: &ProcessParameters,
    ) -> Result<OptimizationResult, ServiceError> {
        let result: OptimizationResult = self
            .post_json(PREDICT_PATH, parameters)
            .await?
            .json()
            .await
            .map_err(|err| ServiceError::MalformedResponse {
                endpoint: PREDICT_PATH,
                reason: err.to_string(),
            })?;
        result
            .validate()
            .map_err(|err| ServiceError::MalformedResponse {
                endpoint: PREDICT_PATH,
                reason: err.to_string(),
            })?;
        Ok(result)
    }

    async fn chat(&self, transcript: &[ChatMessage]) -> Result<String, ServiceError> {
        let request = ChatRequest {
            messages: transcript.to_vec(),
        };
        let body: ChatResponse = self
            .post_json(CHAT_PATH, &request)
            .await?
            .json()
            .await
            .map_err(|err| ServiceError::MalformedResponse {
                endpoint: CHAT_PATH,
                reason: err.to_string(),
            })?;
        Ok(body.response)
    }

    async fn report(&self, request: &ReportRequest) -> Result<Vec<u8>, ServiceError> {
        let document = self
            .post_json(REPORT_PATH, request)
            .await?
            .bytes()
            .await
            .map_err(|err| ServiceError::Transport {
                endpoint: REPORT_PATH,
                reason: err.to_string(),
            })?;
        Ok(document.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;

//! Sending prepared requests over HTTP.

use std::fmt;
use std::time::Duration;

use apistate_core::{PreparedRequest, RecordedResponse};
use async_trait::async_trait;
use reqwest::Method;
use tracing::info;

use crate::error::{StepError, StepResult};

/// Transport used by a scenario state to send requests
#[async_trait]
pub trait HttpContext: Send + Sync + fmt::Debug {
    async fn send(&self, request: &PreparedRequest) -> StepResult<RecordedResponse>;
}

/// `reqwest` backed transport
#[derive(Debug, Clone)]
pub struct ReqwestContext {
    client: reqwest::Client,
}

impl ReqwestContext {
    pub fn new(timeout: Duration) -> StepResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpContext for ReqwestContext {
    async fn send(&self, request: &PreparedRequest) -> StepResult<RecordedResponse> {
        let method = Method::from_bytes(request.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| {
                StepError::InvalidArgument(format!("'{}' is not a valid HTTP method", request.method))
            })?;

        let mut builder = self.client.request(method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        info!(%method, url = %request.url, status, "HTTP request completed");
        Ok(RecordedResponse::new(status, headers, body))
    }
}

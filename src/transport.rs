use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::errors::Error;
use crate::request::PreparedRequest;

/// Raw result of one network exchange, before classification.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Performs a single network exchange for a fully-formed request.
///
/// Implementations must report failures through the `Result`; nothing may
/// panic past this boundary, otherwise the coordinator cannot classify it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, Error>;
}

/// Default transport backed by a shared `reqwest` client.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, Error> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header("User-Agent", concat!("tokengate/", env!("CARGO_PKG_VERSION")));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Ok(RawResponse { status, body })
    }
}

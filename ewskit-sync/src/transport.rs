//! Transport abstraction.
//!
//! The engine hands a [`Request`] to a [`Transport`] and gets the parsed
//! response document back. [`HttpTransport`] posts SOAP envelopes over
//! HTTP; tests and offline tools plug in their own implementations.

use crate::config::ClientConfig;
use crate::error::{EwsError, EwsResult};
use crate::request::Request;
use async_trait::async_trait;
use ewskit_model::Document;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Sends one request and returns the response document.
///
/// Implementations report transport failures only. Server status codes
/// inside the document are classified by the client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> EwsResult<Document>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &Request) -> EwsResult<Document> {
        (**self).send(request).await
    }
}

/// Renders a request as a wire envelope.
pub trait EnvelopeBuilder: Send + Sync {
    fn build(&self, request: &Request) -> EwsResult<String>;
}

/// HTTP transport posting envelopes to a single endpoint.
pub struct HttpTransport<B> {
    client: reqwest::Client,
    endpoint: String,
    builder: B,
}

impl<B: EnvelopeBuilder> HttpTransport<B> {
    pub fn new(config: &ClientConfig, builder: B) -> EwsResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EwsError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            builder,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl<B: EnvelopeBuilder> Transport for HttpTransport<B> {
    async fn send(&self, request: &Request) -> EwsResult<Document> {
        let envelope = self.builder.build(request)?;
        debug!("POST {} ({})", self.endpoint, request.operation());

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(envelope)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        // SOAP faults arrive with a 500 status and a parseable body, which
        // the client classifies like any other response.
        match Document::parse(&body) {
            Ok(document) => Ok(document),
            Err(_) if !status.is_success() => Err(EwsError::Network(format!("HTTP {status}"))),
            Err(e) => Err(e.into()),
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> EwsError {
    if e.is_timeout() {
        EwsError::Timeout
    } else {
        EwsError::Network(e.to_string())
    }
}

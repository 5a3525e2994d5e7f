//! Outbound call execution toward the partner bank.

use async_trait::async_trait;
use common_utils::{
    errors::CustomResult,
    ext_traits::BytesExt,
    request::{Method, Request},
};
use error_stack::{IntoReport, ResultExt};
use router_env::{instrument, logger, tracing};
use serde::de::DeserializeOwned;

use crate::core::errors::ConnectorError;

/// Response the core hands back to the handler layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationResponse<T> {
    /// JSON body
    Json(T),
    /// Empty success
    StatusOk,
}

/// Raw response off the wire.
#[derive(Clone, Debug)]
pub struct Response {
    /// Body bytes
    pub response: bytes::Bytes,
    /// HTTP status
    pub status_code: u16,
}

/// The partner bank's HTTP endpoint, as the core sees it. Implementations
/// own encoding details and certificates; the core only builds requests and
/// parses response bytes.
#[async_trait]
pub trait BankTransport: Send + Sync {
    /// Execute one request, returning body bytes and status.
    async fn send(&self, request: Request) -> CustomResult<Response, ConnectorError>;
}

/// `reqwest`-backed transport.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the given per-request timeout.
    pub fn new(timeout: std::time::Duration) -> CustomResult<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .into_report()
            .change_context(ConnectorError::TransportFailure)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BankTransport for ReqwestTransport {
    async fn send(&self, request: Request) -> CustomResult<Response, ConnectorError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value.clone().into_inner());
        }
        if let Some(body) = &request.body {
            builder = builder.header(reqwest::header::CONTENT_TYPE, body.content_type());
            builder = builder.body(
                body.to_bytes()
                    .change_context(ConnectorError::RequestEncodingFailed)?,
            );
        }

        let response = builder
            .send()
            .await
            .into_report()
            .change_context(ConnectorError::TransportFailure)?;

        let status_code = response.status().as_u16();
        let response = response
            .bytes()
            .await
            .into_report()
            .change_context(ConnectorError::TransportFailure)?;

        Ok(Response {
            response,
            status_code,
        })
    }
}

/// Send a request and parse the JSON body into `Res`.
///
/// Non-2xx statuses are transport-level failures here; the partner delivers
/// business errors inside 200 envelopes with a non-zero response code.
#[instrument(skip_all, fields(url = %request.url))]
pub async fn execute_bank_request<Res: DeserializeOwned>(
    transport: &dyn BankTransport,
    request: Request,
    type_name: &'static str,
) -> CustomResult<Res, ConnectorError> {
    logger::info!(tag = ?router_env::Tag::InitiatedToBank, "calling bank endpoint");

    let response = transport.send(request).await?;

    if !(200..300).contains(&response.status_code) {
        return Err(ConnectorError::UnexpectedResponseStatus {
            status_code: response.status_code,
        })
        .into_report();
    }

    response
        .response
        .parse_struct(type_name)
        .change_context(ConnectorError::ResponseDeserializationFailed)
}

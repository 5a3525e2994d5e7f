//! Outbound request types, transport-agnostic.

use error_stack::{IntoReport, ResultExt};
use masking::Maskable;
use serde::{Deserialize, Serialize};

use crate::errors::{CustomResult, ParsingError};

/// Outbound request headers, with per-header masking information
pub type Headers = std::collections::HashSet<(String, Maskable<String>)>;

#[allow(missing_docs)]
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// Body of an outbound request.
///
/// The partner speaks JSON on every endpoint used here; form encoding exists
/// for the IFSC dataset mirror.
pub enum RequestContent {
    /// `application/json`
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded`
    FormUrlEncoded(Vec<(String, String)>),
}

impl std::fmt::Debug for RequestContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Json(_) => "JsonRequestBody",
            Self::FormUrlEncoded(_) => "FormUrlEncodedRequestBody",
        })
    }
}

impl RequestContent {
    /// Serialize a value into a JSON request body
    pub fn json<T: Serialize>(body: &T) -> CustomResult<Self, ParsingError> {
        serde_json::to_value(body)
            .into_report()
            .change_context(ParsingError::EncodeError("json"))
            .map(Self::Json)
    }

    /// Render the body as bytes for the wire
    pub fn to_bytes(&self) -> CustomResult<Vec<u8>, ParsingError> {
        match self {
            Self::Json(value) => serde_json::to_vec(value)
                .into_report()
                .change_context(ParsingError::EncodeError("json")),
            Self::FormUrlEncoded(fields) => serde_urlencoded::to_string(fields)
                .into_report()
                .change_context(ParsingError::EncodeError("urlencoded"))
                .map(String::into_bytes),
        }
    }

    /// Content type header value for this body
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json(_) => "application/json",
            Self::FormUrlEncoded(_) => "application/x-www-form-urlencoded",
        }
    }
}

/// An outbound request toward the partner bank
#[derive(Debug)]
pub struct Request {
    /// Full URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// HTTP method
    pub method: Method,
    /// Optional body
    pub body: Option<RequestContent>,
}

impl Request {
    /// Creates a new request with the specified HTTP method and URL.
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: String::from(url),
            headers: std::collections::HashSet::new(),
            body: None,
        }
    }

    /// Sets the body of the request.
    pub fn set_body(&mut self, body: RequestContent) {
        self.body.replace(body);
    }

    /// Adds a header to the request.
    pub fn add_header(&mut self, header: &str, value: Maskable<String>) {
        self.headers.insert((String::from(header), value));
    }
}

/// Builder for [`Request`]
#[derive(Debug)]
pub struct RequestBuilder {
    url: String,
    headers: Headers,
    method: Method,
    body: Option<RequestContent>,
}

impl RequestBuilder {
    /// Start a new builder with defaults (`GET` to an empty URL)
    pub fn new() -> Self {
        Self {
            method: Method::Get,
            url: String::with_capacity(1024),
            headers: std::collections::HashSet::new(),
            body: None,
        }
    }

    /// Set the target URL
    pub fn url(mut self, url: &str) -> Self {
        self.url = url.into();
        self
    }

    /// Set the HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Attach a header
    pub fn header(mut self, header: &str, value: Maskable<String>) -> Self {
        self.headers.insert((header.into(), value));
        self
    }

    /// Attach multiple headers
    pub fn headers(mut self, headers: Vec<(String, Maskable<String>)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Attach the body
    pub fn set_body(mut self, body: RequestContent) -> Self {
        self.body.replace(body);
        self
    }

    /// Finalize into a [`Request`]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

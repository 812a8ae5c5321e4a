//! Async HTTP client side: transport trait and a hyper based implementation.
//! Plain HTTP/1.1 only; TLS is left to custom transports.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{ClientError, IntoClientError};

pub use hyper::Method;

/// Outbound request: method, absolute URL, optional JSON body.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            url: url.into(),
            body: None,
        }
    }

    /// Request with a JSON encoded body (POST, PUT).
    pub fn json<T: Serialize>(
        method: Method,
        url: impl Into<String>,
        value: &T,
    ) -> Result<Self, ClientError> {
        let body = serde_json::to_vec(value).map_err(ClientError::Encode)?;
        Ok(Self {
            method,
            url: url.into(),
            body: Some(Bytes::from(body)),
        })
    }
}

/// Response status and fully collected body.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    /// `ClientError::Status` for anything outside 2xx.
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.status.is_success() {
            return Ok(self);
        }
        Err(ClientError::Status {
            code: self.status.as_u16(),
            body: String::from_utf8_lossy(&self.body).into_owned(),
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(ClientError::Decode)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one request and returns the response. No retries.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// Default transport: pooled hyper client over plain TCP.
#[derive(Clone, Debug)]
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        Self {
            client: Client::builder(TokioExecutor::new()).build(connector),
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_uri(url: &str) -> Result<Uri, ClientError> {
    let uri: Uri = url
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| ClientError::InvalidUrl(format!("{}: {}", url, e)))?;
    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(ClientError::InvalidUrl(format!(
            "{}: expected absolute url",
            url
        )));
    }
    Ok(uri)
}

#[async_trait]
impl HttpTransport for HyperTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let uri = parse_uri(&request.url)?;
        let mut builder = Request::builder()
            .method(request.method.clone())
            .uri(uri)
            .header(ACCEPT, "application/json");
        if request.body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(Full::new(request.body.unwrap_or_default()))
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let res = self
            .client
            .request(req)
            .await
            .map_err(IntoClientError::into_transport_error)?;
        let status = res.status();
        let body = res
            .into_body()
            .collect()
            .await
            .map_err(IntoClientError::into_transport_error)?
            .to_bytes();
        tracing::debug!(method = %request.method, url = %request.url, status = status.as_u16(), "response received");
        Ok(HttpResponse { status, body })
    }
}

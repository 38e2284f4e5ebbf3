//! Shared HTTP client for the manager API.
//!
//! The client owns a *derived* copy of the current credential: the default
//! `Authorization` header. The session manager is the only writer; every
//! request reads a snapshot at dispatch time.

use async_trait::async_trait;
use mockapi_core::credential::AccessToken;
use mockapi_core::{MockApiError, Result};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use std::time::Duration;

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// A request relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Form-encoded body; also sets the matching content type.
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self.header(CONTENT_TYPE, FORM_URLENCODED)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A fully resolved request handed to the transport.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl OutboundRequest {
    /// First header with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// The `detail` string of an error body, when the backend sent one.
    ///
    /// Validation errors carry a list under `detail`; those are not
    /// user-facing text and yield `None`.
    pub fn detail(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        value.get("detail")?.as_str().map(str::to_string)
    }
}

/// Sends one request. Only transport failures are errors here; any HTTP
/// status is a successful [`ApiResponse`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse>;
}

/// [`HttpTransport`] backed by `reqwest`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MockApiError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await.map_err(|e| {
            MockApiError::network(format!("{} {} failed: {}", request.method, request.url, e))
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| MockApiError::network(format!("Failed to read response body: {}", e)))?;

        Ok(ApiResponse { status, body })
    }
}

/// The single HTTP client of the process.
///
/// Does NOT:
/// - decide session state (callers react to [`MockApiError::Unauthorized`])
/// - retry or swallow failures
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    auth_header: RwLock<Option<String>>,
}

impl ApiClient {
    /// Creates a client backed by `reqwest`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self::with_transport(
            base_url,
            Arc::new(ReqwestTransport::new(timeout)?),
        ))
    }

    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            auth_header: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replaces the default `Authorization` header for every later request.
    pub fn set_auth_header(&self, token: Option<&AccessToken>) {
        let mut header = self
            .auth_header
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *header = token.map(AccessToken::bearer);
    }

    /// Current default `Authorization` header value.
    pub fn auth_header(&self) -> Option<String> {
        self.auth_header
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Performs a call.
    ///
    /// The credential header is captured before the first suspension point,
    /// so a request started after a login/logout completes always carries the
    /// credential that call left behind.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
        let outbound = self.prepare(request);
        tracing::debug!("[Api] {} {}", outbound.method, outbound.url);

        let response = self.transport.send(outbound).await?;
        if response.is_success() {
            return Ok(response);
        }

        let err = MockApiError::from_status(response.status, response.detail());
        tracing::debug!("[Api] request failed: {}", err);
        Err(err)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.request(ApiRequest::post(path).json(body)?).await?.json()
    }

    fn prepare(&self, request: ApiRequest) -> OutboundRequest {
        let mut headers = Vec::with_capacity(request.headers.len() + 1);
        let caller_sets_auth = request
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION));
        if !caller_sets_auth && let Some(value) = self.auth_header() {
            headers.push((AUTHORIZATION.to_string(), value));
        }
        headers.extend(request.headers);

        OutboundRequest {
            method: request.method,
            url: self.url(&request.path),
            headers,
            body: request.body,
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every request and answers with a fixed response.
    struct RecordingTransport {
        requests: Mutex<Vec<OutboundRequest>>,
        response: Result<ApiResponse>,
    }

    impl RecordingTransport {
        fn answering(response: Result<ApiResponse>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                response,
            })
        }

        fn last(&self) -> OutboundRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn send(&self, request: OutboundRequest) -> Result<ApiResponse> {
            self.requests.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn test_default_header_follows_set_auth_header() {
        let transport = RecordingTransport::answering(Ok(ApiResponse::new(200, "[]")));
        let client = ApiClient::with_transport("http://localhost:8000/", transport.clone());

        client.request(ApiRequest::get("/organizations")).await.unwrap();
        assert_eq!(transport.last().header(AUTHORIZATION), None);
        assert_eq!(transport.last().url, "http://localhost:8000/organizations");

        client.set_auth_header(Some(&AccessToken::new("abc123")));
        client.request(ApiRequest::get("users/me")).await.unwrap();
        assert_eq!(transport.last().header("authorization"), Some("Bearer abc123"));
        assert_eq!(transport.last().url, "http://localhost:8000/users/me");

        client.set_auth_header(None);
        client.request(ApiRequest::get("/organizations")).await.unwrap();
        assert_eq!(transport.last().header(AUTHORIZATION), None);
    }

    #[tokio::test]
    async fn test_status_failures_are_propagated() {
        let transport = RecordingTransport::answering(Ok(ApiResponse::new(
            401,
            r#"{"detail":"Could not validate credentials"}"#,
        )));
        let client = ApiClient::with_transport("http://localhost:8000", transport);

        let err = client.request(ApiRequest::get("/users/me")).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.detail(), Some("Could not validate credentials"));
    }

    #[tokio::test]
    async fn test_network_failures_are_propagated() {
        let transport = RecordingTransport::answering(Err(MockApiError::network("refused")));
        let client = ApiClient::with_transport("http://localhost:8000", transport);

        let err = client.request(ApiRequest::get("/organizations")).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_form_body_sets_content_type() {
        let transport = RecordingTransport::answering(Ok(ApiResponse::new(200, "{}")));
        let client = ApiClient::with_transport("http://localhost:8000", transport.clone());

        client
            .request(ApiRequest::post("/token").form([("username", "a@b.com"), ("password", "pw")]))
            .await
            .unwrap();

        let sent = transport.last();
        assert_eq!(sent.header(CONTENT_TYPE), Some(FORM_URLENCODED));
        assert_eq!(
            sent.body,
            RequestBody::Form(vec![
                ("username".to_string(), "a@b.com".to_string()),
                ("password".to_string(), "pw".to_string()),
            ])
        );
    }

    #[test]
    fn test_detail_extraction() {
        assert_eq!(
            ApiResponse::new(400, r#"{"detail":"Email already registered"}"#).detail(),
            Some("Email already registered".to_string())
        );
        assert_eq!(
            ApiResponse::new(422, r#"{"detail":[{"loc":["body"],"msg":"field required"}]}"#)
                .detail(),
            None
        );
        assert_eq!(ApiResponse::new(502, "<html>Bad gateway</html>").detail(), None);
    }
}

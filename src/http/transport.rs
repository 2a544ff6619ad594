//! Transport seam between the request controller and the network

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::RequestError;
use crate::http::options::Method;

/// A fully built request, ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl TransportRequest {
    /// Place `payload` in the query string or the body depending on `method`
    pub fn build(method: Method, path: &str, payload: Option<Value>) -> Result<Self, RequestError> {
        let (query, body) = match payload {
            Some(payload) if method.uses_query() => (query_pairs(&payload)?, None),
            Some(payload) => (Vec::new(), Some(payload)),
            None => (Vec::new(), None),
        };

        Ok(Self {
            method,
            path: path.to_string(),
            query,
            body,
        })
    }
}

/// Raw response: any status, body already parsed as JSON where possible
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request. Only failures with no response at all are errors here;
    /// non-2xx responses come back as a `TransportResponse`.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, RequestError>;
}

/// Flatten a JSON object into query pairs.
///
/// Null members are dropped, scalars are stringified and arrays repeat their key.
pub fn query_pairs(payload: &Value) -> Result<Vec<(String, String)>, RequestError> {
    let Value::Object(map) = payload else {
        return Err(RequestError::InvalidRequest(
            "query payload must be a JSON object".to_string(),
        ));
    };

    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(values) => {
                for item in values {
                    if let Some(item) = scalar_to_string(item) {
                        pairs.push((key.clone(), item));
                    }
                }
            }
            other => {
                let Some(text) = scalar_to_string(other) else {
                    return Err(RequestError::InvalidRequest(format!(
                        "query parameter '{}' must be a scalar or an array",
                        key
                    )));
                };
                pairs.push((key.clone(), text));
            }
        }
    }

    Ok(pairs)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// reqwest-backed transport rooted at a base URL
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> Result<Self, RequestError> {
        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, RequestError> {
        let url = self.url(&request.path);
        debug!("{} {}", request.method.as_str(), url);

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url).query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let response_text = response.text().await?;

        let body = if response_text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response_text).unwrap_or(Value::String(response_text))
        };

        Ok(TransportResponse { status, body })
    }
}

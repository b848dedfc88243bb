//! Accounting API client over HTTPS.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::{AccountingClient, ClientError, LedgerSettings};

/// Error body of the accounting API.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ErrorBody {
    #[serde(rename = "ErrorInformation")]
    information: Option<ErrorInformation>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ErrorInformation {
    #[serde(alias = "Message")]
    message: Option<String>,
    #[serde(alias = "Code")]
    code: Option<Value>,
}

/// [`AccountingClient`] speaking JSON to the accounting REST API.
///
/// Authenticates every request with the `Access-Token` and `Client-Secret`
/// headers. Null fields are stripped from request bodies so that an update
/// leaves unset fields untouched.
#[derive(Debug, Clone)]
pub struct LedgerHttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl LedgerHttpClient {
    pub fn new(settings: &LedgerSettings) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("access-token"),
            header_value(&settings.access_token)?,
        );
        headers.insert(
            HeaderName::from_static("client-secret"),
            header_value(&settings.client_secret)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<String, ClientError> {
        let mut request = self.http.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(ClientError::Remote(error_message(status, &text)));
        }
        Ok(text)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = match body {
            Some(body) => Some(without_nulls(
                serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?,
            )),
            None => None,
        };
        let text = self.send(method, path, body).await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(format!("{path}: {e}")))
    }
}

#[async_trait]
impl AccountingClient for LedgerHttpClient {
    async fn get<T>(&self, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.send_json::<Value, T>(Method::GET, path, None).await
    }

    async fn add<B, T>(&self, body: &B, path: &str) -> Result<T, ClientError>
    where
        B: Serialize + Send + Sync,
        T: DeserializeOwned + Send + 'static,
    {
        self.send_json(Method::POST, path, Some(body)).await
    }

    async fn update<B, T>(&self, body: &B, path: &str) -> Result<T, ClientError>
    where
        B: Serialize + Send + Sync,
        T: DeserializeOwned + Send + 'static,
    {
        self.send_json(Method::PUT, path, Some(body)).await
    }

    async fn action(&self, path: &str) -> Result<(), ClientError> {
        self.send(Method::PUT, path, None).await.map(drop)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value).map_err(|e| ClientError::Transport(format!("invalid credential: {e}")))
}

/// Message of an error response, from `ErrorInformation` when present.
fn error_message(status: StatusCode, body: &str) -> String {
    let information = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.information);
    match information {
        Some(ErrorInformation {
            message: Some(message),
            code,
        }) => match code {
            Some(code) => format!("HTTP {status}: {message} (code {code})"),
            None => format!("HTTP {status}: {message}"),
        },
        _ => format!("HTTP {status}: {body}"),
    }
}

/// Drop null members from every object, recursively.
fn without_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(without_nulls).collect()),
        other => other,
    }
}

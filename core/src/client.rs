//! Request orchestration: build, dispatch, classify.
//!
//! # Design
//! `ApiClient` owns the connection settings (base URL, default headers,
//! timeout, bearer token) and a [`Transport`]. Each verb call splits into the
//! same three steps the rest of the crate is organised around:
//!
//! 1. [`ApiClient::build_request`] resolves URL, headers and body into an
//!    `HttpRequest` without touching the network.
//! 2. The request is dispatched through the transport, raced against either
//!    the internal timeout or the caller's cancellation token.
//! 3. [`classify_response`] turns whatever came back into an `ApiResponse`.
//!
//! No call ever returns `Err` or panics on a network, HTTP or backend failure;
//! every outcome lands in an `ApiResponse`. The only per-call state lives on
//! the stack of the call itself, so any number of calls may be in flight on a
//! shared `&ApiClient`. Configuration setters take `&mut self` and therefore
//! only affect calls issued after them.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ApiClientConfig, RequestConfig};
use crate::envelope::ApiResponse;
use crate::error::ApiError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

const AUTHORIZATION: &str = "Authorization";
const TIMEOUT_MESSAGE: &str = "Request timeout";
const UNKNOWN_BACKEND_ERROR: &str = "Unknown error from backend";

/// Asynchronous REST client that normalizes every outcome into an
/// [`ApiResponse`].
#[derive(Debug)]
pub struct ApiClient<T> {
    transport: T,
    base_url: String,
    timeout: Duration,
    default_headers: Headers,
    auth_token: Option<String>,
}

/// How the race between the transport and the cancellation source ended.
enum Settled {
    Response(HttpResponse),
    Failed(TransportError),
    TimedOut,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, config: ApiClientConfig) -> Self {
        let timeout = config.effective_timeout();
        let mut default_headers = Headers::new();
        default_headers.set("Content-Type", "application/json");
        default_headers.set("Accept", "application/json");
        default_headers.merge(&config.default_headers);

        Self {
            transport,
            base_url: config.base_url.unwrap_or_default(),
            timeout,
            default_headers,
            auth_token: None,
        }
    }

    pub fn set_base_url(&mut self, url: impl Into<String>) {
        self.base_url = url.into();
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install a bearer token, or clear it with an empty string.
    ///
    /// The `Authorization` default header always mirrors the token: it is
    /// rewritten on every non-empty token and removed on an empty one.
    pub fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            self.auth_token = None;
            self.default_headers.remove(AUTHORIZATION);
        } else {
            self.default_headers
                .set(AUTHORIZATION, format!("Bearer {token}"));
            self.auth_token = Some(token);
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get<R>(&self, path: &str, config: &RequestConfig) -> ApiResponse<R>
    where
        R: DeserializeOwned,
    {
        self.request::<R, ()>(HttpMethod::Get, path, None, config)
            .await
    }

    pub async fn post<R, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: &RequestConfig,
    ) -> ApiResponse<R>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Post, path, body, config).await
    }

    pub async fn put<R, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: &RequestConfig,
    ) -> ApiResponse<R>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Put, path, body, config).await
    }

    pub async fn patch<R, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: &RequestConfig,
    ) -> ApiResponse<R>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Patch, path, body, config).await
    }

    pub async fn delete<R>(&self, path: &str, config: &RequestConfig) -> ApiResponse<R>
    where
        R: DeserializeOwned,
    {
        self.request::<R, ()>(HttpMethod::Delete, path, None, config)
            .await
    }

    /// Issue one request and classify its outcome. The verb methods are thin
    /// wrappers around this.
    pub async fn request<R, B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        config: &RequestConfig,
    ) -> ApiResponse<R>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = match self.build_request(method, path, body, config) {
            Ok(request) => request,
            Err(err) => {
                warn!(%method, path, error = %err, "failed to build request");
                return ApiResponse::error(err.to_string());
            }
        };

        let timeout = config
            .timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(self.timeout);
        let url = request.url.clone();
        debug!(%method, url = %url, ?timeout, "dispatching request");

        match self.dispatch(request, config.signal.is_none(), timeout).await {
            Settled::Response(response) => {
                debug!(%method, url = %url, status = response.status, "response received");
                classify_response(response)
            }
            Settled::TimedOut => {
                warn!(%method, url = %url, ?timeout, "request timed out");
                ApiResponse::error(TIMEOUT_MESSAGE)
            }
            Settled::Failed(err) => {
                warn!(%method, url = %url, error = %err, "transport failure");
                ApiResponse::error(err.to_string())
            }
        }
    }

    /// Resolve `path` against the effective base URL.
    ///
    /// Absolute URLs (anything starting with `scheme://`) pass through
    /// untouched. Otherwise base and path are joined with exactly one slash.
    /// An empty `base_override` falls back to the client's base URL.
    pub fn build_url(&self, path: &str, base_override: Option<&str>) -> String {
        if has_scheme(path) {
            return path.to_string();
        }
        let base = base_override
            .filter(|base| !base.is_empty())
            .unwrap_or(self.base_url.as_str())
            .trim_end_matches('/');
        format!("{base}/{}", path.trim_start_matches('/'))
    }

    /// Assemble the request descriptor for one call without sending it.
    ///
    /// Header precedence, lowest to highest: JSON defaults, configured
    /// defaults, per-call headers, bearer token.
    pub fn build_request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        config: &RequestConfig,
    ) -> Result<HttpRequest, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut headers = self.default_headers.clone();
        headers.merge(&config.headers);
        if let Some(token) = &self.auth_token {
            headers.set(AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = match body {
            Some(body) if method.allows_body() => Some(
                serde_json::to_string(body)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?,
            ),
            _ => None,
        };

        Ok(HttpRequest {
            method,
            url: self.build_url(path, config.base_url.as_deref()),
            headers,
            body,
            with_credentials: config.with_credentials,
            cancel: config.signal.clone().unwrap_or_default(),
        })
    }

    /// Race the transport against the cancellation source. The timer only
    /// exists inside this call, so it is dropped as soon as the race settles.
    async fn dispatch(
        &self,
        request: HttpRequest,
        internal_timer: bool,
        timeout: Duration,
    ) -> Settled {
        let cancel = request.cancel.clone();
        let send = self.transport.send(request);

        let result = if internal_timer {
            tokio::select! {
                biased;
                result = send => result,
                () = tokio::time::sleep(timeout) => {
                    cancel.cancel();
                    return Settled::TimedOut;
                }
            }
        } else {
            tokio::select! {
                biased;
                result = send => result,
                () = cancel.cancelled() => Err(TransportError::Aborted),
            }
        };

        match result {
            Ok(response) => Settled::Response(response),
            // Only the timer cancels a token this client created.
            Err(TransportError::Aborted) if internal_timer && cancel.is_cancelled() => {
                Settled::TimedOut
            }
            Err(err) => Settled::Failed(err),
        }
    }
}

/// Turn a transport response into an envelope.
///
/// - Non-2xx: error with the message resolved by [`http_failure`].
/// - 2xx JSON object with a `success` key: the backend's own envelope is
///   unwrapped. A falsy `success` yields an error; otherwise `data` becomes
///   the payload.
/// - 2xx JSON without a `success` key: the whole body is the payload.
/// - 2xx non-JSON: the body text is the payload.
///
/// The `success`-key heuristic misreads a genuine payload that happens to have
/// a top-level `success` field. It is kept because existing backends rely on
/// it.
pub fn classify_response<R: DeserializeOwned>(response: HttpResponse) -> ApiResponse<R> {
    if !response.is_ok() {
        let err = http_failure(&response);
        if let ApiError::Http { status, code, .. } = &err {
            warn!(status, code = %code, message = %err, "HTTP error response");
        }
        return ApiResponse::error(err.to_string());
    }

    if !response.is_json() {
        return decode(Value::String(response.body));
    }

    let body = match response.json() {
        Ok(body) => body,
        Err(e) => return ApiResponse::error(ApiError::Deserialization(e.to_string()).to_string()),
    };

    match body {
        Value::Object(mut fields) if fields.contains_key("success") => {
            let succeeded = fields.get("success").is_some_and(is_truthy);
            if !succeeded {
                let message = fields
                    .get("error")
                    .and_then(error_field_message)
                    .unwrap_or_else(|| UNKNOWN_BACKEND_ERROR.to_string());
                return ApiResponse::error(message);
            }
            decode(fields.remove("data").unwrap_or(Value::Null))
        }
        other => decode(other),
    }
}

/// Resolve the message for a non-2xx response: JSON `message`, then JSON
/// `error`, then the raw body text, then `HTTP <status>: <status text>`.
pub fn http_failure(response: &HttpResponse) -> ApiError {
    let status_line = format!("HTTP {}: {}", response.status, response.status_text);
    let mut code = response.status.to_string();

    let message = match response.json() {
        Ok(Value::Object(fields)) => {
            if let Some(c) = fields.get("code").filter(|c| is_truthy(c)) {
                code = display_value(c);
            }
            fields
                .get("message")
                .filter(|m| is_truthy(m))
                .map(display_value)
                .or_else(|| fields.get("error").and_then(error_field_message))
                .unwrap_or(status_line)
        }
        Ok(_) => status_line,
        Err(_) if !response.body.is_empty() => response.body.clone(),
        Err(_) => status_line,
    };

    ApiError::Http {
        status: response.status,
        code,
        message,
    }
}

fn decode<R: DeserializeOwned>(value: Value) -> ApiResponse<R> {
    match serde_json::from_value(value) {
        Ok(data) => ApiResponse::success(data),
        Err(e) => ApiResponse::error(ApiError::Deserialization(e.to_string()).to_string()),
    }
}

/// `error` may be a string or `{ message }`. An object without a usable
/// `message` is rendered as JSON.
fn error_field_message(error: &Value) -> Option<String> {
    if let Some(message) = error.get("message").filter(|m| is_truthy(m)) {
        return Some(display_value(message));
    }
    is_truthy(error).then(|| display_value(error))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JavaScript truthiness, which is what backends emitting this envelope use.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn has_scheme(path: &str) -> bool {
    let Some((scheme, _)) = path.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

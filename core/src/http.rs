//! HTTP transport types and the transport seam.
//!
//! # Design
//! Requests and responses are plain data. `ApiClient` builds an `HttpRequest`,
//! hands it to a [`Transport`] supplied by the host, and classifies the
//! `HttpResponse` (or `TransportError`) it gets back. The client never opens a
//! socket itself, which keeps classification deterministic and lets tests
//! drive it with canned responses.
//!
//! All fields use owned types so descriptors can move into spawned tasks.

use std::fmt;
use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether the client attaches a serialized body for this verb. GET
    /// never carries one.
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header list with case-insensitive names.
///
/// Setting a name that already exists replaces its value in place, so the
/// first spelling of a name wins and there is never more than one entry per
/// name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.0[index].1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.0[index].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|index| self.0.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy every entry of `other` over `self`, `other` winning on collision.
    pub fn merge<'a, I>(&mut self, other: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (name, value) in other {
            self.set(name.as_str(), value.as_str());
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}

/// A fully resolved request, ready for the transport.
///
/// Built fresh for each call by `ApiClient::build_request` and consumed by
/// `Transport::send`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
    /// Ask the transport to send ambient credentials (cookies, client certs)
    /// along with the request.
    pub with_credentials: bool,
    /// Fires when the request should be abandoned. Transports that can
    /// interrupt I/O should watch it and return `TransportError::Aborted`.
    pub cancel: CancellationToken,
}

/// A response as delivered by the transport. Non-2xx statuses are data here,
/// not errors.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.contains("application/json"))
    }

    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub fn text(&self) -> &str {
        &self.body
    }
}

/// Failure reported by a transport before any response arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request's cancellation token fired.
    #[error("Request aborted")]
    Aborted,

    /// DNS, connect, reset and similar network-level failures.
    #[error("{0}")]
    Network(String),

    /// Anything else. `None` when the fault carried no message.
    #[error("{}", .0.as_deref().unwrap_or("Unknown error occurred"))]
    Other(Option<String>),
}

/// Performs the actual network I/O for an `HttpRequest`.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_strings_are_upper_case() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn only_get_skips_the_body() {
        assert!(!HttpMethod::Get.allows_body());
        assert!(HttpMethod::Delete.allows_body());
        assert!(HttpMethod::Post.allows_body());
        assert!(HttpMethod::Put.allows_body());
        assert!(HttpMethod::Patch.allows_body());
    }

    #[test]
    fn headers_are_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/json");
        headers.set("content-type", "text/plain");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.iter().next(), Some(("Content-Type", "text/plain")));

        assert_eq!(headers.remove("content-TYPE").as_deref(), Some("text/plain"));
        assert!(headers.is_empty());
        assert!(headers.remove("content-type").is_none());
    }

    #[test]
    fn headers_preserve_insertion_order() {
        let headers: Headers = [("B", "2"), ("A", "1"), ("C", "3")].into_iter().collect();
        let names: Vec<_> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["B", "A", "C"]);
    }

    #[test]
    fn response_detects_json_content_type() {
        let response = HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: [("Content-Type", "application/json; charset=utf-8")]
                .into_iter()
                .collect(),
            body: r#"{"id":1}"#.to_string(),
        };
        assert!(response.is_ok());
        assert!(response.is_json());
        assert_eq!(response.json().unwrap()["id"], 1);
    }

    #[test]
    fn response_without_content_type_is_not_json() {
        let response = HttpResponse {
            status: 204,
            status_text: "No Content".to_string(),
            headers: Headers::new(),
            body: String::new(),
        };
        assert!(response.is_ok());
        assert!(!response.is_json());
        assert_eq!(response.text(), "");
    }

    #[test]
    fn status_outside_2xx_is_not_ok() {
        for status in [199, 301, 404, 500] {
            let response = HttpResponse {
                status,
                status_text: String::new(),
                headers: Headers::new(),
                body: String::new(),
            };
            assert!(!response.is_ok(), "{status}");
        }
    }

    #[test]
    fn transport_error_messages() {
        assert_eq!(TransportError::Aborted.to_string(), "Request aborted");
        assert_eq!(
            TransportError::Network("connection refused".to_string()).to_string(),
            "connection refused"
        );
        assert_eq!(
            TransportError::Other(None).to_string(),
            "Unknown error occurred"
        );
        assert_eq!(
            TransportError::Other(Some("weird".to_string())).to_string(),
            "weird"
        );
    }
}

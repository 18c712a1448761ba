//! Blocking HTTP transport backed by `ureq`.
//!
//! # Design
//! ureq is synchronous, so each request runs on tokio's blocking pool. The
//! agent is configured to hand back 4xx/5xx responses as data rather than
//! `Err`, leaving status interpretation to the client. Blocking I/O cannot be
//! interrupted, so on cancellation the transport stops waiting and returns
//! `TransportError::Aborted` while the worker thread finishes on its own.
//!
//! `with_credentials` has no ambient meaning outside a browser and is ignored.

use std::future::Future;

use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

#[derive(Clone, Debug)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent. It should have `http_status_as_error`
    /// disabled, or error statuses will surface as transport failures.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let agent = self.agent.clone();
        let cancel = request.cancel.clone();
        async move {
            let mut call = tokio::task::spawn_blocking(move || execute(&agent, request));
            tokio::select! {
                biased;
                joined = &mut call => match joined {
                    Ok(result) => result,
                    Err(err) => Err(TransportError::Other(Some(err.to_string()))),
                },
                () = cancel.cancelled() => Err(TransportError::Aborted),
            }
        }
    }
}

fn execute(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, TransportError> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
        ..
    } = req;

    let result = match (method, body) {
        (HttpMethod::Get, _) => with_headers(agent.get(&url), &headers).call(),
        (HttpMethod::Delete, None) => with_headers(agent.delete(&url), &headers).call(),
        (HttpMethod::Delete, body) => send_body(
            with_headers(agent.delete(&url), &headers).force_send_body(),
            body,
        ),
        (HttpMethod::Post, body) => send_body(with_headers(agent.post(&url), &headers), body),
        (HttpMethod::Put, body) => send_body(with_headers(agent.put(&url), &headers), body),
        (HttpMethod::Patch, body) => send_body(with_headers(agent.patch(&url), &headers), body),
    };
    let mut response = result.map_err(|e| TransportError::Network(e.to_string()))?;

    let status = response.status();
    let headers: Headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| TransportError::Network(e.to_string()))?;

    Ok(HttpResponse {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        headers,
        body,
    })
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &Headers) -> ureq::RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

fn send_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

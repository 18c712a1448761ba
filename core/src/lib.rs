//! Typed REST client that folds every outcome into one envelope.
//!
//! # Overview
//! [`ApiClient`] issues GET/POST/PUT/PATCH/DELETE calls through a pluggable
//! [`Transport`] and returns an [`ApiResponse`] for every call: success,
//! HTTP error, backend-declared error, network failure and timeout alike.
//! Callers branch on `is_success()` instead of handling `Err`.
//!
//! # Design
//! - The envelope is immutable once built and offers permissive (`data`) and
//!   checked (`require_data`) access.
//! - Request building (`ApiClient::build_request`) and response
//!   classification (`classify_response`) are pure, so the I/O boundary is
//!   explicit and both halves are testable without a network.
//! - The transport is supplied by the host. `UreqTransport` (feature `ureq`,
//!   on by default) is a ready-made blocking implementation.
//! - Responses shaped `{ success, data, error }` are unwrapped; anything else
//!   is taken as the payload itself.

pub mod client;
pub mod config;
pub mod dto;
pub mod envelope;
pub mod error;
pub mod http;
#[cfg(feature = "ureq")]
pub mod transport;

pub use client::{classify_response, ApiClient};
pub use config::{ApiClientConfig, RequestConfig, DEFAULT_TIMEOUT_MS};
pub use dto::is_request_dto;
pub use envelope::ApiResponse;
pub use error::ApiError;
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use tokio_util::sync::CancellationToken;

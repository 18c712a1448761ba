//! Error types for the API client.
//!
//! # Design
//! Network, HTTP and backend failures never surface as `ApiError` from the
//! client's verb methods: they are folded into an error `ApiResponse`. The
//! variants here either describe a failure *before* it is folded (so its
//! `Display` text becomes the envelope message) or a caller's misuse of the
//! envelope's checked accessors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Checked data access on an error envelope.
    #[error("cannot access data on unsuccessful response")]
    PreconditionViolation,

    /// Checked data access on a success envelope that was built without a
    /// payload.
    #[error("response carries no data")]
    MissingData,

    /// The server answered with a non-2xx status. `message` has already been
    /// resolved from the response body or synthesized from the status line.
    #[error("{message}")]
    Http {
        status: u16,
        code: String,
        message: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

//! The uniform success/error envelope returned by every client call.
//!
//! # Design
//! An `ApiResponse` is fixed at construction: there are no setters and no
//! interior mutability, so its outcome never changes after the client hands
//! it back. The payload is moved in, not cloned, which means a payload holding
//! shared handles (`Arc`, `Rc<RefCell<_>>`) can still be observed or mutated
//! through those handles elsewhere.
//!
//! Two accessor families exist:
//! - `data` / `into_data` are permissive and yield `None` on error envelopes.
//! - `require_data` / `into_required_data` enforce the success check and
//!   return `ApiError::PreconditionViolation` when it does not hold.

use crate::error::ApiError;

/// Outcome of a single API call: either a success carrying an optional
/// payload, or an error carrying a message.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Build an envelope from its raw parts. A success envelope may carry a
    /// message too.
    pub fn new(success: bool, data: Option<T>, message: Option<String>) -> Self {
        Self {
            success,
            data,
            message,
        }
    }

    pub fn success(data: T) -> Self {
        Self::new(true, Some(data), None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(false, None, Some(message.into()))
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_error(&self) -> bool {
        !self.success
    }

    /// Payload as-is, without checking the outcome. Error envelopes yield
    /// `None`.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Owned variant of [`ApiResponse::data`].
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Payload of a successful envelope.
    ///
    /// Fails with `ApiError::PreconditionViolation` on an error envelope, and
    /// with `ApiError::MissingData` on a success envelope built without one.
    pub fn require_data(&self) -> Result<&T, ApiError> {
        if !self.success {
            return Err(ApiError::PreconditionViolation);
        }
        self.data.as_ref().ok_or(ApiError::MissingData)
    }

    /// Owned variant of [`ApiResponse::require_data`].
    pub fn into_required_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::PreconditionViolation);
        }
        self.data.ok_or(ApiError::MissingData)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Alias of [`ApiResponse::message`].
    pub fn error_message(&self) -> Option<&str> {
        self.message()
    }

    /// Same as `response.is_success()`; reads better as a filter predicate.
    pub fn is_success_response(response: &Self) -> bool {
        response.is_success()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde_json::json;

/// Error taxonomy for every service operation.
///
/// All variants are caught at the transaction boundary (full rollback) and
/// translated into the external `{success, message}` envelope. Nothing below
/// `Integrity`/`Internal` crashes the process, and those two never leak their
/// detail to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Missing/malformed required field, non-positive price or quantity,
    /// invalid enum value. Recoverable by resubmitting corrected input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// IMEI/code collision, device not available for sale, insufficient
    /// stock. "Not available" deliberately covers already-sold, reserved
    /// and nonexistent devices in one signal.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller's store scope does not cover the target resource, or the
    /// caller lacks the capability for the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced store/product/device does not exist where it must.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ledger/counter mismatch, uniqueness-retry exhaustion. Indicates a
    /// bug, not user error.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Integrity(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message suitable for the HTTP response. Internal variants return a
    /// generic message; their detail is routed to the operational log only.
    pub fn response_message(&self) -> String {
        match self {
            Self::Integrity(_) | Self::Database(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed with internal error");
        }

        let body = json!({
            "success": false,
            "message": self.response_message(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_distinguishes_caller_errors() {
        assert_eq!(
            ServiceError::Validation("price".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Conflict("imei".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::Forbidden("store".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::NotFound("store".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ServiceError::Integrity("ledger drift on product 42".into());
        assert_eq!(err.response_message(), "Internal server error");

        let err = ServiceError::Conflict("device is not available".into());
        assert!(err.response_message().contains("device is not available"));
    }
}

//! HTTP error mapping
//!
//! Every failure leaves the service as `{"success": false, "detail": ...}`
//! with a status chosen here. Statuses reported by the capture API or the
//! delivery receiver pass through unchanged; everything that went wrong
//! inside the service itself is a 500.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use docshape_core::Error as CoreError;

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Basic auth header missing, malformed, or wrong
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A required request header is absent or empty
    #[error("Missing {header} header in request")]
    MissingHeader { header: &'static str },

    /// Anything the conversion pipeline reported
    #[error(transparent)]
    Pipeline(#[from] CoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::MissingHeader { .. } => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(err) => match err {
                CoreError::Upstream {
                    status: Some(status),
                    ..
                }
                | CoreError::Delivery {
                    status: Some(status),
                    ..
                } => StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status());
        if matches!(self, ApiError::InvalidCredentials) {
            builder.insert_header(("WWW-Authenticate", "Basic"));
        }
        builder.json(json!({"success": false, "detail": self.to_string()}))
    }
}

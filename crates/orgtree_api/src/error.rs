//! Transport error envelope.
//!
//! # Invariants
//! - Every failure leaves the server as `{"error": "<message>"}` with a
//!   status derived from the failure's [`ErrorKind`].

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orgtree_core::db::DbError;
use orgtree_core::{EmployeeServiceError, ErrorKind, HierarchyError, StoreError, UnknownDeleteMode};
use serde_json::json;
use std::fmt::{Display, Formatter};
use tokio::task::JoinError;

/// Error returned by HTTP handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    fn from_kind(kind: ErrorKind, message: String) -> Self {
        Self::new(status_for(kind), message)
    }
}

/// Maps a service error classification to its HTTP status.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::DuplicateName => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::SelfParent | ErrorKind::CycleDetected | ErrorKind::HasChildren => {
            StatusCode::CONFLICT
        }
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<HierarchyError> for ApiError {
    fn from(value: HierarchyError) -> Self {
        Self::from_kind(value.kind(), value.to_string())
    }
}

impl From<EmployeeServiceError> for ApiError {
    fn from(value: EmployeeServiceError) -> Self {
        Self::from_kind(value.kind(), value.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        Self::internal(format!("store unavailable: {value}"))
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        Self::internal(format!("database open failed: {value}"))
    }
}

impl From<UnknownDeleteMode> for ApiError {
    fn from(value: UnknownDeleteMode) -> Self {
        Self::bad_request(value.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::bad_request(format!("invalid json: {}", value.body_text()))
    }
}

impl From<JoinError> for ApiError {
    fn from(value: JoinError) -> Self {
        Self::internal(format!("request worker failed: {value}"))
    }
}

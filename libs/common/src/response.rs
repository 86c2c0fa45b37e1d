use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// JSON envelope every handler returns: request id and timestamp per the
/// external interface contract, success/data/message per the teacher's
/// existing `ApiResponse<T>`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(request_id: Uuid, data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            request_id,
            timestamp: Utc::now(),
        }
    }

    pub fn success_with_message(request_id: Uuid, data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(request_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            request_id,
            timestamp: Utc::now(),
        }
    }
}

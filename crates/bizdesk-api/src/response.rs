//! API response envelope

use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message: message.into(),
            }),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// `{ "deleted": true }`, returned by delete endpoints.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

impl Deleted {
    pub fn ok() -> ApiResponse<Deleted> {
        ApiResponse::success(Deleted { deleted: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(ApiResponse::success(5)).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"], 5);
        assert!(ok["error"].is_null());

        let err = serde_json::to_value(ApiResponse::error("NOT_FOUND", "Product not found")).unwrap();
        assert_eq!(err["success"], false);
        assert!(err["data"].is_null());
        assert_eq!(err["error"]["code"], "NOT_FOUND");
        assert!(err["timestamp"].as_str().is_some());
    }
}

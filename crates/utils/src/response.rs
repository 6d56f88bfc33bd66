use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope returned by every HTTP endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_has_no_data() {
        let response: ApiResponse<u32> = ApiResponse::error("boom");
        assert!(!response.is_success());
        assert_eq!(response.message.as_deref(), Some("boom"));
        assert!(response.into_data().is_none());
    }

    #[test]
    fn success_serializes_envelope() {
        let json = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 3);
        assert!(json["message"].is_null());
    }
}

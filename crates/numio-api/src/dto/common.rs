//! Common DTOs used across the API

use serde::Serialize;

/// Standard API response wrapper for the admin API
///
/// The control facade returns bare payloads for compatibility with existing
/// clients; admin endpoints wrap theirs in this envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// Create a success response with data and message
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_omitted_when_none() {
        let json = serde_json::to_string(&ApiResponse::success(42)).unwrap();
        assert_eq!(json, r#"{"data":42}"#);
    }

    #[test]
    fn test_with_message() {
        let json = serde_json::to_string(&ApiResponse::with_message(1, "ok")).unwrap();
        assert_eq!(json, r#"{"data":1,"message":"ok"}"#);
    }
}

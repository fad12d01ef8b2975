//! Request DTOs for the dashboard API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /dashboard/refresh
///
/// # Fields
/// - `keys`: Source keys to refresh; empty or absent means every source
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub keys: Vec<String>,
}

impl RefreshRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.keys.iter().any(|k| k.trim().is_empty()) {
            return Some("Refresh keys cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_request_deserialize() {
        let req: RefreshRequest = serde_json::from_str(r#"{"keys": ["orders", "sales"]}"#).unwrap();
        assert_eq!(req.keys, vec!["orders", "sales"]);
    }

    #[test]
    fn test_refresh_request_defaults_to_all() {
        let req: RefreshRequest = serde_json::from_str("{}").unwrap();
        assert!(req.keys.is_empty());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_blank_key() {
        let req = RefreshRequest {
            keys: vec!["orders".to_string(), " ".to_string()],
        };
        assert!(req.validate().is_some());
    }
}

//! Envelope response format for all API responses.
//!
//! Every response is wrapped in a consistent envelope:
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "errors": [],
//!   "_links": { "self": "..." }
//! }
//! ```

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

/// Envelope response wrapping all API data.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// The main response payload.
    pub data: Option<T>,

    /// Request metadata.
    pub meta: ApiMeta,

    /// Error list (empty on success).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiErrorDetail>,

    /// HATEOAS-style links for discoverability.
    #[serde(rename = "_links", skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, String>,
}

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// Unique request identifier for tracing.
    pub request_id: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
    /// Response time in milliseconds.
    pub response_time_ms: u64,
}

/// Individual error detail.
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ApiMeta {
    fn new(request_id: String, response_time_ms: u64) -> Self {
        Self {
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            response_time_ms,
        }
    }
}

/// Per-request timer and ID, started when a handler begins.
pub struct RequestClock {
    start: Instant,
    request_id: String,
}

impl RequestClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            request_id: Uuid::now_v7().to_string(),
        }
    }

    /// Wrap `data` in a success envelope stamped with this request's meta.
    pub fn success<T: Serialize>(self, data: T) -> ApiResponse<T> {
        let elapsed = self.start.elapsed().as_millis() as u64;
        ApiResponse::success(data, self.request_id, elapsed)
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response with data.
    pub fn success(data: T, request_id: String, response_time_ms: u64) -> Self {
        Self {
            data: Some(data),
            meta: ApiMeta::new(request_id, response_time_ms),
            errors: Vec::new(),
            links: HashMap::new(),
        }
    }

    /// Add a HATEOAS link.
    pub fn with_link(mut self, rel: &str, href: &str) -> Self {
        self.links.insert(rel.to_string(), href.to_string());
        self
    }
}

impl ApiResponse<()> {
    /// Create an error response (no data).
    pub fn error(code: &str, message: &str, request_id: String) -> Self {
        Self {
            data: None,
            meta: ApiMeta::new(request_id, 0),
            errors: vec![ApiErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            }],
            links: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let resp = RequestClock::start()
            .success(serde_json::json!({"session_id": "abc"}))
            .with_link("self", "/api/v1/sessions");
        let value = serde_json::to_value(&resp).unwrap();

        assert_eq!(value["data"]["session_id"], "abc");
        assert!(!value["meta"]["request_id"].as_str().unwrap().is_empty());
        assert!(value.get("errors").is_none());
        assert_eq!(value["_links"]["self"], "/api/v1/sessions");
    }

    #[test]
    fn test_error_envelope_shape() {
        let resp = ApiResponse::error("SESSION_NOT_FOUND", "Session not found", "r1".to_string());
        let value = serde_json::to_value(&resp).unwrap();

        assert!(value["data"].is_null());
        assert_eq!(value["errors"][0]["code"], "SESSION_NOT_FOUND");
        assert_eq!(value["meta"]["request_id"], "r1");
    }
}

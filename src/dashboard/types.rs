//! Dashboard API Types
//!
//! DTOs for HTTP communication with the browser frontend. The engine's own
//! snapshot types serialize directly; these wrap them in the response
//! envelope and describe the control payloads.

use serde::{Deserialize, Serialize};

use crate::types::{AggregateStatus, FeedStatus};

/// Standard envelope for all API responses
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// GET /api/health row
#[derive(Debug, Clone, Serialize)]
pub struct FeedHealthResponse {
    pub feed: String,
    pub status: FeedStatus,
    pub age_ms: Option<i64>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

/// GET /api/health body
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub aggregate_status: AggregateStatus,
    pub stale_threshold_ms: i64,
    pub feeds: Vec<FeedHealthResponse>,
}

/// POST /api/controls/settings body; absent fields are left unchanged
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsRequest {
    pub refresh_ms: Option<u64>,
    pub window_ms: Option<u64>,
    /// "usd" or "bps"
    pub unit: Option<String>,
}

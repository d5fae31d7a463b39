//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Plain acknowledgement body, e.g. `{"message": "user deleted successfully"}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Wraps `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

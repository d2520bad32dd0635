//! DTOs for the context-aggregation tool endpoint.

use serde::{Deserialize, Serialize};

use crate::application::context::ContextType;

/// Body of `POST /api/tools/context`, matching the tool-call schema the AI
/// platform is configured with.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextToolRequest {
    #[serde(alias = "userUUID")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub context_type: ContextType,
    pub session_id: Option<String>,
    /// Clamped to 1..=50, default 10.
    pub limit: Option<usize>,
}

/// Validation failure payload.
#[derive(Debug, Clone, Serialize)]
pub struct ToolErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ToolErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

//! Axum router configuration for tool endpoints.

use axum::{routing::post, Router};

use super::handlers::{fetch_context, ToolsAppState};

/// Create the tools router.
///
/// Suitable for mounting at `/api/tools`.
pub fn tools_router() -> Router<ToolsAppState> {
    Router::new().route("/context", post(fetch_context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_can_be_constructed() {
        let _router = tools_router();
    }
}

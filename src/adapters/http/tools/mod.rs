//! HTTP adapter for AI-platform tool calls.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::ToolsAppState;
pub use routes::tools_router;

//! HTTP adapter for the memory endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::MemoryAppState;
pub use routes::memory_router;

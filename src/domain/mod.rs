//! Domain layer - entities and value objects for conversational memory.

pub mod foundation;
pub mod memory;

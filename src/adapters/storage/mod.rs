//! In-process storage adapters.

mod in_memory;

pub use in_memory::InMemoryStore;

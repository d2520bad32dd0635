//! Ports - trait contracts between the application and its adapters.

mod memory_store;

pub use memory_store::{HistoryQuery, MemoryStore, StoreError};

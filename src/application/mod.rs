//! Application layer - services composed from ports.

pub mod context;

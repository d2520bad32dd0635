//! Solace Memory - Conversational memory backend for a voice companion
//!
//! Persists chat history, user profiles, stage progressions, and session
//! context behind a storage gateway, and exposes them over HTTP routes and
//! a tool-call endpoint for the conversational-AI platform.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

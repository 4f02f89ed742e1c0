//! picast Common Library
//!
//! Shared types and API payloads for communication between the picast
//! service and its clients.

pub mod api;
pub mod security;
pub mod types;

pub use types::*;

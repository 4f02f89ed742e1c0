//! Security modules for request validation.

pub mod path_validation;
pub mod validation;

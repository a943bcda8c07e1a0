//! Utility functions shared across layers.
//!
//! - [`short_code`] - Deterministic short code derivation
//! - [`url_validator`] - Original URL validation
//! - [`db_error`] - Mapping of database errors to store errors

pub mod db_error;
pub mod short_code;
pub mod url_validator;

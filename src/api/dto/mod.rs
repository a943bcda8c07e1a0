//! Data Transfer Objects for API requests and responses.
//!
//! Responses are built from domain types through `From` impls so the wire
//! shape can change without touching the services.

pub mod analytics;
pub mod health;
pub mod pagination;
pub mod shorten;

//! Core domain entities.
//!
//! Entities are plain data structures without behaviour beyond construction.
//! Each entity has a separate `New*` struct describing an insert before the
//! store has assigned an id and timestamp.
//!
//! - [`ShortLink`] - An owned mapping from a short code to an original URL
//! - [`ClickRecord`] - A persisted redirect event

pub mod click;
pub mod short_link;

pub use click::{ClickRecord, NewClickRecord};
pub use short_link::{NewShortLink, ShortLink};

//! Repository trait definitions for the domain layer.
//!
//! These traits are the store's capability interface. Implementations live in
//! `crate::infrastructure::persistence`; mocks are generated with `mockall`
//! for unit tests.
//!
//! Every method reports failures as [`StoreError`](crate::error::StoreError),
//! which keeps unique-constraint violations distinguishable from outages.
//!
//! - [`LinkRepository`] - Short link storage
//! - [`ClickRepository`] - Click record storage and analytics queries

pub mod click_repository;
pub mod link_repository;

pub use click_repository::ClickRepository;
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;

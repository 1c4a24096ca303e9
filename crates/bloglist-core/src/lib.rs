//! # Bloglist Core
//!
//! The domain layer of the bloglist backend.
//! Entities, repository ports and the post statistics live here, with no
//! infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod stats;

pub use error::DomainError;

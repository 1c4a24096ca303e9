//! In-memory repositories - used when no database is configured, and in tests.
//!
//! Entities are kept in insertion order, so listings come back oldest first
//! just like the ordered PostgreSQL queries.

mod posts;
mod users;

pub use posts::InMemoryPostRepository;
pub use users::InMemoryUserRepository;

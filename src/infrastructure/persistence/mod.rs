//! Persistence layer implementing the domain repository trait.
//!
//! - [`PgLinkRepository`] - PostgreSQL, the production authoritative store
//! - [`MemoryLinkRepository`] - in-process store for tests and development

mod memory_link_repository;
mod pg_link_repository;

pub use memory_link_repository::MemoryLinkRepository;
pub use pg_link_repository::PgLinkRepository;

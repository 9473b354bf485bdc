//! Domain layer containing business entities and logic.
//!
//! The domain layer has no dependency on infrastructure or presentation
//! concerns. It defines the link entity and its lifecycle states, the
//! resolution [`decision::Decision`], and the repository trait implemented
//! by the infrastructure layer.
//!
//! # Link lifecycle
//!
//! `nonexistent -> active -> retired`, and retirement is terminal. An alias
//! change never renames a record in place: it creates a new record under the
//! new id and retires the old one, keeping the one-id-one-cache-entry
//! invariant intact.

pub mod decision;
pub mod entities;
pub mod repositories;

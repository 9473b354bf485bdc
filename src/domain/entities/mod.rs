//! Core domain entities representing the business data model.
//!
//! - [`Link`] - the authoritative record of a shortened URL
//! - [`NewLink`] / [`LinkPatch`] - creation and partial-update inputs
//! - [`RedirectCode`] - the four redirect statuses the engine may serve

pub mod link;

pub use link::{Link, LinkPatch, NewLink, RedirectCode};

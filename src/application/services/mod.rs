//! Application services orchestrating the domain.
//!
//! - [`LifecycleService`] - create, update and delete links (write path)
//! - [`ResolverService`] - resolve ids to redirect decisions (read path)
//! - [`TokenService`] - edit token issuance and verification

mod lifecycle_service;
mod resolver_service;
mod token_service;

pub use lifecycle_service::{LifecycleService, LinkChanges, UpdatedLink};
pub use resolver_service::ResolverService;
pub use token_service::{IssuedToken, TokenService};

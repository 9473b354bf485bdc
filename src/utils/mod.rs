//! Utility functions shared across the application:
//!
//! - [`id_generator`] - Short id generation and validation
//! - [`url_normalizer`] - Target URL normalization and sanitization

pub mod id_generator;
pub mod url_normalizer;

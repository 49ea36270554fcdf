//! docker-gen
//!
//! Renders configuration files from templates and container metadata.
//! Templates filter and group containers through the [`query`] engine; the
//! [`core::generator`] writes the result atomically and only when it changed.

pub mod core;
pub mod infrastructure;
pub mod query;

//! docker-gen core library
//!
//! Container records, configuration, the template layer and the generator
//! that turns a rendered template into a destination file.

pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod templates;
pub mod utils;

pub use config::{Config, ConfigFile};
pub use context::RuntimeContainer;
pub use error::{Error, Result};
pub use generator::Generator;

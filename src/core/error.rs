//! Error handling for docker-gen.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Every failure of a generation
//! run, including filesystem errors while committing the destination, is
//! returned to the caller, which decides whether it is fatal.
//!
//! # Examples
//!
//! ```
//! use dockergen::core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::config("template path is required"))
//! }
//!
//! assert!(might_fail().is_err());
//! ```

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

use crate::query::QueryError;

/// Result type for docker-gen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docker-gen operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Query or template helper error
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Template parse or execution error
    #[error("Unable to render template {}: {message}", .template.display())]
    Render { template: PathBuf, message: String },

    /// Filesystem error while producing or committing a file
    #[error("Unable to {action} {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Notify command error
    #[error("Notify command '{command}' failed: {message}")]
    Notify { command: String, message: String },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a render error from a Tera error, flattening its source chain
    pub fn render(template: impl Into<PathBuf>, error: &tera::Error) -> Self {
        let mut message = error.to_string();
        let mut source = StdError::source(error);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = StdError::source(cause);
        }
        Self::Render {
            template: template.into(),
            message,
        }
    }

    /// Create a filesystem error for `action` on `path`
    pub fn filesystem(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            path: path.into(),
            action,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_config_creation() {
        let error = Error::config("Invalid configuration");
        assert!(matches!(error, Error::Config(_)));
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid configuration"
        );
    }

    #[test]
    fn test_error_filesystem_display() {
        let error = Error::filesystem(
            "chown temp file",
            "/etc/nginx/conf.d/default.conf",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            error.to_string(),
            "Unable to chown temp file /etc/nginx/conf.d/default.conf: denied"
        );
        assert!(StdError::source(&error).is_some());
    }

    #[test]
    fn test_error_render_flattens_chain() {
        let inner = tera::Error::msg("variable `missing` not found");
        let outer = tera::Error::chain("Failed to render 'nginx.tmpl'", inner);
        let error = Error::render("nginx.tmpl", &outer);

        let message = error.to_string();
        assert!(message.contains("Failed to render 'nginx.tmpl'"));
        assert!(message.contains("variable `missing` not found"));
    }

    #[test]
    fn test_error_from_query_error() {
        let error: Error = QueryError::OddArgumentCount(3).into();
        assert!(matches!(error, Error::Query(_)));
        assert!(error.to_string().contains("odd number of values"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
        assert!(error.to_string().contains("File not found"));
    }
}

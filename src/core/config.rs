//! Generation configuration.
//!
//! A [`Config`] describes one template/destination pair. Several can be
//! listed in a TOML file as `[[config]]` tables:
//!
//! ```toml
//! [[config]]
//! template = "/etc/docker-gen/templates/nginx.tmpl"
//! dest = "/etc/nginx/conf.d/default.conf"
//! onlyexposed = true
//! notifycmd = "nginx -s reload"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Configuration for generating one destination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the template to render
    pub template: PathBuf,

    /// Destination file; `None` or an empty path writes to standard output
    pub dest: Option<PathBuf>,

    /// Keep containers that are not running
    #[serde(rename = "includestopped")]
    pub include_stopped: bool,

    /// Keep only containers with at least one published port
    #[serde(rename = "onlypublished")]
    pub only_published: bool,

    /// Keep only containers with at least one exposed port
    #[serde(rename = "onlyexposed")]
    pub only_exposed: bool,

    /// Keep empty and whitespace-only lines in the output
    #[serde(rename = "keepblanklines")]
    pub keep_blank_lines: bool,

    /// Shell command run after the destination changed
    #[serde(rename = "notifycmd")]
    pub notify_cmd: Option<String>,
}

impl Config {
    /// Create a configuration for `template`, writing to standard output
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            ..Default::default()
        }
    }

    /// The destination path, if one is configured
    pub fn dest_path(&self) -> Option<&Path> {
        self.dest
            .as_deref()
            .filter(|dest| !dest.as_os_str().is_empty())
    }

    /// Checks that the configuration can be used for generation
    pub fn validate(&self) -> Result<()> {
        if self.template.as_os_str().is_empty() {
            return Err(Error::config("template path is required"));
        }
        Ok(())
    }
}

/// A configuration file holding one or more [`Config`] entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub config: Vec<Config>,
}

impl ConfigFile {
    /// Parses a configuration file from TOML text
    pub fn parse(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        for config in &file.config {
            config.validate()?;
        }
        Ok(file)
    }

    /// Loads and parses the configuration file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Filesystem {
            path: path.to_path_buf(),
            action: "read config file",
            source,
        })?;
        Self::parse(&text)
    }
}

use crate::types::{InstalledTools, ToolKind};
use std::path::PathBuf;
use thiserror::Error;

/// Shown whenever `read-configuration` cannot give us a config file path.
pub const READ_CONFIGURATION_HINT: &str = "Make sure the workspace folder contains a devcontainer configuration \
(`.devcontainer/devcontainer.json` or `.devcontainer.json`) and that the container engine is running.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown template field '{field}' in '{pattern}'")]
    UnknownField { field: String, pattern: String },
    #[error("malformed template '{pattern}'")]
    Malformed { pattern: String },
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to look up latest release of {owner}/{repo}: {reason}")]
    ReleaseLookup {
        owner: String,
        repo: String,
        reason: String,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to download {url}: server answered {status}")]
    DownloadStatus { url: String, status: u16 },
    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to make {} executable", path.display())]
    PermissionGrant {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A failed install. `path` is the cache slot, which may hold a partial file.
#[derive(Debug, Error)]
#[error("failed to install {tool} to {}", path.display())]
pub struct InstallError {
    pub tool: ToolKind,
    pub path: PathBuf,
    #[source]
    pub source: ProvisionError,
}

/// A composite install stopped at its first failure.
#[derive(Debug, Error)]
#[error("tool installation stopped with {} tool(s) installed", installed.iter().count())]
pub struct ToolSetError {
    pub installed: InstalledTools,
    #[source]
    pub source: InstallError,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`read-configuration` failed: {reason}. {hint}")]
    ReadConfiguration { reason: String, hint: &'static str },
    #[error("cannot merge {}: {message}", path.display())]
    Merge { path: PathBuf, message: String },
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn read_configuration(reason: impl Into<String>) -> Self {
        ConfigError::ReadConfiguration {
            reason: reason.into(),
            hint: READ_CONFIGURATION_HINT,
        }
    }
}

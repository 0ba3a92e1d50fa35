use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,
    #[serde(default = "default_container_engine")]
    pub container_engine: String,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_container_engine() -> String {
    "docker".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_api_url: default_github_api_url(),
            container_engine: default_container_engine(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

/// Subset of the GitHub "latest release" payload we rely on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubRelease {
    pub tag_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolKind {
    Editor,
    ContainerCli,
    PortForwarder,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [
        ToolKind::Editor,
        ToolKind::ContainerCli,
        ToolKind::PortForwarder,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Editor => "vim",
            ToolKind::ContainerCli => "devcontainer",
            ToolKind::PortForwarder => "port-forwarder",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One externally sourced executable.
///
/// `file_name` is version-agnostic: the cache keeps a single copy per tool
/// and an upgrade overwrites it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub kind: ToolKind,
    pub file_name: String,
    pub owner: String,
    pub repo: String,
    pub url_pattern: String,
}

impl ToolDescriptor {
    pub fn cache_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join(&self.file_name)
    }
}

/// Paths installed so far, in install order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledTools {
    paths: Vec<(ToolKind, PathBuf)>,
}

impl InstalledTools {
    pub fn push(&mut self, kind: ToolKind, path: PathBuf) {
        self.paths.push((kind, path));
    }

    pub fn iter(&self) -> impl Iterator<Item = (ToolKind, &Path)> {
        self.paths.iter().map(|(k, p)| (*k, p.as_path()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTools {
    pub editor: PathBuf,
    pub port_forwarder: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTools {
    pub editor: PathBuf,
    pub container_cli: PathBuf,
}

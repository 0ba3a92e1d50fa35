//! Tool provisioning
//!
//! This module provides functionality for:
//! - Resolving the latest release of an upstream tool
//! - Turning that release into a download URL
//! - Keeping one cached, executable copy of every tool
//! - Installing the tool sets each command needs

pub mod github;

pub use github::GitHubReleases;

use crate::download::HttpInstaller;
use crate::error::{InstallError, ProvisionError, ToolSetError};
use crate::registry::ToolRegistry;
use crate::template;
use crate::types::{InstalledTools, RunTools, StartTools, ToolDescriptor, ToolKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Looks up the newest published tag of `owner/repo`.
#[async_trait]
pub trait ReleaseResolver: Send + Sync {
    async fn latest_tag(&self, owner: &str, repo: &str) -> Result<String, ProvisionError>;
}

/// Places the artifact behind `url` at `file_path` ready to execute.
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, url: &str, file_path: &Path) -> Result<PathBuf, ProvisionError>;
}

pub struct Provisioner<R = GitHubReleases, I = HttpInstaller> {
    resolver: R,
    installer: I,
    resolved_urls: Mutex<HashMap<ToolKind, String>>,
}

impl<R: ReleaseResolver, I: Installer> Provisioner<R, I> {
    pub fn new(resolver: R, installer: I) -> Self {
        Self {
            resolver,
            installer,
            resolved_urls: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the download URL of `tool`, memoized for the life of this provisioner.
    pub async fn resolve_download_url(&self, tool: &ToolDescriptor) -> Result<String, ProvisionError> {
        if let Some(url) = self.cached_url(tool.kind) {
            return Ok(url);
        }

        let tag = self.resolver.latest_tag(&tool.owner, &tool.repo).await?;
        let url = template::expand_tag(&tool.url_pattern, &tag)?;
        tracing::debug!("Download URL for {} ({}): {}", tool.kind, tag, url);

        self.resolved_urls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(tool.kind, url.clone());
        Ok(url)
    }

    fn cached_url(&self, kind: ToolKind) -> Option<String> {
        self.resolved_urls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&kind)
            .cloned()
    }

    /// Install `tool` into `install_dir`.
    ///
    /// An existing file is reused as-is unless `override_existing` is set; its
    /// executable bit is trusted to have survived.
    pub async fn install(
        &self,
        tool: &ToolDescriptor,
        install_dir: &Path,
        override_existing: bool,
    ) -> Result<PathBuf, InstallError> {
        let file_path = tool.cache_path(install_dir);

        if file_path.exists() && !override_existing {
            tracing::info!("{} already exists, using it.", file_path.display());
            return Ok(file_path);
        }

        let wrap = |source| InstallError {
            tool: tool.kind,
            path: file_path.clone(),
            source,
        };

        let url = self.resolve_download_url(tool).await.map_err(wrap)?;
        eprintln!("Installing {} from {}...", tool.kind, url);
        self.installer.install(&url, &file_path).await.map_err(wrap)
    }

    /// Install `kinds` in order, stopping at the first failure.
    pub async fn install_tools(
        &self,
        registry: &ToolRegistry,
        kinds: &[ToolKind],
        install_dir: &Path,
        override_existing: bool,
    ) -> Result<InstalledTools, ToolSetError> {
        let mut installed = InstalledTools::default();
        for kind in kinds {
            self.install_step(registry.get(*kind), install_dir, override_existing, &mut installed)
                .await?;
        }
        Ok(installed)
    }

    /// Tools for running a bare container.
    pub async fn install_run_tools(
        &self,
        registry: &ToolRegistry,
        install_dir: &Path,
    ) -> Result<RunTools, ToolSetError> {
        let mut installed = InstalledTools::default();
        let editor = self
            .install_step(registry.editor(), install_dir, false, &mut installed)
            .await?;
        let port_forwarder = self
            .install_step(registry.port_forwarder(), install_dir, false, &mut installed)
            .await?;
        Ok(RunTools {
            editor,
            port_forwarder,
        })
    }

    /// Tools for starting a devcontainer.
    pub async fn install_start_tools(
        &self,
        registry: &ToolRegistry,
        install_dir: &Path,
    ) -> Result<StartTools, ToolSetError> {
        let mut installed = InstalledTools::default();
        let editor = self
            .install_step(registry.editor(), install_dir, false, &mut installed)
            .await?;
        let container_cli = self
            .install_step(registry.container_cli(), install_dir, false, &mut installed)
            .await?;
        Ok(StartTools {
            editor,
            container_cli,
        })
    }

    /// Tool for tearing a devcontainer down.
    pub async fn install_down_tools(
        &self,
        registry: &ToolRegistry,
        install_dir: &Path,
    ) -> Result<PathBuf, ToolSetError> {
        let mut installed = InstalledTools::default();
        self.install_step(registry.container_cli(), install_dir, false, &mut installed)
            .await
    }

    async fn install_step(
        &self,
        tool: &ToolDescriptor,
        install_dir: &Path,
        override_existing: bool,
        installed: &mut InstalledTools,
    ) -> Result<PathBuf, ToolSetError> {
        match self.install(tool, install_dir, override_existing).await {
            Ok(path) => {
                installed.push(tool.kind, path.clone());
                Ok(path)
            }
            Err(source) => Err(ToolSetError {
                installed: std::mem::take(installed),
                source,
            }),
        }
    }
}

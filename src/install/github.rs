//! GitHub API interaction module
//!
//! Resolves the latest published release tag of a repository.

use super::ReleaseResolver;
use crate::error::ProvisionError;
use crate::types::GitHubRelease;
use async_trait::async_trait;
use reqwest::StatusCode;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Build GitHub API URL for fetching the latest release
///
/// # Arguments
/// * `api_url` - API base, e.g. "https://api.github.com"
/// * `owner` / `repo` - Repository coordinates
pub fn build_gh_latest_release_url(api_url: &str, owner: &str, repo: &str) -> String {
    format!(
        "{}/repos/{}/{}/releases/latest",
        api_url.trim_end_matches('/'),
        owner,
        repo
    )
}

#[derive(Debug, Clone)]
pub struct GitHubReleases {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl Default for GitHubReleases {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl GitHubReleases {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            token: None,
        }
    }

    /// Send `token` with every index request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

#[async_trait]
impl ReleaseResolver for GitHubReleases {
    async fn latest_tag(&self, owner: &str, repo: &str) -> Result<String, ProvisionError> {
        let url = build_gh_latest_release_url(&self.api_url, owner, repo);
        let lookup_error = |reason: String| ProvisionError::ReleaseLookup {
            owner: owner.to_string(),
            repo: repo.to_string(),
            reason,
        };

        tracing::debug!("Fetching GitHub release info from: {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header(
                "User-Agent",
                concat!("devcontainer-vim/", env!("CARGO_PKG_VERSION")),
            );
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
            tracing::debug!("Using GITHUB_TOKEN");
        }

        let response = request
            .send()
            .await
            .map_err(|e| lookup_error(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::NOT_FOUND {
                return Err(lookup_error("no releases found (Status: 404)".to_string()));
            }
            return Err(lookup_error(format!("GitHub API answered {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| lookup_error(format!("failed to read response: {}", e)))?;
        let release: GitHubRelease = serde_json::from_str(&body)
            .map_err(|e| lookup_error(format!("unexpected response: {}", e)))?;

        if release.tag_name.is_empty() {
            return Err(lookup_error("release has an empty tag_name".to_string()));
        }

        tracing::debug!("Latest release of {}/{} is {}", owner, repo, release.tag_name);
        Ok(release.tag_name)
    }
}

use crate::error::ProvisionError;
use crate::install::Installer;
use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Stream `url` into `local_path`, truncating whatever is there.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    local_path: &Path,
) -> Result<(), ProvisionError> {
    let filename = local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    tracing::info!("Downloading {} from {}...", filename, url);

    let download_error = |source| ProvisionError::Download {
        url: url.to_string(),
        source,
    };
    let io_error = |source| ProvisionError::Io {
        path: local_path.to_path_buf(),
        source,
    };

    let response = client.get(url).send().await.map_err(download_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProvisionError::DownloadStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(format!("Downloading {}", filename));

    let mut file = fs::File::create(local_path).map_err(io_error)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(download_error)?;
        file.write_all(&chunk).map_err(io_error)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush().map_err(io_error)?;

    pb.finish_with_message("Download complete");
    Ok(())
}

/// Grant the executable bit. A no-op where the platform has no such bit.
pub fn make_executable(path: &Path) -> Result<(), ProvisionError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let grant_error = |source| ProvisionError::PermissionGrant {
            path: path.to_path_buf(),
            source,
        };
        let mut perms = fs::metadata(path).map_err(grant_error)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).map_err(grant_error)?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Installs tools that need nothing more than a download and `chmod +x`.
#[derive(Debug, Clone, Default)]
pub struct HttpInstaller {
    client: reqwest::Client,
}

impl HttpInstaller {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Installer for HttpInstaller {
    async fn install(&self, url: &str, file_path: &Path) -> Result<PathBuf, ProvisionError> {
        download_file(&self.client, url, file_path).await?;
        make_executable(file_path)?;
        tracing::info!("Installed executable to: {}", file_path.display());
        Ok(file_path.to_path_buf())
    }
}

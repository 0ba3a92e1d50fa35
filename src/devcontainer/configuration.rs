//! Resolving the effective devcontainer config file through
//! `devcontainer read-configuration`.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// `read-configuration` output, trimmed to what we use:
///
/// ```json
/// {
///   "configuration": {
///     "name": "development environment",
///     "configFilePath": {
///       "$mid": 1,
///       "fsPath": "/home/me/project/.devcontainer/devcontainer.json",
///       "path": "/home/me/project/.devcontainer/devcontainer.json",
///       "scheme": "vscode-fileHost"
///     }
///   },
///   "workspace": { "workspaceFolder": "/work" }
/// }
/// ```
#[derive(Debug, Deserialize)]
struct ReadConfigurationResult {
    configuration: Configuration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Configuration {
    config_file_path: ConfigFilePath,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFilePath {
    fs_path: String,
}

/// Pull `configuration.configFilePath.fsPath` out of `read-configuration` output.
pub fn config_file_path_from_output(output: &str) -> Result<PathBuf, ConfigError> {
    let result: ReadConfigurationResult = serde_json::from_str(output.trim()).map_err(|e| {
        tracing::debug!("Unparseable read-configuration output: {}", e);
        ConfigError::read_configuration("could not parse its output")
    })?;

    let fs_path = result.configuration.config_file_path.fs_path;
    if fs_path.is_empty() {
        return Err(ConfigError::read_configuration(
            "its output names no configuration file",
        ));
    }
    Ok(PathBuf::from(fs_path))
}

/// Run `<cli> read-configuration --workspace-folder <folder>` and return the config path.
pub fn resolve_config_file_path(
    orchestration_cli_path: &Path,
    workspace_folder: &str,
) -> Result<PathBuf, ConfigError> {
    tracing::debug!(
        "Running {} read-configuration --workspace-folder {}",
        orchestration_cli_path.display(),
        workspace_folder
    );

    let output = Command::new(orchestration_cli_path)
        .args(["read-configuration", "--workspace-folder", workspace_folder])
        .output()
        .map_err(|e| {
            ConfigError::read_configuration(format!(
                "could not run {}: {}",
                orchestration_cli_path.display(),
                e
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!("read-configuration stderr: {}", stderr);
        let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty());
        let reason = match (output.status.code(), last_line) {
            (Some(code), Some(line)) => format!("exit status {}: {}", code, line.trim()),
            (Some(code), None) => format!("exit status {}", code),
            (None, _) => "terminated by a signal".to_string(),
        };
        return Err(ConfigError::read_configuration(reason));
    }

    let path = config_file_path_from_output(&String::from_utf8_lossy(&output.stdout))?;
    tracing::info!("Resolved devcontainer configuration: {}", path.display());
    Ok(path)
}

//! Driving the devcontainer CLI: `up`, `exec` and `down`.

pub mod configuration;

pub use configuration::resolve_config_file_path;

use crate::platform;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpResult {
    outcome: String,
    #[serde(default)]
    container_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parse the JSON line `devcontainer up` prints last on stdout.
pub fn container_id_from_up_output(stdout: &str) -> Result<String> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| anyhow!("`devcontainer up` printed no result"))?;
    let result: UpResult =
        serde_json::from_str(line).context("could not parse `devcontainer up` result")?;

    if result.outcome != "success" {
        return Err(anyhow!(
            "`devcontainer up` failed: {}",
            result.message.unwrap_or(result.outcome)
        ));
    }
    result
        .container_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow!("`devcontainer up` reported no container id"))
}

/// `devcontainer up` with our merged config layered over the workspace's.
pub fn up(
    devcontainer: &Path,
    options: &[String],
    workspace_folder: &str,
    override_config: &Path,
) -> Result<String> {
    let mut cmd = Command::new(devcontainer);
    cmd.arg("up")
        .args(options)
        .arg("--override-config")
        .arg(override_config)
        .arg("--workspace-folder")
        .arg(workspace_folder)
        .stderr(Stdio::inherit());

    tracing::debug!("Executing: {:?}", cmd);
    let output = cmd
        .output()
        .with_context(|| format!("failed to run {}", devcontainer.display()))?;
    // On failure the result line still carries the reason, so parse it first.
    let container_id = container_id_from_up_output(&String::from_utf8_lossy(&output.stdout))?;
    if !output.status.success() {
        return Err(anyhow!("`devcontainer up` exited with {}", output.status));
    }
    Ok(container_id)
}

/// Copy the editor into the container and run it in the workspace.
pub fn exec_editor(
    devcontainer: &Path,
    container_engine: &str,
    container_id: &str,
    workspace_folder: &str,
    editor: &Path,
) -> Result<()> {
    let editor_file_name = editor
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("invalid editor path {}", editor.display()))?;

    crate::docker::copy_into(container_engine, editor, container_id, &format!("/{}", editor_file_name))?;

    let mut cmd = Command::new(devcontainer);
    cmd.args(["exec", "--container-id", container_id, "--workspace-folder", workspace_folder])
        .args(platform::editor_command(&editor_file_name));

    tracing::debug!("Executing: {:?}", cmd);
    let status = cmd
        .status()
        .with_context(|| format!("failed to run {}", devcontainer.display()))?;
    if !status.success() {
        return Err(anyhow!("editor session ended with {}", status));
    }
    Ok(())
}

/// `devcontainer down` for the given arguments.
pub fn down(devcontainer: &Path, args: &[String]) -> Result<()> {
    let mut cmd = Command::new(devcontainer);
    cmd.arg("down").args(args);

    tracing::debug!("Executing: {:?}", cmd);
    let status = cmd
        .status()
        .with_context(|| format!("failed to run {}", devcontainer.display()))?;
    if !status.success() {
        return Err(anyhow!("`devcontainer down` exited with {}", status));
    }
    Ok(())
}

use crate::platform;
use crate::types::RunTools;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// `docker cp <source> <container_id>:<dest>`
pub fn copy_into(engine: &str, source: &Path, container_id: &str, dest: &str) -> Result<()> {
    let status = Command::new(engine)
        .arg("cp")
        .arg(source)
        .arg(format!("{}:{}", container_id, dest))
        .stdout(Stdio::null())
        .status()
        .with_context(|| format!("failed to run {} cp", engine))?;
    if !status.success() {
        return Err(anyhow!(
            "copying {} into container {} failed with {}",
            source.display(),
            container_id,
            status
        ));
    }
    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("invalid tool path {}", path.display()))
}

/// Start a container from `docker_args`, bring the tools in and open the editor.
///
/// Once the container is up it is stopped on every path out, failed copies included.
pub fn run(engine: &str, docker_args: &[String], tools: &RunTools) -> Result<()> {
    let output = Command::new(engine)
        .args(["run", "-d"])
        .args(docker_args)
        .stderr(Stdio::inherit())
        .output()
        .with_context(|| format!("failed to run {} run", engine))?;
    if !output.status.success() {
        return Err(anyhow!("`{} run` exited with {}", engine, output.status));
    }
    let container_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if container_id.is_empty() {
        return Err(anyhow!("`{} run` printed no container id", engine));
    }
    tracing::info!("Started container {}", container_id);

    let session = open_editor(engine, &container_id, tools);
    stop(engine, &container_id);

    let status = session?;
    if !status.success() {
        return Err(anyhow!("editor session ended with {}", status));
    }
    Ok(())
}

fn open_editor(engine: &str, container_id: &str, tools: &RunTools) -> Result<ExitStatus> {
    let editor_file_name = file_name(&tools.editor)?;
    copy_into(engine, &tools.editor, container_id, &format!("/{}", editor_file_name))?;
    copy_into(
        engine,
        &tools.port_forwarder,
        container_id,
        &format!("/{}", file_name(&tools.port_forwarder)?),
    )?;

    Command::new(engine)
        .args(["exec", "-it", container_id])
        .args(platform::editor_command(&editor_file_name))
        .status()
        .with_context(|| format!("failed to run {} exec", engine))
}

fn stop(engine: &str, container_id: &str) {
    let stopped = Command::new(engine)
        .args(["stop", container_id])
        .stdout(Stdio::null())
        .status();
    match stopped {
        Ok(status) if !status.success() => {
            tracing::warn!("Stopping container {} exited with {}", container_id, status)
        }
        Err(e) => tracing::warn!("Could not stop container {}: {}", container_id, e),
        Ok(_) => tracing::info!("Stopped container {}", container_id),
    }
}

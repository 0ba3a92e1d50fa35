use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// Not every test binary uses every helper.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub cache_dir: PathBuf,
    pub settings_path: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cache_dir = temp_dir.path().join("cache");
        let settings_path = temp_dir.path().join("settings").join("config.json");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_devcontainer-vim"));

        Self {
            _temp_dir: temp_dir,
            cache_dir,
            settings_path,
            bin_path,
        }
    }

    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("DEVCONTAINER_VIM_CACHE_DIR", &self.cache_dir);
        cmd.env("DEVCONTAINER_VIM_CONFIG", &self.settings_path);
        // Nothing listens here; a test that reaches the network fails fast.
        cmd.env("DEVCONTAINER_VIM_GITHUB_API_URL", "http://127.0.0.1:9");
        cmd.env_remove("GITHUB_TOKEN");
        cmd.env_remove("RUST_LOG");
        cmd.env("HOME", self.root());
        cmd
    }

    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.cmd()
            .args(args)
            .output()
            .expect("Failed to run devcontainer-vim")
            .into()
    }

    /// Cache path of `tool` as reported by `tool list`.
    pub fn tool_path(&self, tool: &str) -> PathBuf {
        let output = self.run(&["tool", "list"]);
        output.assert_success();
        output
            .stdout
            .lines()
            .map(|line| line.split('\t').collect::<Vec<_>>())
            .find(|fields| fields.first() == Some(&tool))
            .and_then(|fields| fields.get(1).map(PathBuf::from))
            .unwrap_or_else(|| panic!("{} missing from `tool list`:\n{}", tool, output.stdout))
    }

    pub fn config_slot_dir(&self, workspace_folder: &Path) -> PathBuf {
        use sha2::{Digest, Sha256};
        let slot = format!(
            "{:x}",
            Sha256::digest(workspace_folder.to_string_lossy().as_bytes())
        );
        self.cache_dir.join("config").join(slot)
    }
}

/// Write an executable `#!/bin/sh` script.
#[cfg(unix)]
#[allow(dead_code)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create script dir");
    }
    fs::write(path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .expect("Failed to chmod script");
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.status.success(),
            "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}

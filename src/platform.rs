//! Host platform detection and the per-platform tool variants.
//!
//! The editor and port-forwarder run inside the (Linux) container, so only
//! the CPU architecture picks their variant. The devcontainer CLI runs on
//! the host and follows host OS and architecture.

use crate::types::{PlatformInfo, ToolDescriptor, ToolKind};

pub fn get_system_info() -> PlatformInfo {
    let os = std::env::consts::OS.to_string();
    let arch = std::env::consts::ARCH.to_string();

    let normalized_arch = match arch.as_str() {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        _ => arch,
    };

    PlatformInfo {
        os,
        arch: normalized_arch,
    }
}

fn descriptor(kind: ToolKind, file_name: &str, owner: &str, repo: &str, pattern: &str) -> ToolDescriptor {
    ToolDescriptor {
        kind,
        file_name: file_name.to_string(),
        owner: owner.to_string(),
        repo: repo.to_string(),
        url_pattern: pattern.to_string(),
    }
}

const VIM_STATIC_ARCHIVE: &str = "vim-static.tar.gz";

pub fn editor_tool(platform: &PlatformInfo) -> ToolDescriptor {
    match platform.arch.as_str() {
        "arm64" => descriptor(
            ToolKind::Editor,
            VIM_STATIC_ARCHIVE,
            "mikoto2000",
            "vim-static",
            "https://github.com/mikoto2000/vim-static/releases/download/{{ .TagName }}/vim-{{ .TagName }}-aarch64.tar.gz",
        ),
        _ => descriptor(
            ToolKind::Editor,
            "vim",
            "vim",
            "vim-appimage",
            "https://github.com/vim/vim-appimage/releases/download/{{ .TagName }}/Vim-{{ .TagName }}.glibc2.29-x86_64.AppImage",
        ),
    }
}

/// Command that starts the editor once its file has been copied to `/`.
///
/// The static build ships as an archive and is unpacked in the container first.
pub fn editor_command(editor_file_name: &str) -> Vec<String> {
    if editor_file_name == VIM_STATIC_ARCHIVE {
        return vec![
            "sh".to_string(),
            "-c".to_string(),
            format!(
                "cd /; tar zxf ./{} -C ~/ > /dev/null; cd ~; rm -rf ~/vim-static; mv $(ls -d ~/vim-*-aarch64) ~/vim-static; ~/vim-static/AppRun --cmd \"let g:devcontainer_vim = v:true\"",
                editor_file_name
            ),
        ];
    }
    vec![
        format!("/{}", editor_file_name),
        "--appimage-extract-and-run".to_string(),
        "--cmd".to_string(),
        "let g:devcontainer_vim = v:true".to_string(),
    ]
}

/// The devcontainer CLI runs on the host, so both OS and arch matter.
pub fn container_cli_tool(platform: &PlatformInfo) -> ToolDescriptor {
    let arch = match platform.arch.as_str() {
        "arm64" => "arm64",
        _ => "x64",
    };
    let (os, suffix) = match platform.os.as_str() {
        "windows" => ("windows", ".exe"),
        "macos" => ("macos", ""),
        _ => ("linux", ""),
    };
    descriptor(
        ToolKind::ContainerCli,
        &format!("devcontainer{}", suffix),
        "mikoto2000",
        "devcontainers-cli",
        &format!(
            "https://github.com/mikoto2000/devcontainers-cli/releases/download/{{{{ .TagName }}}}/devcontainer-{}-{}{}",
            os, arch, suffix
        ),
    )
}

pub fn port_forwarder_tool(platform: &PlatformInfo) -> ToolDescriptor {
    let arch = match platform.arch.as_str() {
        "arm64" => "arm64",
        _ => "amd64",
    };
    descriptor(
        ToolKind::PortForwarder,
        "port-forwarder",
        "mikoto2000",
        "port-forwarder",
        &format!(
            "https://github.com/mikoto2000/port-forwarder/releases/download/{{{{ .TagName }}}}/port-forwarder-linux-{}",
            arch
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(os: &str, arch: &str) -> PlatformInfo {
        PlatformInfo {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    #[test]
    fn test_container_cli_variants() {
        let cases = [
            ("linux", "amd64", "devcontainer", "devcontainer-linux-x64"),
            ("linux", "arm64", "devcontainer", "devcontainer-linux-arm64"),
            ("macos", "amd64", "devcontainer", "devcontainer-macos-x64"),
            ("macos", "arm64", "devcontainer", "devcontainer-macos-arm64"),
            ("windows", "amd64", "devcontainer.exe", "devcontainer-windows-x64.exe"),
            ("windows", "arm64", "devcontainer.exe", "devcontainer-windows-arm64.exe"),
        ];
        for (os, arch, file_name, asset) in cases {
            let tool = container_cli_tool(&platform(os, arch));
            assert_eq!(tool.file_name, file_name);
            assert_eq!(
                tool.url_pattern,
                format!(
                    "https://github.com/mikoto2000/devcontainers-cli/releases/download/{{{{ .TagName }}}}/{}",
                    asset
                )
            );
        }
    }

    #[test]
    fn test_host_container_cli_has_exe_suffix_on_windows() {
        let tool = container_cli_tool(&get_system_info());
        assert_eq!(tool.file_name.ends_with(".exe"), cfg!(windows));
    }

    #[test]
    fn test_editor_follows_arch() {
        let appimage = editor_tool(&platform("linux", "amd64"));
        assert_eq!(appimage.file_name, "vim");
        assert_eq!(appimage.repo, "vim-appimage");
        assert_eq!(editor_command(&appimage.file_name)[0], "/vim");

        let archive = editor_tool(&platform("macos", "arm64"));
        assert_eq!(archive.file_name, "vim-static.tar.gz");
        assert_eq!(archive.repo, "vim-static");
        let command = editor_command(&archive.file_name);
        assert_eq!(command[0], "sh");
        assert!(command[2].contains("tar zxf ./vim-static.tar.gz"));
    }

    #[test]
    fn test_port_forwarder_is_linux_build() {
        assert!(port_forwarder_tool(&platform("macos", "arm64"))
            .url_pattern
            .ends_with("/port-forwarder-linux-arm64"));
        assert!(port_forwarder_tool(&platform("windows", "amd64"))
            .url_pattern
            .ends_with("/port-forwarder-linux-amd64"));
    }
}

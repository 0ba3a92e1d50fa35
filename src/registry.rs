use crate::platform;
use crate::types::{PlatformInfo, ToolDescriptor, ToolKind};

/// The fixed set of tools, built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRegistry {
    editor: ToolDescriptor,
    container_cli: ToolDescriptor,
    port_forwarder: ToolDescriptor,
}

impl ToolRegistry {
    pub fn new(
        editor: ToolDescriptor,
        container_cli: ToolDescriptor,
        port_forwarder: ToolDescriptor,
    ) -> Self {
        Self {
            editor,
            container_cli,
            port_forwarder,
        }
    }

    /// Registry with the variants for `target`.
    pub fn for_platform(target: &PlatformInfo) -> Self {
        Self::new(
            platform::editor_tool(target),
            platform::container_cli_tool(target),
            platform::port_forwarder_tool(target),
        )
    }

    pub fn for_host() -> Self {
        let host = platform::get_system_info();
        tracing::debug!("Host platform: {}/{}", host.os, host.arch);
        Self::for_platform(&host)
    }

    pub fn get(&self, kind: ToolKind) -> &ToolDescriptor {
        match kind {
            ToolKind::Editor => &self.editor,
            ToolKind::ContainerCli => &self.container_cli,
            ToolKind::PortForwarder => &self.port_forwarder,
        }
    }

    pub fn editor(&self) -> &ToolDescriptor {
        &self.editor
    }

    pub fn container_cli(&self) -> &ToolDescriptor {
        &self.container_cli
    }

    pub fn port_forwarder(&self) -> &ToolDescriptor {
        &self.port_forwarder
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        ToolKind::ALL.into_iter().map(move |kind| self.get(kind))
    }
}

use crate::types::ToolKind;
use clap::{Parser, Subcommand, ValueEnum};

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Release builds are tagged; show just the tag
    if let Some(tag) = option_env!("DEVCONTAINER_VIM_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("DEVCONTAINER_VIM_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("DEVCONTAINER_VIM_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup; clap wants a 'static str
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "devcontainer-vim")]
#[command(about = "Launch devcontainers with a ready-to-use Vim")]
#[command(version = get_version())]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a container with `docker run` and open Vim in it
    #[command(
        allow_hyphen_values = true,
        disable_help_flag = true,
        disable_version_flag = true,
        after_help = "Example:\n  devcontainer-vim run -v \"$(pwd):/work\" --workdir /work debian:bookworm sleep infinity"
    )]
    Run {
        /// Options and arguments passed to `docker run`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        docker_args: Vec<String>,
    },

    /// Run `devcontainer up` and open Vim with `devcontainer exec`
    #[command(
        allow_hyphen_values = true,
        disable_help_flag = true,
        disable_version_flag = true,
        after_help = "The last argument is used as the workspace folder.\n\nExample:\n  devcontainer-vim start ."
    )]
    Start {
        /// devcontainer options followed by WORKSPACE_FOLDER
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },

    /// Stop and remove a devcontainer and its merged configuration
    #[command(
        allow_hyphen_values = true,
        disable_help_flag = true,
        disable_version_flag = true
    )]
    Down {
        /// devcontainer options followed by WORKSPACE_FOLDER
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },

    /// Manage the downloaded tools
    Tool {
        #[command(subcommand)]
        action: ToolAction,
    },

    /// Remove downloaded tools and merged configurations
    Clean,

    /// Show license information
    License,

    /// Show the current version
    Version,
}

#[derive(Subcommand)]
pub enum ToolAction {
    /// List tools and their cache paths
    List,
    /// Download tools into the cache
    Install {
        /// Tool to install
        #[arg(value_enum, default_value_t = ToolName::All)]
        name: ToolName,
        /// Re-download even if the tool is already cached
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToolName {
    Vim,
    Devcontainer,
    PortForwarder,
    All,
}

impl ToolName {
    pub fn kinds(self) -> Vec<ToolKind> {
        match self {
            ToolName::Vim => vec![ToolKind::Editor],
            ToolName::Devcontainer => vec![ToolKind::ContainerCli],
            ToolName::PortForwarder => vec![ToolKind::PortForwarder],
            ToolName::All => ToolKind::ALL.to_vec(),
        }
    }
}

/// Split `[OPTIONS...] WORKSPACE_FOLDER` into options and folder.
pub fn split_workspace_folder(args: &[String]) -> Option<(&[String], &str)> {
    args.split_last()
        .map(|(folder, options)| (options, folder.as_str()))
}

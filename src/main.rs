mod cli;
mod config;
mod devcontainer;
mod docker;
mod download;
mod error;
mod install;
mod platform;
mod registry;
mod template;
mod types;
mod workspace;


use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{split_workspace_folder, Cli, Commands, ToolAction};
use config::AppDirs;
use download::HttpInstaller;
use install::{GitHubReleases, Provisioner};
use registry::ToolRegistry;
use std::fs;
use std::path::Path;
use types::Settings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(&cli);

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            println!("devcontainer-vim v{}", env!("CARGO_PKG_VERSION"));
        }

        Commands::License => {
            println!(
                "{} is licensed under the {} license.\nSee {} for the full text and notices.",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_LICENSE"),
                env!("CARGO_PKG_REPOSITORY")
            );
        }

        Commands::Run { docker_args } => {
            let ctx = AppContext::load()?;
            let tools = ctx
                .provisioner
                .install_run_tools(&ctx.registry, &ctx.dirs.install_dir)
                .await
                .context("Failed to install tools for `run`")?;
            docker::run(&ctx.settings.container_engine, &docker_args, &tools)?;
        }

        Commands::Start { args } => {
            let (options, folder) = split_workspace_folder(&args)
                .ok_or_else(|| anyhow!("WORKSPACE_FOLDER is required"))?;
            let workspace_folder = absolute_workspace_folder(folder)?;

            let ctx = AppContext::load()?;
            let tools = ctx
                .provisioner
                .install_start_tools(&ctx.registry, &ctx.dirs.install_dir)
                .await
                .context("Failed to install tools for `start`")?;

            let merged_config = create_config_file(
                &tools.container_cli,
                &workspace_folder,
                &ctx.dirs.app_config_dir,
            )?;

            let container_id = devcontainer::up(
                &tools.container_cli,
                options,
                &workspace_folder,
                &merged_config,
            )?;
            devcontainer::exec_editor(
                &tools.container_cli,
                &ctx.settings.container_engine,
                &container_id,
                &workspace_folder,
                &tools.editor,
            )?;
        }

        Commands::Down { args } => {
            let (_, folder) = split_workspace_folder(&args)
                .ok_or_else(|| anyhow!("WORKSPACE_FOLDER is required"))?;
            let workspace_folder = absolute_workspace_folder(folder)?;

            let ctx = AppContext::load()?;
            let container_cli = ctx
                .provisioner
                .install_down_tools(&ctx.registry, &ctx.dirs.install_dir)
                .await
                .context("Failed to install tools for `down`")?;

            devcontainer::down(&container_cli, &args)?;

            if let Some(removed) =
                workspace::remove_config_slot(&ctx.dirs.app_config_dir, &workspace_folder)?
            {
                eprintln!("Remove configuration file: `{}`", removed.display());
            }
        }

        Commands::Tool { action } => {
            let ctx = AppContext::load()?;
            match action {
                ToolAction::List => list_tools(&ctx.registry, &ctx.dirs.install_dir),
                ToolAction::Install { name, force } => {
                    let installed = ctx
                        .provisioner
                        .install_tools(&ctx.registry, &name.kinds(), &ctx.dirs.install_dir, force)
                        .await
                        .map_err(|e| {
                            for (kind, path) in e.installed.iter() {
                                eprintln!("  {} installed at {}", kind, path.display());
                            }
                            anyhow::Error::new(e)
                        })?;
                    for (kind, path) in installed.iter() {
                        println!("{}\t{}", kind, path.display());
                    }
                }
            }
        }

        Commands::Clean => {
            let dirs = AppDirs::new(config::get_user_cache_dir()?);
            for dir in [&dirs.install_dir, &dirs.app_config_dir] {
                if dir.exists() {
                    fs::remove_dir_all(dir)
                        .with_context(|| format!("Could not remove {}", dir.display()))?;
                    eprintln!("Removed `{}`", dir.display());
                }
            }
        }
    }

    Ok(())
}

/// Everything a command needs once settings and directories are known.
struct AppContext {
    settings: Settings,
    dirs: AppDirs,
    registry: ToolRegistry,
    provisioner: Provisioner,
}

impl AppContext {
    fn load() -> Result<Self> {
        let settings = config::load_settings()?;
        let dirs = config::get_app_dirs()?;
        let registry = ToolRegistry::for_host();
        tracing::debug!("Cache directory: {}", dirs.cache_dir.display());

        let client = reqwest::Client::new();
        let resolver =
            GitHubReleases::new(settings.github_api_url.clone()).with_token(config::github_token());
        let provisioner = Provisioner::new(resolver, HttpInstaller::new(client));

        Ok(Self {
            settings,
            dirs,
            registry,
            provisioner,
        })
    }
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}

/// Absolute form of `folder`, without resolving symlinks.
fn absolute_workspace_folder(folder: &str) -> Result<String> {
    let path = std::path::absolute(folder)
        .with_context(|| format!("Invalid workspace folder `{}`", folder))?;
    Ok(path.to_string_lossy().to_string())
}

/// Resolve the workspace's devcontainer config and write the merged copy we start with.
fn create_config_file(
    devcontainer_cli: &Path,
    workspace_folder: &str,
    app_config_dir: &Path,
) -> Result<std::path::PathBuf> {
    let config_file_path = devcontainer::resolve_config_file_path(devcontainer_cli, workspace_folder)?;
    let additional_config_file_path = workspace::additional_config_path(&config_file_path);

    let merged = workspace::materialize(
        app_config_dir,
        workspace_folder,
        &config_file_path,
        &additional_config_file_path,
    )?;
    eprintln!("Use configuration file: `{}`", merged.display());
    Ok(merged)
}

fn list_tools(registry: &ToolRegistry, install_dir: &Path) {
    for tool in registry.iter() {
        let path = tool.cache_path(install_dir);
        let state = if path.exists() { "installed" } else { "missing" };
        println!("{}\t{}\t{}", tool.kind, path.display(), state);
    }
}

//! Command-line front end for resolving the build's compiler configuration.
//!
//! The binary only wires logging and argument parsing; everything else lives
//! here so it can be exercised from tests.

/// Re-export for convenience.
pub use solbuild_rs_config as config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use solbuild_rs_config::{
    CompilerConfig, CompilerVersion, ConfigLayer, ConfigResolver, LayeredConfigOptions,
};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Command-line options for `solbuild`.
#[derive(Debug, Parser)]
#[command(name = "solbuild", version)]
pub struct Cli {
    /// Load exactly this build record, without layering
    #[arg(
        long,
        global = true,
        conflicts_with_all = ["cwd", "runtime", "requirements", "no_system", "no_user"]
    )]
    pub config: Option<PathBuf>,
    /// Directory to discover layered config from (defaults to the current directory)
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,
    /// Runtime override layer, applied last (repeatable)
    #[arg(long, global = true)]
    pub runtime: Vec<PathBuf>,
    /// Requirements layer whose values cannot be overridden
    #[arg(long, global = true)]
    pub requirements: Option<PathBuf>,
    /// Skip the system config and system requirements layers
    #[arg(long, global = true)]
    pub no_system: bool,
    /// Skip the user config layer
    #[arg(long, global = true)]
    pub no_user: bool,
    /// Compiler version provided by the toolchain (repeatable)
    #[arg(long, global = true)]
    pub available: Vec<CompilerVersion>,
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate the configuration and print a summary
    Check,
    /// Print the effective configuration as JSON
    Show,
    /// Print the compiler settings handed to the compiler
    Settings,
    /// List the configuration layers that were considered
    Layers,
}

/// Where the effective config came from.
#[derive(Debug)]
enum Origin {
    Explicit(PathBuf),
    Layered(Vec<ConfigLayer>),
}

/// Run `cli` and return the text to print on success.
pub fn run(cli: &Cli) -> Result<String> {
    let (config, origin) = resolve(cli)?;
    if !cli.available.is_empty() {
        config
            .ensure_available(&cli.available)
            .context("compiler version check failed")?;
    }

    let output = match cli.command {
        Command::Check => summary(&config),
        Command::Show => serde_json::to_string_pretty(&config)?,
        Command::Settings => serde_json::to_string_pretty(&config.compiler_settings())?,
        Command::Layers => describe_origin(&origin),
    };
    Ok(output)
}

fn resolve(cli: &Cli) -> Result<(CompilerConfig, Origin)> {
    if let Some(path) = cli.config.as_ref() {
        info!("loading config from path: {}", path.display());
        let config = ConfigResolver::from_path(path)
            .load()
            .with_context(|| format!("failed to load config {}", path.display()))?;
        return Ok((config, Origin::Explicit(path.clone())));
    }

    let cwd = match cli.cwd.as_ref() {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("failed to resolve current working directory")?,
    };
    info!("loading layered config from cwd: {}", cwd.display());
    let mut options = LayeredConfigOptions::new(&cwd);
    if cli.no_system {
        options.system_config_path = None;
        options.requirements_path = None;
    }
    if cli.no_user {
        options.user_config_path = None;
    }
    if let Some(requirements) = cli.requirements.as_ref() {
        options = options.with_requirements_path(requirements);
    }
    for runtime in &cli.runtime {
        options = options.with_runtime_path(runtime);
    }
    let layered = CompilerConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok((layered.config, Origin::Layered(layered.layers)))
}

fn summary(config: &CompilerConfig) -> String {
    let optimizer = config.optimizer();
    let optimizer = if optimizer.enabled {
        format!("optimizer on (runs={})", optimizer.runs)
    } else {
        "optimizer off".to_string()
    };
    format!(
        "ok: {} {}, {}, build directory {}",
        config.compiler_name(),
        config.compiler_version(),
        optimizer,
        config.build_directory().display()
    )
}

fn describe_origin(origin: &Origin) -> String {
    match origin {
        Origin::Explicit(path) => format!("explicit\t{}\tloaded", path.display()),
        Origin::Layered(layers) => {
            let mut out = String::new();
            for layer in layers {
                let path = layer
                    .path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                let status = layer.disabled_reason.as_deref().unwrap_or("loaded");
                let _ = writeln!(out, "{}\t{}\t{}", layer.source.name(), path, status);
            }
            out.trim_end().to_string()
        }
    }
}

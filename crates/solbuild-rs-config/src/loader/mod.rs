//! Layered configuration loader with requirement locks.
//!
//! Discovers configuration layers (system/user/project/etc), validates each
//! against the record schema, merges them under the requirements layer and
//! resolves exactly one `CompilerConfig`.

mod layer_io;
mod merge;
mod schema;
mod utils;

#[cfg(test)]
mod tests;

use crate::{CompilerConfig, ConfigError, ProjectConfig};
use log::{debug, info, warn};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Build record filename at project roots and in the working directory.
const PROJECT_CONFIG_FILE: &str = "truffle-config.js";
/// Config filename inside the solbuild config directory.
const DEFAULT_CONFIG_FILE: &str = "solbuild.json5";
/// Config directory under user or repo roots.
const DEFAULT_CONFIG_DIR: &str = ".solbuild";
/// Marker files/dirs that identify a project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

#[cfg(unix)]
/// Default system config path on Unix.
const SYSTEM_CONFIG_PATH: &str = "/etc/solbuild/solbuild.json5";
#[cfg(unix)]
/// Default requirements path on Unix.
const SYSTEM_REQUIREMENTS_PATH: &str = "/etc/solbuild/requirements.json5";
#[cfg(windows)]
/// Default system config path on Windows.
const SYSTEM_CONFIG_PATH: &str = "C:\\ProgramData\\solbuild\\solbuild.json5";
#[cfg(windows)]
/// Default requirements path on Windows.
const SYSTEM_REQUIREMENTS_PATH: &str = "C:\\ProgramData\\solbuild\\requirements.json5";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: CompilerConfig,
    /// Metadata for each layer considered during load.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// Locked values that later layers cannot override.
    Requirements,
    /// System-wide configuration.
    System,
    /// User-specific configuration.
    User,
    /// Build record at the project root.
    Project,
    /// Build record in the current working directory.
    Cwd,
    /// Repo-local solbuild configuration.
    Repo,
    /// Runtime overrides (highest precedence).
    Runtime,
}

impl ConfigLayerSource {
    pub fn name(self) -> &'static str {
        match self {
            ConfigLayerSource::Requirements => "requirements",
            ConfigLayerSource::System => "system",
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Project => "project",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Repo => "repo",
            ConfigLayerSource::Runtime => "runtime",
        }
    }
}

/// Metadata about a config layer, including the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    /// Layer origin (system, user, runtime, etc).
    pub source: ConfigLayerSource,
    /// Location on disk if present.
    pub path: Option<PathBuf>,
    /// Reason the layer was skipped or disabled.
    pub disabled_reason: Option<String>,
}

/// Schema validation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaMode {
    /// Types and known keys only; required fields may be absent.
    Partial,
    /// Partial checks plus required fields, for the effective record.
    Full,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to locate local layers.
    pub cwd: PathBuf,
    /// Optional system config path (defaults to `/etc/solbuild/solbuild.json5` on Unix).
    pub system_config_path: Option<PathBuf>,
    /// Optional user config path (defaults to `~/.solbuild/solbuild.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Optional requirements path for locked settings.
    pub requirements_path: Option<PathBuf>,
    /// Runtime override config paths applied last.
    pub runtime_paths: Vec<PathBuf>,
    /// Marker files/dirs used to detect the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: layer_io::default_system_config_path(),
            user_config_path: layer_io::default_user_config_path(),
            requirements_path: layer_io::default_requirements_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Replace the requirements path.
    pub fn with_requirements_path(mut self, path: impl AsRef<Path>) -> Self {
        self.requirements_path = Some(path.as_ref().to_path_buf());
        self
    }
}

impl CompilerConfig {
    /// Load a single build record from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value = layer_io::parse_record(&contents)?;
        config_from_value(value, "config")
    }

    /// Load a single build record from its declared contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value = layer_io::parse_record(contents)?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): requirements (locks), system, user,
    /// build record (cwd, else project root), repo, runtime overrides.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = utils::normalize_path(&options.cwd)?;
        debug!("normalized cwd for config load: {}", cwd.display());
        let mut layers = Vec::new();
        let mut merge_layers = Vec::new();

        let requirements = layer_io::load_optional_layer(
            ConfigLayerSource::Requirements,
            options.requirements_path.as_deref(),
        )?;
        let requirements_value = requirements.as_ref().map(|layer| layer.value.clone());
        if let Some(layer) = requirements {
            debug!("loaded requirements layer");
            layers.push(layer.meta);
        }

        for (source, path) in [
            (
                ConfigLayerSource::System,
                options.system_config_path.as_deref(),
            ),
            (ConfigLayerSource::User, options.user_config_path.as_deref()),
        ] {
            if let Some(layer) = layer_io::load_optional_layer(source, path)? {
                debug!("loaded {} layer", source.name());
                layers.push(layer.meta.clone());
                merge_layers.push(layer);
            }
        }

        let project_root = utils::find_project_root(&cwd, &options.project_root_markers);
        match project_root.as_ref() {
            Some(root) => debug!("resolved project root: {}", root.display()),
            None => debug!("project root not found; skipping project/repo layers"),
        }

        let mut local_layers = Vec::new();
        if let Some(record) = select_build_record(&cwd, project_root.as_deref(), &mut layers) {
            local_layers.push(record);
        }
        if let Some(root) = project_root.as_ref() {
            local_layers.push((
                ConfigLayerSource::Repo,
                root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
            ));
        }

        for (source, path) in local_layers {
            load_local_layer(source, path, &mut layers, &mut merge_layers)?;
        }

        for runtime_path in &options.runtime_paths {
            let loaded = layer_io::load_required_layer(ConfigLayerSource::Runtime, runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            layers.push(loaded.meta.clone());
            merge_layers.push(loaded);
        }

        if merge_layers.is_empty() && requirements_value.is_none() {
            return Err(ConfigError::MalformedConfig {
                path: "effective:root".to_string(),
                message: format!(
                    "no configuration layers found (searched from {})",
                    cwd.display()
                ),
            });
        }

        let mut merged = requirements_value
            .clone()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        for layer in merge_layers {
            let mut locked = Vec::new();
            merge::apply_layer(
                &mut merged,
                &layer.value,
                requirements_value.as_ref(),
                "",
                &mut locked,
            );
            for key in locked {
                warn!(
                    "ignoring override of locked key (layer={}, key={})",
                    layer.meta.source.name(),
                    key
                );
            }
        }

        let config = config_from_value(merged, "effective")?;
        info!(
            "layered config loaded (layers={}, solc={})",
            layers.len(),
            config.compiler_version()
        );
        Ok(LayeredConfig { config, layers })
    }
}

/// Internal representation of a loaded config layer.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

fn config_from_value(value: Value, label: &str) -> Result<CompilerConfig, ConfigError> {
    schema::validate_layer_schema(&value, SchemaMode::Full, label)?;
    let record: ProjectConfig = serde_json::from_value(value)?;
    record.resolve()
}

/// Pick the one build record for this build: the cwd record, else the
/// project-root record. Build records are alternatives and are never merged;
/// a project-root record hidden by a cwd record is listed as disabled.
fn select_build_record(
    cwd: &Path,
    project_root: Option<&Path>,
    layers: &mut Vec<ConfigLayer>,
) -> Option<(ConfigLayerSource, PathBuf)> {
    let cwd_record = cwd.join(PROJECT_CONFIG_FILE);
    let root_record = project_root
        .map(|root| root.join(PROJECT_CONFIG_FILE))
        .filter(|path| utils::unique_path(path) != utils::unique_path(&cwd_record));

    match root_record {
        Some(root_record) if cwd_record.exists() => {
            if root_record.exists() {
                debug!(
                    "project build record shadowed by cwd record (path={})",
                    root_record.display()
                );
                layers.push(ConfigLayer {
                    source: ConfigLayerSource::Project,
                    path: Some(root_record),
                    disabled_reason: Some("shadowed by the build record in cwd".to_string()),
                });
            }
            Some((ConfigLayerSource::Cwd, cwd_record))
        }
        Some(root_record) => Some((ConfigLayerSource::Project, root_record)),
        None if cwd_record.exists() => Some((ConfigLayerSource::Cwd, cwd_record)),
        None => None,
    }
}

fn load_local_layer(
    source: ConfigLayerSource,
    path: PathBuf,
    layers: &mut Vec<ConfigLayer>,
    merge_layers: &mut Vec<LoadedLayer>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        debug!(
            "skipping missing layer (source={}, path={})",
            source.name(),
            path.display()
        );
        return Ok(());
    }
    if path.is_dir() {
        let reason = "path is a directory".to_string();
        warn!(
            "layer disabled (source={}, path={}, reason={})",
            source.name(),
            path.display(),
            reason
        );
        layers.push(ConfigLayer {
            source,
            path: Some(path),
            disabled_reason: Some(reason),
        });
        return Ok(());
    }
    let loaded = layer_io::load_required_layer(source, &path)?;
    layers.push(loaded.meta.clone());
    merge_layers.push(loaded);
    Ok(())
}

//! Configuration schema for solbuild.
//!
//! [`ProjectConfig`] mirrors the on-disk record; [`CompilerConfig`] is the
//! validated, immutable view handed to the compiler invocation step.

use crate::{CompilerVersion, ConfigError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::{Component, Path, PathBuf};

/// Identifier of the only compiler backend the record shape describes.
pub const SOLC_COMPILER: &str = "solc";

/// Optimizer runs used when the optimizer is disabled and no count is given.
pub const DEFAULT_OPTIMIZER_RUNS: u32 = 200;

/// Root of the build record as declared on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    #[serde(default, rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub contracts_build_directory: String,
    pub compilers: CompilersConfig,
}

/// The `compilers` block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompilersConfig {
    pub solc: SolcConfig,
}

/// The `compilers.solc` block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SolcConfig {
    pub version: CompilerVersion,
    pub settings: SolcSettings,
}

/// Settings passed opaquely to the compiler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SolcSettings {
    pub optimizer: OptimizerSettings,
    #[serde(
        default,
        rename = "evmVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub evm_version: Option<EvmVersion>,
}

/// Optimizer block as declared; `runs` may be omitted when disabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OptimizerSettings {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<u32>,
}

/// EVM hard-fork targets understood by the compiler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EvmVersion {
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
    Cancun,
    Prague,
}

impl EvmVersion {
    /// Name as written in the record and in compiler settings.
    pub fn as_str(self) -> &'static str {
        match self {
            EvmVersion::Homestead => "homestead",
            EvmVersion::TangerineWhistle => "tangerineWhistle",
            EvmVersion::SpuriousDragon => "spuriousDragon",
            EvmVersion::Byzantium => "byzantium",
            EvmVersion::Constantinople => "constantinople",
            EvmVersion::Petersburg => "petersburg",
            EvmVersion::Istanbul => "istanbul",
            EvmVersion::Berlin => "berlin",
            EvmVersion::London => "london",
            EvmVersion::Paris => "paris",
            EvmVersion::Shanghai => "shanghai",
            EvmVersion::Cancun => "cancun",
            EvmVersion::Prague => "prague",
        }
    }
}

/// Resolved optimizer settings.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct OptimizerConfig {
    pub enabled: bool,
    /// Only meaningful when `enabled` is true.
    pub runs: u32,
}

/// The single active compiler configuration for a build.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompilerConfig {
    build_directory: PathBuf,
    compiler_name: String,
    compiler_version: CompilerVersion,
    optimizer: OptimizerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    evm_version: Option<EvmVersion>,
}

impl ProjectConfig {
    /// Convert the declared record into a validated [`CompilerConfig`].
    pub fn resolve(&self) -> Result<CompilerConfig, ConfigError> {
        if self.contracts_build_directory.trim().is_empty() {
            return Err(malformed(
                "contracts_build_directory",
                "build directory must not be empty",
            ));
        }

        let optimizer = &self.compilers.solc.settings.optimizer;
        let runs = match (optimizer.enabled, optimizer.runs) {
            (_, Some(runs)) => runs,
            (false, None) => DEFAULT_OPTIMIZER_RUNS,
            (true, None) => {
                return Err(malformed(
                    "compilers.solc.settings.optimizer.runs",
                    "runs is required when the optimizer is enabled",
                ));
            }
        };

        Ok(CompilerConfig {
            build_directory: normalize_build_directory(Path::new(
                &self.contracts_build_directory,
            )),
            compiler_name: SOLC_COMPILER.to_string(),
            compiler_version: self.compilers.solc.version,
            optimizer: OptimizerConfig {
                enabled: optimizer.enabled,
                runs,
            },
            evm_version: self.compilers.solc.settings.evm_version,
        })
    }
}

impl CompilerConfig {
    /// Start building a config programmatically.
    pub fn builder(version: CompilerVersion) -> CompilerConfigBuilder {
        CompilerConfigBuilder::new(version)
    }

    /// Where compiled artifacts are written, as declared (normalized).
    pub fn build_directory(&self) -> &Path {
        &self.build_directory
    }

    /// Build directory anchored at `root` when declared relative.
    pub fn build_directory_in(&self, root: &Path) -> PathBuf {
        if self.build_directory.is_absolute() {
            self.build_directory.clone()
        } else {
            root.join(&self.build_directory)
        }
    }

    pub fn compiler_name(&self) -> &str {
        &self.compiler_name
    }

    pub fn compiler_version(&self) -> CompilerVersion {
        self.compiler_version
    }

    pub fn optimizer(&self) -> OptimizerConfig {
        self.optimizer
    }

    pub fn evm_version(&self) -> Option<EvmVersion> {
        self.evm_version
    }

    /// Compiler `settings` object in standard JSON input shape.
    pub fn compiler_settings(&self) -> Value {
        let mut settings = json!({
            "optimizer": {
                "enabled": self.optimizer.enabled,
                "runs": self.optimizer.runs,
            }
        });
        if let (Some(evm_version), Value::Object(map)) = (self.evm_version, &mut settings) {
            map.insert(
                "evmVersion".to_string(),
                Value::String(evm_version.as_str().to_string()),
            );
        }
        settings
    }

    /// Fail with `UnsupportedVersion` unless the toolchain provides this version.
    pub fn ensure_available(&self, available: &[CompilerVersion]) -> Result<(), ConfigError> {
        if available.contains(&self.compiler_version) {
            return Ok(());
        }
        let available = available
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(ConfigError::UnsupportedVersion {
            version: self.compiler_version.to_string(),
            available: if available.is_empty() {
                "none".to_string()
            } else {
                available
            },
        })
    }
}

/// Builder for assembling a `CompilerConfig` in code.
#[derive(Debug, Clone)]
pub struct CompilerConfigBuilder {
    record: ProjectConfig,
}

impl CompilerConfigBuilder {
    /// Create a builder for `version` with the optimizer disabled.
    pub fn new(version: CompilerVersion) -> Self {
        Self {
            record: ProjectConfig {
                schema: None,
                contracts_build_directory: "./build/contracts".to_string(),
                compilers: CompilersConfig {
                    solc: SolcConfig {
                        version,
                        settings: SolcSettings::default(),
                    },
                },
            },
        }
    }

    /// Replace the artifact output directory.
    pub fn build_directory(mut self, path: impl Into<String>) -> Self {
        self.record.contracts_build_directory = path.into();
        self
    }

    /// Enable the optimizer with the given run count.
    pub fn optimize(mut self, runs: u32) -> Self {
        self.record.compilers.solc.settings.optimizer = OptimizerSettings {
            enabled: true,
            runs: Some(runs),
        };
        self
    }

    /// Target a specific EVM hard fork.
    pub fn evm_version(mut self, evm_version: EvmVersion) -> Self {
        self.record.compilers.solc.settings.evm_version = Some(evm_version);
        self
    }

    /// Validate and return the built `CompilerConfig`.
    pub fn build(self) -> Result<CompilerConfig, ConfigError> {
        self.record.resolve()
    }
}

/// Drop `.` components; `..` is kept since the directory may not exist yet.
fn normalize_build_directory(path: &Path) -> PathBuf {
    let normalized: PathBuf = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

fn malformed(path: &str, message: &str) -> ConfigError {
    ConfigError::MalformedConfig {
        path: format!("config:{path}"),
        message: message.to_string(),
    }
}

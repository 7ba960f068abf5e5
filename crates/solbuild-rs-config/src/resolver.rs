//! Single-record resolver.

use crate::{CompilerConfig, ConfigError};
use std::path::PathBuf;

/// Where the build record is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Record contents embedded by the caller.
    Inline(String),
    /// Record file on disk.
    Path(PathBuf),
}

/// Loads and validates exactly one build record.
///
/// The resolver never picks between alternative records itself; the caller
/// names the one source to use.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    source: ConfigSource,
}

impl ConfigResolver {
    pub fn new(source: ConfigSource) -> Self {
        Self { source }
    }

    /// Resolver for a record embedded in the calling program.
    pub fn inline(contents: impl Into<String>) -> Self {
        Self::new(ConfigSource::Inline(contents.into()))
    }

    /// Resolver for a record file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(ConfigSource::Path(path.into()))
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Parse and validate the record.
    ///
    /// Only syntactic validity is guaranteed; whether the toolchain provides
    /// the version is checked by [`CompilerConfig::ensure_available`].
    pub fn load(&self) -> Result<CompilerConfig, ConfigError> {
        match &self.source {
            ConfigSource::Inline(contents) => CompilerConfig::load_from_str(contents),
            ConfigSource::Path(path) => CompilerConfig::load_from_path(path),
        }
    }
}

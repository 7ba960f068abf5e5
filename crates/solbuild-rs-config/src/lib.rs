//! Compiler configuration models, validation and layered loading.
//!
//! This crate owns the build record schema (`contracts_build_directory` plus
//! the `compilers.solc` block), its validation, and the layer-merging logic
//! used to produce exactly one effective [`CompilerConfig`] per build.

mod error;
mod loader;
mod model;
mod resolver;
mod version;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
/// Single-record resolver.
pub use resolver::{ConfigResolver, ConfigSource};
/// Parsed compiler version.
pub use version::{CompilerVersion, InvalidVersion};

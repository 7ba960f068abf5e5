//! IO helpers for reading config layers from disk.

use super::{
    ConfigLayer, ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, LoadedLayer,
    SYSTEM_CONFIG_PATH, SYSTEM_REQUIREMENTS_PATH, SchemaMode, schema,
};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// JavaScript module wrapper the build record is commonly declared in.
const MODULE_EXPORTS: &str = "module.exports";

/// Load an optional layer if the provided path exists.
pub(super) fn load_optional_layer(
    source: ConfigLayerSource,
    path: Option<&Path>,
) -> Result<Option<LoadedLayer>, ConfigError> {
    let Some(path) = path else {
        return Ok(None);
    };

    if !path.exists() {
        debug!(
            "optional layer missing (source={}, path={})",
            source.name(),
            path.display()
        );
        return Ok(None);
    }

    Ok(Some(load_required_layer(source, path)?))
}

/// Load and partially validate a required layer from disk.
pub(super) fn load_required_layer(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<LoadedLayer, ConfigError> {
    debug!(
        "loading config layer (source={}, path={})",
        source.name(),
        path.display()
    );
    let contents = fs::read_to_string(path)?;
    let value = parse_record(&contents)?;
    schema::validate_layer_schema(&value, SchemaMode::Partial, &layer_label(source, path))?;
    Ok(LoadedLayer {
        meta: ConfigLayer {
            source,
            path: Some(path.to_path_buf()),
            disabled_reason: None,
        },
        value,
    })
}

/// Parse a record written as JSON5 or as `module.exports = { ... };`.
pub(super) fn parse_record(contents: &str) -> Result<Value, ConfigError> {
    let body = strip_module_exports(contents)?;
    Ok(json5::from_str(body)?)
}

/// Body of a `module.exports = <record>;` file, or `contents` unchanged when
/// the first statement is not that assignment.
fn strip_module_exports(contents: &str) -> Result<&str, ConfigError> {
    let mut head = skip_trivia(contents);
    while let Some(rest) = head
        .strip_prefix("'use strict'")
        .or_else(|| head.strip_prefix("\"use strict\""))
    {
        let rest = rest.trim_start();
        head = skip_trivia(rest.strip_prefix(';').unwrap_or(rest));
    }
    let Some(rest) = head.strip_prefix(MODULE_EXPORTS) else {
        return Ok(contents);
    };

    let Some(rest) = rest.trim_start().strip_prefix('=') else {
        return Err(wrapper_error("expected '=' after module.exports"));
    };
    let body = skip_trivia(rest);
    let Some(end) = record_end(body) else {
        return Err(wrapper_error(
            "module.exports must be assigned a complete object",
        ));
    };

    let mut tail = skip_trivia(&body[end..]);
    while let Some(rest) = tail.strip_prefix(';') {
        tail = skip_trivia(rest);
    }
    if !tail.is_empty() {
        return Err(wrapper_error("unexpected content after the exported record"));
    }
    Ok(&body[..end])
}

/// Skip whitespace plus `//` and `/* */` comments.
fn skip_trivia(mut text: &str) -> &str {
    loop {
        let trimmed = text.trim_start();
        if let Some(rest) = trimmed.strip_prefix("//") {
            text = rest.find('\n').map_or("", |idx| &rest[idx..]);
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            text = rest.find("*/").map_or("", |idx| &rest[idx + 2..]);
        } else {
            return trimmed;
        }
    }
}

/// Byte offset just past the object or array `body` starts with.
///
/// Brackets inside strings and comments are ignored.
fn record_end(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ if depth == 0 => return None,
            quote @ (b'"' | b'\'') => {
                idx += 1;
                while idx < bytes.len() && bytes[idx] != quote {
                    if bytes[idx] == b'\\' {
                        idx += 1;
                    }
                    idx += 1;
                }
            }
            b'/' if bytes.get(idx + 1) == Some(&b'/') => {
                idx = body[idx..].find('\n').map_or(bytes.len(), |n| idx + n);
                continue;
            }
            b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                idx = body[idx + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |n| idx + 2 + n + 2);
                continue;
            }
            _ => {}
        }
        idx += 1;
    }
    None
}

fn wrapper_error(message: &str) -> ConfigError {
    ConfigError::MalformedConfig {
        path: "config:root".to_string(),
        message: message.to_string(),
    }
}

/// Build a user-friendly label for schema validation errors.
pub(super) fn layer_label(source: ConfigLayerSource, path: &Path) -> String {
    format!("{}({})", source.name(), path.display())
}

/// Default system config path on Unix and Windows; None elsewhere.
pub(super) fn default_system_config_path() -> Option<PathBuf> {
    #[cfg(any(unix, windows))]
    {
        Some(PathBuf::from(SYSTEM_CONFIG_PATH))
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}

/// Default requirements path on Unix and Windows; None elsewhere.
pub(super) fn default_requirements_path() -> Option<PathBuf> {
    #[cfg(any(unix, windows))]
    {
        Some(PathBuf::from(SYSTEM_REQUIREMENTS_PATH))
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}

/// Default user config path under the home directory.
pub(super) fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}

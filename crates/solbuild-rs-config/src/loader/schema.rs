//! Schema validation for the build record.
//!
//! Runs on the raw JSON value before serde decoding so that every defect is
//! reported with the dotted path of the offending field.

use super::SchemaMode;
use crate::{CompilerVersion, ConfigError};
use serde_json::{Map, Value};

/// EVM targets accepted in `settings.evmVersion`.
const EVM_VERSIONS: &[&str] = &[
    "homestead",
    "tangerineWhistle",
    "spuriousDragon",
    "byzantium",
    "constantinople",
    "petersburg",
    "istanbul",
    "berlin",
    "london",
    "paris",
    "shanghai",
    "cancun",
    "prague",
];

/// Validate a single config layer (or the merged record) against the schema.
pub(super) fn validate_layer_schema(
    value: &Value,
    mode: SchemaMode,
    layer: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &["$schema", "contracts_build_directory", "compilers"],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = field(map, "contracts_build_directory", mode, layer, "")? {
        validate_build_directory(value, layer, "contracts_build_directory")?;
    }
    if let Some(value) = field(map, "compilers", mode, layer, "")? {
        validate_compilers(value, mode, layer, "compilers")?;
    }
    Ok(())
}

/// Validate the artifact output directory.
fn validate_build_directory(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Some(dir) = value.as_str() else {
        return Err(invalid_field(layer, path, "expected string"));
    };
    if dir.trim().is_empty() {
        return Err(invalid_field(layer, path, "build directory must not be empty"));
    }
    Ok(())
}

/// Validate the "compilers" block.
fn validate_compilers(
    value: &Value,
    mode: SchemaMode,
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["solc"], layer, path)?;

    if let Some(value) = field(map, "solc", mode, layer, path)? {
        validate_solc(value, mode, layer, &join_path(path, "solc"))?;
    }
    Ok(())
}

/// Validate the "compilers.solc" block.
fn validate_solc(
    value: &Value,
    mode: SchemaMode,
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["version", "settings"], layer, path)?;

    if let Some(value) = field(map, "version", mode, layer, path)? {
        validate_version(value, layer, &join_path(path, "version"))?;
    }
    if let Some(value) = field(map, "settings", mode, layer, path)? {
        validate_settings(value, mode, layer, &join_path(path, "settings"))?;
    }
    Ok(())
}

/// Validate a `MAJOR.MINOR.PATCH` version string.
fn validate_version(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Some(raw) = value.as_str() else {
        return Err(invalid_field(layer, path, "expected string"));
    };
    raw.parse::<CompilerVersion>()
        .map(|_| ())
        .map_err(|err| invalid_field(layer, path, &err.to_string()))
}

/// Validate compiler settings.
fn validate_settings(
    value: &Value,
    mode: SchemaMode,
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["optimizer", "evmVersion"], layer, path)?;

    if let Some(value) = field(map, "optimizer", mode, layer, path)? {
        validate_optimizer(value, mode, layer, &join_path(path, "optimizer"))?;
    }
    if let Some(value) = map.get("evmVersion") {
        validate_evm_version(value, layer, &join_path(path, "evmVersion"))?;
    }
    Ok(())
}

/// Validate the optimizer block; `runs` is required only when enabled.
fn validate_optimizer(
    value: &Value,
    mode: SchemaMode,
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["enabled", "runs"], layer, path)?;

    let enabled = match field(map, "enabled", mode, layer, path)? {
        Some(value) => {
            expect_bool(value, layer, &join_path(path, "enabled"))?;
            value.as_bool()
        }
        None => None,
    };
    // Parsed even when the optimizer is off.
    if let Some(value) = map.get("runs") {
        expect_u32(value, layer, &join_path(path, "runs"))?;
    } else if mode == SchemaMode::Full && enabled == Some(true) {
        return Err(invalid_field(
            layer,
            &join_path(path, "runs"),
            "missing required field",
        ));
    }
    Ok(())
}

/// Validate EVM target names.
fn validate_evm_version(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Some(name) = value.as_str() else {
        return Err(invalid_field(layer, path, "expected string"));
    };
    if EVM_VERSIONS.contains(&name) {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "unknown evm version"))
    }
}

/// Fetch `key`, failing in full mode when it is absent.
fn field<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    mode: SchemaMode,
    layer: &str,
    path: &str,
) -> Result<Option<&'a Value>, ConfigError> {
    match (map.get(key), mode) {
        (None, SchemaMode::Full) => Err(invalid_field(
            layer,
            &join_path(path, key),
            "missing required field",
        )),
        (value, _) => Ok(value),
    }
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a JSON boolean or return a typed error.
fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Expect a non-negative integer that fits in u32.
fn expect_u32(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value.as_u64() {
        Some(n) if u32::try_from(n).is_ok() => Ok(()),
        Some(_) => Err(invalid_field(layer, path, "integer out of range")),
        None => Err(invalid_field(layer, path, "expected non-negative integer")),
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

/// Join nested paths for error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured malformed-config error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let path = if path.is_empty() { "root" } else { path };
    ConfigError::MalformedConfig {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}

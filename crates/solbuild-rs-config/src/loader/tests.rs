//! Tests for single and layered configuration loading.

use super::*;
use crate::{CompilerVersion, EvmVersion, OptimizerConfig};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const RECORD: &str = r#"{
  contracts_build_directory: './build',
  compilers: {
    solc: {
      version: "0.5.16",
      settings: { optimizer: { enabled: true, runs: 1 } }
    }
  }
}"#;

/// Write contents to a path, creating parent directories if needed.
fn write_layer(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// A project directory with a `.git` marker and a `subdir` cwd.
fn project() -> (TempDir, PathBuf, PathBuf) {
    let temp = TempDir::new().expect("tmp");
    let project_root = temp.path().join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    (temp, project_root, cwd)
}

/// Options that ignore any system or user config on the test machine.
fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = None;
    options.user_config_path = None;
    options.requirements_path = None;
    options
}

fn malformed_path(err: &ConfigError) -> &str {
    match err {
        ConfigError::MalformedConfig { path, .. } => path,
        other => panic!("expected malformed config, got {other:?}"),
    }
}

#[test]
fn parse_minimal_record() {
    let config = CompilerConfig::load_from_str(RECORD).expect("config");
    assert_eq!(config.build_directory(), Path::new("build"));
    assert_eq!(config.compiler_name(), "solc");
    assert_eq!(config.compiler_version(), CompilerVersion::new(0, 5, 16));
    assert_eq!(
        config.optimizer(),
        OptimizerConfig {
            enabled: true,
            runs: 1
        }
    );
    assert_eq!(config.evm_version(), None);
}

#[test]
fn parse_evm_version() {
    let json5 = r#"{
      contracts_build_directory: "out",
      compilers: { solc: { version: "0.8.24", settings: {
        optimizer: { enabled: false },
        evmVersion: "cancun",
      } } },
    }"#;
    let config = CompilerConfig::load_from_str(json5).expect("config");
    assert_eq!(config.evm_version(), Some(EvmVersion::Cancun));
    assert!(!config.optimizer().enabled);
}

#[test]
fn rejects_unknown_top_level_key() {
    let json5 = RECORD.replacen('{', "{ networks: {},", 1);
    let err = CompilerConfig::load_from_str(&json5).unwrap_err();
    assert_eq!(malformed_path(&err), "config:networks");
    assert!(err.to_string().contains("unknown key"));
}

#[test]
fn rejects_unknown_compiler_backend() {
    let json5 = r#"{
      contracts_build_directory: "build",
      compilers: { vyper: {} },
    }"#;
    let err = CompilerConfig::load_from_str(json5).unwrap_err();
    assert_eq!(malformed_path(&err), "config:compilers.vyper");
}

#[test]
fn rejects_missing_fields() {
    let cases = [
        (
            r#"{ compilers: { solc: { version: "0.5.16", settings: { optimizer: { enabled: false } } } } }"#,
            "config:contracts_build_directory",
        ),
        (
            r#"{ contracts_build_directory: "b", compilers: { solc: { settings: { optimizer: { enabled: false } } } } }"#,
            "config:compilers.solc.version",
        ),
        (
            r#"{ contracts_build_directory: "b", compilers: { solc: { version: "0.5.16" } } }"#,
            "config:compilers.solc.settings",
        ),
        (
            r#"{ contracts_build_directory: "b", compilers: { solc: { version: "0.5.16", settings: { optimizer: { runs: 1 } } } } }"#,
            "config:compilers.solc.settings.optimizer.enabled",
        ),
        (
            r#"{ contracts_build_directory: "b", compilers: { solc: { version: "0.5.16", settings: { optimizer: { enabled: true } } } } }"#,
            "config:compilers.solc.settings.optimizer.runs",
        ),
    ];
    for (json5, expected) in cases {
        let err = CompilerConfig::load_from_str(json5).unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(malformed_path(&err), expected);
    }
}

#[test]
fn disabled_optimizer_still_parses_runs() {
    let json5 = RECORD.replace("enabled: true, runs: 1", "enabled: false, runs: \"many\"");
    let err = CompilerConfig::load_from_str(&json5).unwrap_err();
    assert_eq!(
        malformed_path(&err),
        "config:compilers.solc.settings.optimizer.runs"
    );

    let json5 = RECORD.replace("enabled: true, runs: 1", "enabled: false, runs: 5000");
    let config = CompilerConfig::load_from_str(&json5).expect("config");
    assert_eq!(
        config.optimizer(),
        OptimizerConfig {
            enabled: false,
            runs: 5000
        }
    );
}

#[test]
fn rejects_out_of_range_runs() {
    let json5 = RECORD.replace("runs: 1", "runs: 4294967296");
    let err = CompilerConfig::load_from_str(&json5).unwrap_err();
    assert!(err.to_string().contains("integer out of range"));
}

#[test]
fn rejects_unknown_evm_version() {
    let json5 = RECORD.replace("runs: 1 }", "runs: 1 }, evmVersion: \"frontier\"");
    let err = CompilerConfig::load_from_str(&json5).unwrap_err();
    assert_eq!(
        malformed_path(&err),
        "config:compilers.solc.settings.evmVersion"
    );
}

#[test]
fn syntax_errors_are_malformed() {
    let err = CompilerConfig::load_from_str("{ contracts_build_directory: ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseFailed(_)));
    assert!(err.is_malformed());
}

#[test]
fn missing_file_is_not_malformed() {
    let temp = TempDir::new().expect("tmp");
    let err = CompilerConfig::load_from_path(temp.path().join("absent.js")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
    assert!(!err.is_malformed());
}

#[test]
fn layered_config_prefers_repo_over_build_record() {
    let (temp, project_root, cwd) = project();
    let root = temp.path();

    let system_config = root.join("system.json5");
    write_layer(&system_config, RECORD);

    let user_config = root.join("user.json5");
    write_layer(&user_config, "{ contracts_build_directory: \"user\" }");

    write_layer(
        &project_root.join(PROJECT_CONFIG_FILE),
        "module.exports = { contracts_build_directory: './project' };",
    );
    write_layer(
        &cwd.join(PROJECT_CONFIG_FILE),
        "module.exports = { contracts_build_directory: './cwd' };",
    );
    write_layer(
        &project_root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
        "{ contracts_build_directory: \"repo\" }",
    );

    let mut options = isolated_options(&cwd);
    options.system_config_path = Some(system_config);
    options.user_config_path = Some(user_config);

    let layered = CompilerConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.build_directory(), Path::new("repo"));
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::System,
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Repo,
        ]
    );
    assert_eq!(
        layered.layers[2].disabled_reason.as_deref(),
        Some("shadowed by the build record in cwd")
    );
}

#[test]
fn layers_validate_partially_and_merge_fully() {
    let (temp, project_root, _cwd) = project();
    let system_config = temp.path().join("system.json5");
    write_layer(
        &system_config,
        "{ compilers: { solc: { settings: { optimizer: { enabled: true, runs: 200 } } } } }",
    );
    write_layer(
        &project_root.join(PROJECT_CONFIG_FILE),
        "module.exports = { contracts_build_directory: './build', compilers: { solc: { version: '0.5.17' } } };",
    );

    let mut options = isolated_options(&project_root);
    options.system_config_path = Some(system_config);

    let layered = CompilerConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(
        layered.config.compiler_version(),
        CompilerVersion::new(0, 5, 17)
    );
    assert_eq!(layered.config.optimizer().runs, 200);
    // Project root and cwd are the same directory; one build record slot.
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![ConfigLayerSource::System, ConfigLayerSource::Cwd]
    );
}

#[test]
fn cwd_build_record_is_not_merged_with_project_record() {
    let (_temp, project_root, cwd) = project();
    write_layer(&project_root.join(PROJECT_CONFIG_FILE), RECORD);
    write_layer(
        &cwd.join(PROJECT_CONFIG_FILE),
        "module.exports = { contracts_build_directory: './sub' };",
    );

    let err = CompilerConfig::load_layered_with_options(isolated_options(&cwd)).unwrap_err();
    assert_eq!(malformed_path(&err), "effective:compilers");
}

#[test]
fn project_record_used_when_cwd_has_none() {
    let (_temp, project_root, cwd) = project();
    write_layer(&project_root.join(PROJECT_CONFIG_FILE), RECORD);

    let layered = CompilerConfig::load_layered_with_options(isolated_options(&cwd)).expect("layered");
    assert_eq!(layered.config.build_directory(), Path::new("build"));
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::Project);
    assert_eq!(layered.layers[0].disabled_reason, None);
}

#[test]
fn merged_record_missing_fields_is_malformed() {
    let (_temp, project_root, _cwd) = project();
    write_layer(
        &project_root.join(PROJECT_CONFIG_FILE),
        "module.exports = { contracts_build_directory: './build' };",
    );
    let err = CompilerConfig::load_layered_with_options(isolated_options(&project_root))
        .unwrap_err();
    assert_eq!(malformed_path(&err), "effective:compilers");
}

#[test]
fn partial_layer_type_errors_name_the_layer() {
    let (temp, project_root, _cwd) = project();
    let runtime = temp.path().join("runtime.json5");
    write_layer(&runtime, "{ compilers: { solc: { version: 16 } } }");

    let options = isolated_options(&project_root).with_runtime_path(&runtime);
    let err = CompilerConfig::load_layered_with_options(options).unwrap_err();
    let path = malformed_path(&err);
    assert!(path.starts_with("runtime("), "{path}");
    assert!(path.ends_with(":compilers.solc.version"), "{path}");
}

#[test]
fn requirements_lock_overrides() {
    let (temp, _project_root, cwd) = project();
    let root = temp.path();

    let system_config = root.join("system.json5");
    write_layer(&system_config, RECORD);

    let requirements = root.join("requirements.json5");
    write_layer(
        &requirements,
        "{ compilers: { solc: { version: \"0.5.15\" } } }",
    );

    let runtime_config = root.join("runtime.json5");
    write_layer(
        &runtime_config,
        "{ compilers: { solc: { version: \"0.5.17\", settings: { optimizer: { enabled: true, runs: 999 } } } } }",
    );

    let mut options = isolated_options(&cwd).with_requirements_path(&requirements);
    options.system_config_path = Some(system_config);
    options.runtime_paths = vec![runtime_config];

    let layered = CompilerConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(
        layered.config.compiler_version(),
        CompilerVersion::new(0, 5, 15)
    );
    assert_eq!(layered.config.optimizer().runs, 999);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::Requirements);
}

#[test]
fn runtime_override_wins_without_constraints() {
    let (temp, _project_root, cwd) = project();
    let system_config = temp.path().join("system.json5");
    write_layer(&system_config, RECORD);

    let runtime_config = temp.path().join("runtime.json5");
    write_layer(&runtime_config, "{ contracts_build_directory: \"dist\" }");

    let mut options = isolated_options(&cwd).with_runtime_path(&runtime_config);
    options.system_config_path = Some(system_config);

    let layered = CompilerConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.build_directory(), Path::new("dist"));
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let (temp, _project_root, cwd) = project();
    let options = isolated_options(&cwd).with_runtime_path(temp.path().join("missing.json5"));
    let err = CompilerConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

#[test]
fn no_layers_found_is_malformed() {
    let (_temp, _project_root, cwd) = project();
    let err = CompilerConfig::load_layered_with_options(isolated_options(&cwd)).unwrap_err();
    assert!(err.is_malformed());
    assert!(err.to_string().contains("no configuration layers found"));
}

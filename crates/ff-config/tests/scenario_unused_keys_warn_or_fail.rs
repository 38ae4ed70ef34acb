//! Unused-key guard.
//!
//! 1) Unused keys are reported in WARN mode without error.
//! 2) Unused keys fail in FAIL mode.
//! 3) Keys under consumed prefixes are not flagged.
//! 4) The shipped base config is clean for the daemon surface.

use ff_config::{
    load_layered_yaml, load_layered_yaml_from_strings, report_unused_keys, ConfigSurface,
    UnusedKeyPolicy,
};

const YAML: &str = r#"
auth:
  token_ttl_seconds: 600
maps:
  language: "fr"
leftovers:
  foo: 123
  bar: 456
"#;

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report =
        report_unused_keys(ConfigSurface::Daemon, &loaded.config_json, UnusedKeyPolicy::Warn)
            .expect("warn mode must not error");

    assert!(!report.is_clean());
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/leftovers/bar".to_string(), "/leftovers/foo".to_string()]
    );
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(ConfigSurface::Daemon, &loaded.config_json, UnusedKeyPolicy::Fail)
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "got: {msg}");
    assert!(msg.contains("surface=DAEMON"), "got: {msg}");
}

#[test]
fn server_section_is_unused_by_cli() {
    let loaded = load_layered_yaml_from_strings(&["server:\n  addr: \"0.0.0.0:9000\"\n"]).unwrap();
    let cli = report_unused_keys(ConfigSurface::Cli, &loaded.config_json, UnusedKeyPolicy::Warn)
        .unwrap();
    assert_eq!(cli.unused_leaf_pointers, vec!["/server/addr".to_string()]);

    let daemon =
        report_unused_keys(ConfigSurface::Daemon, &loaded.config_json, UnusedKeyPolicy::Fail)
            .unwrap();
    assert!(daemon.is_clean());
}

#[test]
fn shipped_base_config_is_clean_for_daemon() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("base.yaml");
    let path = path.to_string_lossy().to_string();
    let loaded = load_layered_yaml(&[path.as_str()]).unwrap();
    report_unused_keys(ConfigSurface::Daemon, &loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    ff_config::PlatformConfig::from_json(&loaded.config_json).unwrap();
}

//! Config hash stability.
//!
//! GREEN when:
//! - the same inputs hash identically across calls
//! - key order inside YAML does not change the hash
//! - different values produce different hashes
//! - layering order matters (later layers win)

use ff_config::{load_layered_yaml, load_layered_yaml_from_strings};
use std::io::Write;

const BASE_YAML: &str = r#"
auth:
  jwt_secret_env: "FF_JWT_SECRET"
  token_ttl_seconds: 3600
restaurant:
  name: "FoodFleet Kitchen"
  city: "Bruz"
"#;

const BASE_YAML_REORDERED: &str = r#"
restaurant:
  city: "Bruz"
  name: "FoodFleet Kitchen"
auth:
  token_ttl_seconds: 3600
  jwt_secret_env: "FF_JWT_SECRET"
"#;

const OVERLAY_YAML: &str = r#"
auth:
  token_ttl_seconds: 600
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
    assert_eq!(a.config_hash.len(), 64, "sha256 hex is 64 chars");
}

#[test]
fn key_order_does_not_change_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_changes_hash_and_value() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let layered = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(base.config_hash, layered.config_hash);
    assert_eq!(layered.config_json["auth"]["token_ttl_seconds"], 600);
    assert_eq!(layered.config_json["auth"]["jwt_secret_env"], "FF_JWT_SECRET");
}

#[test]
fn layer_order_matters() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[OVERLAY_YAML, BASE_YAML]).unwrap();
    assert_eq!(b.config_json["auth"]["token_ttl_seconds"], 3600);
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn file_layers_match_string_layers() {
    let mut base = tempfile::NamedTempFile::new().unwrap();
    base.write_all(BASE_YAML.as_bytes()).unwrap();
    let mut overlay = tempfile::NamedTempFile::new().unwrap();
    overlay.write_all(OVERLAY_YAML.as_bytes()).unwrap();

    let base_path = base.path().to_string_lossy().to_string();
    let overlay_path = overlay.path().to_string_lossy().to_string();

    let from_files = load_layered_yaml(&[base_path.as_str(), overlay_path.as_str()]).unwrap();
    let from_strings = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_eq!(from_files.config_hash, from_strings.config_hash);
}

#[test]
fn missing_file_reports_path() {
    let err = load_layered_yaml(&["/definitely/not/here/base.yaml"]).unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here/base.yaml"));
}

#[test]
fn secret_literal_is_rejected_without_echoing_value() {
    let yaml = r#"
maps:
  api_key_env: "AIzaSyTHIS_LOOKS_LIKE_A_REAL_KEY"
"#;
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_SECRET_DETECTED"), "got: {msg}");
    assert!(msg.contains("/maps/api_key_env"), "got: {msg}");
    assert!(!msg.contains("AIzaSy"), "value must be redacted: {msg}");
}

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

pub mod platform;
pub mod secrets;

pub use platform::{
    AuthConfig, MapsConfig, OrdersConfig, PasswordPolicyConfig, PlatformConfig, RestaurantConfig,
    ServerConfig,
};

/// Env var holding a comma-separated list of YAML layers, in merge order.
pub const ENV_CONFIG_PATHS: &str = "FF_CONFIG";

/// Layer loaded when `FF_CONFIG` is unset and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "config/base.yaml";

/// Known secret-like prefixes. If any leaf string value in the effective
/// config starts with one of these, loading aborts with CONFIG_SECRET_DETECTED.
/// Config stores env var NAMES for secrets, never values.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // Stripe / OpenAI style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "AIza",       // Google API key
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "eyJ",        // serialized JWT / JWK
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
];

/// Which binary surface is reading the config.
///
/// Consumers choose whether unused keys are warnings or errors by calling
/// `report_unused_keys(surface, &config_json, UnusedKeyPolicy::Warn|Fail)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSurface {
    /// REST daemon.
    Daemon,
    /// Authenticated CLI commands.
    Cli,
    /// DB / config maintenance commands (no secrets needed).
    Maintenance,
}

impl ConfigSurface {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSurface::Daemon => "DAEMON",
            ConfigSurface::Cli => "CLI",
            ConfigSurface::Maintenance => "MAINTENANCE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub surface: String,
    /// Consumed JSON-pointer prefixes used for this analysis (sorted, unique)
    pub consumed_prefixes: Vec<String>,
    /// Unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Registry of consumed JSON-pointer prefixes per surface.
///
/// Must only list what the code actually reads on that surface.
pub fn consumed_pointers_for_surface(surface: ConfigSurface) -> &'static [&'static str] {
    match surface {
        ConfigSurface::Daemon => &[
            "/server",
            "/auth",
            "/password_policy",
            "/restaurant",
            "/maps",
            "/orders",
        ],

        ConfigSurface::Cli => &[
            "/auth",
            "/password_policy",
            "/restaurant",
            "/maps",
            "/orders",
        ],

        ConfigSurface::Maintenance => &["/server"],
    }
}

/// Produce an unused-key report for a given surface.
/// If `policy == Fail`, returns an error when unused keys exist.
/// If `policy == Warn`, always returns Ok(report).
pub fn report_unused_keys(
    surface: ConfigSurface,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let mut consumed: BTreeSet<String> = BTreeSet::new();
    for p in consumed_pointers_for_surface(surface) {
        consumed.insert(normalize_pointer(p));
    }
    let consumed_prefixes: Vec<String> = consumed.iter().cloned().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = Vec::new();
    'leaf: for lp in leaves {
        for cp in &consumed_prefixes {
            if is_prefix_pointer(cp, &lp) {
                continue 'leaf;
            }
        }
        unused.push(lp);
    }

    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        surface: surface.as_str().to_string(),
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS (surface={}): {} unused config leaf key(s) detected. \
            Remove them or update the consumed registry. First few: {}",
            report.surface,
            report.unused_leaf_pointers.len(),
            preview_list(&report.unused_leaf_pointers, 12)
        );
    }

    Ok(report)
}

/// Normalize JSON pointer:
/// - must begin with "/"
/// - no trailing "/" unless it's just "/"
fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

/// Return true if `prefix` is a JSON-pointer prefix of `leaf`.
/// "/a/b" consumes "/a/b/c" but NOT "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.starts_with(prefix)
        && leaf
            .get(prefix.len()..prefix.len() + 1)
            .map(|c| c == "/")
            .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{:?}", take)
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    // Earlier docs are base, later docs override.
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // An empty YAML document decodes to null; treat it as an empty layer.
        if v_json.is_null() {
            continue;
        }
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Resolve the layer list from `FF_CONFIG` (comma-separated), falling back to
/// `config/base.yaml` when present, and to an empty config otherwise.
pub fn load_from_env() -> Result<LoadedConfig> {
    match std::env::var(ENV_CONFIG_PATHS) {
        Ok(raw) if !raw.trim().is_empty() => {
            let paths: Vec<&str> = raw
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            load_layered_yaml(&paths)
        }
        _ => {
            if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
                load_layered_yaml(&[DEFAULT_CONFIG_PATH])
            } else {
                load_layered_yaml_from_strings(&[])
            }
        }
    }
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's default Map is a BTreeMap, so keys serialize sorted and
    // key order in the YAML source does not affect the hash.
    let s = serde_json::to_string(v).context("canonical json serialize failed")?;
    Ok(s)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(val) = v.pointer(&ptr) {
            if let Some(s) = val.as_str() {
                if looks_like_secret(s) {
                    bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
                }
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pointer_respects_segment_boundary() {
        assert!(is_prefix_pointer("/maps", "/maps/base_url"));
        assert!(is_prefix_pointer("/maps", "/maps"));
        assert!(!is_prefix_pointer("/maps", "/mapsx/base_url"));
        assert!(is_prefix_pointer("/", "/anything"));
    }

    #[test]
    fn normalize_pointer_adds_slash_and_trims() {
        assert_eq!(normalize_pointer("auth/"), "/auth");
        assert_eq!(normalize_pointer(""), "/");
        assert_eq!(normalize_pointer("///"), "/");
    }

    #[test]
    fn later_layers_override_earlier_ones() {
        let loaded = load_layered_yaml_from_strings(&[
            "auth:\n  token_ttl_seconds: 60\n  issuer: a\n",
            "auth:\n  token_ttl_seconds: 120\n",
        ])
        .unwrap();
        assert_eq!(loaded.config_json["auth"]["token_ttl_seconds"], 120);
        assert_eq!(loaded.config_json["auth"]["issuer"], "a");
    }

    #[test]
    fn empty_layers_are_ignored() {
        let loaded = load_layered_yaml_from_strings(&["", "server:\n  addr: x\n"]).unwrap();
        assert_eq!(loaded.config_json["server"]["addr"], "x");
    }
}

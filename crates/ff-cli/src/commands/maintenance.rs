//! `ff db ...` and `ff config ...`: no token, no secrets.

use anyhow::{bail, Result};
use ff_config::{report_unused_keys, ConfigSurface, PlatformConfig, UnusedKeyPolicy};

pub async fn db_status() -> Result<()> {
    let pool = ff_db::connect_from_env().await?;
    let s = ff_db::status(&pool).await?;
    println!("db_ok={} has_orders_table={}", s.ok, s.has_orders_table);
    Ok(())
}

pub async fn db_migrate() -> Result<()> {
    let pool = ff_db::connect_from_env().await?;
    ff_db::migrate(&pool).await?;
    println!("migrations_applied=true");
    Ok(())
}

pub fn config_hash(paths: &[String]) -> Result<()> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = ff_config::load_layered_yaml(&path_refs)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}

fn parse_surface(s: &str) -> Result<ConfigSurface> {
    match s.trim().to_ascii_lowercase().as_str() {
        "daemon" => Ok(ConfigSurface::Daemon),
        "cli" => Ok(ConfigSurface::Cli),
        "maintenance" => Ok(ConfigSurface::Maintenance),
        other => bail!(
            "invalid --surface '{}'. expected one of: daemon | cli | maintenance",
            other
        ),
    }
}

pub fn config_check(paths: &[String], surface: &str, strict: bool) -> Result<()> {
    let surface = parse_surface(surface)?;
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = ff_config::load_layered_yaml(&path_refs)?;
    PlatformConfig::from_json(&loaded.config_json)?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(surface, &loaded.config_json, policy)?;

    println!("config_hash={}", loaded.config_hash);
    println!("surface={}", surface.as_str());
    println!("unused_keys={}", report.unused_leaf_pointers.len());
    for p in &report.unused_leaf_pointers {
        println!("unused={}", p);
    }
    Ok(())
}

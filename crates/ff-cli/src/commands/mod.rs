//! Command handlers for `ff`.
//!
//! Shared bootstrap, argument parsers and `key=value` printers live here.
//! Command-specific logic lives in the submodules.

pub mod account;
pub mod delivery;
pub mod maintenance;
pub mod shop;

use anyhow::{Context, Result};
use ff_config::{report_unused_keys, secrets::resolve_secrets, ConfigSurface, PlatformConfig, UnusedKeyPolicy};
use ff_schemas::{format_cents, ItemRequest, Order, OrderStatus, Product, Role, User, Vehicle};
use ff_service::{Actor, Platform, ServiceError};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Config, secrets, pool, platform. Unused config keys only warn here.
pub async fn platform() -> Result<Platform> {
    let loaded = ff_config::load_from_env().context("load config")?;
    let report = report_unused_keys(ConfigSurface::Cli, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        tracing::warn!(unused = ?report.unused_leaf_pointers, "config keys not consumed by the cli");
    }
    let config = PlatformConfig::from_json(&loaded.config_json)?;
    let secrets = resolve_secrets(&loaded.config_json, ConfigSurface::Cli)?;
    let pool = ff_db::connect_from_env().await?;
    Platform::from_secrets(pool, config, &secrets)
}

/// Fails before any I/O when no token was given.
pub fn require_token(token: Option<&str>) -> Result<&str> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .context("this command needs a token: pass --token or set FF_TOKEN (see `ff auth login`)")
}

/// Platform plus the verified caller.
pub async fn session(token: Option<&str>) -> Result<(Platform, Actor)> {
    let token = require_token(token)?;
    let p = platform().await?;
    let actor = p.authenticate(token).map_err(svc)?;
    Ok((p, actor))
}

/// Prefix service errors with their stable code.
pub fn svc(e: ServiceError) -> anyhow::Error {
    anyhow::anyhow!("{}: {}", e.code(), e)
}

// ---------------------------------------------------------------------------
// clap value parsers
// ---------------------------------------------------------------------------

pub fn parse_price(s: &str) -> std::result::Result<i64, String> {
    ff_schemas::parse_cents(s).map_err(|e| e.to_string())
}

/// `<uuid>` or `<uuid>:<qty>`.
pub fn parse_item(s: &str) -> std::result::Result<ItemRequest, String> {
    let (id, qty) = match s.split_once(':') {
        Some((id, q)) => (
            id,
            q.trim()
                .parse::<i32>()
                .map_err(|_| format!("invalid quantity in '{s}'"))?,
        ),
        None => (s, 1),
    };
    let product_id = Uuid::parse_str(id.trim()).map_err(|_| format!("invalid product id in '{s}'"))?;
    Ok(ItemRequest {
        product_id,
        quantity: qty,
    })
}

pub fn parse_status(s: &str) -> std::result::Result<OrderStatus, String> {
    OrderStatus::parse(s).map_err(|e| e.to_string())
}

pub fn parse_role(s: &str) -> std::result::Result<Role, String> {
    Role::parse(s).map_err(|e| e.to_string())
}

pub fn parse_vehicle(s: &str) -> std::result::Result<Vehicle, String> {
    Vehicle::parse(s).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

pub fn print_user(u: &User) {
    println!("user_id={}", u.user_id);
    println!("username={}", u.username);
    println!("role={}", u.role.as_str());
    println!("first_name={}", u.first_name);
    println!("last_name={}", u.last_name);
    println!("email={}", u.email);
    println!("created_at_utc={}", u.created_at_utc.to_rfc3339());
}

pub fn user_row(u: &User) -> String {
    format!(
        "user_id={} username={} role={} email={}",
        u.user_id,
        u.username,
        u.role.as_str(),
        u.email
    )
}

pub fn print_product(p: &Product) {
    println!("product_id={}", p.product_id);
    println!("name={}", p.name);
    println!("type={}", p.product_type);
    println!("description={}", p.description);
    println!("price={}", format_cents(p.price_cents));
    println!("stock={}", p.stock);
    println!("available={}", p.is_available);
}

pub fn product_row(p: &Product) -> String {
    format!(
        "product_id={} name=\"{}\" price={} stock={} available={}",
        p.product_id,
        p.name,
        format_cents(p.price_cents),
        p.stock,
        p.is_available
    )
}

pub fn print_order(o: &Order) {
    println!("order_id={}", o.order_id);
    println!("status={}", o.status.as_str());
    println!("customer_id={}", o.customer_id);
    println!(
        "driver_id={}",
        o.driver_id.map(|d| d.to_string()).unwrap_or_default()
    );
    println!("address={}", o.address.one_line());
    println!("nb_items={}", o.nb_items);
    println!("total={}", format_cents(o.total_cents));
    for l in &o.lines {
        println!(
            "line product_id={} name=\"{}\" qty={} unit={} total={}",
            l.product_id,
            l.product_name,
            l.quantity,
            format_cents(l.unit_price_cents),
            format_cents(l.line_total_cents)
        );
    }
}

pub fn order_row(o: &Order) -> String {
    format!(
        "order_id={} status={} nb_items={} total={} address=\"{}\"",
        o.order_id,
        o.status.as_str(),
        o.nb_items,
        format_cents(o.total_cents),
        o.address.one_line()
    )
}

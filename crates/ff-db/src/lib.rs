use anyhow::{Context, Result};
use ff_orders::{StockError, TransitionError};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

mod addresses;
mod orders;
mod products;
mod users;

pub use addresses::{fetch_address, find_or_insert_address};
pub use orders::{
    add_order_item, create_order, fetch_order, list_orders, list_orders_for_customer,
    list_orders_for_driver, remove_order_item, transition_order,
};
pub use products::{
    delete_product, fetch_product, insert_product, list_products, restock_product,
    update_product, NewProduct, ProductPatch, ProductRemoval,
};
pub use users::{
    delete_user, fetch_credentials, fetch_driver_vehicle, fetch_user, fetch_user_by_username,
    insert_user, list_users, set_driver_vehicle, update_password, update_user_profile,
    Credentials, NewUser, ProfilePatch,
};

pub const ENV_DB_URL: &str = "FF_DATABASE_URL";

/// Connect to Postgres using FF_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL)
        .with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

pub async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Connectivity + schema presence.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='orders'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_orders_table: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_orders_table: bool,
}

/// Errors callers branch on. Plain I/O failures stay in `Sqlx`.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Decode(String),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

impl DbError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Postgres unique_violation (23505), optionally for a named constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: Option<&str>) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && constraint.map_or(true, |c| db_err.constraint() == Some(c))
        }
        _ => false,
    }
}

/// Postgres foreign_key_violation (23503).
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23503"),
        _ => false,
    }
}

use chrono::Utc;
use ff_orders::{release, reserve, StockError};
use ff_schemas::Product;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{DbError, DbResult};

const PRODUCT_COLUMNS: &str =
    "product_id, name, description, product_type, price_cents, stock, is_available, created_at_utc";

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub product_type: String,
    pub price_cents: i64,
    pub stock: i32,
    pub is_available: bool,
}

/// `None` leaves the column unchanged. Stock moves only through
/// [`restock_product`] and order operations.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub product_type: Option<String>,
    pub price_cents: Option<i64>,
    pub is_available: Option<bool>,
}

/// Outcome of [`delete_product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductRemoval {
    /// Row removed.
    Deleted,
    /// Still referenced by past orders: hidden from the catalogue and
    /// emptied instead of removed.
    Retired,
}

impl ProductRemoval {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductRemoval::Deleted => "DELETED",
            ProductRemoval::Retired => "RETIRED",
        }
    }
}

pub(crate) fn product_from_row(row: &PgRow) -> DbResult<Product> {
    Ok(Product {
        product_id: row.try_get("product_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        product_type: row.try_get("product_type")?,
        price_cents: row.try_get("price_cents")?,
        stock: row.try_get("stock")?,
        is_available: row.try_get("is_available")?,
        created_at_utc: row.try_get("created_at_utc")?,
    })
}

pub async fn insert_product(pool: &PgPool, new: &NewProduct) -> DbResult<Product> {
    let sql = format!(
        r#"
        insert into products (
          product_id, name, description, product_type, price_cents, stock, is_available, created_at_utc
        ) values (
          $1, $2, $3, $4, $5, $6, $7, $8
        )
        returning {PRODUCT_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(Uuid::new_v4())
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(&new.product_type)
        .bind(new.price_cents)
        .bind(new.stock)
        .bind(new.is_available)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
    let product = product_from_row(&row)?;
    tracing::info!(product_id = %product.product_id, stock = product.stock, "product created");
    Ok(product)
}

pub async fn fetch_product(pool: &PgPool, product_id: Uuid) -> DbResult<Product> {
    let sql = format!("select {PRODUCT_COLUMNS} from products where product_id = $1");
    let row = sqlx::query(&sql)
        .bind(product_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::not_found("product", product_id))?;
    product_from_row(&row)
}

pub async fn list_products(pool: &PgPool, only_available: bool) -> DbResult<Vec<Product>> {
    let sql = format!(
        "select {PRODUCT_COLUMNS} from products \
         where (not $1 or is_available) \
         order by product_type, name"
    );
    let rows = sqlx::query(&sql).bind(only_available).fetch_all(pool).await?;
    rows.iter().map(product_from_row).collect()
}

pub async fn update_product(
    pool: &PgPool,
    product_id: Uuid,
    patch: &ProductPatch,
) -> DbResult<Product> {
    let sql = format!(
        r#"
        update products
        set name         = coalesce($2, name),
            description  = coalesce($3, description),
            product_type = coalesce($4, product_type),
            price_cents  = coalesce($5, price_cents),
            is_available = coalesce($6, is_available)
        where product_id = $1
        returning {PRODUCT_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(product_id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(patch.description.as_deref())
        .bind(patch.product_type.as_deref())
        .bind(patch.price_cents)
        .bind(patch.is_available)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::not_found("product", product_id))?;
    product_from_row(&row)
}

/// Adjust stock by `delta` (positive adds, negative withdraws). Stock never
/// drops below zero.
pub async fn restock_product(pool: &PgPool, product_id: Uuid, delta: i32) -> DbResult<Product> {
    let mut tx = pool.begin().await?;

    let (stock,): (i32,) =
        sqlx::query_as::<_, (i32,)>("select stock from products where product_id = $1 for update")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("product", product_id))?;

    let new_stock = match delta {
        0 => return Err(StockError::NonPositiveQuantity(0).into()),
        d if d > 0 => release(stock, d)?,
        d => reserve(stock, d.checked_neg().ok_or(StockError::Overflow("delta"))?)?,
    };

    let sql = format!(
        "update products set stock = $2 where product_id = $1 returning {PRODUCT_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(product_id)
        .bind(new_stock)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(product_id = %product_id, delta, stock = new_stock, "product restocked");
    product_from_row(&row)
}

/// Refused while an open order (Preparing, Ready, On the way) holds the product.
pub async fn delete_product(pool: &PgPool, product_id: Uuid) -> DbResult<ProductRemoval> {
    let mut tx = pool.begin().await?;

    sqlx::query("select 1 from products where product_id = $1 for update")
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("product", product_id))?;

    let (open, any): (bool, bool) = sqlx::query_as::<_, (bool, bool)>(
        r#"
        select
          exists (
            select 1 from order_lines l
            join orders o on o.order_id = l.order_id
            where l.product_id = $1
              and o.status in ('PREPARING','READY','ON_THE_WAY')
          ),
          exists (select 1 from order_lines where product_id = $1)
        "#,
    )
    .bind(product_id)
    .fetch_one(&mut *tx)
    .await?;

    if open {
        return Err(DbError::Conflict(format!(
            "product {product_id} is held by an open order"
        )));
    }

    let outcome = if any {
        sqlx::query("update products set is_available = false, stock = 0 where product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        ProductRemoval::Retired
    } else {
        sqlx::query("delete from products where product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        ProductRemoval::Deleted
    };
    tx.commit().await?;

    tracing::info!(product_id = %product_id, outcome = outcome.as_str(), "product removed");
    Ok(outcome)
}

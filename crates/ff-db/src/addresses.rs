use ff_schemas::{Address, AddressInput};
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};
use uuid::Uuid;

use crate::{DbError, DbResult};

pub(crate) fn address_from_row(row: &PgRow) -> DbResult<Address> {
    Ok(Address {
        address_id: row.try_get("address_id")?,
        street: row.try_get("street")?,
        postal_code: row.try_get("postal_code")?,
        city: row.try_get("city")?,
    })
}

/// Addresses are deduplicated on (street, postal_code, city) after trimming.
pub async fn find_or_insert_address<'e, E>(exec: E, input: &AddressInput) -> DbResult<Address>
where
    E: PgExecutor<'e>,
{
    // The no-op update makes `returning` yield the existing row on conflict.
    let row = sqlx::query(
        r#"
        insert into addresses (address_id, street, postal_code, city)
        values ($1, $2, $3, $4)
        on conflict on constraint uq_addresses_line
        do update set street = excluded.street
        returning address_id, street, postal_code, city
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.street.trim())
    .bind(input.postal_code.trim())
    .bind(input.city.trim())
    .fetch_one(exec)
    .await?;
    address_from_row(&row)
}

pub async fn fetch_address<'e, E>(exec: E, address_id: Uuid) -> DbResult<Address>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query(
        "select address_id, street, postal_code, city from addresses where address_id = $1",
    )
    .bind(address_id)
    .fetch_optional(exec)
    .await?
    .ok_or_else(|| DbError::not_found("address", address_id))?;
    address_from_row(&row)
}

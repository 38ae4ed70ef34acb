use chrono::Utc;
use ff_schemas::{Role, User, Vehicle};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{is_foreign_key_violation, is_unique_violation, DbError, DbResult};

const USER_COLUMNS: &str =
    "user_id, username, first_name, last_name, email, role, created_at_utc";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub salt: String,
    /// Only read for drivers; defaults to CAR.
    pub vehicle: Option<Vehicle>,
}

/// Stored login material for one account.
#[derive(Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
    pub salt: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password_hash", &"<REDACTED>")
            .field("salt", &"<REDACTED>")
            .finish()
    }
}

/// `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

fn role_table(role: Role) -> &'static str {
    match role {
        Role::Admin => "admins",
        Role::Customer => "customers",
        Role::Driver => "drivers",
    }
}

pub(crate) fn user_from_row(row: &PgRow) -> DbResult<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        role: Role::parse(&role).map_err(|e| DbError::Decode(e.to_string()))?,
        created_at_utc: row.try_get("created_at_utc")?,
    })
}

/// Insert the account and its role row atomically.
pub async fn insert_user(pool: &PgPool, new: &NewUser) -> DbResult<User> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let res = sqlx::query(
        r#"
        insert into users (
          user_id, username, first_name, last_name, email, role, password_hash, salt, created_at_utc
        ) values (
          $1, $2, $3, $4, $5, $6, $7, $8, $9
        )
        "#,
    )
    .bind(new.user_id)
    .bind(&new.username)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.email)
    .bind(new.role.as_str())
    .bind(&new.password_hash)
    .bind(&new.salt)
    .bind(now)
    .execute(&mut *tx)
    .await;

    if let Err(e) = res {
        if is_unique_violation(&e, Some("uq_users_username")) {
            return Err(DbError::Conflict(format!(
                "username '{}' is already taken",
                new.username
            )));
        }
        return Err(e.into());
    }

    match new.role {
        Role::Driver => {
            sqlx::query("insert into drivers (user_id, vehicle) values ($1, $2)")
                .bind(new.user_id)
                .bind(new.vehicle.unwrap_or(Vehicle::Car).as_str())
                .execute(&mut *tx)
                .await?;
        }
        role => {
            let sql = format!("insert into {} (user_id) values ($1)", role_table(role));
            sqlx::query(&sql).bind(new.user_id).execute(&mut *tx).await?;
        }
    }

    tx.commit().await?;

    tracing::info!(user_id = %new.user_id, role = new.role.as_str(), "user created");

    Ok(User {
        user_id: new.user_id,
        username: new.username.clone(),
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        email: new.email.clone(),
        role: new.role,
        created_at_utc: now,
    })
}

pub async fn fetch_user(pool: &PgPool, user_id: Uuid) -> DbResult<User> {
    let sql = format!("select {USER_COLUMNS} from users where user_id = $1");
    let row = sqlx::query(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", user_id))?;
    user_from_row(&row)
}

pub async fn fetch_user_by_username(pool: &PgPool, username: &str) -> DbResult<User> {
    let sql = format!("select {USER_COLUMNS} from users where username = $1");
    let row = sqlx::query(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", username))?;
    user_from_row(&row)
}

/// `Ok(None)` for an unknown username.
pub async fn fetch_credentials(pool: &PgPool, username: &str) -> DbResult<Option<Credentials>> {
    let sql = format!("select {USER_COLUMNS}, password_hash, salt from users where username = $1");
    let Some(row) = sqlx::query(&sql).bind(username).fetch_optional(pool).await? else {
        return Ok(None);
    };
    Ok(Some(Credentials {
        user: user_from_row(&row)?,
        password_hash: row.try_get("password_hash")?,
        salt: row.try_get("salt")?,
    }))
}

pub async fn list_users(pool: &PgPool, role: Option<Role>) -> DbResult<Vec<User>> {
    let sql = format!(
        "select {USER_COLUMNS} from users \
         where ($1::text is null or role = $1) \
         order by username"
    );
    let rows = sqlx::query(&sql)
        .bind(role.map(|r| r.as_str()))
        .fetch_all(pool)
        .await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn update_user_profile(
    pool: &PgPool,
    user_id: Uuid,
    patch: &ProfilePatch,
) -> DbResult<User> {
    let sql = format!(
        r#"
        update users
        set first_name = coalesce($2, first_name),
            last_name  = coalesce($3, last_name),
            email      = coalesce($4, email)
        where user_id = $1
        returning {USER_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .bind(patch.email.as_deref())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", user_id))?;
    user_from_row(&row)
}

pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
    salt: &str,
) -> DbResult<()> {
    let res = sqlx::query("update users set password_hash = $2, salt = $3 where user_id = $1")
        .bind(user_id)
        .bind(password_hash)
        .bind(salt)
        .execute(pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(DbError::not_found("user", user_id));
    }
    Ok(())
}

/// Accounts referenced by orders cannot be removed.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> DbResult<()> {
    let res = sqlx::query("delete from users where user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await;
    match res {
        Ok(r) if r.rows_affected() == 0 => Err(DbError::not_found("user", user_id)),
        Ok(_) => {
            tracing::info!(user_id = %user_id, "user deleted");
            Ok(())
        }
        Err(e) if is_foreign_key_violation(&e) => Err(DbError::Conflict(format!(
            "user {user_id} is referenced by existing orders"
        ))),
        Err(e) => Err(e.into()),
    }
}

pub async fn set_driver_vehicle(pool: &PgPool, user_id: Uuid, vehicle: Vehicle) -> DbResult<()> {
    let res = sqlx::query("update drivers set vehicle = $2 where user_id = $1")
        .bind(user_id)
        .bind(vehicle.as_str())
        .execute(pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(DbError::not_found("driver", user_id));
    }
    Ok(())
}

pub async fn fetch_driver_vehicle(pool: &PgPool, user_id: Uuid) -> DbResult<Vehicle> {
    let (raw,): (String,) =
        sqlx::query_as::<_, (String,)>("select vehicle from drivers where user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::not_found("driver", user_id))?;
    Vehicle::parse(&raw).map_err(|e| DbError::Decode(e.to_string()))
}

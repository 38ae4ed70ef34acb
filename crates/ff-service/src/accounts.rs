use ff_auth::{generate_salt, hash_password, verify_password};
use ff_db::{NewUser, ProfilePatch};
use ff_schemas::{Role, User, Vehicle};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{validate, Actor, Platform, ServiceError, ServiceResult};

/// Self-service sign-up. Always creates a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Admin-created account of any role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserRequest {
    pub role: Role,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub vehicle: Option<Vehicle>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

const BAD_CREDENTIALS: &str = "invalid username or password";

impl Platform {
    pub async fn register_customer(&self, req: RegisterRequest) -> ServiceResult<User> {
        self.insert_account(NewUserRequest {
            role: Role::Customer,
            username: req.username,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            vehicle: None,
        })
        .await
    }

    pub async fn create_user(&self, actor: &Actor, req: NewUserRequest) -> ServiceResult<User> {
        actor.require(Role::Admin)?;
        if req.vehicle.is_some() && req.role != Role::Driver {
            return Err(ServiceError::validation("only drivers have a vehicle"));
        }
        self.insert_account(req).await
    }

    async fn insert_account(&self, req: NewUserRequest) -> ServiceResult<User> {
        let username = req.username.trim().to_string();
        validate::username(&username)?;
        validate::non_empty("first_name", &req.first_name)?;
        validate::non_empty("last_name", &req.last_name)?;
        validate::email(&req.email)?;
        self.policy.check(&req.password)?;

        let salt = generate_salt();
        let user = ff_db::insert_user(
            &self.pool,
            &NewUser {
                user_id: Uuid::new_v4(),
                username,
                first_name: req.first_name.trim().to_string(),
                last_name: req.last_name.trim().to_string(),
                email: req.email.trim().to_string(),
                role: req.role,
                password_hash: hash_password(&req.password, &salt),
                salt,
                vehicle: req.vehicle,
            },
        )
        .await?;
        Ok(user)
    }

    /// Returns the user and a fresh bearer token.
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<(User, String)> {
        let creds = ff_db::fetch_credentials(&self.pool, username.trim()).await?;
        let Some(creds) = creds else {
            warn!(username = %username, "login refused: unknown user");
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()));
        };
        if !verify_password(password, &creds.salt, &creds.password_hash) {
            warn!(user_id = %creds.user.user_id, "login refused: bad password");
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }
        let token = self.tokens.issue(&creds.user)?;
        info!(user_id = %creds.user.user_id, role = creds.user.role.as_str(), "login");
        Ok((creds.user, token))
    }

    /// Stateless: signature, expiry and issuer only.
    pub fn authenticate(&self, token: &str) -> ServiceResult<Actor> {
        Ok(self.tokens.verify(token)?.into())
    }

    pub async fn me(&self, actor: &Actor) -> ServiceResult<User> {
        Ok(ff_db::fetch_user(&self.pool, actor.user_id).await?)
    }

    pub async fn update_profile(&self, actor: &Actor, upd: ProfileUpdate) -> ServiceResult<User> {
        if let Some(v) = &upd.first_name {
            validate::non_empty("first_name", v)?;
        }
        if let Some(v) = &upd.last_name {
            validate::non_empty("last_name", v)?;
        }
        if let Some(v) = &upd.email {
            validate::email(v)?;
        }
        let patch = ProfilePatch {
            first_name: upd.first_name.map(|s| s.trim().to_string()),
            last_name: upd.last_name.map(|s| s.trim().to_string()),
            email: upd.email.map(|s| s.trim().to_string()),
        };
        Ok(ff_db::update_user_profile(&self.pool, actor.user_id, &patch).await?)
    }

    /// Re-salts on every change.
    pub async fn change_password(
        &self,
        actor: &Actor,
        old_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let creds = ff_db::fetch_credentials(&self.pool, &actor.username)
            .await?
            .filter(|c| c.user.user_id == actor.user_id)
            .ok_or_else(|| ServiceError::NotFound(format!("user not found: {}", actor.user_id)))?;
        if !verify_password(old_password, &creds.salt, &creds.password_hash) {
            return Err(ServiceError::Unauthorized(
                "current password is incorrect".to_string(),
            ));
        }
        if old_password == new_password {
            return Err(ServiceError::validation(
                "new password must differ from the current one",
            ));
        }
        self.policy.check(new_password)?;

        let salt = generate_salt();
        ff_db::update_password(
            &self.pool,
            actor.user_id,
            &hash_password(new_password, &salt),
            &salt,
        )
        .await?;
        info!(user_id = %actor.user_id, "password changed");
        Ok(())
    }

    pub async fn list_users(&self, actor: &Actor, role: Option<Role>) -> ServiceResult<Vec<User>> {
        actor.require(Role::Admin)?;
        Ok(ff_db::list_users(&self.pool, role).await?)
    }

    pub async fn delete_user(&self, actor: &Actor, user_id: Uuid) -> ServiceResult<()> {
        actor.require(Role::Admin)?;
        if actor.user_id == user_id {
            return Err(ServiceError::forbidden("an admin cannot delete their own account"));
        }
        ff_db::delete_user(&self.pool, user_id).await?;
        Ok(())
    }

    pub async fn set_vehicle(&self, actor: &Actor, vehicle: Vehicle) -> ServiceResult<Vehicle> {
        actor.require(Role::Driver)?;
        ff_db::set_driver_vehicle(&self.pool, actor.user_id, vehicle).await?;
        Ok(vehicle)
    }

    pub async fn vehicle(&self, actor: &Actor) -> ServiceResult<Vehicle> {
        actor.require(Role::Driver)?;
        Ok(ff_db::fetch_driver_vehicle(&self.pool, actor.user_id).await?)
    }
}

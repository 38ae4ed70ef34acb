//! Credentials and bearer tokens.
//!
//! Pure: no DB, no HTTP. Callers load the stored salt/hash and pass them in.

mod password;
mod token;

pub use password::{generate_salt, hash_password, verify_password, PasswordError, PasswordPolicy};
pub use token::{bearer_token, Claims, TokenError, TokenIssuer};

use ff_schemas::Role;

/// True when `role` may act on a resource owned by `owner`.
/// Admins may act on anything.
pub fn may_act_for(actor_id: uuid::Uuid, role: Role, owner: uuid::Uuid) -> bool {
    role == Role::Admin || actor_id == owner
}

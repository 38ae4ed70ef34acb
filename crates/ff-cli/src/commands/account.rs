//! `ff auth ...` and `ff user ...`.

use anyhow::Result;
use ff_schemas::Role;
use ff_service::{NewUserRequest, ProfileUpdate, RegisterRequest};
use uuid::Uuid;

use super::{platform, print_user, session, svc, user_row};

pub async fn register(req: RegisterRequest) -> Result<()> {
    let p = platform().await?;
    let user = p.register_customer(req).await.map_err(svc)?;
    println!("registered=true");
    print_user(&user);
    Ok(())
}

pub async fn login(username: &str, password: &str) -> Result<()> {
    let p = platform().await?;
    let (user, token) = p.login(username, password).await.map_err(svc)?;
    println!("user_id={}", user.user_id);
    println!("role={}", user.role.as_str());
    println!("expires_in={}", p.token_ttl_seconds());
    println!("token={}", token);
    Ok(())
}

pub async fn whoami(token: Option<&str>) -> Result<()> {
    let (p, actor) = session(token).await?;
    let user = p.me(&actor).await.map_err(svc)?;
    print_user(&user);
    Ok(())
}

pub async fn user_list(token: Option<&str>, role: Option<Role>) -> Result<()> {
    let (p, actor) = session(token).await?;
    let users = p.list_users(&actor, role).await.map_err(svc)?;
    println!("count={}", users.len());
    for u in &users {
        println!("{}", user_row(u));
    }
    Ok(())
}

pub async fn user_create(token: Option<&str>, req: NewUserRequest) -> Result<()> {
    let (p, actor) = session(token).await?;
    let user = p.create_user(&actor, req).await.map_err(svc)?;
    println!("created=true");
    print_user(&user);
    Ok(())
}

pub async fn user_delete(token: Option<&str>, user_id: Uuid) -> Result<()> {
    let (p, actor) = session(token).await?;
    p.delete_user(&actor, user_id).await.map_err(svc)?;
    println!("deleted=true user_id={}", user_id);
    Ok(())
}

pub async fn user_update(token: Option<&str>, upd: ProfileUpdate) -> Result<()> {
    let (p, actor) = session(token).await?;
    let user = p.update_profile(&actor, upd).await.map_err(svc)?;
    print_user(&user);
    Ok(())
}

pub async fn user_password(token: Option<&str>, old: &str, new: &str) -> Result<()> {
    let (p, actor) = session(token).await?;
    p.change_password(&actor, old, new).await.map_err(svc)?;
    println!("password_changed=true");
    Ok(())
}

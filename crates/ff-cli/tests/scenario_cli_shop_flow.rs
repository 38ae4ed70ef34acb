//! `ff auth login` then catalogue and order commands against a real database.
//!
//! This test is DB-backed and is skipped if FF_DATABASE_URL is not set.

use assert_cmd::Command;
use ff_schemas::Role;
use ff_testkit::{db_or_skip, seed_user, TEST_JWT_SECRET, TEST_PASSWORD};
use predicates::prelude::*;

fn ff(dir: &tempfile::TempDir, url: &str) -> Command {
    let mut cmd = Command::cargo_bin("ff").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("FF_TOKEN")
        .env_remove("FF_CONFIG")
        .env(ff_db::ENV_DB_URL, url)
        .env("FF_JWT_SECRET", TEST_JWT_SECRET);
    cmd
}

fn value_of(stdout: &[u8], key: &str) -> Option<String> {
    let prefix = format!("{key}=");
    String::from_utf8_lossy(stdout)
        .lines()
        .find_map(|l| l.strip_prefix(&prefix).map(str::to_string))
}

#[tokio::test]
async fn login_then_manage_catalogue_and_order() -> anyhow::Result<()> {
    let Some(pool) = db_or_skip().await? else {
        return Ok(());
    };
    let url = std::env::var(ff_db::ENV_DB_URL)?;
    let dir = tempfile::tempdir()?;

    let admin = seed_user(&pool, Role::Admin).await?;
    let customer = seed_user(&pool, Role::Customer).await?;

    let out = ff(&dir, &url)
        .args(["auth", "login", "--username", &admin.username, "--password", TEST_PASSWORD])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let admin_token = value_of(&out, "token").expect("token printed");

    ff(&dir, &url)
        .args(["auth", "login", "--username", &admin.username, "--password", "Nope1234"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("UNAUTHORIZED"));

    let out = ff(&dir, &url)
        .args([
            "product", "add", "--name", "Crêpe beurre sucre", "--price", "4.50", "--stock", "6",
            "--type", "dessert",
        ])
        .env("FF_TOKEN", &admin_token)
        .assert()
        .success()
        .stdout(predicate::str::contains("price=4.50"))
        .get_output()
        .stdout
        .clone();
    let product_id = value_of(&out, "product_id").expect("product id printed");

    let out = ff(&dir, &url)
        .args(["auth", "login", "--username", &customer.username, "--password", TEST_PASSWORD])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let cust_token = value_of(&out, "token").expect("token printed");

    ff(&dir, &url)
        .args(["product", "restock", &product_id, "--delta", "5"])
        .env("FF_TOKEN", &cust_token)
        .assert()
        .failure()
        .stderr(predicate::str::contains("FORBIDDEN"));

    let item = format!("{product_id}:2");
    let out = ff(&dir, &url)
        .args([
            "order", "place", "--street", "4 Quai Lamartine", "--postal-code", "35000", "--city",
            "Rennes", "--item", &item,
        ])
        .env("FF_TOKEN", &cust_token)
        .assert()
        .success()
        .stdout(predicate::str::contains("status=PREPARING"))
        .stdout(predicate::str::contains("total=9.00"))
        .get_output()
        .stdout
        .clone();
    let order_id = value_of(&out, "order_id").expect("order id printed");

    ff(&dir, &url)
        .args(["order", "cancel", &order_id])
        .env("FF_TOKEN", &cust_token)
        .assert()
        .success()
        .stdout(predicate::str::contains("status=CANCELLED"));

    ff(&dir, &url)
        .args(["product", "show", &product_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("stock=6"));
    Ok(())
}

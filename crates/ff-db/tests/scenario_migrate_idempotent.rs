/// Running migrations twice must be a no-op and leave the schema in place.
///
/// DB-backed test. Skips if FF_DATABASE_URL is not set.
#[tokio::test]
async fn migrate_twice_then_status_reports_schema() -> anyhow::Result<()> {
    let url = match std::env::var(ff_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: FF_DATABASE_URL not set");
            return Ok(());
        }
    };

    let pool = ff_db::connect(&url).await?;
    ff_db::migrate(&pool).await?;
    ff_db::migrate(&pool).await?;

    let st = ff_db::status(&pool).await?;
    assert!(st.ok);
    assert!(st.has_orders_table);
    Ok(())
}

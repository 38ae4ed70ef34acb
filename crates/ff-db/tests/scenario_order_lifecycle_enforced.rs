//! The DB layer refuses illegal status changes and records the driver.
//!
//! DB-backed test. Skips if FF_DATABASE_URL is not set.

use ff_db::{DbError, NewProduct, NewUser};
use ff_orders::OrderEvent;
use ff_schemas::{AddressInput, ItemRequest, OrderStatus, Role, Vehicle};
use sqlx::PgPool;
use uuid::Uuid;

async fn user(pool: &PgPool, role: Role) -> anyhow::Result<Uuid> {
    let user_id = Uuid::new_v4();
    ff_db::insert_user(
        pool,
        &NewUser {
            user_id,
            username: format!("{}_{}", role.as_str().to_lowercase(), user_id.simple()),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: "test@example.com".to_string(),
            role,
            password_hash: "h".to_string(),
            salt: "s".to_string(),
            vehicle: Some(Vehicle::Bike),
        },
    )
    .await?;
    Ok(user_id)
}

#[tokio::test]
async fn lifecycle_enforced_and_driver_recorded() -> anyhow::Result<()> {
    let url = match std::env::var(ff_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: FF_DATABASE_URL not set");
            return Ok(());
        }
    };
    let pool = ff_db::connect(&url).await?;
    ff_db::migrate(&pool).await?;

    let cust = user(&pool, Role::Customer).await?;
    let driver = user(&pool, Role::Driver).await?;
    let other_driver = user(&pool, Role::Driver).await?;
    assert_eq!(ff_db::fetch_driver_vehicle(&pool, driver).await?, Vehicle::Bike);

    let p = ff_db::insert_product(
        &pool,
        &NewProduct {
            name: "Kouign-amann".to_string(),
            description: String::new(),
            product_type: "dessert".to_string(),
            price_cents: 450,
            stock: 10,
            is_available: true,
        },
    )
    .await?;

    let order = ff_db::create_order(
        &pool,
        cust,
        &AddressInput {
            street: "3 Place des Lices".to_string(),
            postal_code: "35000".to_string(),
            city: "Rennes".to_string(),
        },
        &[ItemRequest { product_id: p.product_id, quantity: 2 }],
    )
    .await?;
    let id = order.order_id;
    assert_eq!(order.status, OrderStatus::Preparing);

    // Preparing cannot be dispatched or delivered.
    let err = ff_db::transition_order(&pool, id, OrderEvent::Dispatch, Some(driver))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Transition(_)));
    let err = ff_db::transition_order(&pool, id, OrderEvent::Deliver, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Transition(_)));

    let order = ff_db::transition_order(&pool, id, OrderEvent::MarkReady, None).await?;
    assert_eq!(order.status, OrderStatus::Ready);

    // Items are frozen once Ready.
    let err = ff_db::add_order_item(&pool, id, p.product_id, 1, 50)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));

    // Dispatch needs a driver.
    let err = ff_db::transition_order(&pool, id, OrderEvent::Dispatch, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));

    let order = ff_db::transition_order(&pool, id, OrderEvent::Dispatch, Some(driver)).await?;
    assert_eq!(order.status, OrderStatus::OnTheWay);
    assert_eq!(order.driver_id, Some(driver));

    // A second driver cannot take it again, and nobody can cancel it now.
    let err = ff_db::transition_order(&pool, id, OrderEvent::Dispatch, Some(other_driver))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Transition(_)));
    let err = ff_db::transition_order(&pool, id, OrderEvent::Cancel, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Transition(_)));

    let err = ff_db::transition_order(&pool, id, OrderEvent::Deliver, Some(other_driver))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));

    let order = ff_db::transition_order(&pool, id, OrderEvent::Deliver, Some(driver)).await?;
    assert_eq!(order.status, OrderStatus::Delivered);

    let mine = ff_db::list_orders_for_driver(&pool, driver).await?;
    assert!(mine.iter().any(|o| o.order_id == id));
    let delivered = ff_db::list_orders(&pool, Some(OrderStatus::Delivered)).await?;
    assert!(delivered.iter().all(|o| o.status == OrderStatus::Delivered));

    // Delivered orders keep their stock reservation.
    assert_eq!(ff_db::fetch_product(&pool, p.product_id).await?.stock, 8);
    Ok(())
}

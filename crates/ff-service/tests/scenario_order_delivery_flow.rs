//! End-to-end order flow through the service layer: place, edit, ready,
//! take, itinerary, deliver. Plus the role gates along the way.
//!
//! DB-backed tests. Skip if FF_DATABASE_URL is not set.

use std::sync::Arc;

use ff_auth::TokenIssuer;
use ff_config::PlatformConfig;
use ff_routing::TravelMode;
use ff_schemas::{ItemRequest, OrderStatus, Role, User};
use ff_service::{Actor, PlaceOrderRequest, Platform};
use ff_testkit::{
    db_or_skip, sample_address, seed_product, seed_user, FixedRouteProvider, TEST_JWT_SECRET,
};

fn actor(u: &User) -> Actor {
    Actor {
        user_id: u.user_id,
        username: u.username.clone(),
        role: u.role,
    }
}

fn platform(pool: sqlx::PgPool, routes: Arc<FixedRouteProvider>) -> anyhow::Result<Platform> {
    let mut cfg = PlatformConfig::default();
    cfg.orders.max_items_per_order = 5;
    let tokens = TokenIssuer::new(TEST_JWT_SECRET, "foodfleet", 3600)?;
    Ok(Platform::new(pool, cfg, tokens, routes))
}

#[tokio::test]
async fn order_goes_from_basket_to_door() -> anyhow::Result<()> {
    let Some(pool) = db_or_skip().await? else {
        return Ok(());
    };
    let routes = Arc::new(FixedRouteProvider::new());
    let p = platform(pool, routes.clone())?;

    let cust = actor(&seed_user(p.pool(), Role::Customer).await?);
    let drv = actor(&seed_user(p.pool(), Role::Driver).await?);
    let admin = actor(&seed_user(p.pool(), Role::Admin).await?);
    let galette = seed_product(p.pool(), 850, 10).await?;
    let cidre = seed_product(p.pool(), 400, 10).await?;

    let order = p
        .place_order(
            &cust,
            PlaceOrderRequest {
                address: sample_address(),
                items: vec![ItemRequest {
                    product_id: galette.product_id,
                    quantity: 2,
                }],
            },
        )
        .await?;
    assert_eq!(order.status, OrderStatus::Preparing);
    assert_eq!(order.total_cents, 1700);

    let order = p
        .add_item(
            &cust,
            order.order_id,
            ItemRequest {
                product_id: cidre.product_id,
                quantity: 3,
            },
        )
        .await?;
    assert_eq!(order.nb_items, 5);
    assert_eq!(order.total_cents, 1700 + 1200);

    let over_cap = p
        .add_item(
            &cust,
            order.order_id,
            ItemRequest {
                product_id: cidre.product_id,
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(over_cap.code(), "VALIDATION");

    let order = p
        .remove_item(&cust, order.order_id, cidre.product_id, 1)
        .await?;
    assert_eq!(order.nb_items, 4);

    assert_eq!(
        p.take_delivery(&drv, order.order_id).await.unwrap_err().code(),
        "INVALID_TRANSITION"
    );
    assert_eq!(
        p.mark_ready(&cust, order.order_id).await.unwrap_err().code(),
        "FORBIDDEN"
    );
    p.mark_ready(&admin, order.order_id).await?;

    let open = p.available_deliveries(&drv).await?;
    assert!(open.iter().any(|o| o.order_id == order.order_id));

    let taken = p.take_delivery(&drv, order.order_id).await?;
    assert_eq!(taken.status, OrderStatus::OnTheWay);
    assert_eq!(taken.driver_id, Some(drv.user_id));
    assert!(!p
        .available_deliveries(&drv)
        .await?
        .iter()
        .any(|o| o.order_id == order.order_id));

    let plan = p.itinerary(&drv, order.order_id).await?;
    assert_eq!(plan.mode, TravelMode::Bicycling);
    assert_eq!(plan.origin, p.config().restaurant.one_line());
    assert!(plan.text.contains("Total: 12.4 km"));
    assert!(plan.directions_url.contains("travelmode=bicycling"));
    assert_eq!(routes.requests().len(), 1);

    let other = actor(&seed_user(p.pool(), Role::Driver).await?);
    assert_eq!(
        p.complete_delivery(&other, order.order_id).await.unwrap_err().code(),
        "FORBIDDEN"
    );
    assert_eq!(
        p.itinerary(&other, order.order_id).await.unwrap_err().code(),
        "FORBIDDEN"
    );

    let done = p.complete_delivery(&drv, order.order_id).await?;
    assert_eq!(done.status, OrderStatus::Delivered);

    let mine = p.orders_for(&drv).await?;
    assert!(mine.iter().any(|o| o.order_id == order.order_id));
    Ok(())
}

#[tokio::test]
async fn cancellation_rules() -> anyhow::Result<()> {
    let Some(pool) = db_or_skip().await? else {
        return Ok(());
    };
    let p = platform(pool, Arc::new(FixedRouteProvider::new()))?;

    let cust = actor(&seed_user(p.pool(), Role::Customer).await?);
    let stranger = actor(&seed_user(p.pool(), Role::Customer).await?);
    let drv = actor(&seed_user(p.pool(), Role::Driver).await?);
    let admin = actor(&seed_user(p.pool(), Role::Admin).await?);
    let product = seed_product(p.pool(), 300, 4).await?;

    let place = || PlaceOrderRequest {
        address: sample_address(),
        items: vec![ItemRequest {
            product_id: product.product_id,
            quantity: 2,
        }],
    };

    let a = p.place_order(&cust, place()).await?;
    assert_eq!(
        p.cancel_order(&stranger, a.order_id).await.unwrap_err().code(),
        "FORBIDDEN"
    );
    assert_eq!(
        p.cancel_order(&drv, a.order_id).await.unwrap_err().code(),
        "FORBIDDEN"
    );
    assert_eq!(
        p.get_order(&stranger, a.order_id).await.unwrap_err().code(),
        "FORBIDDEN"
    );

    let cancelled = p.cancel_order(&cust, a.order_id).await?;
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(p.get_product(product.product_id).await?.stock, 4);

    let b = p.place_order(&cust, place()).await?;
    p.cancel_order(&admin, b.order_id).await?;
    assert_eq!(p.get_product(product.product_id).await?.stock, 4);

    let greedy = PlaceOrderRequest {
        address: sample_address(),
        items: vec![ItemRequest {
            product_id: product.product_id,
            quantity: 5,
        }],
    };
    assert_eq!(
        p.place_order(&cust, greedy).await.unwrap_err().code(),
        "INSUFFICIENT_STOCK"
    );

    let empty = PlaceOrderRequest {
        address: sample_address(),
        items: Vec::new(),
    };
    assert_eq!(p.place_order(&cust, empty).await.unwrap_err().code(), "VALIDATION");

    let cancelled_list = p
        .list_all_orders(&admin, Some(OrderStatus::Cancelled))
        .await?;
    assert!(cancelled_list.iter().any(|o| o.order_id == a.order_id));
    Ok(())
}

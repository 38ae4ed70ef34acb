//! `ff product ...` and `ff order ...`.

use anyhow::Result;
use ff_schemas::{ItemRequest, OrderStatus};
use ff_service::{PlaceOrderRequest, ProductInput, ProductUpdate};
use uuid::Uuid;

use super::{order_row, platform, print_order, print_product, product_row, session, svc};

// ---------------------------------------------------------------------------
// product
// ---------------------------------------------------------------------------

pub async fn product_list(token: Option<&str>, all: bool) -> Result<()> {
    let products = if all {
        let (p, actor) = session(token).await?;
        p.list_all_products(&actor).await.map_err(svc)?
    } else {
        platform().await?.list_products().await.map_err(svc)?
    };
    println!("count={}", products.len());
    for prod in &products {
        println!("{}", product_row(prod));
    }
    Ok(())
}

pub async fn product_show(id: Uuid) -> Result<()> {
    let prod = platform().await?.get_product(id).await.map_err(svc)?;
    print_product(&prod);
    Ok(())
}

pub async fn product_add(token: Option<&str>, input: ProductInput) -> Result<()> {
    let (p, actor) = session(token).await?;
    let prod = p.create_product(&actor, input).await.map_err(svc)?;
    print_product(&prod);
    Ok(())
}

pub async fn product_update(token: Option<&str>, id: Uuid, upd: ProductUpdate) -> Result<()> {
    let (p, actor) = session(token).await?;
    let prod = p.update_product(&actor, id, upd).await.map_err(svc)?;
    print_product(&prod);
    Ok(())
}

pub async fn product_restock(token: Option<&str>, id: Uuid, delta: i32) -> Result<()> {
    let (p, actor) = session(token).await?;
    let prod = p.restock(&actor, id, delta).await.map_err(svc)?;
    println!("product_id={} stock={}", prod.product_id, prod.stock);
    Ok(())
}

pub async fn product_delete(token: Option<&str>, id: Uuid) -> Result<()> {
    let (p, actor) = session(token).await?;
    let outcome = p.delete_product(&actor, id).await.map_err(svc)?;
    println!("product_id={} outcome={}", id, outcome.as_str());
    Ok(())
}

// ---------------------------------------------------------------------------
// order
// ---------------------------------------------------------------------------

pub async fn order_place(token: Option<&str>, req: PlaceOrderRequest) -> Result<()> {
    let (p, actor) = session(token).await?;
    let order = p.place_order(&actor, req).await.map_err(svc)?;
    print_order(&order);
    Ok(())
}

pub async fn order_add_item(
    token: Option<&str>,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<()> {
    let (p, actor) = session(token).await?;
    let order = p
        .add_item(
            &actor,
            order_id,
            ItemRequest {
                product_id,
                quantity,
            },
        )
        .await
        .map_err(svc)?;
    print_order(&order);
    Ok(())
}

pub async fn order_remove_item(
    token: Option<&str>,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<()> {
    let (p, actor) = session(token).await?;
    let order = p
        .remove_item(&actor, order_id, product_id, quantity)
        .await
        .map_err(svc)?;
    print_order(&order);
    Ok(())
}

pub async fn order_cancel(token: Option<&str>, order_id: Uuid) -> Result<()> {
    let (p, actor) = session(token).await?;
    let order = p.cancel_order(&actor, order_id).await.map_err(svc)?;
    println!("order_id={} status={}", order.order_id, order.status.as_str());
    Ok(())
}

/// With a status filter this is the admin-wide listing.
pub async fn order_list(token: Option<&str>, status: Option<OrderStatus>) -> Result<()> {
    let (p, actor) = session(token).await?;
    let orders = match status {
        Some(_) => p.list_all_orders(&actor, status).await,
        None => p.orders_for(&actor).await,
    }
    .map_err(svc)?;
    println!("count={}", orders.len());
    for o in &orders {
        println!("{}", order_row(o));
    }
    Ok(())
}

pub async fn order_show(token: Option<&str>, order_id: Uuid) -> Result<()> {
    let (p, actor) = session(token).await?;
    let order = p.get_order(&actor, order_id).await.map_err(svc)?;
    print_order(&order);
    Ok(())
}

pub async fn order_ready(token: Option<&str>, order_id: Uuid) -> Result<()> {
    let (p, actor) = session(token).await?;
    let order = p.mark_ready(&actor, order_id).await.map_err(svc)?;
    println!("order_id={} status={}", order.order_id, order.status.as_str());
    Ok(())
}

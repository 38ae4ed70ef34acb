//! `ff delivery ...`: the driver's side of an order.

use anyhow::Result;
use ff_schemas::Vehicle;
use uuid::Uuid;

use super::{order_row, print_order, session, svc};

pub async fn available(token: Option<&str>) -> Result<()> {
    let (p, actor) = session(token).await?;
    let orders = p.available_deliveries(&actor).await.map_err(svc)?;
    println!("count={}", orders.len());
    for o in &orders {
        println!("{}", order_row(o));
    }
    Ok(())
}

pub async fn take(token: Option<&str>, order_id: Uuid) -> Result<()> {
    let (p, actor) = session(token).await?;
    let order = p.take_delivery(&actor, order_id).await.map_err(svc)?;
    print_order(&order);
    Ok(())
}

pub async fn deliver(token: Option<&str>, order_id: Uuid) -> Result<()> {
    let (p, actor) = session(token).await?;
    let order = p.complete_delivery(&actor, order_id).await.map_err(svc)?;
    println!("order_id={} status={}", order.order_id, order.status.as_str());
    Ok(())
}

pub async fn itinerary(token: Option<&str>, order_id: Uuid) -> Result<()> {
    let (p, actor) = session(token).await?;
    let plan = p.itinerary(&actor, order_id).await.map_err(svc)?;
    println!("order_id={}", plan.order_id);
    println!("mode={}", plan.mode.as_str());
    println!("origin={}", plan.origin);
    println!("destination={}", plan.destination);
    println!(
        "destination_location={},{}",
        plan.destination_location.lat, plan.destination_location.lng
    );
    println!("distance_m={}", plan.itinerary.total_distance_m());
    println!("duration_s={}", plan.itinerary.total_duration_s());
    println!("directions_url={}", plan.directions_url);
    print!("{}", plan.text);
    Ok(())
}

pub async fn vehicle(token: Option<&str>, set: Option<Vehicle>) -> Result<()> {
    let (p, actor) = session(token).await?;
    let v = match set {
        Some(v) => p.set_vehicle(&actor, v).await,
        None => p.vehicle(&actor).await,
    }
    .map_err(svc)?;
    println!("vehicle={}", v.as_str());
    Ok(())
}

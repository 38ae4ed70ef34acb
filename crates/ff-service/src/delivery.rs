use ff_orders::OrderEvent;
use ff_routing::{directions_url, format_itinerary, DirectionsRequest, Itinerary, LatLng, TravelMode};
use ff_schemas::{Order, OrderStatus, Role};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{Actor, Platform, ServiceError, ServiceResult};

/// Everything a driver needs to reach the customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPlan {
    pub order_id: Uuid,
    pub mode: TravelMode,
    pub origin: String,
    pub destination: String,
    pub destination_location: LatLng,
    pub itinerary: Itinerary,
    /// Plain-text rendering of `itinerary`.
    pub text: String,
    pub directions_url: String,
}

impl Platform {
    /// Orders ready for pickup and not yet held by a driver.
    pub async fn available_deliveries(&self, actor: &Actor) -> ServiceResult<Vec<Order>> {
        actor.require(Role::Driver)?;
        let ready = ff_db::list_orders(&self.pool, Some(OrderStatus::Ready)).await?;
        Ok(ready.into_iter().filter(|o| o.driver_id.is_none()).collect())
    }

    pub async fn take_delivery(&self, actor: &Actor, order_id: Uuid) -> ServiceResult<Order> {
        actor.require(Role::Driver)?;
        let order = ff_db::transition_order(
            &self.pool,
            order_id,
            OrderEvent::Dispatch,
            Some(actor.user_id),
        )
        .await?;
        info!(order_id = %order_id, driver_id = %actor.user_id, "delivery taken");
        Ok(order)
    }

    pub async fn complete_delivery(&self, actor: &Actor, order_id: Uuid) -> ServiceResult<Order> {
        actor.require(Role::Driver)?;
        let order = ff_db::fetch_order(&self.pool, order_id).await?;
        if order.driver_id != Some(actor.user_id) {
            return Err(ServiceError::forbidden(format!(
                "order {order_id} is not assigned to this driver"
            )));
        }
        Ok(ff_db::transition_order(
            &self.pool,
            order_id,
            OrderEvent::Deliver,
            Some(actor.user_id),
        )
        .await?)
    }

    /// Route from the restaurant to the order's address, in the travel mode
    /// matching the driver's vehicle.
    pub async fn itinerary(&self, actor: &Actor, order_id: Uuid) -> ServiceResult<DeliveryPlan> {
        actor.require(Role::Driver)?;
        let order = ff_db::fetch_order(&self.pool, order_id).await?;
        let held = order.driver_id == Some(actor.user_id) && order.status == OrderStatus::OnTheWay;
        let open = order.driver_id.is_none() && order.status == OrderStatus::Ready;
        if !held && !open {
            return Err(ServiceError::forbidden(format!(
                "order {order_id} is not available to this driver"
            )));
        }

        let vehicle = ff_db::fetch_driver_vehicle(&self.pool, actor.user_id).await?;
        let origin = self.config.restaurant.one_line();
        let located = self.routes.geocode(&order.address.one_line()).await?;

        let req = DirectionsRequest {
            origin: origin.clone(),
            destination: located.formatted_address.clone(),
            waypoints: Vec::new(),
            mode: vehicle.into(),
        };
        let itinerary = self.routes.directions(&req).await?;
        info!(
            order_id = %order_id,
            provider = self.routes.source_name(),
            mode = req.mode.as_str(),
            distance_m = itinerary.total_distance_m(),
            "itinerary computed"
        );

        Ok(DeliveryPlan {
            order_id,
            mode: req.mode,
            text: format_itinerary(&itinerary),
            directions_url: directions_url(&req),
            origin,
            destination: req.destination,
            destination_location: located.location,
            itinerary,
        })
    }
}

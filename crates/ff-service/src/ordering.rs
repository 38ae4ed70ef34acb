use ff_auth::may_act_for;
use ff_orders::OrderEvent;
use ff_schemas::{AddressInput, ItemRequest, Order, OrderStatus, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{validate, Actor, Platform, ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub address: AddressInput,
    pub items: Vec<ItemRequest>,
}

/// Who may read an order: its customer, any admin, the driver holding it,
/// and any driver while it waits for pickup.
pub(crate) fn can_view(actor: &Actor, order: &Order) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Customer => order.customer_id == actor.user_id,
        Role::Driver => {
            order.driver_id == Some(actor.user_id)
                || (order.driver_id.is_none() && order.status == OrderStatus::Ready)
        }
    }
}

impl Platform {
    pub async fn place_order(&self, actor: &Actor, req: PlaceOrderRequest) -> ServiceResult<Order> {
        actor.require(Role::Customer)?;
        validate::address(&req.address)?;
        validate::basket(&req.items, self.config.orders.max_items_per_order)?;

        let address = AddressInput {
            street: req.address.street.trim().to_string(),
            postal_code: req.address.postal_code.trim().to_string(),
            city: req.address.city.trim().to_string(),
        };
        Ok(ff_db::create_order(&self.pool, actor.user_id, &address, &req.items).await?)
    }

    pub async fn get_order(&self, actor: &Actor, order_id: Uuid) -> ServiceResult<Order> {
        let order = ff_db::fetch_order(&self.pool, order_id).await?;
        if !can_view(actor, &order) {
            return Err(ServiceError::forbidden(format!(
                "order {order_id} is not visible to this account"
            )));
        }
        Ok(order)
    }

    /// Loads the order and checks that the calling customer owns it.
    async fn own_order(&self, actor: &Actor, order_id: Uuid) -> ServiceResult<Order> {
        actor.require(Role::Customer)?;
        let order = ff_db::fetch_order(&self.pool, order_id).await?;
        if order.customer_id != actor.user_id {
            return Err(ServiceError::forbidden(format!(
                "order {order_id} belongs to another customer"
            )));
        }
        Ok(order)
    }

    pub async fn add_item(
        &self,
        actor: &Actor,
        order_id: Uuid,
        item: ItemRequest,
    ) -> ServiceResult<Order> {
        validate::quantity(item.quantity)?;
        self.own_order(actor, order_id).await?;
        Ok(ff_db::add_order_item(
            &self.pool,
            order_id,
            item.product_id,
            item.quantity,
            self.config.orders.max_items_per_order,
        )
        .await?)
    }

    pub async fn remove_item(
        &self,
        actor: &Actor,
        order_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> ServiceResult<Order> {
        validate::quantity(quantity)?;
        self.own_order(actor, order_id).await?;
        Ok(ff_db::remove_order_item(&self.pool, order_id, product_id, quantity).await?)
    }

    /// Customers cancel their own orders; admins cancel any.
    pub async fn cancel_order(&self, actor: &Actor, order_id: Uuid) -> ServiceResult<Order> {
        if actor.role == Role::Driver {
            return Err(ServiceError::forbidden("drivers cannot cancel orders"));
        }
        let order = ff_db::fetch_order(&self.pool, order_id).await?;
        if !may_act_for(actor.user_id, actor.role, order.customer_id) {
            return Err(ServiceError::forbidden(format!(
                "order {order_id} belongs to another customer"
            )));
        }
        Ok(ff_db::transition_order(&self.pool, order_id, OrderEvent::Cancel, None).await?)
    }

    pub async fn mark_ready(&self, actor: &Actor, order_id: Uuid) -> ServiceResult<Order> {
        actor.require(Role::Admin)?;
        Ok(ff_db::transition_order(&self.pool, order_id, OrderEvent::MarkReady, None).await?)
    }

    /// The caller's own view: placed orders for a customer, held orders for
    /// a driver, everything for an admin.
    pub async fn orders_for(&self, actor: &Actor) -> ServiceResult<Vec<Order>> {
        let orders = match actor.role {
            Role::Customer => ff_db::list_orders_for_customer(&self.pool, actor.user_id).await?,
            Role::Driver => ff_db::list_orders_for_driver(&self.pool, actor.user_id).await?,
            Role::Admin => ff_db::list_orders(&self.pool, None).await?,
        };
        Ok(orders)
    }

    pub async fn list_all_orders(
        &self,
        actor: &Actor,
        status: Option<OrderStatus>,
    ) -> ServiceResult<Vec<Order>> {
        actor.require(Role::Admin)?;
        Ok(ff_db::list_orders(&self.pool, status).await?)
    }
}

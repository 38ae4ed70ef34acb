//! Shared runtime state for ff-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The platform does the
//! work; the bus only fans out what already happened.

use std::sync::Arc;
use std::time::Duration;

use ff_schemas::{Order, OrderStatus};
use ff_service::Platform;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    OrderStatus(OrderStatusEvent),
    LogLine { level: String, msg: String },
}

/// Emitted after every committed order change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusEvent {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: OrderStatus,
    pub nb_items: i32,
    pub total_cents: i64,
    pub ts_millis: i64,
}

impl From<&Order> for OrderStatusEvent {
    fn from(o: &Order) -> Self {
        Self {
            order_id: o.order_id,
            customer_id: o.customer_id,
            driver_id: o.driver_id,
            status: o.status,
            nb_items: o.nb_items,
            total_cents: o.total_cents,
            ts_millis: o.updated_at_utc.timestamp_millis(),
        }
    }
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub platform: Arc<Platform>,
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(platform: Platform) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            platform: Arc::new(platform),
            bus,
            build: BuildInfo {
                service: "ff-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }

    /// No subscribers is not an error.
    pub fn publish_order(&self, order: &Order) {
        let _ = self.bus.send(BusMsg::OrderStatus(order.into()));
    }

    pub fn log_line(&self, level: &str, msg: impl Into<String>) {
        let _ = self.bus.send(BusMsg::LogLine {
            level: level.to_string(),
            msg: msg.into(),
        });
    }
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}

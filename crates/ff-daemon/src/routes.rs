//! Axum router and all HTTP handlers for ff-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers authenticate through [`AuthUser`], call one
//! `Platform` operation, and map [`ServiceError`] through [`ApiError`].

use std::{convert::Infallible, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post, put},
    Json, Router,
};
use ff_auth::bearer_token;
use ff_schemas::{ItemRequest, Order, OrderStatus, Product, Role, User};
use ff_service::{
    Actor, DeliveryPlan, NewUserRequest, PlaceOrderRequest, ProductInput, ProductUpdate,
    ProfileUpdate, RegisterRequest, ServiceError,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    api_types::{
        ErrorResponse, HealthResponse, LoginRequest, LoginResponse, OrderListQuery,
        PasswordChangeRequest, ProductRemovedResponse, RemoveItemQuery, RestockRequest,
        UserListQuery, VehicleBody,
    },
    state::{AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/stream", get(stream))
        // auth + self-service
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/v1/me", get(me).put(update_me))
        .route("/v1/me/password", put(change_password))
        // catalogue
        .route("/v1/products", get(list_products).post(create_product))
        .route(
            "/v1/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/v1/products/:id/restock", post(restock_product))
        // customer orders
        .route("/v1/orders", get(my_orders).post(place_order))
        .route("/v1/orders/:id", get(get_order))
        .route("/v1/orders/:id/items", post(add_item))
        .route(
            "/v1/orders/:id/items/:product_id",
            axum::routing::delete(remove_item),
        )
        .route("/v1/orders/:id/cancel", post(cancel_order))
        // admin
        .route("/v1/admin/orders", get(admin_orders))
        .route("/v1/admin/orders/:id/ready", post(admin_mark_ready))
        .route("/v1/admin/products", get(admin_products))
        .route("/v1/admin/users", get(admin_users).post(admin_create_user))
        .route(
            "/v1/admin/users/:id",
            axum::routing::delete(admin_delete_user),
        )
        // driver
        .route("/v1/driver/deliveries", get(driver_available))
        .route("/v1/driver/orders", get(my_orders))
        .route("/v1/driver/vehicle", get(driver_vehicle).put(driver_set_vehicle))
        .route("/v1/driver/deliveries/:id/take", post(driver_take))
        .route("/v1/driver/deliveries/:id/deliver", post(driver_deliver))
        .route("/v1/driver/deliveries/:id/itinerary", get(driver_itinerary))
        .layer(middleware::from_fn_with_state(state.clone(), report_failures))
        .with_state(state)
}

/// Echo server-side failures on the bus as `log` events.
async fn report_failures(State(st): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let resp = next.run(req).await;
    if resp.status().is_server_error() {
        st.log_line(
            "ERROR",
            format!("{method} {path} failed with {}", resp.status().as_u16()),
        );
    }
    resp
}

// ---------------------------------------------------------------------------
// Errors and auth
// ---------------------------------------------------------------------------

/// `ServiceError` rendered as `{ "error", "code" }` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError(e)
    }
}

pub(crate) fn status_for(e: &ServiceError) -> StatusCode {
    match e {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_)
        | ServiceError::InvalidTransition(_)
        | ServiceError::InsufficientStock(_) => StatusCode::CONFLICT,
        ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let error = match &self.0 {
            ServiceError::Internal(e) => {
                error!(error = %format!("{e:#}"), "request failed");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorResponse {
            error,
            code: self.0.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// The authenticated caller, taken from `Authorization: Bearer <jwt>`.
pub struct AuthUser(pub Actor);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        st: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?;
        Ok(AuthUser(st.platform.authenticate(token)?))
    }
}

fn parse_status(raw: Option<&str>) -> ApiResult<Option<OrderStatus>> {
    raw.map(OrderStatus::parse)
        .transpose()
        .map_err(|e| ServiceError::Validation(e.to_string()).into())
}

fn parse_role(raw: Option<&str>) -> ApiResult<Option<Role>> {
    raw.map(Role::parse)
        .transpose()
        .map_err(|e| ServiceError::Validation(e.to_string()).into())
}

// ---------------------------------------------------------------------------
// Health + auth
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

pub(crate) async fn register(
    State(st): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = st.platform.register_customer(req).await?;
    info!(user_id = %user.user_id, "customer registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn login(
    State(st): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (user, token) = st.platform.login(&req.username, &req.password).await?;
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: st.platform.token_ttl_seconds(),
        user,
    }))
}

pub(crate) async fn me(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<User>> {
    Ok(Json(st.platform.me(&actor).await?))
}

pub(crate) async fn update_me(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(upd): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(st.platform.update_profile(&actor, upd).await?))
}

pub(crate) async fn change_password(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(req): Json<PasswordChangeRequest>,
) -> ApiResult<StatusCode> {
    st.platform
        .change_password(&actor, &req.old_password, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

pub(crate) async fn list_products(State(st): State<Arc<AppState>>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(st.platform.list_products().await?))
}

pub(crate) async fn get_product(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    Ok(Json(st.platform.get_product(id).await?))
}

pub(crate) async fn create_product(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let p = st.platform.create_product(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(p)))
}

pub(crate) async fn update_product(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(upd): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    Ok(Json(st.platform.update_product(&actor, id, upd).await?))
}

pub(crate) async fn restock_product(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RestockRequest>,
) -> ApiResult<Json<Product>> {
    Ok(Json(st.platform.restock(&actor, id, req.delta).await?))
}

pub(crate) async fn delete_product(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProductRemovedResponse>> {
    let outcome = st.platform.delete_product(&actor, id).await?;
    Ok(Json(ProductRemovedResponse {
        product_id: id,
        outcome: outcome.as_str().to_string(),
    }))
}

pub(crate) async fn admin_products(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(st.platform.list_all_products(&actor).await?))
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Publish the committed order on the bus and hand it back.
fn announce(st: &AppState, order: Order) -> Json<Order> {
    st.publish_order(&order);
    Json(order)
}

pub(crate) async fn place_order(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(req): Json<PlaceOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = st.platform.place_order(&actor, req).await?;
    Ok((StatusCode::CREATED, announce(&st, order)))
}

pub(crate) async fn my_orders(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(st.platform.orders_for(&actor).await?))
}

pub(crate) async fn get_order(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(st.platform.get_order(&actor, id).await?))
}

pub(crate) async fn add_item(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(item): Json<ItemRequest>,
) -> ApiResult<Json<Order>> {
    let order = st.platform.add_item(&actor, id, item).await?;
    Ok(announce(&st, order))
}

pub(crate) async fn remove_item(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
    Query(q): Query<RemoveItemQuery>,
) -> ApiResult<Json<Order>> {
    let qty = q.quantity.unwrap_or(1);
    let order = st.platform.remove_item(&actor, id, product_id, qty).await?;
    Ok(announce(&st, order))
}

pub(crate) async fn cancel_order(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let order = st.platform.cancel_order(&actor, id).await?;
    Ok(announce(&st, order))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

pub(crate) async fn admin_orders(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Query(q): Query<OrderListQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    let status = parse_status(q.status.as_deref())?;
    Ok(Json(st.platform.list_all_orders(&actor, status).await?))
}

pub(crate) async fn admin_mark_ready(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let order = st.platform.mark_ready(&actor, id).await?;
    Ok(announce(&st, order))
}

pub(crate) async fn admin_users(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Query(q): Query<UserListQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let role = parse_role(q.role.as_deref())?;
    Ok(Json(st.platform.list_users(&actor, role).await?))
}

pub(crate) async fn admin_create_user(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(req): Json<NewUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = st.platform.create_user(&actor, req).await?;
    info!(user_id = %user.user_id, role = user.role.as_str(), "user created by admin");
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn admin_delete_user(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    st.platform.delete_user(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub(crate) async fn driver_available(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(st.platform.available_deliveries(&actor).await?))
}

pub(crate) async fn driver_vehicle(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<VehicleBody>> {
    let vehicle = st.platform.vehicle(&actor).await?;
    Ok(Json(VehicleBody { vehicle }))
}

pub(crate) async fn driver_set_vehicle(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(body): Json<VehicleBody>,
) -> ApiResult<Json<VehicleBody>> {
    let vehicle = st.platform.set_vehicle(&actor, body.vehicle).await?;
    Ok(Json(VehicleBody { vehicle }))
}

pub(crate) async fn driver_take(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let order = st.platform.take_delivery(&actor, id).await?;
    Ok(announce(&st, order))
}

pub(crate) async fn driver_deliver(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let order = st.platform.complete_delivery(&actor, id).await?;
    Ok(announce(&st, order))
}

pub(crate) async fn driver_itinerary(
    State(st): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeliveryPlan>> {
    Ok(Json(st.platform.itinerary(&actor, id).await?))
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::OrderStatus(_) => "order_status",
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            // lagged or closed
            Err(_) => None,
        }
    })
}

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::order::{OrderItem, OrderState, TrackId};
use crate::services::{OrderService, PaymentInitiationService};
use crate::store::{OrderFilter, Pagination, DEFAULT_PAGE_SIZE};
use super::errors::ApiError;

// ============================================================================
// Order Routes
// ============================================================================
//
//   POST /orders                     open a new order for a customer
//   GET  /orders                     list orders (customer_id, state, page, size)
//   GET  /orders/track/{track_id}    look up by track id
//   GET  /orders/{id}
//   POST /orders/{id}/items          add items while the order is created
//   POST /orders/{id}/pay            request a payment (?resend=true to force)
//
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AddItemsRequest {
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub customer_id: Option<Uuid>,
    pub state: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ListOrdersQuery {
    fn pagination(&self) -> Pagination {
        Pagination::new(self.page.unwrap_or(1), self.size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    fn filter(&self) -> Result<OrderFilter, ApiError> {
        let filter = OrderFilter {
            customer_id: self.customer_id,
            ..OrderFilter::default()
        };

        match self.state.as_deref() {
            None => Ok(filter),
            Some(name) => match OrderState::from_wire(name) {
                OrderState::None => Err(ApiError::InvalidRequest(format!("unknown order state {name:?}"))),
                state => Ok(filter.in_state(state)),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PayQuery {
    #[serde(default)]
    pub resend: bool,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(create_order))
            .route("", web::get().to(list_orders))
            .route("/track/{track_id}", web::get().to(get_order_by_track_id))
            .route("/{order_id}", web::get().to(get_order))
            .route("/{order_id}/items", web::post().to(add_items))
            .route("/{order_id}/pay", web::post().to(send_to_pay)),
    );
}

async fn create_order(
    orders: web::Data<OrderService>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = orders.create_order(body.customer_id).await?;
    Ok(HttpResponse::Created().json(order))
}

async fn list_orders(
    orders: web::Data<OrderService>,
    query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = orders.get_all(query.pagination(), &query.filter()?).await?;
    Ok(HttpResponse::Ok().json(page))
}

async fn get_order(
    orders: web::Data<OrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = orders.get_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn get_order_by_track_id(
    orders: web::Data<OrderService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let track_id = TrackId::from(path.into_inner());
    let order = orders.get_by_track_id(&track_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn add_items(
    orders: web::Data<OrderService>,
    path: web::Path<Uuid>,
    body: web::Json<AddItemsRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = orders
        .add_items(path.into_inner(), body.into_inner().items)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn send_to_pay(
    payments: web::Data<PaymentInitiationService>,
    path: web::Path<Uuid>,
    query: web::Query<PayQuery>,
) -> Result<HttpResponse, ApiError> {
    let payment = payments.send_to_pay(path.into_inner(), query.resend).await?;
    Ok(HttpResponse::Accepted().json(payment))
}

// ============================================================================
// Tests
// ============================================================================

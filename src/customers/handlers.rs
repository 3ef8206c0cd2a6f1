use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::ActiveUser,
    customers::dto::{CustomerQuery, CustomerUpdate, MessageResponse},
    customers::repo::Customer,
    error::ApiError,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers))
        .route("/customers/:id", get(get_customer))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", post(create_customers))
        .route(
            "/customers/:id",
            axum::routing::put(update_customer).delete(delete_customer),
        )
}

#[instrument(skip(state, _user))]
pub async fn list_customers(
    State(state): State<AppState>,
    ActiveUser(_user): ActiveUser,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = Customer::list(
        &state.db,
        query.search.as_deref(),
        query.sort_by.as_deref(),
        &query.sort_order,
    )
    .await?;
    Ok(Json(customers))
}

#[instrument(skip(state, _user))]
pub async fn get_customer(
    State(state): State<AppState>,
    ActiveUser(_user): ActiveUser,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, ApiError> {
    let customer = Customer::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::CustomerNotFound)?;
    Ok(Json(customer))
}

/// Bulk create with client-supplied ids; the whole batch lands in one
/// transaction or not at all.
#[instrument(skip(state, _user, payload))]
pub async fn create_customers(
    State(state): State<AppState>,
    ActiveUser(_user): ActiveUser,
    Json(payload): Json<Vec<Customer>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let mut tx = state.db.begin().await.map_err(ApiError::Database)?;
    let mut created = Vec::with_capacity(payload.len());
    for customer in &payload {
        created.push(Customer::insert(&mut tx, customer).await?);
    }
    tx.commit().await.map_err(ApiError::Database)?;

    info!(count = created.len(), "customers created");
    Ok(Json(created))
}

#[instrument(skip(state, _user, payload))]
pub async fn update_customer(
    State(state): State<AppState>,
    ActiveUser(_user): ActiveUser,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerUpdate>,
) -> Result<Json<Customer>, ApiError> {
    let customer = Customer::update(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.email.as_deref(),
        payload.phone.as_deref(),
        payload.address.as_deref(),
        payload.date.as_deref(),
        payload.payments,
        payload.status,
    )
    .await?
    .ok_or(ApiError::CustomerNotFound)?;

    info!(customer_id = customer.id, "customer updated");
    Ok(Json(customer))
}

#[instrument(skip(state, _user))]
pub async fn delete_customer(
    State(state): State<AppState>,
    ActiveUser(_user): ActiveUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !Customer::delete(&state.db, id).await? {
        return Err(ApiError::CustomerNotFound);
    }
    info!(customer_id = id, "customer deleted");
    Ok(Json(MessageResponse {
        message: "Customer deleted successfully".into(),
    }))
}

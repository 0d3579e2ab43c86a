//! Application router configuration.

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    AppState, endpoints,
    stores::TransactionStore,
    transaction::{clear_funds, create_transaction, get_transaction, get_transactions},
};

/// Return a router with all the app's routes.
///
/// CORS is wide open: the API is a demo backend and applies no access
/// control, so any origin, method and header is allowed.
pub fn build_router<T>(state: AppState<T>) -> Router
where
    T: TransactionStore + Clone + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(endpoints::ROOT, get(get_service_banner))
        .route(endpoints::TRANSACTIONS, get(get_transactions::<T>))
        .route(endpoints::TRANSACTION, get(get_transaction::<T>))
        .route(endpoints::CREATE_TRANSACTION, post(create_transaction::<T>))
        .route(endpoints::CLEAR_FUNDS, post(clear_funds::<T>))
        .layer(cors)
        .with_state(state)
}

/// A route handler for the static service banner at the root path.
async fn get_service_banner() -> Json<Value> {
    Json(json!({ "message": "Portola API", "docs": "/docs" }))
}

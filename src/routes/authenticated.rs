use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Authenticated Router Module
///
/// The product catalog. Every route here is wrapped by the auth middleware in
/// `create_router`, so handlers only run for a request carrying a valid
/// bearer token.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/products?name=...&limit=...
        // POST /api/products
        .route(
            "/api/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        // GET/PUT/DELETE /api/products/{id}
        .route(
            "/api/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
}

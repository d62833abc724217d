use crate::{
    AppState, auth,
    error::ApiResult,
    models::{
        CreateProductRequest, Envelope, LoginRequest, Product, TokenResponse,
        UpdateProductRequest,
    },
    service::{ProductService, parse_limit},
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;

// --- Filter Structs ---

/// ProductQuery
///
/// Query parameters of GET /api/products. `limit` is kept raw so a malformed
/// value is reported through the JSON envelope.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub name: Option<String>,
    pub limit: Option<String>,
}

// --- Handlers ---

/// list_products
///
/// [Authenticated Route] Lists products ordered by name, optionally filtered by
/// a name substring.
pub async fn list_products(
    State(products): State<ProductService>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> ApiResult<Json<Envelope<Vec<Product>>>> {
    let Query(query) = query?;
    let limit = parse_limit(query.limit.as_deref())?;

    let listing = products.list(query.name, limit).await?;
    let message = if listing.searched {
        format!(
            "There are {} products matching the search term.",
            listing.products.len()
        )
    } else {
        "The product list has been retrieved.".to_string()
    };

    Ok(Json(Envelope::success(message, listing.products)))
}

/// get_product
///
/// [Authenticated Route] Retrieves a single product by id.
pub async fn get_product(
    State(products): State<ProductService>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<Envelope<Product>>> {
    let Path(id) = id?;
    let product = products.get(id).await?;
    Ok(Json(Envelope::success(
        format!("The product with id {} has been retrieved.", product.id),
        product,
    )))
}

/// create_product
///
/// [Authenticated Route] Adds a product to the catalog.
pub async fn create_product(
    State(products): State<ProductService>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<Product>>> {
    let Json(payload) = payload?;
    let product = products.create(payload).await?;
    Ok(Json(Envelope::success(
        format!("The product {} has been created!", product.name),
        product,
    )))
}

/// update_product
///
/// [Authenticated Route] Replaces the given fields of a product and returns
/// the stored row.
pub async fn update_product(
    State(products): State<ProductService>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<Product>>> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let product = products.update(id, payload).await?;
    Ok(Json(Envelope::success(
        format!("The product {} has been updated.", product.name),
        product,
    )))
}

/// delete_product
///
/// [Authenticated Route] Removes a product and returns it as it was.
pub async fn delete_product(
    State(products): State<ProductService>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<Envelope<Product>>> {
    let Path(id) = id?;
    let product = products.delete(id).await?;
    Ok(Json(Envelope::success(
        format!("The product {} has been deleted.", product.name),
        product,
    )))
}

/// login
///
/// [Public Route] Exchanges a username and password for a signed access token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<TokenResponse>>> {
    let Json(payload) = payload?;
    let token = auth::login(&state.repo, &state.config, payload).await?;
    Ok(Json(Envelope::success(
        "The user has been logged in successfully.",
        TokenResponse { token },
    )))
}

/// root
///
/// [Public Route] Plain-text banner.
pub async fn root() -> &'static str {
    "REST API of the self-service machine!"
}

/// not_found
///
/// Fallback for every unmatched route.
pub async fn not_found() -> (StatusCode, Json<&'static str>) {
    (
        StatusCode::NOT_FOUND,
        Json("The requested resource could not be found. You can try another URL."),
    )
}

/// method_not_allowed
///
/// Known path, unsupported method.
pub async fn method_not_allowed() -> (StatusCode, Json<Envelope<()>>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(Envelope::message_only(
            "This method is not supported for the requested resource.",
        )),
    )
}

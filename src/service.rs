use axum::extract::FromRef;

use crate::{
    AppState,
    error::{ApiError, ApiResult, RepositoryError},
    models::{CreateProductRequest, Product, UpdateProductRequest},
    repository::RepositoryState,
};

/// Minimum length of a name search term.
pub const MIN_SEARCH_LENGTH: usize = 2;
/// Default cap of a filtered listing.
pub const DEFAULT_SEARCH_LIMIT: i64 = 3;
/// Default cap of an unfiltered listing.
pub const DEFAULT_LIST_LIMIT: i64 = 100;
/// Any requested limit is clamped to this value.
pub const MAX_LIST_LIMIT: i64 = 100;

const PRODUCT_NOT_FOUND: &str =
    "The requested product does not exist. Please retry with another identifier.";

/// ProductListing
///
/// The rows returned by `ProductService::list`, plus whether a search was applied.
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub products: Vec<Product>,
    pub searched: bool,
}

/// ProductService
///
/// Translates catalog operations into repository calls and repository
/// failures into `ApiError`s.
#[derive(Clone)]
pub struct ProductService {
    repo: RepositoryState,
}

impl FromRef<AppState> for ProductService {
    fn from_ref(app_state: &AppState) -> ProductService {
        ProductService::new(app_state.repo.clone())
    }
}

/// Maps a repository failure for `operation` into a 500, or a 400 when a
/// store constraint rejected the row.
fn persistence_failure(operation: &'static str) -> impl FnOnce(RepositoryError) -> ApiError {
    move |error| match error {
        RepositoryError::ConstraintViolation(detail) => {
            tracing::warn!(operation, %detail, "constraint rejected product");
            ApiError::Validation(format!("The product is invalid: {detail}"))
        }
        other => {
            tracing::error!(operation, error = %other, "persistence failure");
            ApiError::Transient(format!(
                "The product {operation} failed. Please retry in a few moments."
            ))
        }
    }
}

/// Parses the raw `limit` query value.
pub fn parse_limit(raw: Option<&str>) -> ApiResult<Option<i64>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(limit) if limit > 0 => Ok(Some(limit.min(MAX_LIST_LIMIT))),
        _ => Err(ApiError::Validation(
            "The limit must be a positive integer.".to_string(),
        )),
    }
}

impl ProductService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// list
    ///
    /// With a name filter the term must be at least two characters and the
    /// result defaults to three rows; without one it defaults to
    /// `DEFAULT_LIST_LIMIT` rows. Both are ordered by name.
    pub async fn list(&self, name: Option<String>, limit: Option<i64>) -> ApiResult<ProductListing> {
        let search = name.filter(|n| !n.is_empty());

        let limit = match &search {
            Some(term) => {
                if term.chars().count() < MIN_SEARCH_LENGTH {
                    return Err(ApiError::Validation(format!(
                        "The search term must contain at least {MIN_SEARCH_LENGTH} characters."
                    )));
                }
                limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
            }
            None => limit.unwrap_or(DEFAULT_LIST_LIMIT),
        };

        let searched = search.is_some();
        let products = self
            .repo
            .list_products(search, limit.clamp(1, MAX_LIST_LIMIT))
            .await
            .map_err(persistence_failure("listing"))?;

        Ok(ProductListing { products, searched })
    }

    pub async fn get(&self, id: i32) -> ApiResult<Product> {
        self.repo
            .get_product(id)
            .await
            .map_err(persistence_failure("lookup"))?
            .ok_or_else(|| ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }

    pub async fn create(&self, request: CreateProductRequest) -> ApiResult<Product> {
        let new_product = request.validate()?;
        let product = self
            .repo
            .create_product(new_product)
            .await
            .map_err(persistence_failure("creation"))?;

        tracing::info!(id = product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn update(&self, id: i32, request: UpdateProductRequest) -> ApiResult<Product> {
        let changes = request.validate()?;
        let product = self
            .repo
            .update_product(id, changes)
            .await
            .map_err(persistence_failure("update"))?
            .ok_or_else(|| ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

        tracing::info!(id = product.id, "product updated");
        Ok(product)
    }

    /// delete
    ///
    /// Returns the removed row. A missing id leaves the table untouched.
    pub async fn delete(&self, id: i32) -> ApiResult<Product> {
        let product = self
            .repo
            .delete_product(id)
            .await
            .map_err(persistence_failure("deletion"))?
            .ok_or_else(|| ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

        tracing::info!(id = product.id, "product deleted");
        Ok(product)
    }
}

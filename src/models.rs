use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{ApiError, ApiResult};

// --- Core Application Schemas (Mapped to Database) ---

/// Product
///
/// A catalog entry from the `products` table. `price` is stored as NUMERIC and
/// serialized as a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Default)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
}

/// User
///
/// An account from the `users` table, read only during login.
/// The hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

// --- Response Envelope ---

/// Envelope
///
/// Uniform `{message, data}` wrapper used by every JSON response.
/// `data` is omitted entirely on error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreateProductRequest
///
/// Input payload for POST /api/products. Fields are optional at the parsing
/// stage so that a missing field is reported as a validation error with a
/// JSON body instead of an extractor rejection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
}

/// NewProduct
///
/// A validated product ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
}

impl CreateProductRequest {
    pub fn validate(self) -> ApiResult<NewProduct> {
        let name = self
            .name
            .ok_or_else(|| ApiError::Validation("The product name is required.".to_string()))?;
        let price = self
            .price
            .ok_or_else(|| ApiError::Validation("The product price is required.".to_string()))?;

        Ok(NewProduct {
            name: validate_name(name)?,
            price: validate_price(price)?,
        })
    }
}

/// UpdateProductRequest
///
/// Partial update payload for PUT /api/products/{id}. Absent fields keep
/// their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl UpdateProductRequest {
    pub fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            name: self.name.map(validate_name).transpose()?,
            price: self.price.map(validate_price).transpose()?,
        })
    }
}

/// Decimal places a stored price keeps (`NUMERIC(10, 2)`).
pub const PRICE_SCALE: u32 = 2;

/// Exclusive upper bound of a stored price: 8 integer digits.
pub const PRICE_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Whether `price` fits the `products.price` column without rounding.
pub fn price_fits_column(price: &Decimal) -> bool {
    price.normalize().scale() <= PRICE_SCALE && *price < PRICE_LIMIT
}

// Blank names are rejected; the name is stored exactly as sent.
fn validate_name(name: String) -> ApiResult<String> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation(
            "The product name cannot be empty.".to_string(),
        ));
    }
    Ok(name)
}

fn validate_price(price: Decimal) -> ApiResult<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ApiError::Validation(
            "The product price must be a positive number.".to_string(),
        ));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(ApiError::Validation(format!(
            "The product price cannot have more than {PRICE_SCALE} decimal places."
        )));
    }
    if price >= PRICE_LIMIT {
        return Err(ApiError::Validation(format!(
            "The product price must be lower than {PRICE_LIMIT}."
        )));
    }
    Ok(price)
}

/// LoginRequest
///
/// Input payload for POST /api/login.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// TokenResponse
///
/// The `data` payload of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

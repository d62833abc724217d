use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    error::{ApiError, ApiResult},
    models::LoginRequest,
    repository::RepositoryState,
};

/// bcrypt cost used for stored password hashes.
pub const PASSWORD_HASH_COST: u32 = 10;

const MISSING_TOKEN_MESSAGE: &str =
    "No authentication token was provided. Add one to the Authorization header of the request.";
const REJECTED_TOKEN_MESSAGE: &str = "The user is not allowed to access this resource.";

/// Claims
///
/// Payload of an access token. The token is self-contained: nothing about it
/// is stored server-side.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the username the token was issued to.
    pub sub: String,
    /// Expiration Time (exp): seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat): seconds since the epoch.
    pub iat: usize,
}

/// AuthUser
///
/// The identity resolved from a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub expires_at: usize,
}

/// issue_token
///
/// Signs a token for `username` valid for the configured TTL.
pub fn issue_token(username: &str, config: &AppConfig) -> ApiResult<String> {
    let now = Utc::now();
    let expires = now + Duration::hours(config.token_ttl_hours);

    let claims = Claims {
        sub: username.to_string(),
        iat: now.timestamp() as usize,
        exp: expires.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("token signing failed: {:?}", e);
        ApiError::Transient(
            "The login could not be completed. Please retry in a few moments.".to_string(),
        )
    })
}

/// decode_token
///
/// Verifies the signature and expiry of `token`. Expiry is checked without
/// leeway so a token is rejected as soon as its window closes.
pub fn decode_token(token: &str, secret: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                other => tracing::debug!("rejected token: {:?}", other),
            }
            Err(ApiError::Unauthenticated(REJECTED_TOKEN_MESSAGE.to_string()))
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument and as the route-layer
/// gate. Only the `Authorization: Bearer <token>` header is consulted; the
/// persistence layer is never touched.
///
/// Rejection: `ApiError::Unauthenticated` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated(MISSING_TOKEN_MESSAGE.to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthenticated(MISSING_TOKEN_MESSAGE.to_string()))?;

        let claims = decode_token(token, &config.jwt_secret)?;

        Ok(AuthUser {
            username: claims.sub,
            expires_at: claims.exp,
        })
    }
}

// --- Password Hashing ---

/// hash_password
///
/// bcrypt is CPU-bound, so it runs on the blocking pool.
pub async fn hash_password(password: &str) -> ApiResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_HASH_COST))
        .await
        .map_err(|e| password_failure(e.to_string()))?
        .map_err(|e| password_failure(e.to_string()))
}

async fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| password_failure(e.to_string()))?
        .map_err(|e| password_failure(e.to_string()))
}

fn password_failure(detail: String) -> ApiError {
    tracing::error!("password hashing failed: {}", detail);
    ApiError::Transient(
        "The login could not be completed. Please retry in a few moments.".to_string(),
    )
}

// --- Credential Verifier ---

/// login
///
/// Checks `request` against the stored user and returns a freshly signed
/// token. Unknown users and wrong passwords produce the same error.
pub async fn login(
    repo: &RepositoryState,
    config: &AppConfig,
    request: LoginRequest,
) -> ApiResult<String> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::Validation(
            "A username and a password are required.".to_string(),
        ));
    }

    let user = repo
        .find_user_by_username(&request.username)
        .await
        .map_err(|e| {
            tracing::error!("user lookup failed: {}", e);
            ApiError::Transient(
                "The login could not be completed. Please retry in a few moments.".to_string(),
            )
        })?
        .ok_or_else(|| {
            tracing::warn!(username = %request.username, "login with unknown username");
            ApiError::InvalidCredentials
        })?;

    if !verify_password(&request.password, &user.password_hash).await? {
        tracing::warn!(username = %user.username, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(&user.username, config)?;
    tracing::info!(username = %user.username, "user logged in");
    Ok(token)
}

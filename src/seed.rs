use rust_decimal::Decimal;

use crate::{
    auth::hash_password,
    error::{ApiError, ApiResult},
    models::NewProduct,
    repository::RepositoryState,
};

/// Account created by the seed.
pub const DEFAULT_USERNAME: &str = "etml";
pub const DEFAULT_PASSWORD: &str = "etml";

/// Initial catalog: (name, price in cents).
const CATALOG: &[(&str, i64)] = &[
    ("Big Mac", 599),
    ("Cheeseburger", 290),
    ("Chicken Nuggets", 450),
    ("Coca-Cola", 250),
    ("French Fries", 350),
    ("McFlurry", 420),
    ("Milkshake", 380),
    ("Salad", 650),
    ("Sundae", 300),
    ("Wrap", 520),
];

fn seed_failure(step: &str, detail: String) -> ApiError {
    tracing::error!(step, %detail, "seeding failed");
    ApiError::Transient(format!("Seeding the {step} failed."))
}

/// seed_database
///
/// Inserts the initial catalog when the products table is empty and creates
/// the default account when it is missing. Safe to run on every startup.
pub async fn seed_database(repo: &RepositoryState) -> ApiResult<()> {
    let existing = repo
        .count_products()
        .await
        .map_err(|e| seed_failure("catalog", e.to_string()))?;

    if existing == 0 {
        for (name, cents) in CATALOG {
            let product = repo
                .create_product(NewProduct {
                    name: (*name).to_string(),
                    price: Decimal::new(*cents, 2),
                })
                .await
                .map_err(|e| seed_failure("catalog", e.to_string()))?;
            tracing::debug!(id = product.id, name = %product.name, "seeded product");
        }
        tracing::info!(count = CATALOG.len(), "product catalog seeded");
    } else {
        tracing::info!(count = existing, "product catalog already populated");
    }

    let user = repo
        .find_user_by_username(DEFAULT_USERNAME)
        .await
        .map_err(|e| seed_failure("users", e.to_string()))?;

    if user.is_none() {
        let hash = hash_password(DEFAULT_PASSWORD).await?;
        repo.create_user(DEFAULT_USERNAME, &hash)
            .await
            .map_err(|e| seed_failure("users", e.to_string()))?;
        tracing::info!(username = DEFAULT_USERNAME, "default user created");
    }

    Ok(())
}

/// catalog_size
///
/// Number of products the seed inserts into an empty table.
pub fn catalog_size() -> usize {
    CATALOG.len()
}

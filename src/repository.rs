use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{NewProduct, Product, UpdateProductRequest, User, price_fits_column};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Repository Trait
///
/// The persistence contract used by the product service and the credential
/// verifier. Handlers never see a concrete store, so the Postgres implementation
/// can be swapped for the in-memory one in tests.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Products ---
    // Ordered by name. `search` is a case-insensitive substring match.
    async fn list_products(&self, search: Option<String>, limit: i64)
    -> RepositoryResult<Vec<Product>>;
    async fn get_product(&self, id: i32) -> RepositoryResult<Option<Product>>;
    async fn create_product(&self, product: NewProduct) -> RepositoryResult<Product>;
    // Only fields that are `Some` are written. Returns the stored row.
    async fn update_product(
        &self,
        id: i32,
        changes: UpdateProductRequest,
    ) -> RepositoryResult<Option<Product>>;
    // Returns the row as it was before removal.
    async fn delete_product(&self, id: i32) -> RepositoryResult<Option<Product>>;
    async fn count_products(&self) -> RepositoryResult<i64>;

    // --- Users ---
    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;
    async fn create_user(&self, username: &str, password_hash: &str) -> RepositoryResult<User>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Escapes LIKE metacharacters so the filter matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// SQLSTATE 22003: the value does not fit the NUMERIC column.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

fn map_db_error(error: sqlx::Error) -> RepositoryError {
    if let Some(db_error) = error.as_database_error() {
        if db_error.is_check_violation()
            || db_error.is_unique_violation()
            || db_error.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE)
        {
            return RepositoryError::ConstraintViolation(db_error.message().to_string());
        }
    }
    RepositoryError::Database(error)
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_products
    ///
    /// Builds the query with QueryBuilder so the search term is always bound,
    /// never interpolated.
    async fn list_products(
        &self,
        search: Option<String>,
        limit: i64,
    ) -> RepositoryResult<Vec<Product>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT id, name, price FROM products");

        if let Some(term) = search {
            builder.push(" WHERE name ILIKE ");
            builder.push_bind(format!("%{}%", escape_like(&term)));
        }

        builder.push(" ORDER BY name ASC, id ASC LIMIT ");
        builder.push_bind(limit);

        builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn get_product(&self, id: i32) -> RepositoryResult<Option<Product>> {
        sqlx::query_as::<_, Product>("SELECT id, name, price FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn create_product(&self, product: NewProduct) -> RepositoryResult<Product> {
        sqlx::query_as::<_, Product>(
            "INSERT INTO products (name, price) VALUES ($1, $2) RETURNING id, name, price",
        )
        .bind(product.name)
        .bind(product.price)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    /// update_product
    ///
    /// `COALESCE` keeps the stored value for every field the caller left out.
    async fn update_product(
        &self,
        id: i32,
        changes: UpdateProductRequest,
    ) -> RepositoryResult<Option<Product>> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                price = COALESCE($3, price),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, price
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.price)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn delete_product(&self, id: i32) -> RepositoryResult<Option<Product>> {
        sqlx::query_as::<_, Product>(
            "DELETE FROM products WHERE id = $1 RETURNING id, name, price",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn count_products(&self) -> RepositoryResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> RepositoryResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id, username, password_hash",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

// --- In-Memory Implementation (For Tests) ---

#[derive(Default)]
struct MemoryTables {
    products: BTreeMap<i32, Product>,
    users: Vec<User>,
    next_product_id: i32,
    next_user_id: i32,
}

/// MemoryRepository
///
/// A `Repository` held entirely in process memory. It mirrors the Postgres
/// ordering and constraint rules closely enough for router and service tests,
/// and counts every call so tests can assert that a request never reached the
/// store.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<MemoryTables>,
    calls: AtomicUsize,
    /// When true, every operation fails with `RepositoryError::Unavailable`.
    should_fail: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        let repo = Self::default();
        repo.set_failing(true);
        repo
    }

    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    /// Number of repository operations served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> RepositoryResult<std::sync::MutexGuard<'_, MemoryTables>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "simulated connectivity failure".to_string(),
            ));
        }
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store poisoned".to_string()))
    }
}

fn check_product(name: &str, price: &rust_decimal::Decimal) -> RepositoryResult<()> {
    if name.trim().is_empty() {
        return Err(RepositoryError::ConstraintViolation(
            "products_name_check".to_string(),
        ));
    }
    if price.is_sign_negative() && !price.is_zero() {
        return Err(RepositoryError::ConstraintViolation(
            "products_price_check".to_string(),
        ));
    }
    if !price_fits_column(price) {
        return Err(RepositoryError::ConstraintViolation(
            "numeric field overflow".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_products(
        &self,
        search: Option<String>,
        limit: i64,
    ) -> RepositoryResult<Vec<Product>> {
        let tables = self.enter()?;
        let needle = search.map(|s| s.to_lowercase());

        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| match &needle {
                Some(n) => p.name.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        products.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(products)
    }

    async fn get_product(&self, id: i32) -> RepositoryResult<Option<Product>> {
        let tables = self.enter()?;
        Ok(tables.products.get(&id).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> RepositoryResult<Product> {
        let mut tables = self.enter()?;
        check_product(&product.name, &product.price)?;

        tables.next_product_id += 1;
        let created = Product {
            id: tables.next_product_id,
            name: product.name,
            price: product.price,
        };
        tables.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        id: i32,
        changes: UpdateProductRequest,
    ) -> RepositoryResult<Option<Product>> {
        let mut tables = self.enter()?;
        let Some(existing) = tables.products.get(&id).cloned() else {
            return Ok(None);
        };

        let updated = Product {
            id,
            name: changes.name.unwrap_or(existing.name),
            price: changes.price.unwrap_or(existing.price),
        };
        check_product(&updated.name, &updated.price)?;

        tables.products.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_product(&self, id: i32) -> RepositoryResult<Option<Product>> {
        let mut tables = self.enter()?;
        Ok(tables.products.remove(&id))
    }

    async fn count_products(&self) -> RepositoryResult<i64> {
        let tables = self.enter()?;
        Ok(tables.products.len() as i64)
    }

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let tables = self.enter()?;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> RepositoryResult<User> {
        let mut tables = self.enter()?;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(RepositoryError::ConstraintViolation(
                "users_username_key".to_string(),
            ));
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

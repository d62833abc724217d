use catalog_api::{
    error::RepositoryError,
    models::{NewProduct, UpdateProductRequest},
    repository::{PostgresRepository, Repository},
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::test;

// --- Test Context and Setup ---
//
// These tests need a disposable Postgres database:
//   DATABASE_URL=postgres://... cargo test -- --ignored

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

// --- Tests ---

#[test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_product_crud_round_trip() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let name = unique("Burger");

    let created = repo
        .create_product(NewProduct {
            name: name.clone(),
            price: Decimal::new(450, 2),
        })
        .await
        .unwrap();
    assert_eq!(created.name, name);

    let fetched = repo.get_product(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    let updated = repo
        .update_product(
            created.id,
            UpdateProductRequest {
                name: None,
                price: Some(Decimal::new(500, 2)),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, name);
    assert_eq!(updated.price, Decimal::new(500, 2));

    let deleted = repo.delete_product(created.id).await.unwrap().unwrap();
    assert_eq!(deleted, updated);
    assert!(repo.get_product(created.id).await.unwrap().is_none());
    assert!(repo.delete_product(created.id).await.unwrap().is_none());
}

#[test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_search_is_case_insensitive_ordered_and_limited() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let tag = unique("zq");

    for suffix in ["c", "a", "b"] {
        repo.create_product(NewProduct {
            name: format!("{tag} {suffix}"),
            price: Decimal::ONE,
        })
        .await
        .unwrap();
    }

    let found = repo
        .list_products(Some(tag.to_uppercase()), 2)
        .await
        .unwrap();

    let names: Vec<String> = found.into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec![format!("{tag} a"), format!("{tag} b")]);
}

#[test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_wildcards_in_search_match_literally() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let tag = unique("pct");

    repo.create_product(NewProduct {
        name: format!("{tag} 100% beef"),
        price: Decimal::ONE,
    })
    .await
    .unwrap();
    repo.create_product(NewProduct {
        name: format!("{tag} 1000 beef"),
        price: Decimal::ONE,
    })
    .await
    .unwrap();

    let found = repo
        .list_products(Some(format!("{tag} 100%")), 10)
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert!(found[0].name.ends_with("100% beef"));
}

#[test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_check_constraints_surface_as_constraint_violation() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let negative = repo
        .create_product(NewProduct {
            name: unique("Bad"),
            price: Decimal::new(-1, 0),
        })
        .await;
    assert!(matches!(negative, Err(RepositoryError::ConstraintViolation(_))));

    let blank = repo
        .create_product(NewProduct {
            name: "  ".to_string(),
            price: Decimal::ONE,
        })
        .await;
    assert!(matches!(blank, Err(RepositoryError::ConstraintViolation(_))));

    let overflow = repo
        .create_product(NewProduct {
            name: unique("Gold"),
            price: Decimal::new(1_000_000_000, 0),
        })
        .await;
    assert!(matches!(overflow, Err(RepositoryError::ConstraintViolation(_))));
}

#[test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_usernames_are_unique() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let username = unique("user");

    let user = repo.create_user(&username, "hash").await.unwrap();
    assert_eq!(user.username, username);

    let found = repo.find_user_by_username(&username).await.unwrap().unwrap();
    assert_eq!(found.password_hash, "hash");

    let duplicate = repo.create_user(&username, "other").await;
    assert!(matches!(duplicate, Err(RepositoryError::ConstraintViolation(_))));
}

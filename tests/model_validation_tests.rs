use catalog_api::{
    error::ApiError,
    models::{CreateProductRequest, Envelope, Product, UpdateProductRequest, User},
};
use rust_decimal::Decimal;
use serde_json::json;

#[test]
fn test_product_serializes_price_as_number() {
    let product = Product {
        id: 3,
        name: "Big Mac".to_string(),
        price: Decimal::new(599, 2),
    };

    let value = serde_json::to_value(&product).unwrap();

    assert_eq!(value["id"], 3);
    assert_eq!(value["name"], "Big Mac");
    assert_eq!(value["price"].as_f64(), Some(5.99));
}

#[test]
fn test_user_never_serializes_password_hash() {
    let user = User {
        id: 1,
        username: "etml".to_string(),
        password_hash: "$2b$10$secret".to_string(),
    };

    let value = serde_json::to_value(&user).unwrap();

    assert_eq!(value["username"], "etml");
    assert!(value.get("password_hash").is_none());
}

#[test]
fn test_envelope_omits_missing_data() {
    let error: Envelope<()> = Envelope::message_only("nope");
    assert_eq!(serde_json::to_value(&error).unwrap(), json!({ "message": "nope" }));

    let success = Envelope::success("ok", vec![1, 2]);
    assert_eq!(
        serde_json::to_value(&success).unwrap(),
        json!({ "message": "ok", "data": [1, 2] })
    );
}

#[test]
fn test_create_request_parses_integer_and_float_prices() {
    let whole: CreateProductRequest =
        serde_json::from_value(json!({ "name": "Fries", "price": 3 })).unwrap();
    let fractional: CreateProductRequest =
        serde_json::from_value(json!({ "name": "Fries", "price": 3.5 })).unwrap();

    assert_eq!(whole.price, Some(Decimal::new(3, 0)));
    assert_eq!(fractional.price, Some(Decimal::new(35, 1)));
}

#[test]
fn test_create_request_validation_keeps_name_as_sent() {
    let request = CreateProductRequest {
        name: Some("  Wrap ".to_string()),
        price: Some(Decimal::new(520, 2)),
    };

    let product = request.validate().unwrap();

    assert_eq!(product.name, "  Wrap ");
    assert_eq!(product.price, Decimal::new(520, 2));
}

#[test]
fn test_create_request_validation_failures() {
    let missing_name = CreateProductRequest {
        name: None,
        price: Some(Decimal::ONE),
    };
    let negative = CreateProductRequest {
        name: Some("Wrap".to_string()),
        price: Some(Decimal::new(-1, 2)),
    };

    assert!(matches!(missing_name.validate(), Err(ApiError::Validation(_))));
    assert!(matches!(negative.validate(), Err(ApiError::Validation(_))));
}

#[test]
fn test_update_request_partial_fields() {
    let request: UpdateProductRequest = serde_json::from_value(json!({ "price": 5.0 })).unwrap();
    assert!(request.name.is_none());

    let validated = request.validate().unwrap();
    assert_eq!(validated.price, Some(Decimal::new(5, 0)));

    let empty_name = UpdateProductRequest {
        name: Some(String::new()),
        price: None,
    };
    assert!(matches!(empty_name.validate(), Err(ApiError::Validation(_))));
}

#[test]
fn test_price_must_fit_two_decimal_column() {
    let with_price = |price: Decimal| CreateProductRequest {
        name: Some("Wrap".to_string()),
        price: Some(price),
    };

    assert!(with_price(Decimal::new(9_999_999_999, 2)).validate().is_ok());
    assert!(with_price(Decimal::new(5200, 3)).validate().is_ok());

    for rejected in [
        Decimal::new(5205, 3),
        Decimal::new(100_000_000, 0),
        Decimal::new(10_000_000_000, 2),
    ] {
        assert!(matches!(
            with_price(rejected).validate(),
            Err(ApiError::Validation(_))
        ));
    }
}

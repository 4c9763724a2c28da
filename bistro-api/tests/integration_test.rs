use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bistro_api::{app, AppState};
use bistro_store::Config;
use serde_json::{json, Value};
use tower::ServiceExt;

const STEAK: &str = "0b6f7c1e-5d2a-4c1b-9a51-3f0e2d4c6a01";
const PIZZA: &str = "0b6f7c1e-5d2a-4c1b-9a51-3f0e2d4c6a02";
const BYK_TVERSKAYA: &str = "7a3e9d10-1c2b-4f5e-8a9b-0c1d2e3f4a01";
const PIZZERIA_ARBAT: &str = "7a3e9d10-1c2b-4f5e-8a9b-0c1d2e3f4a02";

const CONFIG: &str = r#"
[server]
port = 0

[[menu.restaurants]]
id = "7a3e9d10-1c2b-4f5e-8a9b-0c1d2e3f4a01"
name = "Бык Тверская"
location = { latitude = 55.7649, longitude = 37.6050 }
brand = "THE БЫК"
delivery_time_minutes = 25
address = "Тверская 18"

[[menu.restaurants]]
id = "7a3e9d10-1c2b-4f5e-8a9b-0c1d2e3f4a02"
name = "Pizzeria Arbat"
location = { latitude = 55.7522, longitude = 37.5929 }
brand = "Pizzeria"
delivery_time_minutes = 20
address = "Арбат 10"

[[menu.dishes]]
id = "0b6f7c1e-5d2a-4c1b-9a51-3f0e2d4c6a01"
name = "Рибай"
price = 1200.0
category = "Стейки"
brand = "THE БЫК"

[[menu.dishes]]
id = "0b6f7c1e-5d2a-4c1b-9a51-3f0e2d4c6a02"
name = "Маргарита"
price = 600.0
category = "Пицца"
brand = "Pizzeria"

[[geocoding.addresses]]
address = "Красная площадь, 1"
coordinate = { latitude = 55.7539, longitude = 37.6208 }
"#;

fn test_app() -> Router {
    let config = Config::from_toml(CONFIG).unwrap();
    app(AppState::from_config(&config).unwrap())
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = call(app, "POST", "/v1/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

async fn add_steak(app: &Router, session: &str, quantity: u32) -> (StatusCode, Value) {
    call(
        app,
        "POST",
        &format!("/v1/sessions/{session}/cart/items"),
        Some(json!({ "dish_id": STEAK, "restaurant_id": BYK_TVERSKAYA, "quantity": quantity })),
    )
    .await
}

#[tokio::test]
async fn test_brand_conflict_flow() {
    let app = test_app();
    let session = new_session(&app).await;

    let (status, body) = add_steak(&app, &session, 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["outcome"], "ADDED");
    assert_eq!(body["cart"]["total"].as_f64(), Some(1200.0));

    let (status, body) = call(
        &app,
        "POST",
        &format!("/v1/sessions/{session}/cart/items"),
        Some(json!({ "dish_id": PIZZA, "restaurant_id": PIZZERIA_ARBAT })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["outcome"], "CONFLICT_PENDING");
    assert_eq!(body["cart"]["brand"], "THE БЫК");
    assert_eq!(body["cart"]["total"].as_f64(), Some(1200.0));

    let (status, body) = call(&app, "POST", &format!("/v1/sessions/{session}/cart/conflict/confirm"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["brand"], "Pizzeria");
    assert_eq!(body["cart"]["total"].as_f64(), Some(600.0));

    let (status, _) = call(&app, "POST", &format!("/v1/sessions/{session}/cart/conflict/confirm"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cart_quantity_bounds() {
    let app = test_app();
    let session = new_session(&app).await;
    add_steak(&app, &session, 98).await;

    let (status, _) = add_steak(&app, &session, 2).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/v1/sessions/{session}/cart/items/{STEAK}");
    let (status, body) = call(&app, "PATCH", &uri, Some(json!({ "delta": -98 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 0);
    assert_eq!(body["cart"]["items"].as_array().map(Vec::len), Some(0));

    let (status, _) = call(&app, "PATCH", &uri, Some(json!({ "delta": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_to_submission() {
    let app = test_app();
    let session = new_session(&app).await;
    add_steak(&app, &session, 1).await;
    let base = format!("/v1/sessions/{session}/checkout");

    let (status, body) = call(&app, "POST", &base, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "ADDRESS_OR_METHOD");

    // contact still missing
    let (status, _) = call(&app, "POST", &format!("{base}/advance"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(
        &app,
        "POST",
        &format!("{base}/contact"),
        Some(json!({ "name": "Анна", "phone": "+79161234567" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        "POST",
        &format!("{base}/address"),
        Some(json!({ "address": "Красная площадь, 1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calculation"]["is_available"], true);
    assert_eq!(body["calculation"]["address_validated"], true);
    assert_eq!(body["calculation"]["fee"].as_f64(), Some(200.0));

    let (_, body) = call(&app, "POST", &format!("{base}/advance"), None).await;
    assert_eq!(body["step"], "PAYMENT");

    let (status, _) = call(
        &app,
        "POST",
        &format!("{base}/tip"),
        Some(json!({ "kind": "custom", "value": "79228162514264337593543950335" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, "POST", &format!("{base}/tip"), Some(json!({ "kind": "preset", "value": 100 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checkout"]["summary"]["total"].as_f64(), Some(1500.0));

    let (_, body) = call(&app, "POST", &format!("{base}/advance"), None).await;
    assert_eq!(body["step"], "CONFIRMATION");

    let (status, body) = call(&app, "POST", &format!("{base}/submit"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["order_number"].as_str().unwrap().starts_with("THE-"));
    assert_eq!(body["total"].as_f64(), Some(1500.0));

    let (_, cart) = call(&app, "GET", &format!("/v1/sessions/{session}/cart"), None).await;
    assert_eq!(cart["total_items"], 0);

    let (status, _) = call(&app, "POST", &format!("{base}/cancel"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pickup_cancel_keeps_cart() {
    let app = test_app();
    let session = new_session(&app).await;
    add_steak(&app, &session, 2).await;
    let base = format!("/v1/sessions/{session}/checkout");
    call(&app, "POST", &base, None).await;

    let (status, body) = call(&app, "POST", &format!("{base}/method"), Some(json!({ "method": "PICKUP" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["calculation"].is_null());
    assert_eq!(body["checkout"]["summary"]["delivery_fee"].as_f64(), Some(0.0));
    assert_eq!(body["checkout"]["summary"]["fulfillment"]["window"]["max_minutes"], 30);

    let (status, body) = call(&app, "POST", &format!("{base}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "CANCELLED");

    let (_, cart) = call(&app, "GET", &format!("/v1/sessions/{session}/cart"), None).await;
    assert_eq!(cart["total_items"], 2);
}

#[tokio::test]
async fn test_quote_outside_zones() {
    let app = test_app();
    let (status, body) = call(
        &app,
        "POST",
        "/v1/delivery/quote",
        Some(json!({
            "restaurant_id": BYK_TVERSKAYA,
            "destination": { "kind": "point", "coordinate": { "latitude": 59.9311, "longitude": 30.3609 } },
            "order_amount": 1000
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calculation"]["is_available"], false);
    assert_eq!(body["calculation"]["reason"], "delivery unavailable in this area");
    assert_eq!(body["pickup"]["min_minutes"], 15);
}

#[tokio::test]
async fn test_unknown_address_falls_back() {
    let app = test_app();
    let (status, body) = call(
        &app,
        "POST",
        "/v1/delivery/quote",
        Some(json!({
            "restaurant_id": BYK_TVERSKAYA,
            "destination": { "kind": "address", "text": "Нигде, 0" },
            "order_amount": 500
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calculation"]["address_validated"], false);
    assert_eq!(body["calculation"]["is_available"], true);
}

#[tokio::test]
async fn test_zone_listing() {
    let app = test_app();
    let (status, body) = call(&app, "GET", "/v1/zones", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(5));

    let (_, body) = call(&app, "GET", "/v1/zones?lat=55.7539&lon=37.6208", None).await;
    let names: Vec<_> = body.as_array().unwrap().iter().map(|z| z["name"].clone()).collect();
    assert_eq!(names.len(), 2);

    let (status, _) = call(&app, "GET", "/v1/zones?lat=55.7", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_restaurant_listing() {
    let app = test_app();
    let (status, body) = call(&app, "GET", "/v1/restaurants", None).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body.as_array().unwrap().iter().filter_map(|r| r["id"].as_str()).collect();
    assert_eq!(ids, vec![PIZZERIA_ARBAT, BYK_TVERSKAYA]);
    assert_eq!(body[0]["address"], "Арбат 10");

    let (status, body) = call(&app, "GET", &format!("/v1/restaurants/{BYK_TVERSKAYA}/zones"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = test_app();
    let ghost = uuid::Uuid::new_v4();
    let (status, body) = call(&app, "GET", &format!("/v1/sessions/{ghost}/cart"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Session not found"));
}

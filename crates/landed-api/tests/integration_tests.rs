//! # Integration Tests for landed-api
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot`: band
//! management and overlap rejection, category CRUD, the configuration
//! singleton, quotes, bearer token issuance and the unauthenticated probes.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use landed_api::state::{AppConfig, AppState};

/// Helper: build the test app with auth disabled.
fn test_app() -> Router {
    landed_api::app(AppState::new())
}

/// Helper: build the test app with a static token and admin credentials.
fn test_app_with_auth() -> Router {
    let config = AppConfig::from_lookup(|key| {
        let value = match key {
            "AUTH_TOKEN" => "static-admin-token",
            "ADMIN_USERNAME" => "admin",
            "ADMIN_PASSWORD" => "hunter2",
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap();
    landed_api::app(AppState::with_config(config, None))
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: send a request and decode the JSON response (Null for empty bodies).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let text = body_string(response).await;
    let value = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, value)
}

async fn create_band(app: &Router, origin: &str, min: f64, max: f64, price: f64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/shipping-rates",
        Some(json!({
            "origin_country": origin,
            "min_weight": min,
            "max_weight": max,
            "price": price
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn create_category(app: &Router, name: &str, duty_rate: f64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/categories",
        Some(json!({ "name": name, "duty_rate": duty_rate })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn worked_example() -> Value {
    json!({
        "weight": 2,
        "length": 10,
        "width": 10,
        "height": 10,
        "item_value": 100,
        "category": "Electronics",
        "origin": "USA"
    })
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe_without_database() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/readiness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_probes_bypass_auth() {
    let app = test_app_with_auth();
    let (status, _) = send(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

// -- Calculator ---------------------------------------------------------------

#[tokio::test]
async fn test_worked_example_quote() {
    let app = test_app();
    create_band(&app, "USA", 0.0, 5.0, 20.0).await;
    create_category(&app, "Electronics", 0.1).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/calculator/calculate",
        Some(worked_example()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total"], 92.12);
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["billable_weight"], 2.0);
    assert_eq!(body["breakdown"]["shipping"], 20.0);
    assert_eq!(body["breakdown"]["duties"], 12.0);
    assert_eq!(body["breakdown"]["vat"], 23.1);
    assert_eq!(body["breakdown"]["local_fees"], 25.0);
    assert_eq!(body["breakdown"]["subtotal"], 80.1);
    assert_eq!(body["breakdown"]["margin"], 12.02);
}

#[tokio::test]
async fn test_quote_is_public_when_auth_enabled() {
    let app = test_app_with_auth();
    let token = Some("static-admin-token");
    send(
        &app,
        "POST",
        "/api/shipping-rates",
        Some(json!({"origin_country": "UK", "min_weight": 0, "max_weight": 5, "price": 20})),
        token,
    )
    .await;
    send(
        &app,
        "POST",
        "/api/categories",
        Some(json!({"name": "Books", "duty_rate": 0})),
        token,
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/calculator/calculate",
        Some(json!({"weight": "1.5", "category": "Books", "origin": "UK"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["currency"], "GBP");
}

#[tokio::test]
async fn test_unknown_category_is_rejected() {
    let app = test_app();
    create_band(&app, "USA", 0.0, 5.0, 20.0).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/calculator/calculate",
        Some(worked_example()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CATEGORY_NOT_FOUND");
}

#[tokio::test]
async fn test_no_rate_band_names_weight_and_origin() {
    let app = test_app();
    create_band(&app, "USA", 0.0, 5.0, 20.0).await;
    create_category(&app, "Electronics", 0.1).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/calculator/calculate",
        Some(json!({"weight": 40, "category": "Electronics", "origin": "USA"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NO_RATE_BAND");
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("40kg"), "{message}");
    assert!(message.contains("USA"), "{message}");
}

#[tokio::test]
async fn test_volumetric_weight_selects_band() {
    let app = test_app();
    create_band(&app, "USA", 0.0, 5.0, 20.0).await;
    create_band(&app, "USA", 5.0, 20.0, 45.0).await;
    create_category(&app, "Electronics", 0.1).await;

    // 50 x 40 x 30 / 5000 = 12kg, heavier than the 1kg actual weight.
    let (status, body) = send(
        &app,
        "POST",
        "/api/calculator/calculate",
        Some(json!({
            "weight": 1, "length": 50, "width": 40, "height": 30,
            "category": "Electronics", "origin": "USA"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["billable_weight"], 12.0);
    assert_eq!(body["breakdown"]["shipping"], 45.0);
}

#[tokio::test]
async fn test_boundary_weight_resolves_to_lower_band() {
    let app = test_app();
    create_band(&app, "USA", 0.0, 5.0, 20.0).await;
    create_band(&app, "USA", 5.0, 10.0, 30.0).await;
    create_category(&app, "Electronics", 0.0).await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/calculator/calculate",
        Some(json!({"weight": 5, "category": "Electronics", "origin": "USA"})),
        None,
    )
    .await;
    assert_eq!(body["breakdown"]["shipping"], 20.0);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let app = test_app();
    let cases = [
        (json!({"weight": -1, "category": "X", "origin": "USA"}), "weight"),
        (json!({"weight": "heavy", "category": "X", "origin": "USA"}), "weight"),
        (json!({"weight": 1, "origin": "USA"}), "category"),
        (json!({"weight": 1, "category": "X", "origin": "FR"}), "origin"),
    ];
    for (request, field) in cases {
        let (status, body) = send(
            &app,
            "POST",
            "/api/calculator/calculate",
            Some(request),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["code"], "INVALID_INPUT");
        assert_eq!(body["details"]["field"], field);
    }
}

#[tokio::test]
async fn test_category_is_referenced_by_name() {
    let app = test_app();
    create_band(&app, "USA", 0.0, 5.0, 20.0).await;
    let category = create_category(&app, "Electronics", 0.1).await;
    let id = category["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/categories/{id}"),
        Some(json!({"name": "Gadgets"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/calculator/calculate",
        Some(worked_example()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CATEGORY_NOT_FOUND");
}

// -- Rate Bands ---------------------------------------------------------------

#[tokio::test]
async fn test_overlapping_band_conflicts() {
    let app = test_app();
    create_band(&app, "USA", 0.0, 5.0, 20.0).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/shipping-rates",
        Some(json!({"origin_country": "USA", "min_weight": 4, "max_weight": 8, "price": 30})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "Weight range conflicts with existing band: 0kg - 5kg"
    );
}

#[tokio::test]
async fn test_touching_and_cross_origin_bands_are_accepted() {
    let app = test_app();
    create_band(&app, "USA", 0.0, 5.0, 20.0).await;
    create_band(&app, "USA", 5.0, 10.0, 30.0).await;
    create_band(&app, "UK", 0.0, 10.0, 25.0).await;

    let (status, body) = send(&app, "GET", "/api/shipping-rates", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let bands = body.as_array().unwrap();
    assert_eq!(bands.len(), 3);
    assert_eq!(bands[0]["origin_country"], "UK");
    assert_eq!(bands[1]["min_weight"], 0.0);
    assert_eq!(bands[2]["min_weight"], 5.0);

    let (_, body) = send(
        &app,
        "GET",
        "/api/shipping-rates?origin_country=USA",
        None,
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unsupported_origin_filter_is_rejected() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "GET",
        "/api/shipping-rates?origin_country=FR",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_inverted_range_is_validation_error() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/shipping-rates",
        Some(json!({"origin_country": "UK", "min_weight": 5, "max_weight": 1, "price": 10})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_band_update_excludes_itself_and_checks_others() {
    let app = test_app();
    let first = create_band(&app, "USA", 0.0, 5.0, 20.0).await;
    create_band(&app, "USA", 5.0, 10.0, 30.0).await;
    let id = first["id"].as_str().unwrap();
    let uri = format!("/api/shipping-rates/{id}");

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({"price": 22})), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["price"], 22.0);
    assert_eq!(body["max_weight"], 5.0);

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({"origin_country": "USA", "min_weight": 0, "max_weight": 6, "price": 22})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(body["max_weight"], 5.0);
}

#[tokio::test]
async fn test_band_patch_is_validated_after_merge() {
    let app = test_app();
    let first = create_band(&app, "USA", 0.0, 5.0, 20.0).await;
    create_band(&app, "USA", 5.0, 10.0, 30.0).await;
    let uri = format!("/api/shipping-rates/{}", first["id"].as_str().unwrap());

    // Merged range becomes [7, 5].
    let (status, body) = send(&app, "PATCH", &uri, Some(json!({"min_weight": 7})), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Merged range [0, 6] runs into [5, 10].
    let (status, body) = send(&app, "PATCH", &uri, Some(json!({"max_weight": 6})), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["min_weight"], 0.0);
    assert_eq!(body["max_weight"], 5.0);
    assert_eq!(body["price"], 20.0);
}

#[tokio::test]
async fn test_band_delete_and_not_found() {
    let app = test_app();
    let band = create_band(&app, "UK", 0.0, 2.0, 9.5).await;
    let uri = format!("/api/shipping-rates/{}", band["id"].as_str().unwrap());

    let (status, _) = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    let (status, _) = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/shipping-rates")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Categories ---------------------------------------------------------------

#[tokio::test]
async fn test_category_crud() {
    let app = test_app();
    create_category(&app, "Toys", 0.05).await;
    let books = create_category(&app, "Books", 0.0).await;

    let (status, body) = send(&app, "GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Books", "Toys"]);

    let uri = format!("/api/categories/{}", books["id"].as_str().unwrap());
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({"name": "Books", "duty_rate": 0.02})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duty_rate"], 0.02);

    let (status, _) = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_category_name_conflicts() {
    let app = test_app();
    create_category(&app, "Toys", 0.05).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/categories",
        Some(json!({"name": "Toys", "duty_rate": 0.1})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_invalid_category_is_validation_error() {
    let app = test_app();
    for request in [
        json!({"name": "", "duty_rate": 0.1}),
        json!({"name": "x".repeat(51), "duty_rate": 0.1}),
        json!({"name": "Toys", "duty_rate": -0.1}),
    ] {
        let (status, body) = send(&app, "POST", "/api/categories", Some(request), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    }
}

// -- Shipping Config ----------------------------------------------------------

#[tokio::test]
async fn test_config_is_created_with_defaults() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/api/shipping-config", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vat_rate"], 17.5);
    assert_eq!(body["local_handling_fee"], 25.0);
    assert_eq!(body["margin_rate"], 15.0);
}

#[tokio::test]
async fn test_config_patch_and_put() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "PATCH",
        "/api/shipping-config",
        Some(json!({"margin_rate": 20})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["margin_rate"], 20.0);
    assert_eq!(body["vat_rate"], 17.5);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/shipping-config",
        Some(json!({"vat_rate": 20, "local_handling_fee": 10, "margin_rate": 5})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["local_handling_fee"], 10.0);

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/shipping-config",
        Some(json!({"vat_rate": -1})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, body) = send(&app, "GET", "/api/shipping-config", None, None).await;
    assert_eq!(body["vat_rate"], 20.0);
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_public_caller_cannot_write() {
    let app = test_app_with_auth();
    let (status, body) = send(
        &app,
        "POST",
        "/api/categories",
        Some(json!({"name": "Toys", "duty_rate": 0.05})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = send(&app, "GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_bearer_token_is_unauthorized() {
    let app = test_app_with_auth();
    let (status, body) = send(&app, "GET", "/api/shipping-rates", None, Some("nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_issuance_grants_admin() {
    let app = test_app_with_auth();
    let (status, body) = send(
        &app,
        "POST",
        "/api/token",
        Some(json!({"username": "admin", "password": "hunter2"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    let access = body["access"].as_str().unwrap().to_string();
    assert_eq!(access.len(), 64);

    let (status, _) = send(
        &app,
        "POST",
        "/api/categories",
        Some(json!({"name": "Toys", "duty_rate": 0.05})),
        Some(&access),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_token_rejects_wrong_password() {
    let app = test_app_with_auth();
    let (status, body) = send(
        &app,
        "POST",
        "/api/token",
        Some(json!({"username": "admin", "password": "wrong"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_unavailable_without_credentials() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/token",
        Some(json!({"username": "admin", "password": "x"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

// -- Metrics & OpenAPI --------------------------------------------------------

#[tokio::test]
async fn test_metrics_count_requests() {
    let app = test_app();
    send(&app, "GET", "/api/shipping-rates", None, None).await;
    send(&app, "GET", "/api/shipping-rates/not-a-uuid", None, None).await;

    let (status, body) = send(&app, "GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("landed_http_requests_total{method=\"GET\"} 2\n"), "{text}");
    assert!(text.contains("landed_http_errors_total{class=\"4xx\"} 1\n"), "{text}");
}

#[tokio::test]
async fn test_openapi_spec_is_served() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/calculator/calculate"].is_object());
}

//! Integration tests for the product catalog surface.

use axum::http::StatusCode;
use serde_json::json;

use orchard_integration_tests::{TestContext, json_request, send};

#[tokio::test]
async fn empty_catalog_lists_as_empty() {
    let ctx = TestContext::new();

    let (status, body) = send(&ctx.router, json_request("GET", "/products", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["products"], json!([]));
}

#[tokio::test]
async fn create_then_fetch_product() {
    let ctx = TestContext::new();

    let (status, created) = send(
        &ctx.router,
        json_request(
            "POST",
            "/products",
            None,
            Some(&json!({
                "title": "Walnut Desk",
                "description": "A desk made of walnut.",
                "price": "349.00",
                "category": "furniture",
                "stock": 4
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().expect("product id");

    let (status, fetched) = send(
        &ctx.router,
        json_request("GET", &format!("/products/{id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Walnut Desk");
    assert_eq!(fetched["stock"], 4);
}

#[tokio::test]
async fn unknown_product_is_404() {
    let ctx = TestContext::new();

    let (status, _) = send(
        &ctx.router,
        json_request("GET", "/products/12345", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_filter_is_exact_match() {
    let ctx = TestContext::new();
    ctx.products.seed("Widget A", 9_99, 5);
    ctx.products.seed("Widget B", 4_99, 5);

    let (status, all) = send(&ctx.router, json_request("GET", "/products", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["count"], 2);

    // Seeded products carry category "test"; exact match only.
    let (_, matching) = send(
        &ctx.router,
        json_request("GET", "/products?category=test", None, None),
    )
    .await;
    assert_eq!(matching["count"], 2);

    let (_, none) = send(
        &ctx.router,
        json_request("GET", "/products?category=tes", None, None),
    )
    .await;
    assert_eq!(none["count"], 0);
}

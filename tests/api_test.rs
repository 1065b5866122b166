//! Tests for REST API endpoints

mod mocks;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use mocks::*;
use split_aggr::router::create_api_router;

fn create_test_router() -> Router {
    create_api_router(Arc::new(router(eth_dai_pools())))
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, _) = get_json(create_test_router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_quote_returns_string_amounts() {
    let (status, body) = post_json(
        create_test_router(),
        "/api/v1/quote",
        json!({
            "fromAsset": "ETH",
            "toAsset": "DAI",
            "amountIn": "1000000000",
            "parts": 10,
            "flags": "0x0"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ret: u128 = body["returnAmount"].as_str().unwrap().parse().unwrap();
    assert!(ret > 0);
    let total: u64 = body["distribution"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_u64().unwrap())
        .sum();
    assert_eq!(total, 10);
    assert_eq!(body["sources"].as_array().unwrap().len(), 3);
    assert_eq!(body["noRoute"], false);
}

#[tokio::test]
async fn test_quote_with_everything_disabled() {
    let (status, body) = post_json(
        create_test_router(),
        "/api/v1/quote",
        json!({
            "fromAsset": "eth",
            "toAsset": "dai",
            "amountIn": "1000000000",
            "parts": 10,
            "flags": "0x60000000"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["returnAmount"], "0");
    assert_eq!(body["noRoute"], true);
}

#[tokio::test]
async fn test_quote_rejects_same_asset() {
    let (status, body) = post_json(
        create_test_router(),
        "/api/v1/quote",
        json!({
            "fromAsset": "eth",
            "toAsset": "eth",
            "amountIn": "1000",
            "parts": 10
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("identical"));
}

#[tokio::test]
async fn test_swap_slippage_is_unprocessable() {
    let app = create_test_router();
    let (_, quote) = post_json(
        app.clone(),
        "/api/v1/quote",
        json!({
            "fromAsset": "eth",
            "toAsset": "dai",
            "amountIn": "1000000000",
            "parts": 10
        }),
    )
    .await;
    let ret: u128 = quote["returnAmount"].as_str().unwrap().parse().unwrap();

    let (status, body) = post_json(
        app.clone(),
        "/api/v1/swap",
        json!({
            "fromAsset": "eth",
            "toAsset": "dai",
            "amountIn": "1000000000",
            "minReturn": ret.to_string(),
            "distribution": quote["distribution"],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["returnAmount"], ret.to_string());

    let (status, _) = post_json(
        app,
        "/api/v1/swap",
        json!({
            "fromAsset": "eth",
            "toAsset": "dai",
            "amountIn": "1000000000",
            "minReturn": (ret + 1).to_string(),
            "distribution": quote["distribution"],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_sources_listing() {
    let (status, body) = get_json(create_test_router(), "/api/v1/sources").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["uniswap", "uniswap-v2", "balancer-1"]);
    assert_eq!(body[2]["toggles"], json!(["BALANCER_1", "BALANCER_ALL"]));
}

#[tokio::test]
async fn test_stats_endpoint() {
    let (status, body) = get_json(create_test_router(), "/api/v1/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["execution"]["totalExecutions"], 0);
    assert_eq!(body["sources"], 3);
}

#[tokio::test]
async fn test_quote_rejects_mask_beyond_json_integers() {
    let (status, _) = post_json(
        create_test_router(),
        "/api/v1/quote",
        json!({
            "fromAsset": "eth",
            "toAsset": "dai",
            "amountIn": "1000",
            "parts": 10,
            "flags": 1.2e21
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = post_json(
        create_test_router(),
        "/api/v1/quote",
        json!({
            "fromAsset": "eth",
            "toAsset": "dai",
            "amountIn": "1000",
            "parts": 10,
            "flags": "1267650600228229401496703205376"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["noRoute"], false);
}

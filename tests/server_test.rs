use std::net::SocketAddr;
use std::sync::Arc;

use review_sentiment::server::{self, LIVENESS_MESSAGE};
use review_sentiment::{Sentiment, SentimentModel};
use serde_json::{json, Value};
use tokio::net::TcpListener;

fn review_model() -> Result<SentimentModel, Box<dyn std::error::Error>> {
    Ok(SentimentModel::builder()
        .add_example("I love this tablet, great screen", Sentiment::Positive)
        .add_example("Best purchase ever, excellent value", Sentiment::Positive)
        .add_example("Works great, love it", Sentiment::Positive)
        .add_example("Terrible, it broke after a week", Sentiment::Negative)
        .add_example("Worst purchase, awful battery", Sentiment::Negative)
        .add_example("Returned it, waste of money", Sentiment::Negative)
        .build()?)
}

/// Serves the router on an ephemeral port and returns its address.
async fn spawn_server(cors: bool) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let app = server::router(Arc::new(review_model()?), cors);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });
    Ok(addr)
}

#[tokio::test]
async fn test_liveness() -> Result<(), Box<dyn std::error::Error>> {
    let addr = spawn_server(true).await?;

    let response = reqwest::get(format!("http://{}/", addr)).await?;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, LIVENESS_MESSAGE);
    Ok(())
}

#[tokio::test]
async fn test_prediction_positive() -> Result<(), Box<dyn std::error::Error>> {
    let addr = spawn_server(true).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/prediction", addr))
        .json(&json!({"post_id": "7", "comment": "I love this tablet, best purchase ever"}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({
            "post_id": "7",
            "comment": "I love this tablet, best purchase ever",
            "prediction": "Positive"
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_prediction_negative_with_numeric_id() -> Result<(), Box<dyn std::error::Error>> {
    let addr = spawn_server(true).await?;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("http://{}/prediction", addr))
        .json(&json!({"post_id": 42, "comment": "<b>Terrible</b>, it broke. Waste of money!"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["post_id"], json!(42));
    assert_eq!(body["prediction"], "Negative");
    assert_eq!(body["comment"], "<b>Terrible</b>, it broke. Waste of money!");
    Ok(())
}

#[tokio::test]
async fn test_empty_comment_is_classified() -> Result<(), Box<dyn std::error::Error>> {
    let addr = spawn_server(true).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/prediction", addr))
        .json(&json!({"post_id": "e", "comment": ""}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert!(body["prediction"] == "Positive" || body["prediction"] == "Negative");
    Ok(())
}

#[tokio::test]
async fn test_invalid_requests() -> Result<(), Box<dyn std::error::Error>> {
    let addr = spawn_server(true).await?;
    let client = reqwest::Client::new();
    let url = format!("http://{}/prediction", addr);

    let missing = client.post(&url).json(&json!({"post_id": "1"})).send().await?;
    assert_eq!(missing.status(), 422);
    let body: Value = missing.json().await?;
    assert!(body["error"].as_str().unwrap_or_default().contains("comment"));

    let wrong_type = client
        .post(&url)
        .json(&json!({"post_id": "1", "comment": 5}))
        .send()
        .await?;
    assert_eq!(wrong_type.status(), 422);

    let not_an_object = client.post(&url).json(&json!(["hello"])).send().await?;
    assert_eq!(not_an_object.status(), 400);

    let malformed = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(malformed.status(), 400);
    let body: Value = malformed.json().await?;
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_cors_headers() -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let addr = spawn_server(true).await?;
    let response = client
        .get(format!("http://{}/", addr))
        .header("origin", "http://example.com")
        .send()
        .await?;
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let addr = spawn_server(false).await?;
    let response = client
        .get(format!("http://{}/", addr))
        .header("origin", "http://example.com")
        .send()
        .await?;
    assert!(response.headers().get("access-control-allow-origin").is_none());
    Ok(())
}

#[tokio::test]
async fn test_unknown_route() -> Result<(), Box<dyn std::error::Error>> {
    let addr = spawn_server(true).await?;
    let response = reqwest::get(format!("http://{}/predict", addr)).await?;
    assert_eq!(response.status(), 404);

    let response = reqwest::get(format!("http://{}/prediction", addr)).await?;
    assert_eq!(response.status(), 405);
    Ok(())
}

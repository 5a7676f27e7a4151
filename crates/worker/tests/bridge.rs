use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use engine::{Currency, Engine};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;
use worker::{SeedMode, Worker, WorkerOptions, router};

async fn app() -> axum::Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    router(Worker::new(
        engine,
        WorkerOptions {
            default_currency: Currency::try_from("USD").unwrap(),
            seed_mode: SeedMode::Inline,
        },
    ))
}

fn post(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/messages")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn envelopes_round_trip_over_http() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(post(json!({
            "type": "add-Wallet",
            "payload": { "user_id": "alice", "name": "Cash", "money": 5 }
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let envelope = json_body(response).await;
    assert_eq!(envelope["type"], "add-Wallet");
    assert_eq!(envelope["status"], 200);
    assert_eq!(envelope["payload"]["money"], 5.0);

    let response = app
        .oneshot(post(json!({ "type": "get-Wallets", "payload": { "_id": "alice" } })))
        .await
        .unwrap();
    let envelope = json_body(response).await;
    assert_eq!(envelope["payload"]["wallets"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failures_travel_inside_the_envelope() {
    let app = app().await;
    let response = app
        .oneshot(post(json!({ "type": "nope", "payload": {} })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let envelope = json_body(response).await;
    assert_eq!(envelope["status"], 400);
    assert_eq!(envelope["type"], "Error");
}

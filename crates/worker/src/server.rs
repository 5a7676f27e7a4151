//! HTTP bridge: accepts request envelopes on `POST /messages`.
//!
//! The envelope carries its own status, so the HTTP status is always 200
//! once the body parsed.

use std::sync::Arc;

use api_types::envelope::{Request, Response};
use axum::{Json, Router, extract::State, routing::post};

use crate::{Worker, process};

#[derive(Clone)]
pub struct ServerState {
    pub worker: Arc<Worker>,
}

async fn messages(State(state): State<ServerState>, Json(request): Json<Request>) -> Json<Response> {
    Json(process(&state.worker, request).await)
}

pub fn router(worker: Worker) -> Router {
    Router::new()
        .route("/messages", post(messages))
        .with_state(ServerState {
            worker: Arc::new(worker),
        })
}

pub async fn run_with_listener(
    worker: Worker,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Bridge listening on {}", addr);

    axum::serve(listener, router(worker)).await
}

use axum::Json;
use serde_json::{Value, json};

pub async fn index() -> Json<Value> {
    Json(json!({
        "service": "drug-repurposing-analyzer",
        "status": "ready"
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "drug-repurposing-analyzer",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({
        "service": "contract-node",
        "version": option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
        "status": "ok",
        "timestamp": chrono::Utc::now().timestamp_millis().to_string(),
    }))
}

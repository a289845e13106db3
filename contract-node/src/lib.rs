pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use state::AppState;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/user/create", put(routes::users::create_user))
        .route("/user/:uuid", get(routes::users::get_user))
        .route(
            "/contract",
            post(routes::contracts::create_contract).get(routes::contracts::list_contracts),
        )
        .route(
            "/contract/:uuid",
            get(routes::contracts::get_contract)
                .put(routes::contracts::update_contract)
                .delete(routes::contracts::delete_contract),
        )
        .route("/contract/:uuid/sign", put(routes::contracts::sign_step))
        .route("/contracts", get(routes::contracts::list_contracts))
        .route("/magic/spell/:name", post(routes::magic::cast_spell))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use contract_core::keys::KeyRegistry;
    use contract_core::store::{LocalStore, RemoteAdapter, ReplicatedStore, UserStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(dir: &std::path::Path) -> AppState {
        AppState {
            store: Arc::new(ReplicatedStore::new(
                LocalStore::new(dir.join("contracts")),
                RemoteAdapter::new("http://127.0.0.1:1"),
                KeyRegistry::new(dir.join("keys")),
            )),
            users: Arc::new(UserStore::new(dir.join("users"))),
            env: "development".to_string(),
        }
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn get_unknown_contract_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));
        let uuid = uuid::Uuid::new_v4();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/contract/{uuid}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_contract_with_bad_signature_is_401() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));

        let body = serde_json::json!({
            "timestamp": "1000",
            "signature": "not-a-real-signature",
            "userUuid": "user-a",
            "pubKey": "deadbeef",
            "title": "Test",
            "participants": ["a", "b"],
            "steps": [{ "description": "Step one" }],
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/contract")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

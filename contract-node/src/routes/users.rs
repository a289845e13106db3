use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use contract_core::crypto::{user_create_message, user_fetch_message, verify};
use contract_core::model::User;
use contract_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub pub_key: String,
    pub timestamp: String,
    pub signature: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let message = user_create_message(&req.timestamp, &req.pub_key);
    if !verify(&req.signature, &message, &req.pub_key) {
        return Err(ApiError(Error::AuthFailed));
    }

    let user = User {
        uuid: Uuid::new_v4(),
        pub_key: req.pub_key,
        display_name: req.display_name,
        created_at: Utc::now().timestamp_millis().to_string(),
    };
    state.users.save(&user).await?;
    Ok(Json(json!({ "success": true, "data": { "uuid": user.uuid } })))
}

#[derive(Deserialize)]
pub struct FetchUserQuery {
    pub timestamp: String,
    pub signature: String,
}

#[derive(Serialize)]
struct UserEnvelope {
    success: bool,
    data: User,
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Query(query): Query<FetchUserQuery>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = state.users.load(&uuid).await?;
    let message = user_fetch_message(&query.timestamp, &uuid.to_string());
    if !verify(&query.signature, &message, &user.pub_key) {
        return Err(ApiError(Error::AuthFailed));
    }
    Ok(Json(UserEnvelope { success: true, data: user }))
}

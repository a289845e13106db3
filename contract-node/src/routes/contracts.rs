use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use contract_core::auth::{authenticate, AuthRequest};
use contract_core::model::{Contract, ContractSummary, ContractUpdate, NewContract, SignStepOutcome};
use contract_core::state_machine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    pub timestamp: String,
    pub signature: String,
    pub user_uuid: String,
    pub pub_key: String,
    #[serde(flatten)]
    pub contract: NewContract,
}

pub async fn create_contract(
    State(state): State<AppState>,
    Json(req): Json<CreateContractRequest>,
) -> Result<Json<Value>, ApiError> {
    authenticate(&AuthRequest {
        signature: &req.signature,
        timestamp: &req.timestamp,
        user_uuid: &req.user_uuid,
        pub_key: &req.pub_key,
        contract_uuid: None,
    })?;

    let contract = state_machine::create(&state.store, req.contract, req.pub_key).await?;
    Ok(Json(json!({ "success": true, "data": contract })))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let contract = state.store.get(&uuid).await?;
    Ok(Json(json!({ "success": true, "data": contract })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContractRequest {
    pub timestamp: String,
    pub signature: String,
    pub user_uuid: String,
    pub pub_key: String,
    #[serde(flatten)]
    pub patch: ContractUpdate,
}

pub async fn update_contract(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<UpdateContractRequest>,
) -> Result<Json<Value>, ApiError> {
    authenticate(&AuthRequest {
        signature: &req.signature,
        timestamp: &req.timestamp,
        user_uuid: &req.user_uuid,
        pub_key: &req.pub_key,
        contract_uuid: Some(&uuid.to_string()),
    })?;

    let contract = state_machine::update(&state.store, uuid, &req.pub_key, req.patch).await?;
    Ok(Json(json!({ "success": true, "data": contract })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignStepRequest {
    pub timestamp: String,
    pub signature: String,
    pub user_uuid: String,
    pub pub_key: String,
    pub step_id: Uuid,
    pub step_signature: String,
}

#[derive(Serialize)]
struct SignStepResponse {
    success: bool,
    data: SignStepResponseData,
}

#[derive(Serialize)]
struct SignStepResponseData {
    contract: Contract,
    outcome: SignStepOutcome,
}

pub async fn sign_step(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<SignStepRequest>,
) -> Result<Json<SignStepResponse>, ApiError> {
    authenticate(&AuthRequest {
        signature: &req.signature,
        timestamp: &req.timestamp,
        user_uuid: &req.user_uuid,
        pub_key: &req.pub_key,
        contract_uuid: Some(&uuid.to_string()),
    })?;

    let (contract, outcome) = state_machine::sign_step(
        &state.store,
        uuid,
        &req.pub_key,
        &req.user_uuid,
        req.step_id,
        &req.step_signature,
        &req.timestamp,
    )
    .await?;

    Ok(Json(SignStepResponse { success: true, data: SignStepResponseData { contract, outcome } }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteContractRequest {
    pub timestamp: String,
    pub signature: String,
    pub user_uuid: String,
    pub pub_key: String,
}

pub async fn delete_contract(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<DeleteContractRequest>,
) -> Result<Json<Value>, ApiError> {
    authenticate(&AuthRequest {
        signature: &req.signature,
        timestamp: &req.timestamp,
        user_uuid: &req.user_uuid,
        pub_key: &req.pub_key,
        contract_uuid: Some(&uuid.to_string()),
    })?;

    state_machine::delete(&state.store, uuid, &req.pub_key).await?;
    Ok(Json(json!({ "success": true, "data": { "uuid": uuid } })))
}

#[derive(Deserialize)]
pub struct ListContractsQuery {
    pub participant: Option<String>,
}

#[derive(Serialize)]
struct ListContractsResponse {
    success: bool,
    data: Vec<ContractSummary>,
}

pub async fn list_contracts(
    State(state): State<AppState>,
    Query(query): Query<ListContractsQuery>,
) -> Result<Json<ListContractsResponse>, ApiError> {
    let mut summaries = state.store.list().await?;
    if let Some(participant) = query.participant {
        summaries.retain(|s| s.participants.iter().any(|p| p == &participant));
    }
    Ok(Json(ListContractsResponse { success: true, data: summaries }))
}

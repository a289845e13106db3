//! `POST /magic/spell/:name` (spec.md §6, §4.8): the effect-resolver
//! entry path. The resolver upstream has already verified the caster's
//! signature; spell failures are reported as HTTP 200 with a `900` code
//! carried in the body rather than through the normal status mapping
//! (spec.md §6 "Status codes").

use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use contract_core::resolver::{resolve, Spell};
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellRequest {
    pub timestamp: String,
    pub caster_signature: String,
    #[serde(default)]
    pub components: Map<String, Value>,
}

pub async fn cast_spell(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<SpellRequest>,
) -> Json<Value> {
    let spell = Spell {
        name,
        components: req.components,
        timestamp: req.timestamp,
        caster_signature: req.caster_signature,
    };

    match resolve(&state.store, &state.users, &spell).await {
        Ok(data) => Json(json!({ "success": true, "data": data })),
        Err(e) => Json(json!({ "success": false, "error": e.to_string(), "code": 900 })),
    }
}

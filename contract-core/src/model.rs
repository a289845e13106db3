use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Hex-encoded secp256k1 public key. Used both as a participant identity
/// and, for the per-contract keypair, as the contract's own identity (§4.2).
pub type PubKeyHex = String;

/// A free-form tagged payload attached to a step, opaque to the core
/// (spec.md §9 "Effect descriptors as open data"). Stored and copied
/// verbatim; never inspected beyond presence/absence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Optional opaque association identifiers (product / external-location
/// references). Carried through unchanged, never validated (§10.5).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssociationIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}

/// The signature bytes, the fields that went into the signed message,
/// and the wall-clock time the record was created (§3 SignatureRecord).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    pub signature: String,
    pub timestamp: String,
    pub signer_pub_key: PubKeyHex,
    pub signed_message: String,
    pub signed_at: String,
}

/// One unit of a contract, completed once every participant has signed it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: Uuid,
    pub description: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "magic_spell")]
    pub magic_spell: Option<EffectDescriptor>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "completed_at")]
    pub completed_at: Option<String>,
    /// Exactly one entry per participant public key (invariant 1). `None`
    /// means unsigned; ordering follows the participant list so the map
    /// round-trips as stable JSON.
    pub signatures: BTreeMap<PubKeyHex, Option<SignatureRecord>>,
}

impl Step {
    /// True iff every participant has a non-null signature (invariant 2).
    pub fn is_fully_signed(&self) -> bool {
        !self.signatures.is_empty() && self.signatures.values().all(|s| s.is_some())
    }
}

/// A multi-party agreement: an ordered sequence of steps, each completed
/// by the unanimous signature of the participant list (§3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub uuid: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub participants: Vec<PubKeyHex>,
    pub steps: Vec<Step>,
    #[serde(alias = "creator_pub_key")]
    pub creator: PubKeyHex,
    #[serde(alias = "created_at")]
    pub created_at: String,
    #[serde(alias = "updated_at")]
    pub updated_at: String,
    pub status: String,
    #[serde(default)]
    pub association_ids: AssociationIds,
    /// The contract's own public key, fixed at first persistence
    /// (invariant 5). `None` until the first successful write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_key: Option<PubKeyHex>,
    /// The remote object-store record id, set after the first successful
    /// `createRecord` call. Absent when the remote was unavailable on
    /// create (S5) or the contract has never been replicated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_record_id: Option<String>,
}

/// Summary view returned by `LocalStore::list` (§4.3): enough to render a
/// list without loading every full document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractSummary {
    pub uuid: Uuid,
    pub title: String,
    pub participants: Vec<PubKeyHex>,
    pub created_at: String,
    pub updated_at: String,
    pub step_count: usize,
    pub completed_step_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_key: Option<PubKeyHex>,
}

impl From<&Contract> for ContractSummary {
    fn from(c: &Contract) -> Self {
        ContractSummary {
            uuid: c.uuid,
            title: c.title.clone(),
            participants: c.participants.clone(),
            created_at: c.created_at.clone(),
            updated_at: c.updated_at.clone(),
            step_count: c.steps.len(),
            completed_step_count: c.steps.iter().filter(|s| s.completed).count(),
            remote_record_id: c.remote_record_id.clone(),
            pub_key: c.pub_key.clone(),
        }
    }
}

/// A secp256k1 keypair, persisted one file per public key (§3 KeyPair).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPair {
    pub pub_key: PubKeyHex,
    pub private_key: PubKeyHex,
}

/// The aggregate `contract UUID -> contract public key` document (§3
/// ContractKeyMap), persisted as a single file and cached in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractKeyMap {
    pub bindings: BTreeMap<Uuid, PubKeyHex>,
}

/// Raw input for contract creation, before ids/timestamps/signature maps
/// are assigned (feeds `StateMachine::create`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub participants: Vec<PubKeyHex>,
    pub steps: Vec<NewStep>,
    #[serde(default)]
    pub association_ids: AssociationIds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStep {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub description: String,
    #[serde(default, alias = "magic_spell")]
    pub magic_spell: Option<EffectDescriptor>,
}

/// Partial update restricted to the fields update operations may touch
/// (§4.6 "Update operation"). Any other field on the wire is silently
/// ignored by the caller deserializing into this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Option<Vec<Step>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Outcome of a sign-step call, surfaced verbatim to HTTP callers (§8 S1/S2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignStepOutcome {
    pub step_completed: bool,
    pub magic_triggered: bool,
}

/// A registered caller identity (§6 `/user/create`, `/user/:uuid`). Kept
/// deliberately thin — the core only needs enough of a user record to
/// authenticate endpoint-auth signatures against a known public key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uuid: Uuid,
    pub pub_key: PubKeyHex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub pub_key: PubKeyHex,
    #[serde(default)]
    pub display_name: Option<String>,
}

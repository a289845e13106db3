//! Contract State Machine (C6, spec.md §4.6).
//!
//! All state transitions on a contract document: validation, the
//! create/update/sign-step/delete operations, and completion detection.
//! Authorization here is content-dependent (creator vs. participant) and
//! therefore lives here rather than in the Auth Gate (§4.7).

use crate::crypto::{step_message, verify};
use crate::error::Error;
use crate::model::{Contract, ContractUpdate, NewContract, SignStepOutcome, Step};
use crate::store::ReplicatedStore;
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

fn now_millis() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Validation applied before create and after any update (§4.6
/// "Validation"). Fails on the first violation found.
pub fn validate(contract: &Contract) -> Result<(), Error> {
    if contract.title.trim().is_empty() {
        return Err(Error::Validation("title must be a non-empty string".into()));
    }

    if contract.participants.len() < 2 {
        return Err(Error::Validation("participants must contain at least 2 entries".into()));
    }
    if contract.participants.iter().any(|p| p.trim().is_empty()) {
        return Err(Error::Validation("participants must be non-empty strings".into()));
    }
    let mut seen = std::collections::HashSet::new();
    if !contract.participants.iter().all(|p| seen.insert(p)) {
        return Err(Error::Validation("participants must not contain duplicates".into()));
    }

    if contract.steps.is_empty() {
        return Err(Error::Validation("steps must contain at least 1 entry".into()));
    }
    for step in &contract.steps {
        if step.description.trim().is_empty() {
            return Err(Error::Validation("each step must have a non-empty description".into()));
        }
    }

    Ok(())
}

/// Create operation (§4.6): assigns ids/order/timestamps, seeds every
/// step's signature map with the participant list, validates, and
/// persists through the replicated store.
pub async fn create(
    store: &ReplicatedStore,
    input: NewContract,
    creator: String,
) -> Result<Contract, Error> {
    let now = now_millis();
    let steps = input
        .steps
        .into_iter()
        .enumerate()
        .map(|(index, s)| Step {
            id: s.id.unwrap_or_else(Uuid::new_v4),
            description: s.description,
            order: index as u32,
            magic_spell: s.magic_spell,
            completed: false,
            completed_at: None,
            signatures: input
                .participants
                .iter()
                .map(|p| (p.clone(), None))
                .collect::<BTreeMap<_, _>>(),
        })
        .collect();

    let contract = Contract {
        uuid: Uuid::new_v4(),
        title: input.title,
        description: input.description,
        participants: input.participants,
        steps,
        creator,
        created_at: now.clone(),
        updated_at: now,
        status: "active".to_string(),
        association_ids: input.association_ids,
        pub_key: None,
        remote_record_id: None,
    };

    validate(&contract)?;
    store.create(contract).await
}

/// Update operation (§4.6): overlays the permitted fields, refreshes the
/// updated timestamp, revalidates, and persists. Other fields on the
/// wire are not represented in `ContractUpdate` and so cannot leak in.
pub async fn update(
    store: &ReplicatedStore,
    uuid: Uuid,
    caller: &str,
    patch: ContractUpdate,
) -> Result<Contract, Error> {
    let _guard = store.lock(&uuid).await;
    let mut contract = store.get(&uuid).await?;

    if caller != contract.creator && !contract.participants.iter().any(|p| p == caller) {
        return Err(Error::Forbidden);
    }

    if let Some(title) = patch.title {
        contract.title = title;
    }
    if let Some(description) = patch.description {
        contract.description = Some(description);
    }
    if let Some(steps) = patch.steps {
        contract.steps = steps;
    }
    if let Some(status) = patch.status {
        contract.status = status;
    }
    contract.updated_at = now_millis();

    validate(&contract)?;
    store.update(&contract).await?;
    Ok(contract)
}

/// Sign-step operation (§4.6). Applies the caller's signature to the
/// named step, then recomputes completion and the effect-trigger signal.
pub async fn sign_step(
    store: &ReplicatedStore,
    uuid: Uuid,
    caller_pub_key: &str,
    caller_uuid: &str,
    step_id: Uuid,
    step_signature: &str,
    timestamp: &str,
) -> Result<(Contract, SignStepOutcome), Error> {
    let _guard = store.lock(&uuid).await;
    let mut contract = store.get(&uuid).await?;

    if !contract.participants.iter().any(|p| p == caller_pub_key) {
        return Err(Error::Forbidden);
    }

    let step_index = contract
        .steps
        .iter()
        .position(|s| s.id == step_id)
        .ok_or(Error::StepNotFound)?;

    // Precondition order follows spec.md §4.6 exactly: the step signature
    // is checked (3) before completion is checked (4), so a forged
    // signature on an already-complete step is reported as
    // InvalidStepSignature rather than StepAlreadyComplete.
    let expected_message = step_message(timestamp, caller_uuid, &uuid.to_string(), &step_id.to_string());
    if !verify(step_signature, &expected_message, caller_pub_key) {
        return Err(Error::InvalidStepSignature);
    }

    if contract.steps[step_index].completed {
        return Err(Error::StepAlreadyComplete);
    }

    let record = crate::model::SignatureRecord {
        signature: step_signature.to_string(),
        timestamp: timestamp.to_string(),
        signer_pub_key: caller_pub_key.to_string(),
        signed_message: expected_message,
        signed_at: now_millis(),
    };

    {
        let step = &mut contract.steps[step_index];
        step.signatures.insert(caller_pub_key.to_string(), Some(record));

        let mut outcome = SignStepOutcome { step_completed: false, magic_triggered: false };
        if step.is_fully_signed() {
            step.completed = true;
            step.completed_at = Some(now_millis());
            outcome.step_completed = true;
            if step.magic_spell.is_some() {
                outcome.magic_triggered = true;
            }
            tracing::info!(uuid = %contract.uuid, step = %step_id, "Step completed.");
        }

        contract.updated_at = now_millis();
        store.update(&contract).await?;
        return Ok((contract.clone(), outcome));
    }
}

/// Delete operation (§4.6): creator-only, removes via the replicated
/// store. Key material is retained (§3 lifecycles).
pub async fn delete(store: &ReplicatedStore, uuid: Uuid, caller: &str) -> Result<(), Error> {
    let _guard = store.lock(&uuid).await;
    let contract = store.get(&uuid).await?;
    if caller != contract.creator {
        return Err(Error::Forbidden);
    }
    store.delete(&uuid).await
}

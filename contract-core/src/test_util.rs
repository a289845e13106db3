//! Fixtures shared by the unit tests across this crate. Not compiled into
//! release builds.

use crate::crypto::generate_keypair;
use crate::model::{AssociationIds, Contract, SignatureRecord, Step};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A two-participant, single-step contract with no signatures yet.
pub fn sample_contract() -> Contract {
    let (pa, _) = generate_keypair();
    let (pb, _) = generate_keypair();
    let mut signatures = BTreeMap::new();
    signatures.insert(pa.clone(), None);
    signatures.insert(pb.clone(), None);

    Contract {
        uuid: Uuid::new_v4(),
        title: "Sample contract".to_string(),
        description: Some("Fixture used by tests.".to_string()),
        participants: vec![pa.clone(), pb],
        steps: vec![Step {
            id: Uuid::new_v4(),
            description: "Do the thing".to_string(),
            order: 0,
            magic_spell: None,
            completed: false,
            completed_at: None,
            signatures,
        }],
        creator: pa,
        created_at: "1000".to_string(),
        updated_at: "1000".to_string(),
        status: "active".to_string(),
        association_ids: AssociationIds::default(),
        pub_key: None,
        remote_record_id: None,
    }
}

/// A fully-signed, single-step, two-participant contract.
pub fn completed_contract() -> Contract {
    let mut contract = sample_contract();
    let now = "2000".to_string();
    for participant in contract.participants.clone() {
        contract.steps[0].signatures.insert(
            participant.clone(),
            Some(SignatureRecord {
                signature: "deadbeef".to_string(),
                timestamp: now.clone(),
                signer_pub_key: participant,
                signed_message: "fixture".to_string(),
                signed_at: now.clone(),
            }),
        );
    }
    contract.steps[0].completed = true;
    contract.steps[0].completed_at = Some(now);
    contract
}

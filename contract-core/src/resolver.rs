//! Effect-Resolver Adapter (C8, spec.md §4.8).
//!
//! A second entry path for pre-signed "spell" messages. The resolver
//! upstream has already verified `casterSignature` over the caster's
//! endpoint-auth message; this adapter translates a spell into the
//! matching Gate + State Machine call and dispatches it. It does not
//! re-verify anything itself — the supplied signature runs through the
//! normal Auth Gate exactly as if the caster had called directly, which
//! is what makes that call succeed without this adapter re-deriving trust.

use crate::auth::{authenticate, AuthRequest};
use crate::error::Error;
use crate::model::{AssociationIds, NewContract, NewStep, NewUser, User};
use crate::state_machine;
use crate::store::{ReplicatedStore, UserStore};
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

/// A spell as received from the resolver: a named operation, its logical
/// call arguments, and the timestamp/signature the caster produced over
/// its own endpoint-auth message (spec.md §4.8).
pub struct Spell {
    pub name: String,
    pub components: Map<String, Value>,
    pub timestamp: String,
    pub caster_signature: String,
}

fn field<'a>(components: &'a Map<String, Value>, key: &str) -> Result<&'a str, Error> {
    components
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Validation(format!("spell missing required field `{key}`")))
}

/// Dispatch `spell` to its target operation (table in spec.md §4.8).
pub async fn resolve(
    store: &ReplicatedStore,
    users: &UserStore,
    spell: &Spell,
) -> Result<Value, Error> {
    match spell.name.as_str() {
        "userCreate" => user_create(users, spell).await,
        "contractCreate" => contract_create(store, spell).await,
        "contractUpdate" => contract_update(store, spell).await,
        "contractSign" => contract_sign(store, spell).await,
        "contractDelete" => contract_delete(store, spell).await,
        "purchaseLesson" => purchase_lesson(store, spell).await,
        other => Err(Error::Validation(format!("unsupported spell `{other}`"))),
    }
}

async fn user_create(users: &UserStore, spell: &Spell) -> Result<Value, Error> {
    let caster_uuid = field(&spell.components, "casterUuid")?;
    let caster_pub_key = field(&spell.components, "casterPubKey")?;

    authenticate(&AuthRequest {
        signature: &spell.caster_signature,
        timestamp: &spell.timestamp,
        user_uuid: caster_uuid,
        pub_key: caster_pub_key,
        contract_uuid: None,
    })?;

    let display_name = spell
        .components
        .get("displayName")
        .and_then(Value::as_str)
        .map(str::to_string);
    let new_user = NewUser { pub_key: caster_pub_key.to_string(), display_name };
    let user = User {
        uuid: Uuid::new_v4(),
        pub_key: new_user.pub_key,
        display_name: new_user.display_name,
        created_at: Utc::now().timestamp_millis().to_string(),
    };
    users.save(&user).await?;
    Ok(serde_json::json!({ "uuid": user.uuid }))
}

async fn contract_create(store: &ReplicatedStore, spell: &Spell) -> Result<Value, Error> {
    let caster_uuid = field(&spell.components, "casterUuid")?;
    let caster_pub_key = field(&spell.components, "casterPubKey")?;

    authenticate(&AuthRequest {
        signature: &spell.caster_signature,
        timestamp: &spell.timestamp,
        user_uuid: caster_uuid,
        pub_key: caster_pub_key,
        contract_uuid: None,
    })?;

    let new_contract: NewContract = serde_json::from_value(Value::Object(spell.components.clone()))
        .map_err(|e| Error::Validation(e.to_string()))?;
    let contract = state_machine::create(store, new_contract, caster_pub_key.to_string()).await?;
    serde_json::to_value(contract).map_err(|e| Error::Validation(e.to_string()))
}

async fn contract_update(store: &ReplicatedStore, spell: &Spell) -> Result<Value, Error> {
    let caster_uuid = field(&spell.components, "casterUuid")?;
    let caster_pub_key = field(&spell.components, "casterPubKey")?;
    let contract_uuid_str = field(&spell.components, "contractUuid")?;
    let contract_uuid = Uuid::parse_str(contract_uuid_str)
        .map_err(|e| Error::Validation(e.to_string()))?;

    authenticate(&AuthRequest {
        signature: &spell.caster_signature,
        timestamp: &spell.timestamp,
        user_uuid: caster_uuid,
        pub_key: caster_pub_key,
        contract_uuid: Some(contract_uuid_str),
    })?;

    let patch = serde_json::from_value(Value::Object(spell.components.clone()))
        .map_err(|e| Error::Validation(e.to_string()))?;
    let contract = state_machine::update(store, contract_uuid, caster_pub_key, patch).await?;
    serde_json::to_value(contract).map_err(|e| Error::Validation(e.to_string()))
}

async fn contract_sign(store: &ReplicatedStore, spell: &Spell) -> Result<Value, Error> {
    let caster_uuid = field(&spell.components, "casterUuid")?;
    let caster_pub_key = field(&spell.components, "casterPubKey")?;
    let contract_uuid_str = field(&spell.components, "contractUuid")?;
    let step_id_str = field(&spell.components, "stepId")?;
    let step_signature = field(&spell.components, "stepSignature")?;

    let contract_uuid = Uuid::parse_str(contract_uuid_str).map_err(|e| Error::Validation(e.to_string()))?;
    let step_id = Uuid::parse_str(step_id_str).map_err(|e| Error::Validation(e.to_string()))?;

    authenticate(&AuthRequest {
        signature: &spell.caster_signature,
        timestamp: &spell.timestamp,
        user_uuid: caster_uuid,
        pub_key: caster_pub_key,
        contract_uuid: Some(contract_uuid_str),
    })?;

    let (contract, outcome) = state_machine::sign_step(
        store,
        contract_uuid,
        caster_pub_key,
        caster_uuid,
        step_id,
        step_signature,
        &spell.timestamp,
    )
    .await?;
    Ok(serde_json::json!({ "contract": contract, "outcome": outcome }))
}

async fn contract_delete(store: &ReplicatedStore, spell: &Spell) -> Result<Value, Error> {
    let caster_uuid = field(&spell.components, "casterUuid")?;
    let caster_pub_key = field(&spell.components, "casterPubKey")?;
    let contract_uuid_str = field(&spell.components, "contractUuid")?;
    let contract_uuid = Uuid::parse_str(contract_uuid_str).map_err(|e| Error::Validation(e.to_string()))?;

    authenticate(&AuthRequest {
        signature: &spell.caster_signature,
        timestamp: &spell.timestamp,
        user_uuid: caster_uuid,
        pub_key: caster_pub_key,
        contract_uuid: Some(contract_uuid_str),
    })?;

    state_machine::delete(store, contract_uuid, caster_pub_key).await?;
    Ok(serde_json::json!({ "uuid": contract_uuid }))
}

/// The five-step template contract behind the `purchaseLesson` spell
/// (spec.md §4.8): participants are (teacher, student), caller is the
/// student, and the steps form a fixed booking/payment/delivery flow.
fn lesson_template(teacher_pub_key: &str, student_pub_key: &str) -> NewContract {
    let step = |description: &str| NewStep {
        id: None,
        description: description.to_string(),
        magic_spell: None,
    };
    NewContract {
        title: "Lesson purchase".to_string(),
        description: Some("Composite contract created by the purchaseLesson spell.".to_string()),
        participants: vec![teacher_pub_key.to_string(), student_pub_key.to_string()],
        steps: vec![
            step("Student requests lesson"),
            step("Teacher confirms availability"),
            step("Student submits payment"),
            step("Teacher delivers lesson"),
            step("Student confirms completion"),
        ],
        association_ids: AssociationIds::default(),
    }
}

async fn purchase_lesson(store: &ReplicatedStore, spell: &Spell) -> Result<Value, Error> {
    let caster_uuid = field(&spell.components, "casterUuid")?;
    let student_pub_key = field(&spell.components, "studentPubKey")?;
    let teacher_pub_key = field(&spell.components, "teacherPubKey")?;

    authenticate(&AuthRequest {
        signature: &spell.caster_signature,
        timestamp: &spell.timestamp,
        user_uuid: caster_uuid,
        pub_key: student_pub_key,
        contract_uuid: None,
    })?;

    let template = lesson_template(teacher_pub_key, student_pub_key);
    let contract = state_machine::create(store, template, student_pub_key.to_string()).await?;
    serde_json::to_value(contract).map_err(|e| Error::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{gate_message, generate_keypair, sign};
    use crate::keys::KeyRegistry;
    use crate::store::{LocalStore, RemoteAdapter};

    fn store(dir: &std::path::Path) -> ReplicatedStore {
        ReplicatedStore::new(
            LocalStore::new(dir.join("contracts")),
            RemoteAdapter::new("http://127.0.0.1:1"),
            KeyRegistry::new(dir.join("keys")),
        )
    }

    fn signed_spell(name: &str, components: Map<String, Value>, priv_key: &str, msg: &str) -> Spell {
        Spell {
            name: name.to_string(),
            components,
            timestamp: "1000".to_string(),
            caster_signature: sign(msg, priv_key).unwrap(),
        }
    }

    #[tokio::test]
    async fn user_create_spell_persists_a_user() {
        let dir = tempfile::tempdir().unwrap();
        let users = UserStore::new(dir.path().join("users"));
        let store = store(dir.path());
        let (pub_key, priv_key) = generate_keypair();

        let mut components = Map::new();
        components.insert("casterUuid".into(), Value::String("user-a".into()));
        components.insert("casterPubKey".into(), Value::String(pub_key.clone()));
        let msg = gate_message("1000", "user-a", None);
        let spell = signed_spell("userCreate", components, &priv_key, &msg);

        let result = resolve(&store, &users, &spell).await.unwrap();
        assert!(result.get("uuid").is_some());
    }

    #[tokio::test]
    async fn purchase_lesson_spell_creates_five_step_contract() {
        let dir = tempfile::tempdir().unwrap();
        let users = UserStore::new(dir.path().join("users"));
        let store = store(dir.path());
        let (teacher_pub, _teacher_priv) = generate_keypair();
        let (student_pub, student_priv) = generate_keypair();

        let mut components = Map::new();
        components.insert("casterUuid".into(), Value::String("student-1".into()));
        components.insert("teacherPubKey".into(), Value::String(teacher_pub.clone()));
        components.insert("studentPubKey".into(), Value::String(student_pub.clone()));
        let msg = gate_message("1000", "student-1", None);
        let spell = signed_spell("purchaseLesson", components, &student_priv, &msg);

        let result = resolve(&store, &users, &spell).await.unwrap();
        let steps = result.get("steps").and_then(Value::as_array).unwrap();
        assert_eq!(steps.len(), 5);
        let participants = result.get("participants").and_then(Value::as_array).unwrap();
        assert_eq!(participants.len(), 2);
    }

    #[tokio::test]
    async fn unsupported_spell_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let users = UserStore::new(dir.path().join("users"));
        let store = store(dir.path());
        let spell = Spell {
            name: "summonDragon".to_string(),
            components: Map::new(),
            timestamp: "1000".to_string(),
            caster_signature: "deadbeef".to_string(),
        };
        assert!(matches!(resolve(&store, &users, &spell).await, Err(Error::Validation(_))));
    }
}

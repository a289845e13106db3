//! Signature Verifier (C1, spec.md §4.1).
//!
//! secp256k1 / ECDSA over the SHA-256 digest of the UTF-8 message bytes.
//! Messages are built by plain string concatenation, no separator — that
//! concatenation order is the protocol's canonical form and must not
//! change independently in the Gate and the State Machine.

use bitcoin_hashes::{sha256, Hash};
use secp256k1::{
    ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey,
};

/// Sign `message` with `private_key` (hex-encoded secp256k1 scalar).
/// Returns the hex-encoded DER-free compact signature.
pub fn sign(message: &str, private_key_hex: &str) -> Result<String, String> {
    let secp = Secp256k1::signing_only();
    let secret_bytes = hex::decode(private_key_hex).map_err(|e| e.to_string())?;
    let secret_key = SecretKey::from_slice(&secret_bytes).map_err(|e| e.to_string())?;
    let digest = sha256::Hash::hash(message.as_bytes());
    let msg = Message::from_digest(digest.to_byte_array());
    let sig = secp.sign_ecdsa(&msg, &secret_key);
    Ok(hex::encode(sig.serialize_compact()))
}

/// Verify `signature_hex` over `message` under `public_key_hex`.
///
/// Never throws: any malformed hex, key, or signature simply yields
/// `false` (spec.md §4.1).
pub fn verify(signature_hex: &str, message: &str, public_key_hex: &str) -> bool {
    let secp = Secp256k1::verification_only();

    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(signature) = Signature::from_compact(&sig_bytes) else {
        return false;
    };

    let Ok(pk_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(public_key) = PublicKey::from_slice(&pk_bytes) else {
        return false;
    };

    let digest = sha256::Hash::hash(message.as_bytes());
    let msg = Message::from_digest(digest.to_byte_array());

    secp.verify_ecdsa(&msg, &signature, &public_key).is_ok()
}

/// Canonical endpoint-auth message: `timestamp ∥ userUUID` (no contract)
/// or `timestamp ∥ userUUID ∥ contractUUID` (spec.md §4.7).
pub fn gate_message(timestamp: &str, user_uuid: &str, contract_uuid: Option<&str>) -> String {
    match contract_uuid {
        Some(cid) => format!("{timestamp}{user_uuid}{cid}"),
        None => format!("{timestamp}{user_uuid}"),
    }
}

/// Canonical step-signature message: `timestamp ∥ callerUUID ∥ contractUUID ∥ stepId`
/// (spec.md §4.6 Sign-step operation, precondition 3).
pub fn step_message(timestamp: &str, caller_uuid: &str, contract_uuid: &str, step_id: &str) -> String {
    format!("{timestamp}{caller_uuid}{contract_uuid}{step_id}")
}

/// Canonical message for `PUT /user/create`: `timestamp ∥ pubKey` (spec.md
/// §6). No userUUID exists yet at this point, so it departs from the
/// general Gate message shape in §4.7.
pub fn user_create_message(timestamp: &str, pub_key: &str) -> String {
    format!("{timestamp}{pub_key}")
}

/// Canonical message for `GET /user/:uuid`: `timestamp ∥ uuid` (spec.md §6).
pub fn user_fetch_message(timestamp: &str, uuid: &str) -> String {
    format!("{timestamp}{uuid}")
}

/// Mint a new random secp256k1 keypair (used by the key registry, C2).
pub fn generate_keypair() -> (String, String) {
    let secp = Secp256k1::new();
    let mut rng = secp256k1::rand::thread_rng();
    let (secret_key, public_key) = secp.generate_keypair(&mut rng);
    (hex::encode(public_key.serialize()), hex::encode(secret_key.secret_bytes()))
}

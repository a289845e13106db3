//! Authentication Gate (C7, spec.md §4.7).
//!
//! A uniform guard for mutating entry points. Verifies the caller's
//! endpoint-auth signature and nothing else — authorization (creator vs.
//! participant) is content-dependent and lives in the State Machine
//! (§4.6), not here.

use crate::crypto::{gate_message, verify};
use crate::error::Error;

/// The fields every Auth-Gate-protected request carries (§4.7).
pub struct AuthRequest<'a> {
    pub signature: &'a str,
    pub timestamp: &'a str,
    pub user_uuid: &'a str,
    pub pub_key: &'a str,
    pub contract_uuid: Option<&'a str>,
}

/// Verify `request` and return `Ok(())` if the signature checks out,
/// `Err(Error::AuthFailed)` otherwise. No timestamp freshness window is
/// enforced (open question, §9).
pub fn authenticate(request: &AuthRequest) -> Result<(), Error> {
    let message = gate_message(request.timestamp, request.user_uuid, request.contract_uuid);
    if verify(request.signature, &message, request.pub_key) {
        Ok(())
    } else {
        Err(Error::AuthFailed)
    }
}

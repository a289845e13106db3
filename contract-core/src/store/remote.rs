//! Remote Object-Store Adapter (C4, spec.md §4.4).
//!
//! Wraps an external content-addressed document store (the "COS") that
//! owns records by public key. The COS client the rest of this codebase
//! would reach for assumes a process-wide signing identity (one ambient
//! keypair for the whole client); this adapter makes it act per-contract
//! instead by installing the caller's keypair for the duration of a
//! single call and clearing it — on every exit path, including a panic
//! mid-call — once the call returns. All calls serialize through one
//! `tokio::sync::Mutex` so identity installations never interleave
//! (spec.md §5 "Remote-client identity serialization").

use crate::crypto::sign;
use crate::error::RemoteError;
use crate::model::{KeyPair, PubKeyHex};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;

const CALL_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RemoteAdapter {
    base_url: String,
    http: reqwest::Client,
    /// The keypair currently "installed" as the ambient signing identity.
    /// `None` between calls; holding the lock across the whole call is
    /// what provides the serialization guarantee.
    identity: Mutex<Option<PubKeyHex>>,
}

/// Clears the installed identity when the guarded call finishes, whether
/// it returned, errored, or unwound through a panic.
struct ClearIdentityOnDrop<'a>(&'a mut Option<PubKeyHex>);

impl Drop for ClearIdentityOnDrop<'_> {
    fn drop(&mut self) {
        *self.0 = None;
    }
}

impl RemoteAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::builder()
                .timeout(CALL_TIMEOUT)
                .build()
                .expect("reqwest client builds"),
            identity: Mutex::new(None),
        }
    }

    async fn signed_headers(&self, keypair: &KeyPair, hash: &str) -> Result<(String, String, String), RemoteError> {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let message = format!("{}{}", timestamp, hash);
        let signature = sign(&message, &keypair.private_key)
            .map_err(|e| RemoteError::AuthFailed(e))?;
        Ok((keypair.pub_key.clone(), timestamp, signature))
    }

    /// Installs `keypair` as the ambient identity for the duration of
    /// `op`, serialized against every other adapter call.
    async fn call_signed<T, F, Fut>(&self, keypair: &KeyPair, op: F) -> Result<T, RemoteError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, RemoteError>>,
    {
        let mut guard = self.identity.lock().await;
        *guard = Some(keypair.pub_key.clone());
        let _clear = ClearIdentityOnDrop(&mut guard);

        op().await
    }

    pub async fn create_record(
        &self,
        hash: &str,
        payload: &Value,
        keypair: &KeyPair,
    ) -> Result<String, RemoteError> {
        let (pub_key, timestamp, signature) = self.signed_headers(keypair, hash).await?;
        self.call_signed(keypair, || async {
            let response = self
                .http
                .post(format!("{}/records", self.base_url))
                .header("X-Public-Key", pub_key)
                .header("X-Timestamp", timestamp)
                .header("X-Signature", signature)
                .json(&serde_json::json!({ "hash": hash, "payload": payload }))
                .send()
                .await?
                .error_for_status()?;

            #[derive(serde::Deserialize)]
            struct CreateResponse {
                record_id: String,
            }
            let body: CreateResponse = response.json().await?;
            Ok(body.record_id)
        })
        .await
    }

    pub async fn update_record(
        &self,
        record_id: &str,
        hash: &str,
        payload: &Value,
        keypair: &KeyPair,
    ) -> Result<(), RemoteError> {
        let (pub_key, timestamp, signature) = self.signed_headers(keypair, hash).await?;
        self.call_signed(keypair, || async {
            self.http
                .put(format!("{}/records/{}", self.base_url, record_id))
                .header("X-Public-Key", pub_key)
                .header("X-Timestamp", timestamp)
                .header("X-Signature", signature)
                .json(&serde_json::json!({ "hash": hash, "payload": payload }))
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
        .await
    }

    pub async fn fetch_record(
        &self,
        record_id: &str,
        hash: &str,
        keypair: &KeyPair,
    ) -> Result<Value, RemoteError> {
        let (pub_key, timestamp, signature) = self.signed_headers(keypair, hash).await?;
        self.call_signed(keypair, || async {
            let response = self
                .http
                .get(format!("{}/records/{}", self.base_url, record_id))
                .header("X-Public-Key", pub_key)
                .header("X-Timestamp", timestamp)
                .header("X-Signature", signature)
                .send()
                .await?
                .error_for_status()?;
            let payload: Value = response.json().await?;
            Ok(payload)
        })
        .await
    }

    pub async fn delete_record(
        &self,
        record_id: &str,
        hash: &str,
        keypair: &KeyPair,
    ) -> Result<(), RemoteError> {
        let (pub_key, timestamp, signature) = self.signed_headers(keypair, hash).await?;
        self.call_signed(keypair, || async {
            self.http
                .delete(format!("{}/records/{}", self.base_url, record_id))
                .header("X-Public-Key", pub_key)
                .header("X-Timestamp", timestamp)
                .header("X-Signature", signature)
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
        .await
    }
}

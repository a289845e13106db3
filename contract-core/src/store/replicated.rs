//! Replicated Store (C5, spec.md §4.5).
//!
//! Composes the key registry, the local store, and the remote adapter.
//! Local is authoritative; the remote is a replica that may lag, diverge,
//! or be temporarily missing. No remote failure is ever surfaced to a
//! caller of this type — it is logged and swallowed here.

use crate::error::Error;
use crate::keys::KeyRegistry;
use crate::model::Contract;
use crate::store::local::LocalStore;
use crate::store::remote::RemoteAdapter;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

pub struct ReplicatedStore {
    local: LocalStore,
    remote: RemoteAdapter,
    keys: KeyRegistry,
    /// One lock per contract UUID, created on first use (§5 "Per-contract
    /// serialization"). Callers that read-modify-write a contract (the
    /// State Machine's update/sign-step/delete) hold this for the whole
    /// sequence; plain reads are not serialized against it.
    contract_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ReplicatedStore {
    pub fn new(local: LocalStore, remote: RemoteAdapter, keys: KeyRegistry) -> Self {
        Self { local, remote, keys, contract_locks: DashMap::new() }
    }

    pub fn keys(&self) -> &KeyRegistry {
        &self.keys
    }

    /// Acquire the per-contract write lock, minting it on first use. Held
    /// by the caller for the duration of a read-modify-write sequence.
    pub async fn lock(&self, uuid: &Uuid) -> OwnedMutexGuard<()> {
        let mutex = self
            .contract_locks
            .entry(*uuid)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// First write for a contract: mint a keypair, bind it, stamp the
    /// contract, attempt a remote create, then always save locally.
    pub async fn create(&self, mut contract: Contract) -> Result<Contract, Error> {
        let keypair = self.keys.mint().await?;
        self.keys.bind(contract.uuid, &keypair.pub_key).await?;
        contract.pub_key = Some(keypair.pub_key.clone());

        let payload = serde_json::to_value(&contract).map_err(|e| Error::Store(e.into()))?;
        match self
            .remote
            .create_record(&contract.uuid.to_string(), &payload, &keypair)
            .await
        {
            Ok(record_id) => {
                contract.remote_record_id = Some(record_id);
            }
            Err(e) => {
                tracing::warn!(uuid = %contract.uuid, error = %e, "Remote create failed, proceeding local-only.");
            }
        }

        self.local.save(&contract).await?;
        Ok(contract)
    }

    /// Subsequent write: look up the bound keypair, attempt a remote
    /// update, save locally regardless of the remote outcome.
    pub async fn update(&self, contract: &Contract) -> Result<(), Error> {
        let keypair = self.keys.load(&self.keys.lookup(&contract.uuid)?).await?;

        if let Some(record_id) = &contract.remote_record_id {
            let payload = serde_json::to_value(contract).map_err(|e| Error::Store(e.into()))?;
            if let Err(e) = self
                .remote
                .update_record(record_id, &contract.uuid.to_string(), &payload, &keypair)
                .await
            {
                tracing::warn!(uuid = %contract.uuid, error = %e, "Remote update failed, saving local only.");
            }
        }

        self.local.save(contract).await
    }

    /// Remote-preferred read with local fallback (§4.5 "Read").
    pub async fn get(&self, uuid: &Uuid) -> Result<Contract, Error> {
        if let Ok(pub_key) = self.keys.lookup(uuid) {
            if let Ok(keypair) = self.keys.load(&pub_key).await {
                if let Ok(local) = self.local.load(uuid).await {
                    if let Some(record_id) = &local.remote_record_id {
                        match self.remote.fetch_record(record_id, &uuid.to_string(), &keypair).await {
                            Ok(payload) => {
                                if let Ok(contract) = serde_json::from_value::<Contract>(payload) {
                                    return Ok(contract);
                                }
                            }
                            Err(e) => {
                                tracing::warn!(uuid = %uuid, error = %e, "Remote fetch failed, falling back to local.");
                            }
                        }
                    }
                    return Ok(local);
                }
            }
        }

        self.local.load(uuid).await
    }

    /// Attempt a remote delete regardless of outcome; always remove the
    /// local document. Key material is left untouched (§4.5 "Delete").
    pub async fn delete(&self, uuid: &Uuid) -> Result<(), Error> {
        if let Ok(pub_key) = self.keys.lookup(uuid) {
            if let Ok(keypair) = self.keys.load(&pub_key).await {
                if let Ok(contract) = self.local.load(uuid).await {
                    if let Some(record_id) = &contract.remote_record_id {
                        if let Err(e) = self.remote.delete_record(record_id, &uuid.to_string(), &keypair).await {
                            tracing::warn!(uuid = %uuid, error = %e, "Remote delete failed.");
                        }
                    }
                }
            }
        }

        self.local.delete(uuid).await
    }

    pub async fn list(&self) -> Result<Vec<crate::model::ContractSummary>, Error> {
        self.local.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::sample_contract;

    fn store(dir: &std::path::Path) -> ReplicatedStore {
        ReplicatedStore::new(
            LocalStore::new(dir.join("contracts")),
            // Unreachable host: every remote call fails, exercising the
            // fallback paths (§8 S5 "Remote outage on create").
            RemoteAdapter::new("http://127.0.0.1:1"),
            KeyRegistry::new(dir.join("keys")),
        )
    }

    #[tokio::test]
    async fn create_with_remote_outage_still_succeeds_locally() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let contract = sample_contract();

        let created = store.create(contract.clone()).await.unwrap();
        assert!(created.pub_key.is_some());
        assert!(created.remote_record_id.is_none());

        let fetched = store.get(&created.uuid).await.unwrap();
        assert_eq!(fetched.uuid, created.uuid);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let contract = sample_contract();
        let created = store.create(contract).await.unwrap();

        store.delete(&created.uuid).await.unwrap();
        assert!(matches!(store.get(&created.uuid).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn pub_key_is_stable_across_update() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let mut created = store.create(sample_contract()).await.unwrap();
        let original_key = created.pub_key.clone();

        created.title = "renamed".to_string();
        store.update(&created).await.unwrap();

        let fetched = store.get(&created.uuid).await.unwrap();
        assert_eq!(fetched.pub_key, original_key);
        assert_eq!(fetched.title, "renamed");
    }
}

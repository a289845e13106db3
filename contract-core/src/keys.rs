//! Per-Contract Key Registry (C2, spec.md §4.2).
//!
//! Isolates each contract's cryptographic identity: one keypair is minted
//! per contract rather than per process, and a persistent map binds
//! contract UUID to that contract's public key. Write-through cache; a
//! cache miss reads from disk. Eviction is not implemented — the working
//! set is bounded by active contracts (§4.2 cache semantics).

use crate::crypto::generate_keypair;
use crate::error::{Error, StoreError};
use crate::fs_util::write_atomic;
use crate::model::{ContractKeyMap, KeyPair, PubKeyHex};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use tokio::sync::Mutex;
use uuid::Uuid;

const MAP_FILE: &str = "contract-pubkey-mapping.json";

pub struct KeyRegistry {
    keys_dir: PathBuf,
    cache: RwLock<HashMap<PubKeyHex, KeyPair>>,
    contract_map: RwLock<ContractKeyMap>,
    /// Serializes the aggregate map's read-mutate-write-persist sequence
    /// (§4.2 "atomically update the aggregate map document", §5 "a
    /// single writer lock suffices"). Without this, two concurrent
    /// `bind()` calls race on the same `contract-pubkey-mapping.json.tmp`
    /// path and one `rename` can fail or silently lose a binding.
    map_write_lock: Mutex<()>,
}

impl KeyRegistry {
    pub fn new(keys_dir: impl Into<PathBuf>) -> Self {
        Self {
            keys_dir: keys_dir.into(),
            cache: RwLock::new(HashMap::new()),
            contract_map: RwLock::new(ContractKeyMap::default()),
            map_write_lock: Mutex::new(()),
        }
    }

    fn key_path(&self, pub_key: &str) -> PathBuf {
        self.keys_dir.join(format!("{pub_key}.json"))
    }

    fn map_path(&self) -> PathBuf {
        self.keys_dir.join(MAP_FILE)
    }

    /// Load the entire aggregate map into memory on process start (§4.2
    /// `restore`). A missing map file is treated as an empty map.
    pub async fn restore(&self) -> Result<(), Error> {
        let path = self.map_path();
        if !path.exists() {
            return Ok(());
        }
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::Store(StoreError::Io(e)))?;
        let map: ContractKeyMap =
            serde_json::from_slice(&bytes).map_err(|e| Error::Store(StoreError::Serde(e)))?;
        *self.contract_map.write().unwrap() = map;
        tracing::info!(bindings = self.contract_map.read().unwrap().bindings.len(), "Restored contract key map.");
        Ok(())
    }

    /// Generate a new random keypair, persist it under its public key,
    /// and cache it in memory (§4.2 `mint`).
    pub async fn mint(&self) -> Result<KeyPair, Error> {
        let (pub_key, private_key) = generate_keypair();
        let keypair = KeyPair { pub_key: pub_key.clone(), private_key };

        tokio::fs::create_dir_all(&self.keys_dir)
            .await
            .map_err(|e| Error::Store(StoreError::Io(e)))?;
        write_atomic(&self.key_path(&pub_key), &keypair).await?;

        self.cache.write().unwrap().insert(pub_key.clone(), keypair.clone());
        tracing::info!(pub_key, "Minted new contract keypair.");
        Ok(keypair)
    }

    /// Return the cached keypair, reading through to disk on a miss
    /// (§4.2 `load`). Fails with `KeyNotFound` if absent everywhere.
    pub async fn load(&self, pub_key: &str) -> Result<KeyPair, Error> {
        if let Some(kp) = self.cache.read().unwrap().get(pub_key).cloned() {
            return Ok(kp);
        }

        let path = self.key_path(pub_key);
        if !path.exists() {
            return Err(Error::KeyNotFound(pub_key.to_string()));
        }
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::Store(StoreError::Io(e)))?;
        let keypair: KeyPair =
            serde_json::from_slice(&bytes).map_err(|e| Error::Store(StoreError::Serde(e)))?;
        self.cache.write().unwrap().insert(pub_key.to_string(), keypair.clone());
        Ok(keypair)
    }

    /// Associate a contract with a public key, atomically updating both
    /// the aggregate map document and the in-memory map (§4.2 `bind`).
    /// Holds `map_write_lock` across the mutate-then-persist sequence so
    /// concurrent binds (the normal case under §5's parallel request
    /// handlers) serialize instead of racing on the same tmp file.
    pub async fn bind(&self, contract_uuid: Uuid, pub_key: &str) -> Result<(), Error> {
        let _guard = self.map_write_lock.lock().await;
        {
            let mut map = self.contract_map.write().unwrap();
            map.bindings.insert(contract_uuid, pub_key.to_string());
        }
        self.persist_map().await
    }

    /// Look up the public key bound to a contract (§4.2 `lookup`).
    pub fn lookup(&self, contract_uuid: &Uuid) -> Result<PubKeyHex, Error> {
        self.contract_map
            .read()
            .unwrap()
            .bindings
            .get(contract_uuid)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound(contract_uuid.to_string()))
    }

    async fn persist_map(&self) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.keys_dir)
            .await
            .map_err(|e| Error::Store(StoreError::Io(e)))?;
        let snapshot = self.contract_map.read().unwrap().clone();
        write_atomic(&self.map_path(), &snapshot).await
    }
}

//! Local Contract Store (C3, spec.md §4.3).
//!
//! A content-addressed file store: one JSON document per contract under
//! `contracts/<uuid>.json`. Stable JSON (insertion order preserved, via
//! `serde_json`'s `preserve_order` feature) so documents diff cleanly.

use crate::error::{Error, StoreError};
use crate::fs_util::write_atomic;
use crate::model::{Contract, ContractSummary};
use std::path::PathBuf;
use uuid::Uuid;

pub struct LocalStore {
    contracts_dir: PathBuf,
}

impl LocalStore {
    pub fn new(contracts_dir: impl Into<PathBuf>) -> Self {
        Self { contracts_dir: contracts_dir.into() }
    }

    fn path(&self, uuid: &Uuid) -> PathBuf {
        self.contracts_dir.join(format!("{uuid}.json"))
    }

    pub async fn save(&self, contract: &Contract) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.contracts_dir)
            .await
            .map_err(|e| Error::Store(StoreError::Io(e)))?;
        write_atomic(&self.path(&contract.uuid), contract).await?;
        tracing::debug!(uuid = %contract.uuid, "Saved contract to local store.");
        Ok(())
    }

    pub async fn load(&self, uuid: &Uuid) -> Result<Contract, Error> {
        let path = self.path(uuid);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(uuid.to_string())
            } else {
                Error::Store(StoreError::Io(e))
            }
        })?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Store(StoreError::Serde(e)))
    }

    pub async fn delete(&self, uuid: &Uuid) -> Result<(), Error> {
        match tokio::fs::remove_file(self.path(uuid)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Store(StoreError::Io(e))),
        }
    }

    /// Summaries sorted by updated timestamp descending (§4.3 `list`).
    pub async fn list(&self) -> Result<Vec<ContractSummary>, Error> {
        tokio::fs::create_dir_all(&self.contracts_dir)
            .await
            .map_err(|e| Error::Store(StoreError::Io(e)))?;

        let mut entries = tokio::fs::read_dir(&self.contracts_dir)
            .await
            .map_err(|e| Error::Store(StoreError::Io(e)))?;

        let mut summaries = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Store(StoreError::Io(e)))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| Error::Store(StoreError::Io(e)))?;
            let contract: Contract =
                serde_json::from_slice(&bytes).map_err(|e| Error::Store(StoreError::Serde(e)))?;
            summaries.push(ContractSummary::from(&contract));
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::sample_contract;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let contract = sample_contract();

        store.save(&contract).await.unwrap();
        let loaded = store.load(&contract.uuid).await.unwrap();
        assert_eq!(loaded, contract);
    }

    #[tokio::test]
    async fn load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let err = store.load(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_then_load_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let contract = sample_contract();
        store.save(&contract).await.unwrap();

        store.delete(&contract.uuid).await.unwrap();
        assert!(matches!(store.load(&contract.uuid).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_missing_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.delete(&Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn list_returns_summaries_sorted_by_updated_desc() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let mut older = sample_contract();
        older.updated_at = "1000".to_string();
        let mut newer = sample_contract();
        newer.updated_at = "2000".to_string();

        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].uuid, newer.uuid);
        assert_eq!(summaries[1].uuid, older.uuid);
    }
}

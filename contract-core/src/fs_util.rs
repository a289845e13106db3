//! Shared atomic-write helper: write-to-temp + rename so a concurrent
//! reader never observes a partial document (§5 concurrency model).

use crate::error::{Error, StoreError};
use std::path::Path;

pub async fn write_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| Error::Store(StoreError::Serde(e)))?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|e| Error::Store(StoreError::Io(e)))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Store(StoreError::Io(e)))?;
    Ok(())
}

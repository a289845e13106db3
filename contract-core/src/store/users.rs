//! User Store. Not a component of its own in the design (§4), but the
//! persisted-state layout (§6) calls for `users/<uuid>.json` alongside
//! the contract and key documents, so it follows C3's shape exactly.

use crate::error::{Error, StoreError};
use crate::fs_util::write_atomic;
use crate::model::User;
use std::path::PathBuf;
use uuid::Uuid;

pub struct UserStore {
    users_dir: PathBuf,
}

impl UserStore {
    pub fn new(users_dir: impl Into<PathBuf>) -> Self {
        Self { users_dir: users_dir.into() }
    }

    fn path(&self, uuid: &Uuid) -> PathBuf {
        self.users_dir.join(format!("{uuid}.json"))
    }

    pub async fn save(&self, user: &User) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.users_dir)
            .await
            .map_err(|e| Error::Store(StoreError::Io(e)))?;
        write_atomic(&self.path(&user.uuid), user).await
    }

    pub async fn load(&self, uuid: &Uuid) -> Result<User, Error> {
        let bytes = tokio::fs::read(self.path(uuid)).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(uuid.to_string())
            } else {
                Error::Store(StoreError::Io(e))
            }
        })?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Store(StoreError::Serde(e)))
    }
}

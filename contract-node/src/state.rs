use contract_core::store::{ReplicatedStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ReplicatedStore>,
    pub users: Arc<UserStore>,
    pub env: String,
}

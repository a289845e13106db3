use clap::Parser;
use contract_core::keys::KeyRegistry;
use contract_core::store::{LocalStore, RemoteAdapter, ReplicatedStore, UserStore};
use contract_node::config::NodeOpts;
use contract_node::state::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let opts = NodeOpts::parse();
    tracing::info!(port = opts.port, env = %opts.env, remote = %opts.remote_url, "Starting contract-node.");

    let keys = KeyRegistry::new(opts.keys_dir());
    keys.restore().await.expect("failed to restore contract key map");

    let store = ReplicatedStore::new(
        LocalStore::new(opts.contracts_dir()),
        RemoteAdapter::new(opts.remote_url.clone()),
        keys,
    );
    let users = UserStore::new(opts.users_dir());

    let state = AppState { store: Arc::new(store), users: Arc::new(users), env: opts.env.clone() };
    let app = contract_node::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", opts.port))
        .await
        .expect("failed to bind listener");
    tracing::info!("Listening on 0.0.0.0:{}", opts.port);

    axum::serve(listener, app).await.expect("server error");
}

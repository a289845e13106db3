pub mod local;
pub mod remote;
pub mod replicated;
pub mod users;

pub use local::LocalStore;
pub use remote::RemoteAdapter;
pub use replicated::ReplicatedStore;
pub use users::UserStore;

pub mod conflict;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use conflict::{check_expected_version, update_versioned};
pub use manager::{DatabaseManager, StoreError};
pub use memory::MemoryStore;
pub use store::{Models, MovieStore, PermissionStore, TokenStore, UserStore, VersionedStore};

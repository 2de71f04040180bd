use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use super::manager::StoreError;
use super::memory::MemoryStore;
use super::models::{Movie, MovieFilter, User};
use super::postgres::PgStore;
use crate::auth::{Permissions, Token, TokenScope};
use crate::filter::{Metadata, Page};

/// Records that can be read by id and updated under a version check
#[async_trait]
pub trait VersionedStore<T>: Send + Sync {
    async fn get(&self, id: i64) -> Result<T, StoreError>;

    /// Persist `record` only if the stored version still equals
    /// `record.version`; on success the new version is written back into
    /// `record`. A version mismatch is `StoreError::EditConflict`.
    async fn update(&self, record: &mut T) -> Result<(), StoreError>;
}

/// Credential lookups plus user persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &mut User) -> Result<(), StoreError>;
    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;
    async fn update(&self, user: &mut User) -> Result<(), StoreError>;

    /// Owner of a non-expired token with the given hash and scope
    async fn get_by_token(&self, token_hash: &[u8], scope: TokenScope) -> Result<User, StoreError>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: &Token) -> Result<(), StoreError>;
    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions, StoreError>;
    async fn grant_for_user(&self, user_id: i64, codes: &[&str]) -> Result<(), StoreError>;
}

#[async_trait]
pub trait MovieStore: VersionedStore<Movie> {
    async fn insert(&self, movie: &mut Movie) -> Result<(), StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
    async fn list(&self, filter: &MovieFilter, page: &Page) -> Result<(Vec<Movie>, Metadata), StoreError>;
}

/// The set of stores handed to the request pipeline and handlers
#[derive(Clone)]
pub struct Models {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub permissions: Arc<dyn PermissionStore>,
    pub movies: Arc<dyn MovieStore>,
}

impl Models {
    pub fn postgres(pool: PgPool, timeout: Duration) -> Self {
        let store = Arc::new(PgStore::new(pool, timeout));
        Self {
            users: store.clone(),
            tokens: store.clone(),
            permissions: store.clone(),
            movies: store,
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    /// Share an existing in-memory store (tests seed it directly)
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            tokens: store.clone(),
            permissions: store.clone(),
            movies: store,
        }
    }
}

impl std::fmt::Debug for Models {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Models").finish_non_exhaustive()
    }
}

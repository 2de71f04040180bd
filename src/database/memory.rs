//! In-process record store with the same semantics as the PostgreSQL one,
//! including version-checked updates. Used by tests and by `STORAGE=memory`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::manager::StoreError;
use super::models::{Movie, MovieFilter, User};
use super::store::{MovieStore, PermissionStore, TokenStore, UserStore, VersionedStore};
use crate::auth::{Permissions, Token, TokenScope};
use crate::filter::{Metadata, Page, SortDirection};

#[derive(Debug, Default)]
struct State {
    next_user_id: i64,
    next_movie_id: i64,
    users: BTreeMap<i64, User>,
    tokens: Vec<Token>,
    permissions: HashMap<i64, HashSet<String>>,
    movies: BTreeMap<i64, Movie>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &mut User) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        state.next_user_id += 1;
        user.id = state.next_user_id;
        user.created_at = Utc::now();
        user.version = 1;
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, user: &mut User) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::DuplicateEmail);
        }

        let stored = state
            .users
            .get_mut(&user.id)
            .filter(|stored| stored.version == user.version)
            .ok_or(StoreError::EditConflict)?;

        user.version += 1;
        *stored = user.clone();
        Ok(())
    }

    async fn get_by_token(&self, token_hash: &[u8], scope: TokenScope) -> Result<User, StoreError> {
        let state = self.lock();
        let now = Utc::now();

        let token = state
            .tokens
            .iter()
            .find(|t| t.hash == token_hash && t.scope == scope && t.expiry > now)
            .ok_or(StoreError::NotFound)?;

        state
            .users
            .get(&token.user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(&self, token: &Token) -> Result<(), StoreError> {
        self.lock().tokens.push(token.clone());
        Ok(())
    }

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> Result<(), StoreError> {
        self.lock()
            .tokens
            .retain(|t| !(t.scope == scope && t.user_id == user_id));
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions, StoreError> {
        Ok(self
            .lock()
            .permissions
            .get(&user_id)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn grant_for_user(&self, user_id: i64, codes: &[&str]) -> Result<(), StoreError> {
        self.lock()
            .permissions
            .entry(user_id)
            .or_default()
            .extend(codes.iter().map(|c| c.to_string()));
        Ok(())
    }
}

#[async_trait]
impl VersionedStore<Movie> for MemoryStore {
    async fn get(&self, id: i64) -> Result<Movie, StoreError> {
        self.lock().movies.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update(&self, movie: &mut Movie) -> Result<(), StoreError> {
        let mut state = self.lock();
        let stored = state
            .movies
            .get_mut(&movie.id)
            .filter(|stored| stored.version == movie.version)
            .ok_or(StoreError::EditConflict)?;

        movie.version += 1;
        *stored = movie.clone();
        Ok(())
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn insert(&self, movie: &mut Movie) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.next_movie_id += 1;
        movie.id = state.next_movie_id;
        movie.created_at = Utc::now();
        movie.version = 1;
        state.movies.insert(movie.id, movie.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.lock()
            .movies
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &MovieFilter, page: &Page) -> Result<(Vec<Movie>, Metadata), StoreError> {
        let mut matched: Vec<Movie> = self
            .lock()
            .movies
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();

        let column = page.sort.column();
        matched.sort_by(|a, b| {
            let ordering = match column {
                "title" => a.title.cmp(&b.title),
                "year" => a.year.cmp(&b.year),
                "runtime" => a.runtime.cmp(&b.runtime),
                _ => a.id.cmp(&b.id),
            };
            let ordering = match page.sort.direction() {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            ordering.then(a.id.cmp(&b.id))
        });

        let total = matched.len() as i64;
        let movies = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok((movies, Metadata::calculate(total, page)))
    }
}

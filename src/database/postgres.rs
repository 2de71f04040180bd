use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::future::Future;
use std::time::Duration;

use super::manager::StoreError;
use super::models::{Movie, MovieFilter, User};
use super::store::{MovieStore, PermissionStore, TokenStore, UserStore, VersionedStore};
use crate::auth::{Permissions, Token, TokenScope};
use crate::filter::{Metadata, Page};

const USERS_EMAIL_KEY: &str = "users_email_key";

/// sqlx-backed implementation of every store trait
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Bound a single query by the configured timeout
    async fn bounded<T, F>(&self, query: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| StoreError::Timeout)?
            .map_err(StoreError::from)
    }
}

fn is_duplicate_email(err: &StoreError) -> bool {
    match err {
        StoreError::Sqlx(sqlx::Error::Database(db)) => db.constraint() == Some(USERS_EMAIL_KEY),
        _ => false,
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, user: &mut User) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO users (name, email, password_hash, activated)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, version
        "#;

        let row = self
            .bounded(
                sqlx::query(query)
                    .bind(&user.name)
                    .bind(&user.email)
                    .bind(&user.password_hash)
                    .bind(user.activated)
                    .fetch_one(&self.pool),
            )
            .await
            .map_err(|e| if is_duplicate_email(&e) { StoreError::DuplicateEmail } else { e })?;

        user.id = row.try_get("id")?;
        user.created_at = row.try_get("created_at")?;
        user.version = row.try_get("version")?;
        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let query = r#"
            SELECT id, created_at, name, email, password_hash, activated, version
            FROM users
            WHERE email = $1
        "#;

        self.bounded(
            sqlx::query_as::<_, User>(query)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update(&self, user: &mut User) -> Result<(), StoreError> {
        let query = r#"
            UPDATE users
            SET name = $1, email = $2, password_hash = $3, activated = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
        "#;

        let version: Option<i32> = self
            .bounded(
                sqlx::query_scalar(query)
                    .bind(&user.name)
                    .bind(&user.email)
                    .bind(&user.password_hash)
                    .bind(user.activated)
                    .bind(user.id)
                    .bind(user.version)
                    .fetch_optional(&self.pool),
            )
            .await
            .map_err(|e| if is_duplicate_email(&e) { StoreError::DuplicateEmail } else { e })?;

        user.version = version.ok_or(StoreError::EditConflict)?;
        Ok(())
    }

    async fn get_by_token(&self, token_hash: &[u8], scope: TokenScope) -> Result<User, StoreError> {
        let query = r#"
            SELECT u.id, u.created_at, u.name, u.email, u.password_hash, u.activated, u.version
            FROM users u
            INNER JOIN tokens t ON u.id = t.user_id
            WHERE t.hash = $1
              AND t.scope = $2
              AND t.expiry > $3
        "#;

        self.bounded(
            sqlx::query_as::<_, User>(query)
                .bind(token_hash)
                .bind(scope.as_str())
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn insert(&self, token: &Token) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
        "#;

        self.bounded(
            sqlx::query(query)
                .bind(&token.hash)
                .bind(token.user_id)
                .bind(token.expiry)
                .bind(token.scope.as_str())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> Result<(), StoreError> {
        self.bounded(
            sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
                .bind(scope.as_str())
                .bind(user_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for PgStore {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions, StoreError> {
        let query = r#"
            SELECT p.code
            FROM permissions p
            INNER JOIN users_permissions up ON up.permission_id = p.id
            WHERE up.user_id = $1
        "#;

        let codes: Vec<String> = self
            .bounded(
                sqlx::query_scalar(query)
                    .bind(user_id)
                    .fetch_all(&self.pool),
            )
            .await?;

        Ok(codes.into_iter().collect())
    }

    async fn grant_for_user(&self, user_id: i64, codes: &[&str]) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO users_permissions
            SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
        "#;

        self.bounded(
            sqlx::query(query)
                .bind(user_id)
                .bind(codes)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl VersionedStore<Movie> for PgStore {
    async fn get(&self, id: i64) -> Result<Movie, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let query = r#"
            SELECT id, created_at, title, year, runtime, genres, version
            FROM movies
            WHERE id = $1
        "#;

        self.bounded(
            sqlx::query_as::<_, Movie>(query)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update(&self, movie: &mut Movie) -> Result<(), StoreError> {
        let query = r#"
            UPDATE movies
            SET title = $1, year = $2, runtime = $3, genres = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
        "#;

        let version: Option<i32> = self
            .bounded(
                sqlx::query_scalar(query)
                    .bind(&movie.title)
                    .bind(movie.year)
                    .bind(movie.runtime)
                    .bind(&movie.genres)
                    .bind(movie.id)
                    .bind(movie.version)
                    .fetch_optional(&self.pool),
            )
            .await?;

        movie.version = version.ok_or(StoreError::EditConflict)?;
        Ok(())
    }
}

#[async_trait]
impl MovieStore for PgStore {
    async fn insert(&self, movie: &mut Movie) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO movies (title, year, runtime, genres)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, version
        "#;

        let row = self
            .bounded(
                sqlx::query(query)
                    .bind(&movie.title)
                    .bind(movie.year)
                    .bind(movie.runtime)
                    .bind(&movie.genres)
                    .fetch_one(&self.pool),
            )
            .await?;

        movie.id = row.try_get("id")?;
        movie.created_at = row.try_get("created_at")?;
        movie.version = row.try_get("version")?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let result = self
            .bounded(
                sqlx::query("DELETE FROM movies WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, filter: &MovieFilter, page: &Page) -> Result<(Vec<Movie>, Metadata), StoreError> {
        // The ORDER BY column comes from a safelisted SortOrder, never from raw input
        let query = format!(
            r#"
            SELECT count(*) OVER() AS total_records, id, created_at, title, year, runtime, genres, version
            FROM movies
            WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
              AND (genres @> $2 OR $2 = '{{}}')
            {}
            LIMIT $3 OFFSET $4
            "#,
            page.sort.generate()
        );

        let rows = self
            .bounded(
                sqlx::query(&query)
                    .bind(&filter.title)
                    .bind(&filter.genres)
                    .bind(page.limit())
                    .bind(page.offset())
                    .fetch_all(&self.pool),
            )
            .await?;

        let mut total_records = 0;
        let mut movies = Vec::with_capacity(rows.len());
        for row in rows {
            total_records = row.try_get("total_records")?;
            movies.push(Movie {
                id: row.try_get("id")?,
                created_at: row.try_get("created_at")?,
                title: row.try_get("title")?,
                year: row.try_get("year")?,
                runtime: row.try_get("runtime")?,
                genres: row.try_get("genres")?,
                version: row.try_get("version")?,
            });
        }

        Ok((movies, Metadata::calculate(total_records, page)))
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::Versioned;
use crate::validator::Validator;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: Vec<u8>,
    pub activated: bool,
    #[serde(skip)]
    pub version: i32,
}

impl User {
    /// A user that has not been inserted yet
    pub fn new(name: impl Into<String>, email: impl Into<String>, password_hash: Vec<u8>) -> Self {
        Self {
            id: 0,
            created_at: Utc::now(),
            name: name.into(),
            email: email.into(),
            password_hash,
            activated: false,
            version: 1,
        }
    }

    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.name.is_empty(), "name", "must be provided");
        v.check(self.name.len() <= 100, "name", "must not be more than 100 bytes long");
        crate::auth::password::validate_email(v, &self.email);
    }
}

impl Versioned for User {
    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }
}

pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use token::{Token, TokenScope};

pub const PERMISSION_MOVIES_READ: &str = "movies:read";
pub const PERMISSION_MOVIES_WRITE: &str = "movies:write";

/// Permission codes granted to a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions(HashSet<String>);

impl Permissions {
    pub fn include(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

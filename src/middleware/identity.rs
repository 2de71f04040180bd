use crate::database::models::User;

/// Who is making the request, as established by the authentication stage
#[derive(Debug, Clone, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(user) => Some(user),
        }
    }

    /// Identity attached to a request; a request that never went through
    /// authentication is anonymous
    pub fn from_extensions(extensions: &axum::http::Extensions) -> Self {
        extensions.get::<Identity>().cloned().unwrap_or_default()
    }
}

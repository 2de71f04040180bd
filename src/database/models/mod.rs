pub mod movie;
pub mod user;

pub use movie::{Movie, MovieFilter, Runtime};
pub use user::User;

/// Records guarded by optimistic concurrency carry a version that the store
/// bumps on every successful update.
pub trait Versioned {
    fn id(&self) -> i64;
    fn version(&self) -> i32;
}

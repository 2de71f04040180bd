pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod middleware;
pub mod validator;

pub use app::{router, AppState};
pub use error::ApiError;

use thiserror::Error;

use crate::error::ApiError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("must be greater than zero")]
    PageTooSmall,

    #[error("must be a maximum of 10 million")]
    PageTooLarge,

    #[error("must be greater than zero")]
    PageSizeTooSmall,

    #[error("must be a maximum of 100")]
    PageSizeTooLarge,

    #[error("invalid sort value")]
    InvalidSort(String),
}

impl FilterError {
    /// Query parameter the failure is reported against
    pub fn field(&self) -> &'static str {
        match self {
            FilterError::PageTooSmall | FilterError::PageTooLarge => "page",
            FilterError::PageSizeTooSmall | FilterError::PageSizeTooLarge => "page_size",
            FilterError::InvalidSort(_) => "sort",
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::validation(err.field(), err.to_string())
    }
}

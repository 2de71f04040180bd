pub mod error;
pub mod filter_order;

use serde::Serialize;

pub use error::FilterError;
pub use filter_order::{SortDirection, SortOrder};

use crate::error::ApiError;
use crate::validator::Validator;

pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw pagination and sort parameters as read from a query string
#[derive(Debug, Clone)]
pub struct ListParams {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            sort: "id".to_string(),
        }
    }
}

/// Validated pagination window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
    pub sort: SortOrder,
}

impl Page {
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

impl ListParams {
    /// Check the parameters, adding failures to `v`. Any failure already
    /// recorded in `v` (e.g. an unparsable number) also rejects the list.
    pub fn validate(&self, mut v: Validator, safelist: &[&'static str]) -> Result<Page, ApiError> {
        for err in self.range_errors() {
            v.add_error(err.field(), &err.to_string());
        }

        let sort = match SortOrder::parse(&self.sort, safelist) {
            Ok(sort) => Some(sort),
            Err(err) => {
                v.add_error(err.field(), &err.to_string());
                None
            }
        };

        v.finish()?;

        sort.map(|sort| Page {
            page: self.page,
            page_size: self.page_size,
            sort,
        })
        .ok_or_else(|| FilterError::InvalidSort(self.sort.clone()).into())
    }

    fn range_errors(&self) -> Vec<FilterError> {
        let mut errors = Vec::new();
        if self.page < 1 {
            errors.push(FilterError::PageTooSmall);
        } else if self.page > MAX_PAGE {
            errors.push(FilterError::PageTooLarge);
        }
        if self.page_size < 1 {
            errors.push(FilterError::PageSizeTooSmall);
        } else if self.page_size > MAX_PAGE_SIZE {
            errors.push(FilterError::PageSizeTooLarge);
        }
        errors
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Pagination metadata returned next to list results; empty when nothing matched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

impl Metadata {
    pub fn calculate(total_records: i64, page: &Page) -> Self {
        if total_records == 0 {
            return Self::default();
        }

        Self {
            current_page: page.page,
            page_size: page.page_size,
            first_page: 1,
            last_page: (total_records + page.page_size - 1) / page.page_size,
            total_records,
        }
    }
}

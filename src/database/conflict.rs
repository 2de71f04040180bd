//! Optimistic concurrency for versioned records.
//!
//! A writer reads the record (and its version), applies its changes locally
//! and asks the store to persist them only if the stored version is still the
//! one it read. No lock is held across the read-modify-write round trip; a
//! concurrent writer that got there first turns the update into an
//! `EditConflict`.

use super::models::Versioned;
use super::store::VersionedStore;
use crate::error::ApiError;

/// Reject a caller-supplied precondition that does not match the stored version
pub fn check_expected_version(expected: Option<i32>, current: i32) -> Result<(), ApiError> {
    match expected {
        Some(expected) if expected != current => Err(ApiError::EditConflict),
        _ => Ok(()),
    }
}

/// Fetch `id`, apply `change`, and persist under a version check.
///
/// * missing record -> `NotFound`
/// * `expected` given and different from the stored version -> `EditConflict`
/// * `change` may reject the edit (e.g. validation) with its own error
/// * zero rows matched on write (the record changed, or vanished, after the
///   read) -> `EditConflict`
pub async fn update_versioned<T, S, F>(
    store: &S,
    id: i64,
    expected: Option<i32>,
    change: F,
) -> Result<T, ApiError>
where
    T: Versioned + Send,
    S: VersionedStore<T> + ?Sized,
    F: FnOnce(&mut T) -> Result<(), ApiError>,
{
    let mut record = store.get(id).await?;

    check_expected_version(expected, record.version())?;
    change(&mut record)?;

    store.update(&mut record).await?;
    Ok(record)
}

//! Result folding shared by the command and event dispatchers.

use eventline_core::error::DomainError;

/// Folds the per-subscriber results of one fan-out into a single result.
pub(crate) fn settle(results: Vec<Result<(), DomainError>>) -> Result<(), DomainError> {
    let failures: Vec<DomainError> = results.into_iter().filter_map(Result::err).collect();
    match DomainError::from_failures(failures) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

use super::entity::ArticleStatus;
use crate::domain::{DomainError, DomainResult};

/// Validates all ArticleStatus invariants
pub fn validate_status(status: &ArticleStatus) -> DomainResult<()> {
    if status.article_id().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Article status must have a non-empty article id".to_string(),
        ));
    }
    Ok(())
}

/// Flag names are plain identifiers: ASCII letters, digits and '_'.
/// They end up inside a JSON path in the store, so nothing else is allowed.
pub fn validate_flag_name(name: &str) -> DomainResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
        return Err(DomainError::InvalidFlagName(name.to_string()));
    }
    Ok(())
}

/// Critical ArticleStatus Invariants:
///
/// 1. article_id is immutable and unique (one status per article)
/// 2. date_arrived is set once, at creation
/// 3. Flags change only through the flag-update path
/// 4. Statuses are never deleted

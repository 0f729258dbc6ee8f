// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod article;
pub mod status;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Article
pub use article::Article;

// Status Domain
pub use status::{validate_flag_name, validate_status, ArticleStatus, StatusFlag, StatusRow};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid flag name: '{0}'")]
    InvalidFlagName(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;

// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO caching
// - NO event emission
// - Explicit SQL only

pub mod status_repository;

pub use status_repository::{SqliteStatusRepository, StatusRepository};

#[cfg(test)]
pub use status_repository::MockStatusRepository;

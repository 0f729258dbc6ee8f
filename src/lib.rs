// src/lib.rs
// Article Status - Write-through article status reconciliation
//
// Architecture:
// - Domain-centric: Status records and flags live in the domain
// - Cache first: Every status is resolved through one in-memory cache
// - Minimal writes: Only statuses whose flag changes reach the store
// - Serial access: One worker owns the cache, callers go through a queue
// - Event-driven: Created and marked batches are announced on the bus

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    validate_flag_name,
    validate_status,
    // Article
    Article,
    // Status
    ArticleStatus,
    DomainError,
    StatusFlag,
    StatusRow,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{DomainEvent, EventBus, EventLogEntry, StatusesCreated, StatusesMarked};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{
    create_connection_pool, create_memory_pool, initialize_database, ConnectionPool,
    DatabaseConfig,
};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{SqliteStatusRepository, StatusRepository};

// ============================================================================
// PUBLIC API - Infrastructure
// ============================================================================

pub use infrastructure::{Cacheable, ObjectCache};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{StatusQueue, StatusQueueConfig, StatusService};

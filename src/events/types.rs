// src/events/types.rs
//
// Status events.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

fn sorted(mut article_ids: Vec<String>) -> Vec<String> {
    article_ids.sort();
    article_ids
}

/// Emitted after new status rows were written.
/// Rows another writer had already stored are not listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusesCreated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    /// Sorted
    pub article_ids: Vec<String>,
}

impl StatusesCreated {
    pub fn new(article_ids: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            article_ids: sorted(article_ids),
        }
    }
}

impl DomainEvent for StatusesCreated {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "StatusesCreated" }
}

/// Emitted after a flag changed on one or more statuses.
/// Only statuses whose value actually changed are listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusesMarked {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub flag: String,
    pub value: bool,
    /// Sorted
    pub article_ids: Vec<String>,
}

impl StatusesMarked {
    pub fn new(flag: String, value: bool, article_ids: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            flag,
            value,
            article_ids: sorted(article_ids),
        }
    }
}

impl DomainEvent for StatusesMarked {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "StatusesMarked" }
}

// src/domain/article.rs
//
// Article Entity
//
// Articles are owned by the caller. This crate only fills in their status slot.

use std::sync::Arc;

use crate::domain::status::ArticleStatus;

/// An article whose status may or may not have been resolved yet.
///
/// The status slot points at the record held by the status cache; the
/// article never creates or owns a status of its own.
#[derive(Debug, Clone)]
pub struct Article {
    /// Stable identifier shared with the status record
    pub article_id: String,

    /// Resolved status (None until resolution)
    pub status: Option<Arc<ArticleStatus>>,
}

impl Article {
    pub fn new(article_id: impl Into<String>) -> Self {
        Self {
            article_id: article_id.into(),
            status: None,
        }
    }

    pub fn has_status(&self) -> bool {
        self.status.is_some()
    }
}

impl PartialEq for Article {
    fn eq(&self, other: &Self) -> bool {
        self.article_id == other.article_id
    }
}

impl Eq for Article {}

impl std::hash::Hash for Article {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.article_id.hash(state);
    }
}

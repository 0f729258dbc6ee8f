// src/services/status_queue.rs
//
// Status Queue - Serial access to the status service
//
// CRITICAL RULES:
// - Exactly one worker owns the StatusService (and so the cache)
// - Every resolve / mark / lookup is a message to that worker
// - Commands run one at a time, in arrival order, to completion
// - Store I/O happens on the worker (a blocking thread), never on the caller

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::{Article, ArticleStatus, StatusFlag};
use crate::error::{AppError, AppResult};
use crate::services::StatusService;

#[derive(Debug, Clone)]
pub struct StatusQueueConfig {
    /// Commands that may wait before senders are back-pressured
    pub capacity: usize,
}

impl Default for StatusQueueConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

enum StatusCommand {
    Resolve {
        articles: Vec<Article>,
        reply: oneshot::Sender<AppResult<Vec<Article>>>,
    },
    EnsureStatuses {
        article_ids: HashSet<String>,
        reply: oneshot::Sender<AppResult<Vec<Arc<ArticleStatus>>>>,
    },
    Mark {
        statuses: Vec<Arc<ArticleStatus>>,
        flag: StatusFlag,
        value: bool,
        reply: oneshot::Sender<AppResult<HashSet<String>>>,
    },
    MarkArticles {
        articles: Vec<Article>,
        flag: StatusFlag,
        value: bool,
        reply: oneshot::Sender<AppResult<(Vec<Article>, HashSet<String>)>>,
    },
    Lookup {
        article_id: String,
        reply: oneshot::Sender<Option<Arc<ArticleStatus>>>,
    },
    Contains {
        article_id: String,
        reply: oneshot::Sender<bool>,
    },
}

/// Cloneable handle to the status worker
#[derive(Clone)]
pub struct StatusQueue {
    sender: mpsc::Sender<StatusCommand>,
}

impl StatusQueue {
    /// Move `service` onto a dedicated blocking worker.
    ///
    /// The worker stops once every handle has been dropped. Must be called
    /// from within a Tokio runtime.
    pub fn spawn(service: StatusService, config: StatusQueueConfig) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));
        let worker = tokio::task::spawn_blocking(move || run_worker(service, receiver));
        (Self { sender }, worker)
    }

    /// Resolve statuses for `articles` and hand them back with their status set
    pub async fn resolve(&self, articles: Vec<Article>) -> AppResult<Vec<Article>> {
        self.request(|reply| StatusCommand::Resolve { articles, reply })
            .await?
    }

    pub async fn ensure_statuses(
        &self,
        article_ids: HashSet<String>,
    ) -> AppResult<Vec<Arc<ArticleStatus>>> {
        self.request(|reply| StatusCommand::EnsureStatuses { article_ids, reply })
            .await?
    }

    /// See `StatusService::mark`
    pub async fn mark(
        &self,
        statuses: Vec<Arc<ArticleStatus>>,
        flag: StatusFlag,
        value: bool,
    ) -> AppResult<HashSet<String>> {
        self.request(|reply| StatusCommand::Mark {
            statuses,
            flag,
            value,
            reply,
        })
        .await?
    }

    /// Resolve then mark; returns the resolved articles and the changed ids
    pub async fn mark_articles(
        &self,
        articles: Vec<Article>,
        flag: StatusFlag,
        value: bool,
    ) -> AppResult<(Vec<Article>, HashSet<String>)> {
        self.request(|reply| StatusCommand::MarkArticles {
            articles,
            flag,
            value,
            reply,
        })
        .await?
    }

    pub async fn lookup(&self, article_id: impl Into<String>) -> AppResult<Option<Arc<ArticleStatus>>> {
        let article_id = article_id.into();
        self.request(|reply| StatusCommand::Lookup { article_id, reply })
            .await
    }

    pub async fn contains(&self, article_id: impl Into<String>) -> AppResult<bool> {
        let article_id = article_id.into();
        self.request(|reply| StatusCommand::Contains { article_id, reply })
            .await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> StatusCommand,
    ) -> AppResult<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .await
            .map_err(|_| AppError::QueueClosed)?;
        response.await.map_err(|_| AppError::QueueClosed)
    }
}

fn run_worker(mut service: StatusService, mut receiver: mpsc::Receiver<StatusCommand>) {
    log::debug!("Status worker started");

    while let Some(command) = receiver.blocking_recv() {
        // A dropped reply receiver only means the caller stopped waiting
        match command {
            StatusCommand::Resolve { mut articles, reply } => {
                let result = service.resolve(&mut articles).map(|_| articles);
                let _ = reply.send(result);
            }
            StatusCommand::EnsureStatuses { article_ids, reply } => {
                let _ = reply.send(service.ensure_statuses(&article_ids));
            }
            StatusCommand::Mark {
                statuses,
                flag,
                value,
                reply,
            } => {
                let _ = reply.send(service.mark(&statuses, &flag, value));
            }
            StatusCommand::MarkArticles {
                mut articles,
                flag,
                value,
                reply,
            } => {
                let result = service
                    .mark_articles(&mut articles, &flag, value)
                    .map(|changed| (articles, changed));
                let _ = reply.send(result);
            }
            StatusCommand::Lookup { article_id, reply } => {
                let _ = reply.send(service.lookup(&article_id));
            }
            StatusCommand::Contains { article_id, reply } => {
                let _ = reply.send(service.contains(&article_id));
            }
        }
    }

    log::debug!("Status worker stopped ({} statuses cached)", service.cached_count());
}

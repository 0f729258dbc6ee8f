// src/main.rs
//
// article-status <resolve|read|unread|star|unstar> <article-id>...
// article-status stats

use anyhow::{bail, Context};
use std::sync::Arc;

use article_status::db::{
    create_connection_pool, get_connection, get_database_stats, initialize_database,
    verify_database_integrity, ConnectionPool, DatabaseConfig,
};
use article_status::domain::{Article, StatusFlag};
use article_status::events::EventBus;
use article_status::repositories::{SqliteStatusRepository, StatusRepository};
use article_status::services::{StatusQueue, StatusQueueConfig, StatusService};

const USAGE: &str = "usage: article-status <resolve|read|unread|star|unstar> <article-id>...
       article-status stats";

enum Command {
    Stats,
    Resolve,
    Mark(StatusFlag, bool),
}

fn parse_command(name: &str) -> anyhow::Result<Command> {
    Ok(match name {
        "stats" => Command::Stats,
        "resolve" => Command::Resolve,
        "read" => Command::Mark(StatusFlag::read(), true),
        "unread" => Command::Mark(StatusFlag::read(), false),
        "star" => Command::Mark(StatusFlag::starred(), true),
        "unstar" => Command::Mark(StatusFlag::starred(), false),
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let command = match args.next() {
        Some(name) => parse_command(&name)?,
        None => bail!(USAGE),
    };
    let articles: Vec<Article> = args.map(Article::new).collect();
    if articles.is_empty() && !matches!(command, Command::Stats) {
        bail!(USAGE);
    }

    // 1. INFRASTRUCTURE
    let config = DatabaseConfig::from_env()?;
    let pool = Arc::new(
        create_connection_pool(&config).context("Failed to open the status database")?,
    );
    {
        let conn = get_connection(&pool)?;
        initialize_database(&conn)?;
    }

    if let Command::Stats = command {
        return print_stats(&pool, &config);
    }

    let event_bus = Arc::new(EventBus::new());

    // 2. REPOSITORIES
    let status_repo: Arc<dyn StatusRepository> =
        Arc::new(SqliteStatusRepository::new(pool.clone()));

    // 3. SERVICES
    let status_service = StatusService::new(status_repo, event_bus);
    let (queue, worker) = StatusQueue::spawn(status_service, StatusQueueConfig::default());

    // 4. RUN
    let articles = match command {
        Command::Mark(flag, value) => {
            let (articles, changed) = queue.mark_articles(articles, flag, value).await?;
            log::info!("{} statuses changed", changed.len());
            articles
        }
        _ => queue.resolve(articles).await?,
    };

    for article in &articles {
        if let Some(status) = &article.status {
            println!(
                "{}  read={}  starred={}  arrived={}",
                article.article_id,
                status.is_read(),
                status.is_starred(),
                status.date_arrived().to_rfc3339()
            );
        }
    }

    drop(queue);
    worker.await.context("Status worker failed")?;

    Ok(())
}

fn print_stats(pool: &ConnectionPool, config: &DatabaseConfig) -> anyhow::Result<()> {
    let conn = get_connection(pool)?;
    verify_database_integrity(&conn)?;
    let stats = get_database_stats(&conn)?;

    println!("database  {}", config.database_path()?.display());
    println!("statuses  {}", stats.status_count);
    println!(
        "size      {} bytes ({} pages of {})",
        stats.size_bytes, stats.page_count, stats.page_size
    );
    println!("integrity ok");

    Ok(())
}

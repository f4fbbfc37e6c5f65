//! One-shot CLI commands for checking configuration and the repository
//! without going through the chat.

use anyhow::{bail, Result};
use std::time::Instant;

use crate::config::Config;
use crate::fetcher::{fetch_category, FetchOutcome, HttpListing, Pagination};
use crate::index;

pub fn list_categories(config: &Config) -> Result<()> {
    println!("{:<32} FOLDERS", "CATEGORY");
    for category in &config.categories {
        let folders = category
            .folder_ids
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("{:<32} {}", category.label, folders);
    }
    Ok(())
}

pub fn check_config(config: &Config) -> Result<()> {
    println!("Configuration OK.");
    println!("  allowed users: {}", config.access.allowed_users.len());
    println!("  categories: {}", config.categories.len());
    println!("  listing: {}", config.repository.url_template);
    println!(
        "  page size: {}, request timeout: {}s, fetch budget: {}s",
        config.repository.page_size,
        config.repository.request_timeout_secs,
        config.repository.fetch_budget_secs
    );
    match config.bot_token() {
        Ok(_) => println!("  bot token: set"),
        Err(_) => println!("  bot token: NOT SET"),
    }
    Ok(())
}

async fn load(config: &Config, label: &str) -> Result<FetchOutcome> {
    let Some(category) = config.category(label) else {
        let known = config
            .categories
            .iter()
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        bail!("Unknown category: '{}'. Available: {}", label, known);
    };

    let listing = HttpListing::new(&config.repository)?;
    let paging = Pagination::from_config(&config.repository);
    Ok(fetch_category(&listing, &category.folder_ids, &paging).await)
}

pub async fn run_fetch(config: &Config, label: &str) -> Result<()> {
    let started = Instant::now();
    let outcome = load(config, label).await?;

    println!("fetch {}", label);
    println!("  items: {}", outcome.items.len());
    println!(
        "  status: {}",
        if outcome.complete {
            "complete"
        } else {
            "incomplete (see log)"
        }
    );
    println!("  elapsed: {}ms", started.elapsed().as_millis());
    Ok(())
}

pub async fn run_search(config: &Config, label: &str, term: &str) -> Result<()> {
    let outcome = load(config, label).await?;
    if !outcome.complete {
        eprintln!("Warning: listing was not read completely; results may be missing.");
    }

    let hits = index::search(&outcome.items, term.trim());
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for hit in hits {
        println!("{}", hit);
    }
    Ok(())
}

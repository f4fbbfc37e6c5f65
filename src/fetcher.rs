//! Paginated repository listing.
//!
//! Aggregates a remote repository's paged folder listing into a single
//! in-memory collection. Pages are requested one at a time with `start` /
//! `limit` query parameters until a page comes back empty.
//!
//! # Pagination
//!
//! The offset advances by the configured page size after every successful
//! page, regardless of how many items that page held. A short page is not
//! treated as the end of the listing; only an empty (or absent) `result`
//! is.
//!
//! # Failure policy
//!
//! Fetching is best-effort. A transport error, non-2xx status, undecodable
//! body or per-page timeout is logged and ends that folder's loop; whatever
//! was accumulated is kept. [`FetchOutcome::complete`] records whether any
//! such failure happened so callers can flag a possibly short result, but
//! no error is ever returned.
//!
//! # Endpoint
//!
//! ```text
//! GET <url_template with {folder_id}>?start=<offset>&limit=<page_size>&id=<folder_id>
//! Content-Type: application/json
//!
//! {"result": [{"NAME": "...", "DOWNLOAD_URL": "..."}, ...]}
//! ```
//!
//! Entries without a `DOWNLOAD_URL` (subfolders) are skipped but still
//! count towards the page, so they never end a folder early.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::RepositoryConfig;
use crate::models::{FolderId, Item, ListingPage};

/// Why a single page request failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("listing request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("listing returned HTTP {0}")]
    Status(u16),
    #[error("listing page could not be decoded: {0}")]
    Decode(String),
    #[error("listing request timed out")]
    Timeout,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err)
        }
    }
}

/// A source of listing pages.
///
/// Implemented by [`HttpListing`] for the real repository; tests supply
/// in-memory sources.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page of `folder` starting at offset `start`, at most
    /// `limit` entries long. A page with no entries marks the end of the
    /// listing.
    async fn fetch_page(
        &self,
        folder: &FolderId,
        start: usize,
        limit: usize,
    ) -> Result<ListingPage, FetchError>;
}

/// Paging limits for one fetch.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page_size: usize,
    /// Upper bound on pages per folder, for listings that never run dry.
    pub max_pages: usize,
    /// Overall time allowed for a whole category load.
    pub budget: Duration,
}

impl Pagination {
    pub fn from_config(config: &RepositoryConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_pages: config.max_pages,
            budget: config.fetch_budget(),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_pages: 10_000,
            budget: Duration::from_secs(120),
        }
    }
}

/// Items gathered by a fetch, plus whether every page was read.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub items: Vec<Item>,
    pub complete: bool,
}

/// Fetch every page of one folder, in order.
pub async fn fetch_all(
    source: &dyn PageSource,
    folder: &FolderId,
    paging: &Pagination,
) -> FetchOutcome {
    let deadline = Instant::now() + paging.budget;
    fetch_folder(source, folder, paging, deadline).await.0
}

/// Fetch every folder of a category and concatenate the results.
///
/// Folders are read in the given order. A failed folder does not stop the
/// next one from being read; running out of the overall budget does.
pub async fn fetch_category(
    source: &dyn PageSource,
    folders: &[FolderId],
    paging: &Pagination,
) -> FetchOutcome {
    let deadline = Instant::now() + paging.budget;
    let mut outcome = FetchOutcome {
        items: Vec::new(),
        complete: true,
    };

    for folder in folders {
        let (part, budget_left) = fetch_folder(source, folder, paging, deadline).await;
        outcome.items.extend(part.items);
        outcome.complete &= part.complete;
        if !budget_left {
            break;
        }
    }

    outcome
}

/// Returns the folder's outcome and whether the overall budget still has
/// time left.
async fn fetch_folder(
    source: &dyn PageSource,
    folder: &FolderId,
    paging: &Pagination,
    deadline: Instant,
) -> (FetchOutcome, bool) {
    let mut items = Vec::new();
    let mut start = 0usize;

    for _ in 0..paging.max_pages {
        let page =
            match tokio::time::timeout_at(deadline, source.fetch_page(folder, start, paging.page_size))
                .await
            {
                Ok(Ok(page)) => page,
                Ok(Err(e)) => {
                    tracing::error!(folder = %folder, start, error = %e, "listing request failed");
                    return (
                        FetchOutcome {
                            items,
                            complete: false,
                        },
                        true,
                    );
                }
                Err(_) => {
                    tracing::warn!(folder = %folder, start, "fetch budget exhausted");
                    return (
                        FetchOutcome {
                            items,
                            complete: false,
                        },
                        false,
                    );
                }
            };

        if page.is_end() {
            return (
                FetchOutcome {
                    items,
                    complete: true,
                },
                true,
            );
        }

        items.extend(page.into_items());
        start += paging.page_size;
    }

    tracing::warn!(
        folder = %folder,
        max_pages = paging.max_pages,
        "page limit reached before listing ended"
    );
    (
        FetchOutcome {
            items,
            complete: true,
        },
        true,
    )
}

// ============ HTTP listing ============

/// Repository listing served over HTTP.
pub struct HttpListing {
    client: reqwest::Client,
    url_template: String,
}

impl HttpListing {
    pub fn new(config: &RepositoryConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            url_template: config.url_template.clone(),
        })
    }

    fn url_for(&self, folder: &FolderId) -> String {
        self.url_template.replace("{folder_id}", folder.as_str())
    }
}

#[async_trait]
impl PageSource for HttpListing {
    async fn fetch_page(
        &self,
        folder: &FolderId,
        start: usize,
        limit: usize,
    ) -> Result<ListingPage, FetchError> {
        let response = self
            .client
            .get(self.url_for(folder))
            .header(CONTENT_TYPE, "application/json")
            .query(&[
                ("start", start.to_string()),
                ("limit", limit.to_string()),
                ("id", folder.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

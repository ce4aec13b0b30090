//! Pipeline orchestration: one series end to end, and whole catalog runs.

use crate::catalog::{drive_catalog, extract_catalog_links};
use crate::chapter::extract_chapter;
use crate::config::{Config, CrawlConfig};
use crate::db;
use crate::error::IngestError;
use crate::fetcher::{Fetcher, PageKind};
use crate::models::{CatalogRunReport, SeriesIngestSummary};
use crate::series::extract_series;
use crate::slug::chapter_slug;
use rusqlite::Connection;
use std::cell::RefCell;

/// Ingest one series and all of its chapters. Chapters already in the
/// store count as scraped; a failing chapter is logged and skipped without
/// aborting the rest.
pub async fn run_series_ingestion(
    fetcher: &Fetcher,
    conn: &mut Connection,
    source_url: &str,
) -> Result<SeriesIngestSummary, IngestError> {
    let page = fetcher.fetch(source_url, PageKind::Series).await?;
    if page.is_empty() {
        return Err(IngestError::FetchFailed {
            url: source_url.to_string(),
            reason: "empty response from both fetch paths".to_string(),
        });
    }

    let extracted = extract_series(&page.html, source_url)?;
    let series_id = db::upsert_series(conn, &extracted.record)?;
    db::link_genres(conn, series_id, &extracted.genres)?;

    let chapters_found = extracted.chapter_urls.len();
    let mut chapters_scraped = 0;
    for (i, url) in extracted.chapter_urls.iter().enumerate() {
        match ingest_chapter(fetcher, conn, series_id, url, i).await {
            Ok(true) => chapters_scraped += 1,
            Ok(false) => {}
            Err(e) => log::warn!("chapter {} failed: {}", url, e),
        }
    }

    log::info!(
        "series '{}': {}/{} chapters in store",
        extracted.record.title,
        chapters_scraped,
        chapters_found
    );
    Ok(SeriesIngestSummary {
        series_id,
        title: extracted.record.title,
        chapters_found,
        chapters_scraped,
    })
}

/// Returns true when the chapter is in the store after this call, whether
/// it was just written or already there.
async fn ingest_chapter(
    fetcher: &Fetcher,
    conn: &mut Connection,
    series_id: i64,
    url: &str,
    index: usize,
) -> Result<bool, IngestError> {
    let page = fetcher.fetch(url, PageKind::Chapter).await?;
    if page.is_empty() {
        log::warn!("empty chapter page {}", url);
        return Ok(false);
    }

    let chapter = extract_chapter(&page.html, url, index);
    if db::chapter_exists(conn, series_id, chapter.number)? {
        log::debug!("chapter {} already present, skipping", chapter.number);
        return Ok(true);
    }

    // A chapter with zero discovered pages is still recorded; the page
    // loop simply writes nothing.
    let title = chapter
        .title
        .clone()
        .unwrap_or_else(|| default_chapter_title(chapter.number));
    db::insert_chapter_with_pages(conn, series_id, &title, &chapter)?;
    Ok(true)
}

fn default_chapter_title(number: f64) -> String {
    format!("الفصل {}", chapter_slug(number))
}

/// Crawl a catalog page and ingest every discovered series, paced and with
/// one retry per item. `progress` fires after each item with
/// (completed, total).
pub async fn run_catalog_ingestion<P>(
    fetcher: &Fetcher,
    conn: &mut Connection,
    catalog_url: &str,
    crawl: &CrawlConfig,
    progress: P,
) -> Result<CatalogRunReport, IngestError>
where
    P: FnMut(usize, usize),
{
    let page = fetcher.fetch(catalog_url, PageKind::Catalog).await?;
    if page.is_empty() {
        return Err(IngestError::FetchFailed {
            url: catalog_url.to_string(),
            reason: "empty response from both fetch paths".to_string(),
        });
    }

    let links = extract_catalog_links(&page.html, catalog_url);
    log::info!("catalog {} yielded {} series links", catalog_url, links.len());

    let conn = RefCell::new(conn);
    let report = drive_catalog(
        links,
        crawl,
        |url| {
            let conn = &conn;
            async move {
                let mut guard = conn.borrow_mut();
                let summary = run_series_ingestion(fetcher, &mut **guard, &url).await?;
                Ok(format!(
                    "{}: {}/{} chapters",
                    summary.title, summary.chapters_scraped, summary.chapters_found
                ))
            }
        },
        progress,
    )
    .await;
    Ok(report)
}

/// The fetch layer and crawl settings bundled behind the two trigger
/// operations, built from a [`Config`].
pub struct Ingestor {
    fetcher: Fetcher,
    crawl: CrawlConfig,
}

impl Ingestor {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            fetcher: Fetcher::new(config.render)?,
            crawl: config.crawl,
        })
    }

    /// Build from `config.toml` in the working directory, falling back to
    /// defaults when the file is absent or unreadable.
    pub fn from_config_file() -> Result<Self, reqwest::Error> {
        Self::new(Config::load())
    }

    pub async fn ingest_series(
        &self,
        conn: &mut Connection,
        source_url: &str,
    ) -> Result<SeriesIngestSummary, IngestError> {
        run_series_ingestion(&self.fetcher, conn, source_url).await
    }

    pub async fn ingest_catalog<P>(
        &self,
        conn: &mut Connection,
        catalog_url: &str,
        progress: P,
    ) -> Result<CatalogRunReport, IngestError>
    where
        P: FnMut(usize, usize),
    {
        run_catalog_ingestion(&self.fetcher, conn, catalog_url, &self.crawl, progress).await
    }
}

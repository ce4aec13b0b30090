//! Catalog crawling: series-link discovery on listing pages and the paced
//! driver that works through the discovered links with one retry each.

use crate::config::CrawlConfig;
use crate::error::IngestError;
use crate::extract::{absolutize, all_matches, dedup_preserving};
use crate::models::{CatalogItemReport, CatalogRunReport, ItemOutcome};
use regex::Regex;
use scraper::{Html, Selector};
use std::future::Future;
use std::time::Duration;

/// Series links on a catalog/listing page, deduped and absolute, in
/// document order. Strategies go narrow to broad; the broad sweep refuses
/// chapter-shaped URLs (trailing numeric path segment).
pub fn extract_catalog_links(html: &str, base_url: &str) -> Vec<String> {
    let doc = Html::parse_document(html);

    let found = links_from_post_titles(&doc);
    if !found.is_empty() {
        return dedup_preserving(absolutize(found, base_url));
    }

    let found = links_from_manga_paths(html);
    if !found.is_empty() {
        return dedup_preserving(absolutize(found, base_url));
    }

    dedup_preserving(absolutize(links_from_broad_sweep(&doc), base_url))
}

fn links_from_post_titles(doc: &Html) -> Vec<String> {
    let selector = Selector::parse("h3.post-title a, div.post-title a").unwrap();
    doc.select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|h| h.trim().to_string())
        .filter(|h| h.contains("/manga/") || h.contains("/series/"))
        .collect()
}

fn links_from_manga_paths(html: &str) -> Vec<String> {
    let re = Regex::new(r#"href="([^"]*/manga/[^"/]+/?)""#).unwrap();
    all_matches(html, &re)
}

fn links_from_broad_sweep(doc: &Html) -> Vec<String> {
    let chapter_shaped = Regex::new(r"/\d+(?:\.\d+)?/?$").unwrap();
    let selector = Selector::parse("a").unwrap();
    doc.select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|h| h.trim().to_string())
        .filter(|h| (h.contains("/manga/") || h.contains("/series/")) && !chapter_shaped.is_match(h))
        .collect()
}

/// Lifecycle of one catalog item. At most one retry: the second
/// `Fetching` attempt terminates the item either way.
enum ItemState {
    Pending,
    Fetching { attempt: u8 },
    Retrying,
}

/// Work through catalog items sequentially, each through its own state
/// machine (`Pending → Fetching → Retrying → Fetching`), with a pacing
/// delay between items and a progress call after every item with
/// (completed, total).
pub async fn drive_catalog<F, Fut, P>(
    urls: Vec<String>,
    crawl: &CrawlConfig,
    mut ingest_one: F,
    mut progress: P,
) -> CatalogRunReport
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, IngestError>>,
    P: FnMut(usize, usize),
{
    let total = urls.len();
    let mut items = Vec::with_capacity(total);
    let mut succeeded = 0;

    for (i, url) in urls.into_iter().enumerate() {
        let mut state = ItemState::Pending;
        let report = loop {
            state = match state {
                ItemState::Pending => ItemState::Fetching { attempt: 1 },
                ItemState::Fetching { attempt } => match ingest_one(url.clone()).await {
                    Ok(message) => {
                        let outcome = if attempt == 1 {
                            ItemOutcome::Succeeded
                        } else {
                            ItemOutcome::Retried
                        };
                        break CatalogItemReport {
                            url,
                            outcome,
                            message,
                        };
                    }
                    Err(err) if attempt == 1 => {
                        log::warn!("item {} failed ({}), retrying once", url, err);
                        ItemState::Retrying
                    }
                    Err(err) => {
                        log::error!("item {} failed twice: {}", url, err);
                        break CatalogItemReport {
                            url,
                            outcome: ItemOutcome::Failed,
                            message: err.to_string(),
                        };
                    }
                },
                ItemState::Retrying => {
                    tokio::time::sleep(Duration::from_millis(crawl.retry_backoff_ms)).await;
                    ItemState::Fetching { attempt: 2 }
                }
            };
        };

        if report.outcome != ItemOutcome::Failed {
            succeeded += 1;
        }
        items.push(report);
        progress(i + 1, total);

        if i + 1 < total {
            tokio::time::sleep(Duration::from_millis(crawl.pace_delay_ms)).await;
        }
    }

    CatalogRunReport {
        total,
        succeeded,
        failed: total - succeeded,
        items,
    }
}

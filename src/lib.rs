//! Ingestion core for manga-hosting sites.
//!
//! The pipeline is fetch → extract → persist: a render-backend-first
//! [`fetcher`], strategy-chain extractors for series, chapter and catalog
//! pages, and an idempotent SQLite writer. [`ingest`] ties them together
//! for single-series and whole-catalog runs.

pub mod catalog;
pub mod chapter;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod ingest;
pub mod models;
pub mod series;
pub mod slug;

pub use config::Config;
pub use error::IngestError;
pub use fetcher::{FetchedPage, Fetcher, PageKind};
pub use ingest::{run_catalog_ingestion, run_series_ingestion, Ingestor};
pub use models::{CatalogRunReport, SeriesIngestSummary};

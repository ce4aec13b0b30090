use serde::{Deserialize, Serialize};

/// Content-type classification by origin of the work
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Manga,
    Manhwa,
    Manhua,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Manga => "manga",
            ContentType::Manhwa => "manhwa",
            ContentType::Manhua => "manhua",
        }
    }

}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeriesStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
}

impl SeriesStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesStatus::Ongoing => "ongoing",
            SeriesStatus::Completed => "completed",
            SeriesStatus::Hiatus => "hiatus",
            SeriesStatus::Cancelled => "cancelled",
        }
    }
}

/// One series as extracted from its source page. The slug is derived from
/// the title and is the primary natural identity in the store.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeriesRecord {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub content_type: ContentType,
    pub rating: Option<f64>,
    pub source_url: String,
    pub author: Option<String>,
    pub artist: Option<String>,
}

/// Output of the series extractor: the record plus discovered chapter
/// links in document order.
#[derive(Debug, Clone)]
pub struct ExtractedSeries {
    pub record: SeriesRecord,
    pub genres: Vec<String>,
    pub chapter_urls: Vec<String>,
}

/// Output of the chapter extractor
#[derive(Debug, Clone)]
pub struct ExtractedChapter {
    pub title: Option<String>,
    pub number: f64,
    pub page_urls: Vec<String>,
}

/// Result object returned to the trigger interface after one series run
#[derive(Debug, Serialize, Clone)]
pub struct SeriesIngestSummary {
    pub series_id: i64,
    pub title: String,
    pub chapters_found: usize,
    pub chapters_scraped: usize,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemOutcome {
    Succeeded,
    /// Succeeded on the second attempt
    Retried,
    Failed,
}

#[derive(Debug, Serialize, Clone)]
pub struct CatalogItemReport {
    pub url: String,
    pub outcome: ItemOutcome,
    pub message: String,
}

/// Result object for a whole catalog run. `total == 0` is "nothing found",
/// not an error; `succeeded < total` is a partial success.
#[derive(Debug, Serialize, Clone)]
pub struct CatalogRunReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<CatalogItemReport>,
}

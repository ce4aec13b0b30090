use crate::config::RenderBackendConfig;
use crate::error::IngestError;
use rand::Rng;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User agents to rotate through to avoid bot detection
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// What kind of page is being fetched; drives render wait, timeout and the
/// minimum length below which a response counts as an empty shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Series,
    Chapter,
    Catalog,
}

impl PageKind {
    fn render_wait_ms(&self) -> u64 {
        match self {
            PageKind::Series => 2000,
            PageKind::Chapter => 1500,
            PageKind::Catalog => 3000,
        }
    }

    fn timeout(&self) -> Duration {
        match self {
            PageKind::Series => Duration::from_secs(30),
            PageKind::Chapter => Duration::from_secs(25),
            PageKind::Catalog => Duration::from_secs(60),
        }
    }

    fn min_html_len(&self) -> usize {
        match self {
            PageKind::Catalog => 500,
            _ => 100,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    url: &'a str,
    want_html: bool,
    render_wait_ms: u64,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize, Default)]
struct RenderResponse {
    #[serde(default)]
    html: String,
}

/// The fetched page. `html` may be empty when both paths failed; callers
/// treat that as "nothing found" rather than an error.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    pub used_renderer: bool,
}

impl FetchedPage {
    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

/// Resilient fetch layer: rendering backend first (defeats JS-gated and
/// anti-bot pages), plain GET with browser-like headers as fallback.
pub struct Fetcher {
    client: Client,
    render: RenderBackendConfig,
}

impl Fetcher {
    pub fn new(render: RenderBackendConfig) -> Result<Self, reqwest::Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .parse()
                .expect("static header"),
        );
        headers.insert(
            "Accept-Language",
            "ar,en-US;q=0.9,en;q=0.8".parse().expect("static header"),
        );

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(60))
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, render })
    }

    fn random_user_agent() -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
    }

    /// Validate the URL shape before any network call.
    pub fn validate_url(url: &str) -> Result<(), IngestError> {
        if url.is_empty() {
            return Err(IngestError::InvalidInput("empty URL".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(IngestError::InvalidInput(format!(
                "URL must start with http:// or https://: {}",
                url
            )));
        }
        reqwest::Url::parse(url)
            .map_err(|e| IngestError::InvalidInput(format!("{}: {}", url, e)))?;
        Ok(())
    }

    /// Fetch raw HTML for a page, rendering backend first. Both paths
    /// failing resolves to an empty page with the error logged; the error
    /// itself never escapes this function.
    pub async fn fetch(&self, url: &str, kind: PageKind) -> Result<FetchedPage, IngestError> {
        Self::validate_url(url)?;

        if self.render.api_key.is_some() {
            match self.fetch_rendered(url, kind).await {
                Ok(html) if html.len() > kind.min_html_len() => {
                    log::debug!("renderer produced {} bytes for {}", html.len(), url);
                    return Ok(FetchedPage {
                        html,
                        used_renderer: true,
                    });
                }
                Ok(html) => {
                    log::warn!(
                        "renderer returned near-empty content ({} bytes) for {}, falling back",
                        html.len(),
                        url
                    );
                }
                Err(e) => {
                    log::warn!("renderer failed for {}: {}, falling back", url, e);
                }
            }
        }

        match self.fetch_direct(url, kind).await {
            Ok(html) => Ok(FetchedPage {
                html,
                used_renderer: false,
            }),
            Err(e) => {
                log::warn!("direct fetch failed for {}: {}", url, e);
                Ok(FetchedPage {
                    html: String::new(),
                    used_renderer: false,
                })
            }
        }
    }

    async fn fetch_rendered(&self, url: &str, kind: PageKind) -> Result<String, reqwest::Error> {
        let key = self.render.api_key.as_deref().unwrap_or_default();
        let body = RenderRequest {
            url,
            want_html: true,
            render_wait_ms: kind.render_wait_ms(),
            timeout_ms: kind.timeout().as_millis() as u64,
        };
        let resp = self
            .client
            .post(&self.render.endpoint)
            .bearer_auth(key)
            .timeout(kind.timeout())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let rendered: RenderResponse = resp.json().await?;
        Ok(rendered.html)
    }

    async fn fetch_direct(&self, url: &str, kind: PageKind) -> Result<String, reqwest::Error> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", Self::random_user_agent())
            .timeout(kind.timeout())
            .send()
            .await?;
        resp.text().await
    }
}

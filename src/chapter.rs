//! Chapter page extraction: number, optional title and the ordered page
//! image list.

use crate::extract::{all_matches, clean_text, dedup_preserving, first_match, FieldPattern};
use crate::models::ExtractedChapter;
use regex::Regex;
use scraper::{Html, Selector};

/// Extract one chapter. `index_hint` is the zero-based position of this
/// chapter in the series list and supplies the number when the page itself
/// carries none. Zero pages is a valid result, logged as its own
/// condition; it is not a fetch error.
pub fn extract_chapter(html: &str, source_url: &str, index_hint: usize) -> ExtractedChapter {
    let doc = Html::parse_document(html);

    let heading = extract_heading(html, &doc);
    let number = heading
        .as_deref()
        .and_then(parse_chapter_number)
        .unwrap_or((index_hint + 1) as f64);

    let page_urls = extract_page_images(html, &doc);
    if page_urls.is_empty() {
        log::warn!("no page images found on {}", source_url);
    }

    ExtractedChapter {
        title: heading,
        number,
        page_urls,
    }
}

fn extract_heading(html: &str, doc: &Html) -> Option<String> {
    let h1 = Selector::parse("h1").unwrap();
    if let Some(el) = doc.select(&h1).next() {
        let text = clean_text(&el.text().collect::<String>());
        if !text.is_empty() {
            return Some(text);
        }
    }
    let patterns = [FieldPattern::new(
        "og-title",
        r#"<meta[^>]+property="og:title"[^>]+content="([^"]+)""#,
    )];
    first_match(html, &patterns, |t| !t.is_empty())
}

/// The chapter number is the first numeric token in the heading, decimals
/// included ("Chapter 10.5" is 10.5).
fn parse_chapter_number(heading: &str) -> Option<f64> {
    let re = Regex::new(r"(\d+(?:\.\d+)?)").unwrap();
    re.captures(heading)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Hosts whose images the broad sweep trusts; anything else needs one of
/// the theme-specific markers instead.
const IMAGE_HOST_MARKERS: &[&str] = &[
    "lekmanga",
    "tempsolo",
    "olympus",
    "teamx",
    "cdn",
    "uploads",
];

fn extract_page_images(html: &str, doc: &Html) -> Vec<String> {
    let strategies: [fn(&str, &Html) -> Vec<String>; 6] = [
        images_from_reader_src,
        images_from_reader_data_src,
        images_from_numbered_ids,
        images_from_broad_sweep,
        images_from_ts_reader,
        images_from_any_data_src,
    ];
    for strategy in strategies {
        let found = strategy(html, doc);
        if !found.is_empty() {
            return dedup_preserving(found);
        }
    }
    Vec::new()
}

fn images_from_reader_src(_html: &str, doc: &Html) -> Vec<String> {
    collect_img_attr(doc, "img.wp-manga-chapter-img", "src")
}

fn images_from_reader_data_src(_html: &str, doc: &Html) -> Vec<String> {
    collect_img_attr(doc, "img.wp-manga-chapter-img", "data-src")
}

fn images_from_numbered_ids(html: &str, _doc: &Html) -> Vec<String> {
    let re = Regex::new(r#"<img[^>]+id="image-\d+"[^>]+src="([^"]+)""#).unwrap();
    all_matches(html, &re)
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| is_page_image(u))
        .collect()
}

fn images_from_ts_reader(_html: &str, doc: &Html) -> Vec<String> {
    collect_img_attr(doc, "img.ts-main-image", "src")
}

/// Every image with a page-like extension on a known image host.
fn images_from_broad_sweep(html: &str, _doc: &Html) -> Vec<String> {
    let src = Regex::new(r#"<img[^>]+(?:data-src|src)="([^"]+\.(?:jpg|jpeg|png|webp)[^"]*)""#)
        .unwrap();
    all_matches(html, &src)
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| {
            let lowered = u.to_lowercase();
            is_page_image(u) && IMAGE_HOST_MARKERS.iter().any(|h| lowered.contains(h))
        })
        .collect()
}

/// Last resort: lazy-loaded images with a page-like extension, any host.
fn images_from_any_data_src(html: &str, _doc: &Html) -> Vec<String> {
    let src = Regex::new(r#"<img[^>]+data-src="([^"]+\.(?:jpg|jpeg|png|webp)[^"]*)""#).unwrap();
    all_matches(html, &src)
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| is_page_image(u))
        .collect()
}

fn collect_img_attr(doc: &Html, selector: &str, attr: &str) -> Vec<String> {
    let sel = Selector::parse(selector).unwrap();
    doc.select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .map(|s| s.trim().to_string())
        .filter(|u| is_page_image(u))
        .collect()
}

fn is_page_image(url: &str) -> bool {
    let lowered = url.to_lowercase();
    url.starts_with("http")
        && !lowered.contains("logo")
        && !lowered.contains("avatar")
        && !lowered.ends_with(".gif")
}

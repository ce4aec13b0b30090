//! Series page extraction: title, description, classification, rating,
//! cover, genres and the ordered chapter-link list.
//!
//! Every field is an ordered strategy chain; most target WordPress manga
//! themes (Madara and friends) first and fall back to generic markup. Only
//! the title is required, everything else degrades to None or empty.

use crate::error::IngestError;
use crate::extract::{
    absolutize, all_matches, clean_text, dedup_preserving, first_match, FieldPattern,
};
use crate::models::{ContentType, ExtractedSeries, SeriesRecord};
use crate::slug::series_slug;
use regex::Regex;
use scraper::{Html, Selector};

pub fn extract_series(html: &str, source_url: &str) -> Result<ExtractedSeries, IngestError> {
    let doc = Html::parse_document(html);

    let title = extract_title(html, &doc)
        .ok_or_else(|| IngestError::ExtractionFailed(format!("title on {}", source_url)))?;

    let record = SeriesRecord {
        slug: series_slug(&title),
        description: extract_description(html, &doc),
        cover_url: extract_cover(html, &doc),
        content_type: classify_content_type(html, source_url),
        rating: extract_rating(html),
        source_url: source_url.to_string(),
        author: extract_person(html, &doc, "author", &["author", "المؤلف"]),
        artist: extract_person(html, &doc, "artist", &["artist", "الرسام"]),
        title,
    };

    let genres = extract_genres(&doc);
    let chapter_urls = extract_chapter_links(html, &doc, source_url);

    Ok(ExtractedSeries {
        record,
        genres,
        chapter_urls,
    })
}

fn extract_title(html: &str, doc: &Html) -> Option<String> {
    let selectors = [
        "div.post-title h1",
        "h1.entry-title",
        "div.post-title h3",
        "h1",
    ];
    for sel in selectors {
        let selector = Selector::parse(sel).unwrap();
        if let Some(el) = doc.select(&selector).next() {
            let text = clean_text(&el.text().collect::<String>());
            if is_plausible_title(&text) {
                return Some(text);
            }
        }
    }

    let patterns = [FieldPattern::new(
        "og-title",
        r#"<meta[^>]+property="og:title"[^>]+content="([^"]+)""#,
    )];
    if let Some(title) = first_match(html, &patterns, is_plausible_title) {
        return Some(title);
    }

    // Last resort: the document title, chopped at the site-name separator
    let title_tag = Selector::parse("title").unwrap();
    doc.select(&title_tag)
        .next()
        .map(|el| el.text().collect::<String>())
        .map(|t| {
            let head = t
                .split(['|', '-', '–'])
                .next()
                .unwrap_or(t.as_str())
                .to_string();
            clean_text(&head)
        })
        .filter(|t| is_plausible_title(t))
}

fn is_plausible_title(text: &str) -> bool {
    let len = text.chars().count();
    // "الرئيسية" is the home-page nav heading some themes emit first
    len >= 2 && len <= 200 && !text.contains("navbar") && !text.contains("الرئيسية")
}

fn extract_description(html: &str, doc: &Html) -> Option<String> {
    let selectors = [
        "div.description-summary div.summary__content",
        "div.summary__content p",
        "div.manga-excerpt",
        "div.entry-content p",
    ];
    for sel in selectors {
        let selector = Selector::parse(sel).unwrap();
        if let Some(el) = doc.select(&selector).next() {
            let text = clean_text(&el.text().collect::<String>());
            if is_plausible_description(&text) {
                return Some(text);
            }
        }
    }

    let patterns = [FieldPattern::new(
        "og-description",
        r#"<meta[^>]+property="og:description"[^>]+content="([^"]+)""#,
    )];
    first_match(html, &patterns, is_plausible_description)
}

fn is_plausible_description(text: &str) -> bool {
    // "افضل موقع" is boilerplate site self-promotion, not a synopsis
    text.chars().count() >= 30 && !text.contains("افضل موقع")
}

/// Classify from type-labeled elements; the URL path only decides when no
/// labeled element matched. Bare occurrences of "manga" elsewhere on the
/// page (nav links, hrefs) must not count.
fn classify_content_type(html: &str, source_url: &str) -> ContentType {
    let patterns = [
        FieldPattern::new(
            "summary-content",
            r#"(?is)<div[^>]*class="[^"]*post-content[^"]*"[^>]*>.*?<div[^>]*class="[^"]*summary-content[^"]*"[^>]*>\s*(Manhwa|Manhua|Manga|مانهوا|مانها|مانجا)\s*</div>"#,
        ),
        FieldPattern::new(
            "manga-type-link",
            r#"(?i)<a[^>]*class="[^"]*manga-type[^"]*"[^>]*>([^<]+)</a>"#,
        ),
        FieldPattern::new(
            "type-span",
            r#"(?i)<span[^>]*class="[^"]*type[^"]*"[^>]*>\s*(Manhwa|Manhua|Manga|مانهوا|مانها|مانجا)\s*</span>"#,
        ),
        FieldPattern::new(
            "type-text",
            r#"(?i)نوع[\s:]+(?:<[^>]*>)?\s*(مانهوا|مانها|مانجا|Manhwa|Manhua|Manga)"#,
        ),
        FieldPattern::new(
            "type-english",
            r#"(?i)Type[\s:]+(?:<[^>]*>)?\s*(Manhwa|Manhua|Manga)"#,
        ),
    ];
    if let Some(label) = first_match(html, &patterns, |_| true) {
        let lowered = label.to_lowercase();
        if lowered.contains("manhwa") || lowered.contains("مانهوا") {
            return ContentType::Manhwa;
        }
        if lowered.contains("manhua") || lowered.contains("مانها") {
            return ContentType::Manhua;
        }
        return ContentType::Manga;
    }
    let url = source_url.to_lowercase();
    if url.contains("manhwa") {
        ContentType::Manhwa
    } else if url.contains("manhua") {
        ContentType::Manhua
    } else {
        ContentType::Manga
    }
}

fn extract_rating(html: &str) -> Option<f64> {
    let patterns = [
        FieldPattern::new(
            "schema-rating",
            r#"itemprop="ratingValue"[^>]*content="([0-9.]+)""#,
        ),
        FieldPattern::new(
            "schema-rating-span",
            r#"itemprop="ratingValue"[^>]*>([0-9.]+)</span>"#,
        ),
        FieldPattern::new(
            "score-span",
            r#"(?i)<span[^>]*class="[^"]*score[^"]*"[^>]*>\s*([0-9.]+)\s*</span>"#,
        ),
        FieldPattern::new(
            "total-votes",
            r#"(?i)<div[^>]*class="[^"]*total_votes[^"]*"[^>]*>\s*([0-9.]+)\s*</div>"#,
        ),
        FieldPattern::new("rating-general", r#"(?i)rating[^>]*>\s*([0-9.]+)\s*<"#),
    ];
    first_match(html, &patterns, |s| {
        s.parse::<f64>().map(|r| r > 0.0 && r <= 10.0).unwrap_or(false)
    })
    .and_then(|s| s.parse::<f64>().ok())
}

fn extract_cover(html: &str, doc: &Html) -> Option<String> {
    let selectors = ["div.summary_image img", "div.thumb img", "div.tab-summary img"];
    for sel in selectors {
        let selector = Selector::parse(sel).unwrap();
        if let Some(el) = doc.select(&selector).next() {
            for attr in ["data-src", "src"] {
                if let Some(src) = el.value().attr(attr) {
                    let src = src.trim();
                    if is_plausible_cover(src) {
                        return Some(src.to_string());
                    }
                }
            }
        }
    }

    let patterns = [FieldPattern::new(
        "og-image",
        r#"<meta[^>]+property="og:image"[^>]+content="([^"]+)""#,
    )];
    first_match(html, &patterns, is_plausible_cover)
}

fn is_plausible_cover(url: &str) -> bool {
    let lowered = url.to_lowercase();
    // "teamx" is a scanlation-group watermark, not the series cover
    url.starts_with("http") && !lowered.contains("logo") && !lowered.contains("teamx")
}

fn extract_genres(doc: &Html) -> Vec<String> {
    let selectors = [
        "div.genres-content a",
        "a[href*=\"manga-genre\"]",
        "a[rel=\"tag\"]",
    ];
    for sel in selectors {
        let selector = Selector::parse(sel).unwrap();
        let found: Vec<String> = doc
            .select(&selector)
            .map(|el| clean_text(&el.text().collect::<String>()))
            .filter(|g| {
                let len = g.chars().count();
                len >= 2 && len <= 30
            })
            .collect();
        if !found.is_empty() {
            return dedup_preserving(found);
        }
    }
    Vec::new()
}

/// Author/artist come from labeled summary rows first, then from bare
/// `class="author"`-style fragments some themes emit instead.
fn extract_person(html: &str, doc: &Html, class_name: &str, labels: &[&str]) -> Option<String> {
    if let Some(value) = extract_labeled_field(doc, labels) {
        return Some(value);
    }
    let pattern = FieldPattern::new(
        "class-fragment",
        &format!(r#"class="{}"[^>]*>([^<]+)<"#, class_name),
    );
    first_match(html, std::slice::from_ref(&pattern), |v| {
        !v.is_empty() && v != "-" && v.to_lowercase() != "updating"
    })
}

/// Matching is by the row heading, English or Arabic.
fn extract_labeled_field(doc: &Html, labels: &[&str]) -> Option<String> {
    let row = Selector::parse("div.post-content_item").unwrap();
    let heading = Selector::parse("div.summary-heading").unwrap();
    let content = Selector::parse("div.summary-content").unwrap();
    for item in doc.select(&row) {
        let head = match item.select(&heading).next() {
            Some(h) => clean_text(&h.text().collect::<String>()).to_lowercase(),
            None => continue,
        };
        if labels.iter().any(|l| head.contains(&l.to_lowercase())) {
            let value = match item.select(&content).next() {
                Some(c) => clean_text(&c.text().collect::<String>()),
                None => continue,
            };
            if !value.is_empty() && value != "-" && value.to_lowercase() != "updating" {
                return Some(value);
            }
        }
    }
    None
}

/// Chapter links in document order. Strategies narrow to broad: the Madara
/// chapter list, any wp-manga-chapter item, site families with numeric
/// chapter paths, then a generic container sweep.
fn extract_chapter_links(html: &str, doc: &Html, source_url: &str) -> Vec<String> {
    let strategies: [fn(&str, &Html) -> Vec<String>; 4] = [
        chapters_from_main_list,
        chapters_from_items,
        chapters_from_path_shapes,
        chapters_from_generic_containers,
    ];
    for strategy in strategies {
        let found = strategy(html, doc);
        if !found.is_empty() {
            return dedup_preserving(absolutize(found, source_url));
        }
    }
    Vec::new()
}

fn chapters_from_main_list(_html: &str, doc: &Html) -> Vec<String> {
    let selector = Selector::parse("ul.main.version-chap li.wp-manga-chapter a").unwrap();
    doc.select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|h| h.trim().to_string())
        .collect()
}

fn chapters_from_items(_html: &str, doc: &Html) -> Vec<String> {
    let selector = Selector::parse("li.wp-manga-chapter a").unwrap();
    doc.select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|h| h.trim().to_string())
        .collect()
}

fn chapters_from_path_shapes(html: &str, _doc: &Html) -> Vec<String> {
    let patterns = [
        Regex::new(r#"href="([^"]*/series/[^"]+/\d+(?:\.\d+)?/?)""#).unwrap(),
        Regex::new(r#"href="([^"]*/chapter[^"]*)""#).unwrap(),
    ];
    for re in &patterns {
        let found = all_matches(html, re);
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

fn chapters_from_generic_containers(_html: &str, doc: &Html) -> Vec<String> {
    let selector = Selector::parse(
        "div.eplister a, div.chapter-list a, ul.chapters a, div#chapterlist a, li[data-num] a",
    )
    .unwrap();
    doc.select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty() && *h != "#")
        .collect()
}

//! Shared extraction primitives: ordered regex strategy chains over raw
//! HTML, tag stripping and order-preserving dedup.
//!
//! Selector-based extraction lives with the page-specific extractors; the
//! regex chains here are the fallback layer that still works when a site's
//! markup deviates from its theme.

use regex::Regex;
use reqwest::Url;
use std::collections::HashSet;

/// One named strategy in a chain. The name only shows up in debug logs.
pub struct FieldPattern {
    pub name: &'static str,
    pub regex: Regex,
}

impl FieldPattern {
    pub fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
        }
    }
}

/// Walk the chain in order and return the first capture that the validator
/// accepts. Later patterns are never consulted once one matches and
/// validates.
pub fn first_match<F>(html: &str, patterns: &[FieldPattern], validate: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    for pattern in patterns {
        if let Some(caps) = pattern.regex.captures(html) {
            if let Some(m) = caps.get(1) {
                let cleaned = clean_text(m.as_str());
                if validate(&cleaned) {
                    log::debug!("field matched via strategy '{}'", pattern.name);
                    return Some(cleaned);
                }
            }
        }
    }
    None
}

/// All first-capture-group matches of a single pattern, in document order.
pub fn all_matches(html: &str, pattern: &Regex) -> Vec<String> {
    pattern
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Strip tags and collapse whitespace runs into single spaces.
pub fn clean_text(raw: &str) -> String {
    let tags = Regex::new(r"<[^>]*>").unwrap();
    let ws = Regex::new(r"\s+").unwrap();
    let stripped = tags.replace_all(raw, " ");
    ws.replace_all(stripped.trim(), " ").trim().to_string()
}

/// Dedup keeping only the first occurrence of each value.
pub fn dedup_preserving(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Resolve possibly-relative URLs against the page they were found on.
/// Unjoinable entries drop out; an unparsable base passes everything
/// through untouched.
pub fn absolutize(urls: Vec<String>, base: &str) -> Vec<String> {
    let base_url = match Url::parse(base) {
        Ok(u) => u,
        Err(_) => return urls,
    };
    urls.into_iter()
        .filter_map(|u| base_url.join(&u).ok().map(|j| j.to_string()))
        .collect()
}

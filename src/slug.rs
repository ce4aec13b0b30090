//! Slug generation for series, genres and chapters
//!
//! Series slugs keep Arabic-script characters (the target locale) alongside
//! ASCII word characters; everything else collapses to a single hyphen.

use regex::Regex;

/// Derive the stable series slug from a title. Runs of characters that are
/// neither ASCII word characters nor in the Arabic block U+0600..U+06FF
/// become one `-`; leading and trailing hyphens are trimmed.
pub fn series_slug(title: &str) -> String {
    let non_word = Regex::new(r"[^a-z0-9_؀-ۿ]+").unwrap();
    let lowered = title.trim().to_lowercase();
    let collapsed = non_word.replace_all(&lowered, "-");
    collapsed.trim_matches('-').to_string()
}

/// Genre slugs are simpler: lowercased with whitespace runs as hyphens.
pub fn genre_slug(name: &str) -> String {
    let ws = Regex::new(r"\s+").unwrap();
    ws.replace_all(name.trim().to_lowercase().as_str(), "-")
        .to_string()
}

/// Chapter slug is the numeric-only rendering of the chapter number
/// ("10.5" stays "10.5", "Chapter 7" would already be parsed to 7 upstream).
pub fn chapter_slug(number: f64) -> String {
    let rendered = if number.fract() == 0.0 {
        format!("{}", number as i64)
    } else {
        format!("{}", number)
    };
    rendered.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_slug_basic() {
        assert_eq!(series_slug("Solo Leveling"), "solo-leveling");
        assert_eq!(series_slug("  Über-Hero: Part 1!  "), "ber-hero-part-1");
    }

    #[test]
    fn test_series_slug_shape() {
        let slug = series_slug("  Über-Hero: Part 1!  ");
        let shape = Regex::new(r"^[a-z0-9-]+(-[a-z0-9-]+)*$").unwrap();
        assert!(shape.is_match(&slug));
        assert!(!slug.starts_with('-'));
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_series_slug_keeps_arabic() {
        assert_eq!(series_slug("سولو ليفلينغ"), "سولو-ليفلينغ");
    }

    #[test]
    fn test_genre_slug() {
        assert_eq!(genre_slug("Slice of Life"), "slice-of-life");
        assert_eq!(genre_slug("Action"), "action");
    }

    #[test]
    fn test_chapter_slug() {
        assert_eq!(chapter_slug(7.0), "7");
        assert_eq!(chapter_slug(10.5), "10.5");
    }
}

//! SQLite persistence: schema setup and the idempotent upsert operations
//! the ingestion pipeline relies on.
//!
//! Identity rules: a series is matched by slug OR exact title, a genre by
//! name, a chapter by (series_id, chapter_number). Re-ingesting the same
//! source never duplicates rows and never touches a series' status.

use crate::models::{ExtractedChapter, SeriesRecord, SeriesStatus};
use crate::slug::{chapter_slug, genre_slug};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

pub fn create_tables(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS series (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            description TEXT,
            cover_url TEXT,
            content_type TEXT NOT NULL DEFAULT 'manga',
            status TEXT NOT NULL DEFAULT 'ongoing',
            rating REAL,
            source_url TEXT,
            author TEXT,
            artist TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS genres (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS series_genres (
            series_id INTEGER NOT NULL REFERENCES series(id),
            genre_id INTEGER NOT NULL REFERENCES genres(id),
            PRIMARY KEY (series_id, genre_id)
        );
        CREATE TABLE IF NOT EXISTS chapters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            series_id INTEGER NOT NULL REFERENCES series(id),
            chapter_number REAL NOT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            release_date TEXT NOT NULL,
            UNIQUE (series_id, chapter_number)
        );
        CREATE TABLE IF NOT EXISTS pages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            chapter_id INTEGER NOT NULL REFERENCES chapters(id),
            page_number INTEGER NOT NULL,
            image_url TEXT NOT NULL,
            UNIQUE (chapter_id, page_number)
        );",
    )
}

/// Insert the series or refresh an existing one matched by slug or exact
/// title. Updates never change id, slug or status; a new row starts as
/// 'ongoing'. Returns the row id either way.
pub fn upsert_series(conn: &Connection, record: &SeriesRecord) -> Result<i64, rusqlite::Error> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM series WHERE slug = ?1 OR title = ?2",
            params![record.slug, record.title],
            |row| row.get(0),
        )
        .optional()?;

    let now = Utc::now().to_rfc3339();
    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE series SET title = ?1, description = ?2, cover_url = ?3,
                    content_type = ?4, rating = ?5, source_url = ?6,
                    author = ?7, artist = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    record.title,
                    record.description,
                    record.cover_url,
                    record.content_type.as_str(),
                    record.rating,
                    record.source_url,
                    record.author,
                    record.artist,
                    now,
                    id
                ],
            )?;
            log::info!("refreshed series '{}' (id {})", record.title, id);
            Ok(id)
        }
        None => {
            conn.execute(
                "INSERT INTO series (title, slug, description, cover_url, content_type,
                    status, rating, source_url, author, artist, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    record.title,
                    record.slug,
                    record.description,
                    record.cover_url,
                    record.content_type.as_str(),
                    SeriesStatus::Ongoing.as_str(),
                    record.rating,
                    record.source_url,
                    record.author,
                    record.artist,
                    now
                ],
            )?;
            let id = conn.last_insert_rowid();
            log::info!("inserted series '{}' (id {})", record.title, id);
            Ok(id)
        }
    }
}

/// Attach genres to a series, creating genre rows as needed. Existing
/// links are left alone.
pub fn link_genres(
    conn: &Connection,
    series_id: i64,
    genres: &[String],
) -> Result<(), rusqlite::Error> {
    for name in genres {
        let slug = genre_slug(name);
        let genre_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM genres WHERE slug = ?1",
                params![slug],
                |row| row.get(0),
            )
            .optional()?;
        let genre_id = match genre_id {
            Some(id) => id,
            None => {
                conn.execute(
                    "INSERT INTO genres (slug, name) VALUES (?1, ?2)",
                    params![slug, name],
                )?;
                conn.last_insert_rowid()
            }
        };
        conn.execute(
            "INSERT OR IGNORE INTO series_genres (series_id, genre_id) VALUES (?1, ?2)",
            params![series_id, genre_id],
        )?;
    }
    Ok(())
}

pub fn chapter_exists(
    conn: &Connection,
    series_id: i64,
    number: f64,
) -> Result<bool, rusqlite::Error> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM chapters WHERE series_id = ?1 AND chapter_number = ?2",
            params![series_id, number],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Insert a chapter and all of its pages in one transaction; a failure on
/// any page leaves no trace of the chapter.
pub fn insert_chapter_with_pages(
    conn: &mut Connection,
    series_id: i64,
    title: &str,
    chapter: &ExtractedChapter,
) -> Result<i64, rusqlite::Error> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO chapters (series_id, chapter_number, title, slug, release_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            series_id,
            chapter.number,
            title,
            chapter_slug(chapter.number),
            Utc::now().to_rfc3339()
        ],
    )?;
    let chapter_id = tx.last_insert_rowid();
    for (i, url) in chapter.page_urls.iter().enumerate() {
        tx.execute(
            "INSERT INTO pages (chapter_id, page_number, image_url) VALUES (?1, ?2, ?3)",
            params![chapter_id, (i + 1) as i64, url],
        )?;
    }
    tx.commit()?;
    Ok(chapter_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn sample_record() -> SeriesRecord {
        SeriesRecord {
            title: "Solo Leveling".to_string(),
            slug: "solo-leveling".to_string(),
            description: Some("Hunters and gates.".to_string()),
            cover_url: Some("https://cdn.example.com/solo.jpg".to_string()),
            content_type: ContentType::Manhwa,
            rating: Some(8.7),
            source_url: "https://lekmanga.net/manga/solo-leveling/".to_string(),
            author: Some("Chugong".to_string()),
            artist: None,
        }
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let conn = test_conn();
        let id1 = upsert_series(&conn, &sample_record()).unwrap();

        let mut refreshed = sample_record();
        refreshed.rating = Some(9.1);
        let id2 = upsert_series(&conn, &refreshed).unwrap();
        assert_eq!(id1, id2);

        let (count, rating): (i64, f64) = conn
            .query_row(
                "SELECT COUNT(*), MAX(rating) FROM series",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(rating, 9.1);
    }

    #[test]
    fn test_upsert_matches_by_title_when_slug_differs() {
        let conn = test_conn();
        let id1 = upsert_series(&conn, &sample_record()).unwrap();

        let mut renamed_slug = sample_record();
        renamed_slug.slug = "solo-leveling-remastered".to_string();
        let id2 = upsert_series(&conn, &renamed_slug).unwrap();
        assert_eq!(id1, id2);

        // The stored slug is the original one
        let slug: String = conn
            .query_row("SELECT slug FROM series WHERE id = ?1", [id1], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(slug, "solo-leveling");
    }

    #[test]
    fn test_upsert_never_touches_status() {
        let conn = test_conn();
        let id = upsert_series(&conn, &sample_record()).unwrap();
        conn.execute("UPDATE series SET status = 'completed' WHERE id = ?1", [id])
            .unwrap();

        upsert_series(&conn, &sample_record()).unwrap();
        let status: String = conn
            .query_row("SELECT status FROM series WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(status, "completed");
    }

    #[test]
    fn test_link_genres_idempotent() {
        let conn = test_conn();
        let id = upsert_series(&conn, &sample_record()).unwrap();
        let genres = vec!["Action".to_string(), "Fantasy".to_string()];

        link_genres(&conn, id, &genres).unwrap();
        link_genres(&conn, id, &genres).unwrap();

        let genre_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM genres", [], |row| row.get(0))
            .unwrap();
        let link_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM series_genres", [], |row| row.get(0))
            .unwrap();
        assert_eq!(genre_count, 2);
        assert_eq!(link_count, 2);
    }

    #[test]
    fn test_chapter_insert_and_exists() {
        let mut conn = test_conn();
        let id = upsert_series(&conn, &sample_record()).unwrap();
        let chapter = ExtractedChapter {
            title: Some("Chapter 1".to_string()),
            number: 1.0,
            page_urls: vec![
                "https://cdn.example.com/1.jpg".to_string(),
                "https://cdn.example.com/2.jpg".to_string(),
            ],
        };

        assert!(!chapter_exists(&conn, id, 1.0).unwrap());
        insert_chapter_with_pages(&mut conn, id, "Chapter 1", &chapter).unwrap();
        assert!(chapter_exists(&conn, id, 1.0).unwrap());

        let pages: Vec<(i64, String)> = conn
            .prepare("SELECT page_number, image_url FROM pages ORDER BY page_number")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            pages,
            vec![
                (1, "https://cdn.example.com/1.jpg".to_string()),
                (2, "https://cdn.example.com/2.jpg".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_chapter_number_rejected() {
        let mut conn = test_conn();
        let id = upsert_series(&conn, &sample_record()).unwrap();
        let chapter = ExtractedChapter {
            title: None,
            number: 3.0,
            page_urls: vec!["https://cdn.example.com/p.jpg".to_string()],
        };
        insert_chapter_with_pages(&mut conn, id, "الفصل 3", &chapter).unwrap();
        assert!(insert_chapter_with_pages(&mut conn, id, "الفصل 3", &chapter).is_err());
    }
}

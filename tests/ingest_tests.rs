//! End-to-end pipeline tests over canned HTML and an in-memory store.
//! Network stays out of these; the extractors and the writer are exercised
//! exactly the way the orchestration layer uses them.

use manga_ingest::chapter::extract_chapter;
use manga_ingest::db;
use manga_ingest::models::ContentType;
use manga_ingest::series::extract_series;
use manga_ingest::slug::chapter_slug;
use rusqlite::Connection;

const SERIES_PAGE: &str = r#"
    <html><head><title>برج الساحر | Lek Manga</title></head><body>
    <div class="post-title"><h1>برج الساحر</h1></div>
    <div class="tab-summary"><div class="summary_image">
        <img src="https://cdn.lekmanga.net/covers/tower.jpg">
    </div></div>
    <div class="description-summary"><div class="summary__content">
        <p>ساحر شاب يتسلق برجاً غامضاً بحثاً عن الحقيقة خلف اختفاء عائلته بأكملها.</p>
    </div></div>
    <div class="genres-content">
        <a href="/manga-genre/fantasy/">فانتازيا</a>
        <a href="/manga-genre/action/">أكشن</a>
    </div>
    <div class="post-content"><div class="post-content_item">
        <div class="summary-heading">النوع</div>
        <div class="summary-content">مانهوا</div>
    </div></div>
    <ul class="main version-chap">
        <li class="wp-manga-chapter"><a href="/manga/wizard-tower/2/">2</a></li>
        <li class="wp-manga-chapter"><a href="/manga/wizard-tower/1/">1</a></li>
    </ul>
    </body></html>
"#;

fn chapter_page(number: u32, pages: &[&str]) -> String {
    let imgs: String = pages
        .iter()
        .map(|p| format!(r#"<img class="wp-manga-chapter-img" src="{}">"#, p))
        .collect();
    format!("<html><body><h1>الفصل {}</h1>{}</body></html>", number, imgs)
}

fn fresh_store() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::create_tables(&conn).unwrap();
    conn
}

/// Run the extract-then-persist path for one series page and its chapter
/// pages, the way the orchestrator does, without the network in between.
fn ingest_canned(
    conn: &mut Connection,
    series_html: &str,
    source_url: &str,
    chapter_pages: &[String],
) -> (i64, usize) {
    let extracted = extract_series(series_html, source_url).unwrap();
    let series_id = db::upsert_series(conn, &extracted.record).unwrap();
    db::link_genres(conn, series_id, &extracted.genres).unwrap();

    let mut scraped = 0;
    for (i, html) in chapter_pages.iter().enumerate() {
        let chapter = extract_chapter(html, &extracted.chapter_urls[i], i);
        if db::chapter_exists(conn, series_id, chapter.number).unwrap() {
            scraped += 1;
            continue;
        }
        let title = chapter
            .title
            .clone()
            .unwrap_or_else(|| format!("الفصل {}", chapter_slug(chapter.number)));
        db::insert_chapter_with_pages(conn, series_id, &title, &chapter).unwrap();
        scraped += 1;
    }
    (series_id, scraped)
}

#[test]
fn full_series_ingestion_persists_everything() {
    let mut conn = fresh_store();
    let chapters = vec![
        chapter_page(2, &["https://cdn.lekmanga.net/t/2/1.jpg", "https://cdn.lekmanga.net/t/2/2.jpg"]),
        chapter_page(1, &["https://cdn.lekmanga.net/t/1/1.jpg"]),
    ];
    let (series_id, scraped) = ingest_canned(
        &mut conn,
        SERIES_PAGE,
        "https://lekmanga.net/manga/wizard-tower/",
        &chapters,
    );
    assert_eq!(scraped, 2);

    let (title, content_type, status): (String, String, String) = conn
        .query_row(
            "SELECT title, content_type, status FROM series WHERE id = ?1",
            [series_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(title, "برج الساحر");
    assert_eq!(content_type, ContentType::Manhwa.as_str());
    assert_eq!(status, "ongoing");

    let chapter_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM chapters WHERE series_id = ?1", [series_id], |r| r.get(0))
        .unwrap();
    let page_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))
        .unwrap();
    let genre_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM series_genres WHERE series_id = ?1", [series_id], |r| r.get(0))
        .unwrap();
    assert_eq!(chapter_count, 2);
    assert_eq!(page_count, 3);
    assert_eq!(genre_count, 2);
}

#[test]
fn reingestion_is_idempotent() {
    let mut conn = fresh_store();
    let chapters = vec![
        chapter_page(2, &["https://cdn.lekmanga.net/t/2/1.jpg"]),
        chapter_page(1, &["https://cdn.lekmanga.net/t/1/1.jpg"]),
    ];
    let url = "https://lekmanga.net/manga/wizard-tower/";

    let (id1, scraped1) = ingest_canned(&mut conn, SERIES_PAGE, url, &chapters);
    let (id2, scraped2) = ingest_canned(&mut conn, SERIES_PAGE, url, &chapters);
    assert_eq!(id1, id2);
    assert_eq!(scraped1, 2);
    // Existing chapters still count as scraped
    assert_eq!(scraped2, 2);

    let series_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM series", [], |r| r.get(0))
        .unwrap();
    let chapter_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM chapters", [], |r| r.get(0))
        .unwrap();
    let genre_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM genres", [], |r| r.get(0))
        .unwrap();
    assert_eq!(series_count, 1);
    assert_eq!(chapter_count, 2);
    assert_eq!(genre_count, 2);
}

#[test]
fn manual_status_change_survives_reingestion() {
    let mut conn = fresh_store();
    let url = "https://lekmanga.net/manga/wizard-tower/";
    let (id, _) = ingest_canned(&mut conn, SERIES_PAGE, url, &[]);

    conn.execute("UPDATE series SET status = 'hiatus' WHERE id = ?1", [id])
        .unwrap();
    ingest_canned(&mut conn, SERIES_PAGE, url, &[]);

    let status: String = conn
        .query_row("SELECT status FROM series WHERE id = ?1", [id], |r| r.get(0))
        .unwrap();
    assert_eq!(status, "hiatus");
}

#[test]
fn duplicate_page_urls_collapse_in_order() {
    let mut conn = fresh_store();
    let html = chapter_page(
        1,
        &[
            "https://cdn.lekmanga.net/a.jpg",
            "https://cdn.lekmanga.net/b.jpg",
            "https://cdn.lekmanga.net/a.jpg",
            "https://cdn.lekmanga.net/c.jpg",
        ],
    );
    let series = extract_series(SERIES_PAGE, "https://lekmanga.net/manga/wizard-tower/").unwrap();
    let series_id = db::upsert_series(&conn, &series.record).unwrap();

    let chapter = extract_chapter(&html, "https://lekmanga.net/manga/wizard-tower/1/", 0);
    db::insert_chapter_with_pages(&mut conn, series_id, "الفصل 1", &chapter).unwrap();

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
            (1, "https://cdn.lekmanga.net/a.jpg".to_string()),
            (2, "https://cdn.lekmanga.net/b.jpg".to_string()),
            (3, "https://cdn.lekmanga.net/c.jpg".to_string()),
        ]
    );
}

#[test]
fn chapter_without_pages_is_still_recorded() {
    let mut conn = fresh_store();
    let chapters = vec![
        chapter_page(2, &[]),
        chapter_page(1, &["https://cdn.lekmanga.net/t/1/1.jpg"]),
    ];
    let (series_id, scraped) = ingest_canned(
        &mut conn,
        SERIES_PAGE,
        "https://lekmanga.net/manga/wizard-tower/",
        &chapters,
    );
    assert_eq!(scraped, 2);

    let chapter_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM chapters WHERE series_id = ?1", [series_id], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(chapter_count, 2);

    // The empty chapter carries no pages but still blocks duplicates
    let empty_pages: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pages WHERE chapter_id =
                (SELECT id FROM chapters WHERE series_id = ?1 AND chapter_number = 2.0)",
            [series_id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(empty_pages, 0);
    assert!(db::chapter_exists(&conn, series_id, 2.0).unwrap());
}

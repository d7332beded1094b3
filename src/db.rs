use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::warn;

use crate::nutrition::patterns::PatternKind;
use crate::scraper::Lookup;
use crate::wiki::{CandidatePage, Corpus, CorpusError, PageOutcome};

/// SQLite page/search cache and lookup log. Shared across lookup tasks.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
        }
        let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Store::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Store::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Store { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("store lock poisoned"))
    }

    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    // ── Cache ──

    pub fn cached_page(&self, query_title: &str, max_age: chrono::Duration) -> Result<Option<CandidatePage>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT title, url, full_text, excerpt, fetched_at FROM pages WHERE query_title = ?1",
                [query_title],
                |row| {
                    Ok((
                        CandidatePage {
                            title: row.get(0)?,
                            url: row.get(1)?,
                            full_text: row.get(2)?,
                            excerpt: row.get(3)?,
                        },
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;
        Ok(row.and_then(|(page, fetched_at)| is_fresh(&fetched_at, max_age).then_some(page)))
    }

    pub fn save_page(&self, query_title: &str, page: &CandidatePage, latency_ms: i64) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO pages (query_title, title, url, full_text, excerpt, latency_ms, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                query_title,
                page.title,
                page.url,
                page.full_text,
                page.excerpt,
                latency_ms,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn cached_search(&self, query: &str, limit: usize, max_age: chrono::Duration) -> Result<Option<Vec<String>>> {
        let conn = self.conn()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT titles, fetched_at FROM searches WHERE query = ?1 AND max_results = ?2",
                rusqlite::params![query, limit as i64],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            Some((titles, fetched_at)) if is_fresh(&fetched_at, max_age) => {
                Ok(Some(serde_json::from_str(&titles)?))
            }
            _ => Ok(None),
        }
    }

    pub fn save_search(&self, query: &str, limit: usize, titles: &[String]) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO searches (query, max_results, titles, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![query, limit as i64, serde_json::to_string(titles)?, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Body of a cached page by resolved or requested title.
    pub fn page_text(&self, title: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let text = conn
            .query_row(
                "SELECT full_text FROM pages WHERE title = ?1 OR query_title = ?1
                 ORDER BY fetched_at DESC LIMIT 1",
                [title],
                |row| row.get(0),
            )
            .optional()?;
        Ok(text)
    }

    // ── Lookup log ──

    pub fn record_lookup(&self, food: &str, lookup: Option<&Lookup>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        match lookup {
            Some(l) => conn.execute(
                "INSERT INTO lookups (food, found, calories, portion, pattern, page_title, source, looked_up_at)
                 VALUES (?1, 1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    food,
                    l.food.calories,
                    l.food.portion,
                    l.pattern.as_str(),
                    l.page_title,
                    l.food.source,
                    now,
                ],
            )?,
            None => conn.execute(
                "INSERT INTO lookups (food, found, looked_up_at) VALUES (?1, 0, ?2)",
                rusqlite::params![food, now],
            )?,
        };
        Ok(())
    }

    /// Latest successful lookup per food.
    pub fn resolved_lookups(&self) -> Result<Vec<LookupRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT food, calories, pattern, page_title FROM lookups
             WHERE id IN (SELECT MAX(id) FROM lookups GROUP BY food) AND found = 1
             ORDER BY food",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LookupRow {
                    food: row.get(0)?,
                    calories: row.get(1)?,
                    pattern: row.get::<_, Option<String>>(2)?.as_deref().and_then(PatternKind::parse),
                    page_title: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;
        let count = |sql: &str| -> Result<usize> {
            Ok(conn.query_row(sql, [], |row| row.get::<_, i64>(0))? as usize)
        };
        Ok(StoreStats {
            pages: count("SELECT COUNT(*) FROM pages")?,
            searches: count("SELECT COUNT(*) FROM searches")?,
            lookups: count("SELECT COUNT(*) FROM lookups")?,
            foods_found: count(
                "SELECT COUNT(*) FROM lookups WHERE id IN (SELECT MAX(id) FROM lookups GROUP BY food) AND found = 1",
            )?,
            foods_missing: count(
                "SELECT COUNT(*) FROM lookups WHERE id IN (SELECT MAX(id) FROM lookups GROUP BY food) AND found = 0",
            )?,
        })
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id          INTEGER PRIMARY KEY,
            query_title TEXT UNIQUE NOT NULL,
            title       TEXT NOT NULL,
            url         TEXT NOT NULL,
            full_text   TEXT NOT NULL,
            excerpt     TEXT NOT NULL,
            latency_ms  INTEGER,
            fetched_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_pages_title ON pages(title);

        CREATE TABLE IF NOT EXISTS searches (
            query       TEXT NOT NULL,
            max_results INTEGER NOT NULL,
            titles      TEXT NOT NULL,
            fetched_at  TEXT NOT NULL,
            PRIMARY KEY (query, max_results)
        );

        CREATE TABLE IF NOT EXISTS lookups (
            id           INTEGER PRIMARY KEY,
            food         TEXT NOT NULL,
            found        BOOLEAN NOT NULL,
            calories     INTEGER,
            portion      TEXT,
            pattern      TEXT,
            page_title   TEXT,
            source       TEXT,
            looked_up_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_lookups_food ON lookups(food);
        ",
    )?;
    Ok(())
}

fn is_fresh(fetched_at: &str, max_age: chrono::Duration) -> bool {
    DateTime::parse_from_rfc3339(fetched_at)
        .map(|t| Utc::now().signed_duration_since(t) <= max_age)
        .unwrap_or(false)
}

pub struct LookupRow {
    pub food: String,
    pub calories: Option<i64>,
    pub pattern: Option<PatternKind>,
    pub page_title: Option<String>,
}

pub struct StoreStats {
    pub pages: usize,
    pub searches: usize,
    pub lookups: usize,
    pub foods_found: usize,
    pub foods_missing: usize,
}

// ── Caching corpus ──

/// Serves searches and found pages from the store while fresh; everything
/// else goes to `inner`. Cache trouble is logged and bypassed.
pub struct CachedCorpus<C> {
    inner: C,
    store: Arc<Store>,
    max_age: chrono::Duration,
}

impl<C: Corpus> CachedCorpus<C> {
    pub fn new(inner: C, store: Arc<Store>, max_age: chrono::Duration) -> Self {
        CachedCorpus { inner, store, max_age }
    }
}

impl<C: Corpus> Corpus for CachedCorpus<C> {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, CorpusError> {
        match self.store.cached_search(query, limit, self.max_age) {
            Ok(Some(titles)) => return Ok(titles),
            Ok(None) => {}
            Err(e) => warn!("Search cache read failed for '{}': {:#}", query, e),
        }
        let titles = self.inner.search(query, limit).await?;
        if let Err(e) = self.store.save_search(query, limit, &titles) {
            warn!("Search cache write failed for '{}': {:#}", query, e);
        }
        Ok(titles)
    }

    async fn fetch_page(&self, title: &str) -> Result<PageOutcome, CorpusError> {
        match self.store.cached_page(title, self.max_age) {
            Ok(Some(page)) => return Ok(PageOutcome::Found(page)),
            Ok(None) => {}
            Err(e) => warn!("Page cache read failed for '{}': {:#}", title, e),
        }
        let start = Instant::now();
        let outcome = self.inner.fetch_page(title).await?;
        if let PageOutcome::Found(page) = &outcome {
            let latency = start.elapsed().as_millis() as i64;
            if let Err(e) = self.store.save_page(title, page, latency) {
                warn!("Page cache write failed for '{}': {:#}", title, e);
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::CrawledFood;

    fn page(title: &str, text: &str) -> CandidatePage {
        CandidatePage::new(title.into(), text.into(), format!("https://zh.wikipedia.org/wiki/{}", title))
    }

    #[test]
    fn page_round_trip_and_expiry() {
        let store = Store::open_in_memory().unwrap();
        store.save_page("牛乳", &page("牛奶", "牛奶是乳制品。"), 120).unwrap();

        let hit = store.cached_page("牛乳", chrono::Duration::days(1)).unwrap().unwrap();
        assert_eq!(hit.title, "牛奶");
        assert_eq!(hit.excerpt, "牛奶是乳制品。");
        assert!(store.cached_page("牛乳", chrono::Duration::seconds(-1)).unwrap().is_none());
        assert_eq!(store.page_text("牛奶").unwrap().as_deref(), Some("牛奶是乳制品。"));
    }

    #[test]
    fn search_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let titles = vec!["可乐".to_string(), "可口可乐".to_string()];
        store.save_search("可乐 卡路里", 5, &titles).unwrap();
        assert_eq!(store.cached_search("可乐 卡路里", 5, chrono::Duration::days(1)).unwrap(), Some(titles));
        assert_eq!(store.cached_search("可乐 卡路里", 3, chrono::Duration::days(1)).unwrap(), None);
    }

    #[test]
    fn latest_lookup_per_food_wins() {
        let store = Store::open_in_memory().unwrap();
        let found = Lookup {
            food: CrawledFood {
                name: "牛奶".into(),
                calories: 150,
                portion: "250ml".into(),
                original_data: "300卡/500ml".into(),
                source: "https://zh.wikipedia.org/wiki/牛奶".into(),
                summary: "牛奶是乳制品。".into(),
            },
            page_title: "牛奶".into(),
            pattern: PatternKind::SpecificPortion,
        };
        store.record_lookup("牛奶", None).unwrap();
        store.record_lookup("牛奶", Some(&found)).unwrap();
        store.record_lookup("豆腐", Some(&found)).unwrap();
        store.record_lookup("豆腐", None).unwrap();

        let rows = store.resolved_lookups().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].food, "牛奶");
        assert_eq!(rows[0].pattern, Some(PatternKind::SpecificPortion));

        let stats = store.stats().unwrap();
        assert_eq!(stats.lookups, 4);
        assert_eq!(stats.foods_found, 1);
        assert_eq!(stats.foods_missing, 1);
    }
}

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension};
use sea_query::{ColumnDef, Expr, OnConflict, Query, SqliteQueryBuilder, Table};
use sea_query_rusqlite::RusqliteBinder;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{CacheMeta, KeyValueTable, QueryCacheTable, CACHE_VERSION};

use super::storage::KeyValueStore;

pub fn get_cache_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("issuedeck").join("cache.db"))
}

pub fn init_db(conn: &Connection) -> Result<()> {
    // Create version table
    let cache_meta_sql = Table::create()
        .table(CacheMeta::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(CacheMeta::Key)
                .text()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(CacheMeta::Value).integer())
        .build(SqliteQueryBuilder);
    conn.execute(&cache_meta_sql, [])?;

    // Check version
    let (version_sql, version_values) = Query::select()
        .column(CacheMeta::Value)
        .from(CacheMeta::Table)
        .and_where(Expr::col(CacheMeta::Key).eq("version"))
        .build_rusqlite(SqliteQueryBuilder);

    let current_version: Option<i32> = conn
        .query_row(&version_sql, &*version_values.as_params(), |row| row.get(0))
        .ok();

    if current_version != Some(CACHE_VERSION) {
        // Cached payloads may not match the current schema; tutorial progress is kept
        let drop_sql = Table::drop()
            .table(QueryCacheTable::Table)
            .if_exists()
            .build(SqliteQueryBuilder);
        let _ = conn.execute(&drop_sql, []);

        let (upsert_sql, upsert_values) = Query::insert()
            .into_table(CacheMeta::Table)
            .columns([CacheMeta::Key, CacheMeta::Value])
            .values_panic(["version".into(), CACHE_VERSION.into()])
            .on_conflict(
                OnConflict::column(CacheMeta::Key)
                    .update_column(CacheMeta::Value)
                    .to_owned(),
            )
            .build_rusqlite(SqliteQueryBuilder);
        conn.execute(&upsert_sql, &*upsert_values.as_params())?;
    }

    let query_cache_sql = Table::create()
        .table(QueryCacheTable::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(QueryCacheTable::Key)
                .text()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(QueryCacheTable::Payload).text().not_null())
        .col(
            ColumnDef::new(QueryCacheTable::FetchedAt)
                .big_integer()
                .not_null(),
        )
        .build(SqliteQueryBuilder);
    conn.execute(&query_cache_sql, [])?;

    let kv_sql = Table::create()
        .table(KeyValueTable::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(KeyValueTable::Key)
                .text()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(KeyValueTable::Value).text().not_null())
        .build(SqliteQueryBuilder);
    conn.execute(&kv_sql, [])?;

    Ok(())
}

fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    init_db(&conn)?;
    Ok(conn)
}

/// A cached query result and when it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CachedEntry<T> {
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.fetched_at) < max_age
    }
}

/// Time-stamped JSON snapshots of API responses, keyed by query.
#[derive(Debug, Clone)]
pub struct QueryCache {
    path: PathBuf,
}

impl QueryCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedEntry<T>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = open_db(&self.path)?;

        let (sql, values) = Query::select()
            .columns([QueryCacheTable::Payload, QueryCacheTable::FetchedAt])
            .from(QueryCacheTable::Table)
            .and_where(Expr::col(QueryCacheTable::Key).eq(key))
            .build_rusqlite(SqliteQueryBuilder);

        let row: Option<(String, i64)> = conn
            .query_row(&sql, &*values.as_params(), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        let Some((payload, fetched_at)) = row else {
            return Ok(None);
        };
        let fetched_at = DateTime::from_timestamp(fetched_at, 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid cache timestamp for {}", key))?;

        Ok(Some(CachedEntry {
            value: serde_json::from_str(&payload)?,
            fetched_at,
        }))
    }

    pub fn save<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = open_db(&self.path)?;
        let payload = serde_json::to_string(value)?;

        let (sql, values) = Query::insert()
            .into_table(QueryCacheTable::Table)
            .columns([
                QueryCacheTable::Key,
                QueryCacheTable::Payload,
                QueryCacheTable::FetchedAt,
            ])
            .values_panic([key.into(), payload.into(), fetched_at.timestamp().into()])
            .on_conflict(
                OnConflict::column(QueryCacheTable::Key)
                    .update_columns([QueryCacheTable::Payload, QueryCacheTable::FetchedAt])
                    .to_owned(),
            )
            .build_rusqlite(SqliteQueryBuilder);

        conn.execute(&sql, &*values.as_params())?;
        Ok(())
    }

    /// Drop every cached response. Tutorial progress is untouched.
    pub fn clear(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let conn = open_db(&self.path)?;
        let (sql, values) = Query::delete()
            .from_table(QueryCacheTable::Table)
            .build_rusqlite(SqliteQueryBuilder);
        Ok(conn.execute(&sql, &*values.as_params())?)
    }
}

/// Key-value store backed by the same SQLite file as the query cache.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = open_db(&self.path)?;

        let (sql, values) = Query::select()
            .column(KeyValueTable::Value)
            .from(KeyValueTable::Table)
            .and_where(Expr::col(KeyValueTable::Key).eq(key))
            .build_rusqlite(SqliteQueryBuilder);

        let value = conn
            .query_row(&sql, &*values.as_params(), |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = open_db(&self.path)?;

        let (sql, values) = Query::insert()
            .into_table(KeyValueTable::Table)
            .columns([KeyValueTable::Key, KeyValueTable::Value])
            .values_panic([key.into(), value.into()])
            .on_conflict(
                OnConflict::column(KeyValueTable::Key)
                    .update_column(KeyValueTable::Value)
                    .to_owned(),
            )
            .build_rusqlite(SqliteQueryBuilder);

        conn.execute(&sql, &*values.as_params())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let conn = open_db(&self.path)?;

        let (sql, values) = Query::delete()
            .from_table(KeyValueTable::Table)
            .and_where(Expr::col(KeyValueTable::Key).eq(key))
            .build_rusqlite(SqliteQueryBuilder);

        conn.execute(&sql, &*values.as_params())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_cache_round_trip_and_staleness() {
        let dir = tempfile::tempdir().unwrap();
        let cache = QueryCache::new(dir.path().join("cache.db"));
        assert!(cache.load::<Vec<u64>>("issues:all:newest").unwrap().is_none());

        let fetched_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        cache
            .save("issues:all:newest", &vec![3u64, 1, 2], fetched_at)
            .unwrap();

        let entry = cache.load::<Vec<u64>>("issues:all:newest").unwrap().unwrap();
        assert_eq!(entry.value, vec![3, 1, 2]);
        assert_eq!(entry.fetched_at, fetched_at);
        assert!(entry.is_fresh(Duration::minutes(5), fetched_at + Duration::minutes(4)));
        assert!(!entry.is_fresh(Duration::minutes(5), fetched_at + Duration::minutes(5)));
    }

    #[test]
    fn save_overwrites_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = QueryCache::new(dir.path().join("cache.db"));
        let t = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        cache.save("labels", &["bug"], t).unwrap();
        cache.save("labels", &["docs"], t).unwrap();
        let entry = cache.load::<Vec<String>>("labels").unwrap().unwrap();
        assert_eq!(entry.value, vec!["docs".to_string()]);
    }

    #[test]
    fn clear_keeps_key_value_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let cache = QueryCache::new(path.clone());
        let store = SqliteStore::new(path);
        let t = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        cache.save("labels", &["bug"], t).unwrap();
        cache.save("issue:7", &7u64, t).unwrap();
        store.set("tutorial-progress", "{}").unwrap();

        assert_eq!(cache.clear().unwrap(), 2);
        assert!(cache.load::<Vec<String>>("labels").unwrap().is_none());
        assert_eq!(store.get("tutorial-progress").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn sqlite_store_get_set_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("nested").join("cache.db"));
        assert_eq!(store.get("tutorial-state").unwrap(), None);
        store.set("tutorial-state", "{}").unwrap();
        store.set("tutorial-state", r#"{"current_step":1}"#).unwrap();
        assert_eq!(
            store.get("tutorial-state").unwrap().as_deref(),
            Some(r#"{"current_step":1}"#)
        );
        store.remove("tutorial-state").unwrap();
        assert_eq!(store.get("tutorial-state").unwrap(), None);
    }

    #[test]
    fn unreadable_rows_are_errors_not_misses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let store = SqliteStore::new(path.clone());
        let cache = QueryCache::new(path.clone());
        let t = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        store.set("tutorial-state", "{}").unwrap();
        cache.save("labels", &["bug"], t).unwrap();

        // Blobs don't decode as text
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "UPDATE key_value_table SET value = X'FF00' WHERE key = 'tutorial-state'",
            [],
        )
        .unwrap();
        conn.execute(
            "UPDATE query_cache_table SET payload = X'FF00' WHERE key = 'labels'",
            [],
        )
        .unwrap();

        assert!(store.get("tutorial-state").is_err());
        assert!(cache.load::<Vec<String>>("labels").is_err());
        assert_eq!(store.get("absent").unwrap(), None);
        assert!(cache.load::<Vec<String>>("absent").unwrap().is_none());
    }
}

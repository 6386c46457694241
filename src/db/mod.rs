use anyhow::Result;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;

const MIGRATIONS: [(i32, &str, &str); 2] = [
    (
        1,
        "Core tables (accounts, posts, sessions)",
        include_str!("migrations/001_initial.sql"),
    ),
    (
        2,
        "AI summary columns",
        include_str!("migrations/002_ai_summary.sql"),
    ),
];

/// Handle to the durable store.
///
/// Every pooled connection runs with `foreign_keys = ON`, so deleting an
/// account cascades to its posts and sessions.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_pool(path, 10)
    }

    pub fn open_with_pool(path: &str, pool_size: u32) -> Result<Self> {
        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;"));
        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        let conn = pool.get()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Ok(Self { pool })
    }

    /// Shared-cache in-memory database. Every connection opened under the
    /// same `name` sees the same data while the pool is alive.
    pub fn open_memory(name: &str) -> Result<Self> {
        let uri = format!("file:{}?mode=memory&cache=shared", name);
        let manager = SqliteConnectionManager::file(uri)
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys=ON;"));
        let pool = Pool::builder().max_size(4).build(manager)?;
        Ok(Self { pool })
    }

    pub fn get(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.get()?;
        run_migrations(&conn)?;
        Ok(())
    }

    /// Every known migration with the time it was applied, if it was.
    pub fn get_migration_status(&self) -> Result<Vec<(i32, &'static str, Option<String>)>> {
        let conn = self.get()?;
        ensure_migrations_table(&conn)?;

        let mut statuses = Vec::with_capacity(MIGRATIONS.len());
        for (version, description, _) in MIGRATIONS {
            let applied_at: Option<String> = conn
                .query_row(
                    "SELECT applied_at FROM schema_migrations WHERE version = ?",
                    [version],
                    |row| row.get(0),
                )
                .optional()?;
            statuses.push((version, description, applied_at));
        }
        Ok(statuses)
    }
}

fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )?;
    Ok(())
}

fn run_migrations(conn: &Connection) -> Result<()> {
    ensure_migrations_table(conn)?;

    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    for (version, description, sql) in MIGRATIONS {
        if version > current_version {
            tracing::info!("Running migration {} ({})", version, description);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                [version],
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_is_idempotent() {
        let db = Database::open_memory("db_migrate_twice").unwrap();
        db.migrate().unwrap();
        db.migrate().unwrap();

        let statuses = db.get_migration_status().unwrap();
        assert_eq!(statuses.len(), MIGRATIONS.len());
        assert!(statuses.iter().all(|(_, _, applied)| applied.is_some()));
    }

    #[test]
    fn test_status_before_migrate_is_pending() {
        let db = Database::open_memory("db_status_pending").unwrap();
        let statuses = db.get_migration_status().unwrap();
        assert!(statuses.iter().all(|(_, _, applied)| applied.is_none()));
    }

    #[test]
    fn test_status_reports_query_errors() {
        let db = Database::open_memory("db_status_broken").unwrap();
        db.get()
            .unwrap()
            .execute_batch(
                "CREATE TABLE schema_migrations (version INTEGER PRIMARY KEY, applied_at INTEGER NOT NULL);
                 INSERT INTO schema_migrations (version, applied_at) VALUES (1, 0);",
            )
            .unwrap();
        // applied_at is not text, so reading it as a String fails.
        assert!(db.get_migration_status().is_err());
    }

    #[test]
    fn test_foreign_keys_enabled_on_pooled_connections() {
        let db = Database::open_memory("db_fk_pragma").unwrap();
        let conn = db.get().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}

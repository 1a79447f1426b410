use crate::store::KvStore;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "rollbook.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    // Workspaces created before timestamps were tracked lack this column.
    ensure_kv_updated_at(&conn)?;

    Ok(conn)
}

fn ensure_kv_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "kv", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE kv ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Key/value store backed by the workspace database.
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            conn: open_db(workspace)?,
        })
    }
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let v = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |r| r.get(0))
            .optional()?;
        Ok(v)
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO kv(key, value, updated_at) VALUES(?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, &now),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn values_persist_across_reopen() {
        let ws = temp_dir("rollbook-db-reopen");
        {
            let mut kv = SqliteKv::open(&ws).expect("open");
            assert_eq!(kv.get("absensi_classes").unwrap(), None);
            kv.set("absensi_classes", "[]").unwrap();
            kv.set("absensi_classes", "[{\"id\":\"c\",\"name\":\"VII A\"}]")
                .unwrap();
        }
        let kv = SqliteKv::open(&ws).expect("reopen");
        assert_eq!(
            kv.get("absensi_classes").unwrap().as_deref(),
            Some("[{\"id\":\"c\",\"name\":\"VII A\"}]")
        );
    }

    #[test]
    fn legacy_table_gains_updated_at() {
        let ws = temp_dir("rollbook-db-migrate");
        {
            let conn = Connection::open(ws.join(DB_FILE)).unwrap();
            conn.execute(
                "CREATE TABLE kv(key TEXT PRIMARY KEY, value TEXT NOT NULL)",
                [],
            )
            .unwrap();
        }
        let conn = open_db(&ws).expect("open");
        assert!(table_has_column(&conn, "kv", "updated_at").unwrap());
    }
}

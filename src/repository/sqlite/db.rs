//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

/// Connection shared by every SQLite repository
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: SharedConnection,
    pub db_path: PathBuf,
}

impl DbState {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            db_path,
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Drop the connection; repositories then report "Database not initialized"
    pub async fn close(&self) {
        self.conn.lock().await.take();
    }
}

/// Open the database at `db_path` (`:memory:` for tests) and run migrations
pub async fn init_db(db_path: &Path) -> Result<DbState, String> {
    let conn = if db_path.as_os_str() == ":memory:" {
        Connection::open_in_memory()
    } else {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("Failed to create db dir: {}", e))?;
        }
        Connection::open(db_path)
    }
    .map_err(|e| format!("Failed to open db: {}", e))?;

    run_migrations(&conn)?;

    let state = DbState::new(db_path.to_path_buf());
    *state.conn.lock().await = Some(conn);
    log::info!("Database ready at {}", db_path.display());
    Ok(state)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(mut rows) = stmt.query([]) else {
        return false;
    };
    while let Ok(Some(row)) = rows.next() {
        if let Ok(name) = row.get::<_, String>(1) {
            if name == column {
                return true;
            }
        }
    }
    false
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> Result<(), String> {
    // Records are stored as JSON documents keyed by collection
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            body TEXT NOT NULL,
            created_at INTEGER,
            updated_at INTEGER,
            PRIMARY KEY (collection, id)
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    // Soft delete column, added after the first schema
    if !column_exists(conn, "records", "deleted_at") {
        conn.execute("ALTER TABLE records ADD COLUMN deleted_at INTEGER", [])
            .map_err(|e| format!("Failed to add deleted_at: {}", e))?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_records_position ON records(collection, position)",
        [],
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}

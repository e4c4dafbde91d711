//! `SQLite`-backed folder registry with async access.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tokio::sync::Mutex;

use super::error::StoreError;
use super::schema::apply_schema;
use super::types::Folder;
use crate::watcher::FolderId;

/// File name of the registry database inside the data directory.
pub const DATABASE_FILE: &str = "docbridge.db";

/// Returns the default data directory.
///
/// This is `~/.local/share/docbridge` on Unix systems.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docbridge")
}

/// Persistent registry of documentation folders.
///
/// Every query runs on the blocking pool behind a shared connection.
#[derive(Debug, Clone)]
pub struct FolderStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl FolderStore {
    /// Open the registry database at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        let path_clone = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn =
                Connection::open(&path_clone).map_err(|source| StoreError::DatabaseOpen {
                    path: path_clone,
                    source,
                })?;
            apply_schema(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        tracing::debug!(path = %path.display(), "Folder store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open the registry inside `data_dir` using [`DATABASE_FILE`].
    ///
    /// # Errors
    ///
    /// See [`FolderStore::open`].
    pub async fn open_in_dir(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open(data_dir.as_ref().join(DATABASE_FILE)).await
    }

    /// Open an in-memory registry for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or the schema cannot be applied.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection, StoreError> {
            let conn = Connection::open_in_memory()?;
            apply_schema(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Returns the path to the database, if opened from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert a new folder row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicatePath`] if `path` is already stored, or a
    /// query error.
    pub async fn create(
        &self,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Folder, StoreError> {
        let name = name.into();
        let path = path.into();
        let created_at = Utc::now().trunc_subsecs(6);
        let stamp = created_at.to_rfc3339_opts(SecondsFormat::Micros, true);

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Folder, StoreError> {
            let conn = conn.blocking_lock();
            let inserted = conn.execute(
                "INSERT INTO folders (name, path, created_at) VALUES (?1, ?2, ?3)",
                params![name, path, stamp],
            );

            match inserted {
                Ok(_) => Ok(Folder {
                    id: conn.last_insert_rowid(),
                    name,
                    path,
                    created_at,
                }),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::DuplicatePath(path))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    /// Look up a folder by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: FolderId) -> Result<Option<Folder>, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<Folder>, StoreError> {
            let conn = conn.blocking_lock();
            let folder = conn
                .query_row(
                    "SELECT id, name, path, created_at FROM folders WHERE id = ?1",
                    params![id],
                    folder_from_row,
                )
                .optional()?;
            Ok(folder)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    /// All folders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_all(&self) -> Result<Vec<Folder>, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Folder>, StoreError> {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT id, name, path, created_at FROM folders
                 ORDER BY created_at DESC, id DESC",
            )?;
            let folders = stmt
                .query_map([], folder_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(folders)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    /// Delete a folder row. Returns `false` if no row had this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn delete(&self, id: FolderId) -> Result<bool, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<bool, StoreError> {
            let conn = conn.blocking_lock();
            let affected = conn.execute("DELETE FROM folders WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    /// Whether a folder with exactly this path is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn exists_by_path(&self, path: impl Into<String>) -> Result<bool, StoreError> {
        let path = path.into();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<bool, StoreError> {
            let conn = conn.blocking_lock();
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM folders WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    /// Highest schema version recorded in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn schema_version(&self) -> Result<Option<u32>, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<u32>, StoreError> {
            let conn = conn.blocking_lock();
            let version = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })?;
            Ok(version)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    /// Number of stored folders.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<u64, StoreError> {
            let conn = conn.blocking_lock();
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM folders", [], |row| row.get(0))?;
            Ok(count.unsigned_abs())
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }
}

fn folder_from_row(row: &Row<'_>) -> rusqlite::Result<Folder> {
    let created_at: String = row.get(3)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Folder {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        created_at,
    })
}

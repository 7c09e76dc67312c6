//! SQLite catalog backend.

use super::{NewPhoto, PhotoId, PhotoRecord};
use crate::core::metadata::PhotoMetadata;
use crate::error::CatalogError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Current schema, stored in `PRAGMA user_version`
const SCHEMA_VERSION: i64 = 1;

const SELECT_COLUMNS: &str = "SELECT id, path, content_hash, width, height, file_size,
        created_at, modified_at, thumb_path, thumb_error, imported_at,
        date_taken, iso, f_number, exposure_time, make, model, lat, lon, orientation
     FROM photos";

/// SQLite-backed photo catalog
///
/// Uses WAL (Write-Ahead Logging) so readers on other connections are never
/// blocked by an import and always see a committed state.
pub struct PhotoCatalog {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl PhotoCatalog {
    /// Open or create a catalog at the given path
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let open_failed = |reason: String| CatalogError::OpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| open_failed(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| open_failed(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref code, _)
                    if code.code == rusqlite::ErrorCode::NotADatabase =>
                {
                    CatalogError::Corrupted {
                        path: path.to_path_buf(),
                    }
                }
                other => open_failed(other.to_string()),
            })?;

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|e| open_failed(e.to_string()))?;

        if version > SCHEMA_VERSION {
            return Err(open_failed(format!(
                "schema version {} is newer than supported version {}",
                version, SCHEMA_VERSION
            )));
        }
        if version < SCHEMA_VERSION {
            Self::migrate(&conn).map_err(|e| open_failed(e.to_string()))?;
        }

        tracing::debug!("catalog opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(&format!(
            "BEGIN;
             CREATE TABLE IF NOT EXISTS photos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL UNIQUE,
                content_hash TEXT NOT NULL UNIQUE,
                width INTEGER NOT NULL,
                height INTEGER NOT NULL,
                file_size INTEGER NOT NULL,
                created_at INTEGER,
                modified_at INTEGER,
                thumb_path TEXT,
                thumb_error TEXT,
                imported_at INTEGER NOT NULL,
                date_taken TEXT,
                iso INTEGER,
                f_number REAL,
                exposure_time TEXT,
                make TEXT,
                model TEXT,
                lat REAL,
                lon REAL,
                orientation INTEGER
             );
             CREATE INDEX IF NOT EXISTS idx_photos_date_taken ON photos(date_taken);
             PRAGMA user_version = {};
             COMMIT;",
            SCHEMA_VERSION
        ))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn.lock().map_err(|_| CatalogError::Corrupted {
            path: self.db_path.clone(),
        })
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<PhotoRecord> {
        let hash: String = row.get(2)?;
        let content_hash = hash.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(PhotoRecord {
            id: PhotoId(row.get(0)?),
            path: row.get(1)?,
            content_hash,
            width: row.get::<_, i64>(3)? as u32,
            height: row.get::<_, i64>(4)? as u32,
            file_size: row.get::<_, i64>(5)? as u64,
            created_at: row.get(6)?,
            modified_at: row.get(7)?,
            thumb_path: row.get(8)?,
            thumb_error: row.get(9)?,
            imported_at: row.get(10)?,
            metadata: PhotoMetadata {
                date_taken: row.get(11)?,
                iso: row.get::<_, Option<i64>>(12)?.map(|v| v as u32),
                f_number: row.get(13)?,
                exposure_time: row.get(14)?,
                make: row.get(15)?,
                model: row.get(16)?,
                lat: row.get(17)?,
                lon: row.get(18)?,
                orientation: row.get::<_, Option<i64>>(19)?.map(|v| v as u16),
            },
        })
    }

    /// Insert one photo as a single atomic statement
    pub fn insert(&self, photo: &NewPhoto) -> Result<PhotoId, CatalogError> {
        let conn = self.lock()?;
        let meta = &photo.metadata;

        conn.execute(
            "INSERT INTO photos
             (path, content_hash, width, height, file_size, created_at, modified_at,
              thumb_path, thumb_error, imported_at, date_taken, iso, f_number,
              exposure_time, make, model, lat, lon, orientation)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                photo.path,
                photo.content_hash.to_hex(),
                photo.width as i64,
                photo.height as i64,
                photo.file_size as i64,
                photo.created_at,
                photo.modified_at,
                photo.thumb_path,
                photo.thumb_error,
                chrono::Utc::now().timestamp(),
                meta.date_taken,
                meta.iso.map(|v| v as i64),
                meta.f_number,
                meta.exposure_time,
                meta.make,
                meta.model,
                meta.lat,
                meta.lon,
                meta.orientation.map(|v| v as i64),
            ],
        )?;

        Ok(PhotoId(conn.last_insert_rowid()))
    }

    /// Look up a photo by content hash
    pub fn query_by_hash(
        &self,
        hash: &crate::core::fingerprint::ContentHash,
    ) -> Result<Option<PhotoRecord>, CatalogError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE content_hash = ?"),
                [hash.to_hex()],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Look up a photo by its original path
    pub fn query_by_path(&self, path: &str) -> Result<Option<PhotoRecord>, CatalogError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE path = ?"),
                [path],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    pub fn get(&self, id: PhotoId) -> Result<Option<PhotoRecord>, CatalogError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?"),
                [id.0],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Every photo, oldest import first
    pub fn list_all(&self) -> Result<Vec<PhotoRecord>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> Result<usize, CatalogError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Delete rows in one transaction, returning the records that existed.
    /// Unknown ids are ignored.
    pub fn delete(&self, ids: &[PhotoId]) -> Result<Vec<PhotoRecord>, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut deleted = Vec::with_capacity(ids.len());

        {
            let mut select = tx.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?"))?;
            let mut remove = tx.prepare("DELETE FROM photos WHERE id = ?")?;
            for id in ids {
                if let Some(record) = select.query_row([id.0], Self::row_to_record).optional()? {
                    remove.execute([id.0])?;
                    deleted.push(record);
                }
            }
        }

        tx.commit()?;
        Ok(deleted)
    }

    /// Point a row at a (re)generated thumbnail, clearing any recorded error
    pub fn update_thumbnail_path(&self, id: PhotoId, thumb_path: &str) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE photos SET thumb_path = ?, thumb_error = NULL WHERE id = ?",
            params![thumb_path, id.0],
        )?;
        if changed == 0 {
            return Err(CatalogError::NotFound { id: id.0 });
        }
        Ok(())
    }

    /// Record why a thumbnail could not be produced
    pub fn update_thumbnail_error(&self, id: PhotoId, reason: &str) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE photos SET thumb_path = NULL, thumb_error = ? WHERE id = ?",
            params![reason, id.0],
        )?;
        if changed == 0 {
            return Err(CatalogError::NotFound { id: id.0 });
        }
        Ok(())
    }

    /// Forget every thumbnail, e.g. after the thumbnail directory was wiped
    pub fn clear_thumbnail_paths(&self) -> Result<usize, CatalogError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE photos SET thumb_path = NULL WHERE thumb_path IS NOT NULL",
            [],
        )?;
        Ok(changed)
    }

    /// Cataloged RAW files next to `record` sharing its file stem
    pub fn find_raw_companions(&self, record: &PhotoRecord) -> Result<Vec<PhotoRecord>, CatalogError> {
        let Some(stem) = record.path().file_stem().and_then(|s| s.to_str()) else {
            return Ok(Vec::new());
        };
        let prefix = match record.path().parent().and_then(|p| p.to_str()) {
            Some(parent) => Path::new(parent).join(format!("{stem}.")),
            None => PathBuf::from(format!("{stem}.")),
        };
        let pattern = format!("{}%", escape_like(&prefix.to_string_lossy()));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE path LIKE ? ESCAPE '\\' ORDER BY id"
        ))?;
        let candidates = stmt
            .query_map([pattern], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(candidates
            .into_iter()
            .filter(|candidate| record.is_raw_companion(candidate))
            .collect())
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

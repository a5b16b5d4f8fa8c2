use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::data::{CandidateRecord, ImportResult, StoredResolution};
use crate::error::Result;
use crate::images::candidates::{CandidateSet, ImageCandidate};
use crate::images::resolver::ResolvedImage;

/// The Library manages the SQLite catalog database.
/// It stores discovered image candidates and previously resolved lookups.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open (or create) the catalog at `db_path` and initialize the schema.
    pub fn open(db_path: &Path) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        info!(path = %db_path.display(), "catalog opened");

        let library = Library {
            conn,
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// A throwaway catalog that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&self) -> Result<()> {
        // Discovered image files, in discovery order
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS candidates (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                path            TEXT NOT NULL UNIQUE,
                file_name       TEXT NOT NULL,
                source          TEXT NOT NULL,
                discovered_at   INTEGER NOT NULL,
                file_status     TEXT NOT NULL DEFAULT 'exists'
            )",
            [],
        )?;

        // Past lookups; an absent brand is stored as ''
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS resolutions (
                display_name    TEXT NOT NULL,
                brand_name      TEXT NOT NULL DEFAULT '',
                path            TEXT NOT NULL,
                found           INTEGER NOT NULL,
                resolved_at     INTEGER NOT NULL,
                PRIMARY KEY (display_name, brand_name)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_candidates_file_status
             ON candidates(file_status)",
            [],
        )?;

        debug!("catalog schema initialized");
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Get a count of live candidates in the catalog
    pub fn candidate_count(&self) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM candidates WHERE file_status = 'exists'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get a count of stored resolutions
    pub fn resolution_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM resolutions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Import every candidate of `set`, skipping paths already in the catalog.
    pub fn import_candidates(&mut self, set: &CandidateSet, source: &str) -> Result<ImportResult> {
        let mut result = ImportResult::default();
        let now = Utc::now().timestamp();

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO candidates (path, file_name, source, discovered_at) VALUES (?1, ?2, ?3, ?4)",
            )?;

            for candidate in set {
                match stmt.execute(params![candidate.path, candidate.file_name, source, now]) {
                    Ok(_) => result.imported_count += 1,
                    // UNIQUE constraint violation means we already know this path
                    Err(rusqlite::Error::SqliteFailure(err, _))
                        if err.code == ErrorCode::ConstraintViolation =>
                    {
                        result.skipped_count += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        // New files can turn a stored miss into a hit, so past lookups are stale
        if result.imported_count > 0 {
            let invalidated = tx.execute("DELETE FROM resolutions", [])?;
            debug!(invalidated, "stored resolutions invalidated by import");
        }
        tx.commit()?;

        info!(
            source,
            imported = result.imported_count,
            skipped = result.skipped_count,
            "candidates imported"
        );
        Ok(result)
    }

    /// All candidate rows, oldest first
    pub fn candidates(&self) -> Result<Vec<CandidateRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_name, path, source, discovered_at, file_status
             FROM candidates ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CandidateRecord {
                id: row.get(0)?,
                file_name: row.get(1)?,
                path: row.get(2)?,
                source: row.get(3)?,
                discovered_at: row.get(4)?,
                file_status: row.get(5)?,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Rebuild the candidate set in discovery order, leaving out deleted files.
    pub fn load_candidates(&self) -> Result<CandidateSet> {
        let candidates = self
            .candidates()?
            .into_iter()
            .filter(|record| record.file_status == "exists")
            .filter_map(|record| ImageCandidate::new(record.file_name, record.path));

        Ok(CandidateSet::from_candidates(candidates))
    }

    /// Store (or replace) the resolution for a lookup
    pub fn save_resolution(
        &self,
        display_name: &str,
        brand_name: Option<&str>,
        resolved: &ResolvedImage,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO resolutions (display_name, brand_name, path, found, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                display_name,
                brand_name.unwrap_or(""),
                resolved.path,
                resolved.found,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }

    /// Look up a stored resolution
    pub fn lookup_resolution(
        &self,
        display_name: &str,
        brand_name: Option<&str>,
    ) -> Result<Option<StoredResolution>> {
        let stored = self
            .conn
            .query_row(
                "SELECT display_name, brand_name, path, found, resolved_at
                 FROM resolutions WHERE display_name = ?1 AND brand_name = ?2",
                params![display_name, brand_name.unwrap_or("")],
                |row| {
                    Ok(StoredResolution {
                        display_name: row.get(0)?,
                        brand_name: row.get(1)?,
                        path: row.get(2)?,
                        found: row.get(3)?,
                        resolved_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(stored)
    }

    /// Forget every stored resolution. Returns how many were removed.
    pub fn clear_resolutions(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM resolutions", [])?;
        info!(removed, "resolutions cleared");
        Ok(removed)
    }

    /// Verify that scanned files still exist under `root`
    /// Mark as 'deleted' if the file is missing
    ///
    /// Only candidates whose path starts with `prefix` are checked; the
    /// prefix is stripped before joining onto `root`. URLs are never checked.
    pub fn verify_files(&self, root: &Path, prefix: &str) -> Result<usize> {
        let prefix = prefix.trim_matches('/');
        let existing: Vec<(i64, String)> = self
            .candidates()?
            .into_iter()
            .filter(|record| record.file_status == "exists")
            .map(|record| (record.id, record.path))
            .collect();

        let mut deleted_count = 0;
        for (id, path) in existing {
            if path.contains("://") {
                continue;
            }

            let relative = if prefix.is_empty() {
                path.as_str()
            } else {
                match path.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('/')) {
                    Some(rest) => rest,
                    None => continue,
                }
            };

            if !root.join(relative).is_file() {
                self.conn.execute(
                    "UPDATE candidates SET file_status = 'deleted' WHERE id = ?1",
                    params![id],
                )?;
                deleted_count += 1;
            }
        }

        if deleted_count > 0 {
            warn!(deleted_count, "marked missing image files as deleted");
            // Stored lookups may point at a file that is gone
            self.conn.execute("DELETE FROM resolutions", [])?;
        }
        Ok(deleted_count)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::resolver::ImageResolver;
    use std::fs;

    #[test]
    fn test_import_skips_duplicates() {
        let mut library = Library::open_in_memory().unwrap();
        let set = CandidateSet::from_file_names(["Black tom ford.avif", "gucci black.avif"]);

        let first = library.import_candidates(&set, "directory").unwrap();
        assert_eq!(first, ImportResult { imported_count: 2, skipped_count: 0 });

        let again = CandidateSet::from_file_names(["gucci black.avif", "Sauvage.jpg"]);
        let second = library.import_candidates(&again, "listing").unwrap();
        assert_eq!(second, ImportResult { imported_count: 1, skipped_count: 1 });

        assert_eq!(library.candidate_count().unwrap(), 3);
    }

    #[test]
    fn test_load_candidates_keeps_discovery_order() {
        let mut library = Library::open_in_memory().unwrap();
        library
            .import_candidates(&CandidateSet::from_file_names(["z.png", "a.png"]), "directory")
            .unwrap();
        library
            .import_candidates(&CandidateSet::from_file_names(["m.png"]), "probe")
            .unwrap();

        let set = library.load_candidates().unwrap();
        let names: Vec<_> = set.iter().map(|c| c.file_name.as_str()).collect();
        assert_eq!(names, vec!["z.png", "a.png", "m.png"]);

        let records = library.candidates().unwrap();
        assert_eq!(records[2].source, "probe");
    }

    #[test]
    fn test_resolutions_round_trip() {
        let library = Library::open_in_memory().unwrap();
        let resolver = ImageResolver::default();
        let set = CandidateSet::from_file_names(["Black tom ford.avif", "gucci black.avif"]);

        let gucci = resolver.resolve("Black", Some("Gucci"), &set);
        library.save_resolution("Black", Some("Gucci"), &gucci).unwrap();
        let missing = resolver.resolve("Sauvage", None, &set);
        library.save_resolution("Sauvage", None, &missing).unwrap();

        let stored = library.lookup_resolution("Black", Some("Gucci")).unwrap().unwrap();
        assert_eq!(stored.path, "gucci black.avif");
        assert!(stored.found);

        let stored = library.lookup_resolution("Sauvage", None).unwrap().unwrap();
        assert!(!stored.found);
        assert_eq!(stored.brand_name, "");

        assert!(library.lookup_resolution("Black", None).unwrap().is_none());
        assert_eq!(library.resolution_count().unwrap(), 2);

        assert_eq!(library.clear_resolutions().unwrap(), 2);
        assert!(library.lookup_resolution("Black", Some("Gucci")).unwrap().is_none());
    }

    #[test]
    fn test_verify_marks_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("kept.png"), b"").unwrap();

        let mut library = Library::open_in_memory().unwrap();
        let set = CandidateSet::from_candidates([
            ImageCandidate::new("kept.png", "photos/kept.png").unwrap(),
            ImageCandidate::new("gone.png", "photos/gone.png").unwrap(),
            ImageCandidate::new("remote.png", "https://cdn.example.com/remote.png").unwrap(),
        ]);
        library.import_candidates(&set, "directory").unwrap();

        assert_eq!(library.verify_files(dir.path(), "photos").unwrap(), 1);
        assert_eq!(library.candidate_count().unwrap(), 2);

        let paths: Vec<_> = library
            .load_candidates()
            .unwrap()
            .iter()
            .map(|c| c.path.clone())
            .collect();
        assert_eq!(paths, vec!["photos/kept.png", "https://cdn.example.com/remote.png"]);
    }

    #[test]
    fn test_import_invalidates_stored_resolutions() {
        let mut library = Library::open_in_memory().unwrap();
        let resolver = ImageResolver::default();

        let miss = resolver.resolve("Sauvage", None, &CandidateSet::empty());
        library.save_resolution("Sauvage", None, &miss).unwrap();
        assert!(library.lookup_resolution("Sauvage", None).unwrap().is_some());

        library
            .import_candidates(&CandidateSet::from_file_names(["Sauvage.jpg"]), "directory")
            .unwrap();
        assert!(library.lookup_resolution("Sauvage", None).unwrap().is_none());

        let hit = resolver.resolve("Sauvage", None, &library.load_candidates().unwrap());
        assert!(hit.found);
        library.save_resolution("Sauvage", None, &hit).unwrap();

        // Re-importing only known paths adds nothing and keeps the lookup
        let again = library
            .import_candidates(&CandidateSet::from_file_names(["Sauvage.jpg"]), "directory")
            .unwrap();
        assert_eq!(again.imported_count, 0);
        assert_eq!(
            library.lookup_resolution("Sauvage", None).unwrap().map(|r| r.path),
            Some("Sauvage.jpg".to_string())
        );
    }

    #[test]
    fn test_verify_invalidates_stored_resolutions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("kept.png"), b"").unwrap();

        let mut library = Library::open_in_memory().unwrap();
        let set = CandidateSet::from_candidates([
            ImageCandidate::new("kept.png", "photos/kept.png").unwrap(),
            ImageCandidate::new("gone.png", "photos/gone.png").unwrap(),
        ]);
        library.import_candidates(&set, "directory").unwrap();

        let resolver = ImageResolver::default();
        let gone = resolver.resolve("gone", None, &library.load_candidates().unwrap());
        library.save_resolution("gone", None, &gone).unwrap();

        // Nothing missing: stored lookups survive
        fs::write(dir.path().join("gone.png"), b"").unwrap();
        assert_eq!(library.verify_files(dir.path(), "photos").unwrap(), 0);
        assert_eq!(library.resolution_count().unwrap(), 1);

        fs::remove_file(dir.path().join("gone.png")).unwrap();
        assert_eq!(library.verify_files(dir.path(), "photos").unwrap(), 1);
        assert!(library.lookup_resolution("gone", None).unwrap().is_none());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("catalog.db");

        {
            let mut library = Library::open(&path).unwrap();
            library
                .import_candidates(&CandidateSet::from_file_names(["Dior.svg"]), "probe")
                .unwrap();
        }

        let library = Library::open(&path).unwrap();
        assert_eq!(library.path(), path.as_path());
        assert_eq!(library.candidate_count().unwrap(), 1);
    }
}

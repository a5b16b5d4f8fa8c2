use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::CandidateSource;
use crate::error::{Error, Result};
use crate::images::candidates::{image_extension, CandidateSet, ImageCandidate};

/// Scans an image folder recursively.
///
/// Candidate paths are `<prefix>/<path relative to root>` with forward
/// slashes, so a file at `<root>/brands/Dior.png` with prefix `photos`
/// becomes `photos/brands/Dior.png`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    prefix: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn storage_path(&self, relative: &Path) -> String {
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if self.prefix.is_empty() {
            relative
        } else {
            format!("{}/{}", self.prefix, relative)
        }
    }
}

impl CandidateSource for DirectorySource {
    fn label(&self) -> &str {
        "directory"
    }

    fn load(&self) -> Result<CandidateSet> {
        if !self.root.is_dir() {
            return Err(Error::MissingFolder(self.root.clone()));
        }

        info!(root = %self.root.display(), "scanning image folder");

        let mut candidates = Vec::new();
        let mut skipped = 0usize;

        // Sorted by file name so enumeration order (and so tie-breaking) is stable
        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                // The root itself could not be read: nothing below it can be
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            // Only process files (not directories)
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            if image_extension(&file_name).is_none() {
                skipped += 1;
                continue;
            }

            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            if let Some(candidate) = ImageCandidate::new(file_name, self.storage_path(relative)) {
                candidates.push(candidate);
            }
        }

        debug!(found = candidates.len(), skipped, "folder scan finished");
        Ok(CandidateSet::from_candidates(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_collects_images_in_stable_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gucci black.avif"), b"").unwrap();
        fs::write(dir.path().join("Black tom ford.avif"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("brands")).unwrap();
        fs::write(dir.path().join("brands").join("Dior.PNG"), b"").unwrap();

        let source = DirectorySource::new(dir.path(), "photos/");
        let set = source.load().unwrap();

        let paths: Vec<_> = set.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["photos/Black tom ford.avif", "photos/brands/Dior.PNG", "photos/gucci black.avif"]
        );
    }

    #[test]
    fn test_empty_prefix_keeps_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Sauvage.jpg"), b"").unwrap();

        let set = DirectorySource::new(dir.path(), "").load().unwrap();
        assert_eq!(set.get(0).map(|c| c.path.as_str()), Some("Sauvage.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_link_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Sauvage.jpg"), b"").unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing.png"), dir.path().join("Dangling.png")).unwrap();

        let set = DirectorySource::new(dir.path(), "").load().unwrap();
        let names: Vec<_> = set.iter().map(|c| c.file_name.as_str()).collect();
        assert_eq!(names, vec!["Sauvage.jpg"]);
    }

    #[test]
    fn test_walk_error_converts() {
        let dir = tempfile::tempdir().unwrap();
        let walk_error = WalkDir::new(dir.path().join("nope"))
            .into_iter()
            .find_map(|entry| entry.err())
            .unwrap();

        let error: Error = walk_error.into();
        assert!(matches!(error, Error::Walk(_)));
        assert!(error.to_string().starts_with("Failed to walk image folder"));
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path().join("nope"), "photos");

        assert!(matches!(source.load(), Err(Error::MissingFolder(_))));
        assert!(CandidateSet::load_or_empty(&source).is_empty());
    }
}

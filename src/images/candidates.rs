//! The candidate set: every image file the resolver is allowed to pick.
//!
//! A set is built once (from a directory scan, an API listing, a probe run or
//! the catalog database) and is read-only afterwards.

use std::collections::HashSet;
use std::path::Path;

use super::normalize::NameKeys;

/// Image extensions accepted into a candidate set (compared lowercase).
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "svg", "webp", "avif", "gif"];

/// Lowercased extension of a file name, if it is on the whitelist.
pub fn image_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()?
        .to_string_lossy()
        .to_lowercase();

    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// File name without its extension.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    }
}

/// A single image file that can be matched against a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// Filename only (e.g., "Black tom ford.avif")
    pub file_name: String,
    /// Storage path handed back to callers (e.g., "photos/Black tom ford.avif")
    pub path: String,
    pub(crate) keys: NameKeys,
    pub(crate) folded: NameKeys,
}

impl ImageCandidate {
    /// Build a candidate, or `None` if the extension is not an image type.
    pub fn new(file_name: impl Into<String>, path: impl Into<String>) -> Option<Self> {
        let file_name = file_name.into();
        image_extension(&file_name)?;

        let stem = file_stem(&file_name);
        let keys = NameKeys::new(stem);
        let folded = NameKeys::folded(stem);

        Some(Self {
            path: path.into(),
            keys,
            folded,
            file_name,
        })
    }

    /// Candidate whose storage path is its own file name.
    pub fn from_file_name(file_name: impl Into<String>) -> Option<Self> {
        let file_name = file_name.into();
        let path = file_name.clone();
        Self::new(file_name, path)
    }

    /// Normalized stem (lowercase, alphanumerics and single spaces).
    pub fn normalized_name(&self) -> &str {
        &self.keys.normalized
    }
}

/// Ordered, immutable collection of candidates.
///
/// Iteration order is insertion order and decides ties in the resolver.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    candidates: Vec<ImageCandidate>,
    /// Some stem changes when accents are folded away
    has_accents: bool,
}

impl CandidateSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from candidates, dropping repeated storage paths (first one wins).
    pub fn from_candidates(candidates: impl IntoIterator<Item = ImageCandidate>) -> Self {
        let mut seen = HashSet::new();
        let candidates = candidates
            .into_iter()
            .filter(|candidate| seen.insert(candidate.path.clone()))
            .collect::<Vec<_>>();
        let has_accents = candidates.iter().any(|c| c.folded != c.keys);

        Self {
            candidates,
            has_accents,
        }
    }

    /// Build a set from bare file names; each file name is also its path.
    /// Names without an image extension are skipped.
    pub fn from_file_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_candidates(names.into_iter().filter_map(|name| ImageCandidate::from_file_name(name)))
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageCandidate> {
        self.candidates.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ImageCandidate> {
        self.candidates.get(index)
    }

    /// Whether folding diacritics changes any candidate's keys.
    pub(crate) fn has_accents(&self) -> bool {
        self.has_accents
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a ImageCandidate;
    type IntoIter = std::slice::Iter<'a, ImageCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<ImageCandidate> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = ImageCandidate>>(iter: T) -> Self {
        Self::from_candidates(iter)
    }
}

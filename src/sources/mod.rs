//! Candidate sources: the ways a candidate set gets discovered.
//!
//! Discovery is kept apart from matching. Each source produces a
//! [`CandidateSet`]; the resolver does not know or care which one did.

pub mod directory;
pub mod index_html;
pub mod listing;
pub mod probe;

use tracing::{info, warn};

use crate::error::Result;
use crate::images::candidates::CandidateSet;

pub use directory::DirectorySource;
pub use index_html::IndexHtmlSource;
pub use listing::ListingSource;
pub use probe::{FsProbe, Probe, ProbeSource};

/// A synchronous provider of candidate images.
pub trait CandidateSource {
    /// Short name used in logs and in the catalog's `source` column.
    fn label(&self) -> &str;

    fn load(&self) -> Result<CandidateSet>;
}

impl CandidateSet {
    /// Load from `source`, treating any failure as an empty set.
    ///
    /// The failure is logged; lookups against the empty set simply fall
    /// back to the placeholder.
    pub fn load_or_empty(source: &dyn CandidateSource) -> CandidateSet {
        match source.load() {
            Ok(set) => {
                info!(source = source.label(), count = set.len(), "loaded candidate images");
                set
            }
            Err(e) => {
                warn!(source = source.label(), error = %e, "candidate source unavailable, using empty set");
                CandidateSet::empty()
            }
        }
    }
}

/// Last `/`-separated segment of a path or URL, percent-decoded.
/// Query strings and fragments are dropped first.
pub(crate) fn file_name_of(reference: &str) -> Option<String> {
    let without_suffix = match reference.find(&['?', '#'][..]) {
        Some(index) => &reference[..index],
        None => reference,
    };

    let last = without_suffix.trim_end_matches('/').rsplit('/').next()?;
    if last.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(last)
        .map(|name| name.into_owned())
        .unwrap_or_else(|_| last.to_string());
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct Broken;

    impl CandidateSource for Broken {
        fn label(&self) -> &str {
            "broken"
        }

        fn load(&self) -> Result<CandidateSet> {
            Err(Error::Source {
                source_label: "broken".to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    #[test]
    fn test_failed_source_becomes_empty_set() {
        let set = CandidateSet::load_or_empty(&Broken);
        assert!(set.is_empty());
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of("https://cdn.x.com/logos/Tom%20Ford.png?v=3").as_deref(), Some("Tom Ford.png"));
        assert_eq!(file_name_of("photos/Sauvage.jpg").as_deref(), Some("Sauvage.jpg"));
        assert_eq!(file_name_of("Sauvage.jpg").as_deref(), Some("Sauvage.jpg"));
        assert_eq!(file_name_of("").as_deref(), None);
    }
}

//! Perfume catalog image lookup.
//!
//! Maps perfume and brand names to photo files with a fixed ladder of
//! matching strategies and a placeholder fallback, and turns stored image
//! references into URLs that are safe to fetch.
//!
//! ```no_run
//! use perfume_images::{CandidateSet, ImageResolver};
//!
//! let candidates = CandidateSet::from_file_names(["Black tom ford.avif", "gucci black.avif"]);
//! let resolved = ImageResolver::default().resolve("Black", Some("Gucci"), &candidates);
//! assert_eq!(resolved.path, "gucci black.avif");
//! ```

pub mod config;
pub mod error;
pub mod images;
pub mod sources;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use images::cache::ResolutionCache;
pub use images::candidates::{CandidateSet, ImageCandidate};
pub use images::resolver::{CatalogItem, ImageResolver, MatchInfo, MatchTier, Pass, ResolvedImage, PLACEHOLDER_PATH};
pub use images::url::{normalize_url, UrlNormalizer};
pub use sources::CandidateSource;
pub use state::library::Library;

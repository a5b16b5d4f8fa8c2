/// Image lookup module
///
/// This module handles:
/// - Normalizing perfume and brand names for comparison
/// - Holding the candidate set of known image files
/// - Resolving a name to the best file, with placeholder fallback
/// - Caching resolutions for the caller
/// - Normalizing stored image references into fetchable URLs

pub mod cache;
pub mod candidates;
pub mod normalize;
pub mod resolver;
pub mod url;

//! Name -> image resolution.
//!
//! The resolver walks a fixed ladder of matching tiers and returns the first
//! hit, falling back to a placeholder. It never fails and never touches the
//! filesystem: the candidate set is handed in already loaded.

use serde::{Deserialize, Serialize};

use super::candidates::{CandidateSet, ImageCandidate};
use super::normalize::{first_token, fold_diacritics, normalize_name, strip_stopwords, NameKeys};

/// Image shown when nothing matches.
pub const PLACEHOLDER_PATH: &str = "photos/placeholder.svg";

/// First tokens this short are too generic for the first-token tier.
const MIN_FIRST_TOKEN_CHARS: usize = 4;

/// Brand tokens this short only count as whole words in a filename.
const MIN_BRAND_SUBSTRING_CHARS: usize = 4;

/// The identity used to look up an image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogItem {
    /// Perfume or brand name as shown in the catalog
    pub display_name: String,
    /// Brand, used to disambiguate names shared across houses
    #[serde(default)]
    pub brand_name: Option<String>,
}

impl CatalogItem {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            brand_name: None,
        }
    }

    pub fn with_brand(mut self, brand_name: impl Into<String>) -> Self {
        self.brand_name = Some(brand_name.into());
        self
    }
}

/// Matching strategy, in the order they are tried.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTier {
    Exact,
    Stopwords,
    Containment,
    FirstToken,
}

impl MatchTier {
    pub const ALL: [MatchTier; 4] = [
        MatchTier::Exact,
        MatchTier::Stopwords,
        MatchTier::Containment,
        MatchTier::FirstToken,
    ];

    fn matches(self, query: &NameKeys, candidate: &NameKeys) -> bool {
        if query.is_empty() || candidate.is_empty() {
            return false;
        }

        match self {
            MatchTier::Exact => query.normalized == candidate.normalized,
            MatchTier::Stopwords => {
                !query.without_stopwords.is_empty()
                    && query.without_stopwords == candidate.without_stopwords
            }
            MatchTier::Containment => {
                candidate.normalized.contains(&query.normalized)
                    || query.normalized.contains(&candidate.normalized)
            }
            MatchTier::FirstToken => first_token(&query.normalized)
                .filter(|token| token.chars().count() >= MIN_FIRST_TOKEN_CHARS)
                .is_some_and(|token| candidate.normalized.contains(token)),
        }
    }
}

/// Whether the names were compared as written or with accents folded away.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Plain,
    Folded,
}

/// How a resolved image was found.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchInfo {
    pub tier: MatchTier,
    pub pass: Pass,
    /// The candidate also carried a token of the requested brand
    pub brand_matched: bool,
}

/// Outcome of a lookup. `path` is never empty.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub path: String,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<MatchInfo>,
}

impl ResolvedImage {
    pub fn placeholder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            found: false,
            matched: None,
        }
    }

    fn hit(candidate: &ImageCandidate, info: MatchInfo) -> Self {
        Self {
            path: candidate.path.clone(),
            found: true,
            matched: Some(info),
        }
    }
}

/// Resolves display names against a candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolver {
    placeholder: String,
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new(PLACEHOLDER_PATH)
    }
}

impl ImageResolver {
    pub fn new(placeholder: impl Into<String>) -> Self {
        let placeholder = placeholder.into();
        let placeholder = if placeholder.trim().is_empty() {
            PLACEHOLDER_PATH.to_string()
        } else {
            placeholder
        };
        Self { placeholder }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn resolve_item(&self, item: &CatalogItem, candidates: &CandidateSet) -> ResolvedImage {
        self.resolve(&item.display_name, item.brand_name.as_deref(), candidates)
    }

    /// Find the image for `display_name`.
    ///
    /// Tiers run in order (exact, stopwords, containment, first token), first
    /// on the names as written and then with diacritics folded on both sides.
    /// Within a tier the first candidate in set order wins.
    ///
    /// The first tier (and pass) with any match decides. With a brand, the
    /// first candidate of that tier carrying a brand token wins; if none
    /// does, the tier's first match is returned. Later tiers are never
    /// consulted for the brand.
    pub fn resolve(
        &self,
        display_name: &str,
        brand_name: Option<&str>,
        candidates: &CandidateSet,
    ) -> ResolvedImage {
        let plain = NameKeys::new(display_name);
        let folded = NameKeys::folded(display_name);
        let brand = brand_name.map(brand_tokens).unwrap_or_default();

        for pass in [Pass::Plain, Pass::Folded] {
            // Folding changes nothing anywhere: the plain pass already said no
            if pass == Pass::Folded && folded == plain && !candidates.has_accents() {
                break;
            }

            let query = match pass {
                Pass::Plain => &plain,
                Pass::Folded => &folded,
            };

            for tier in MatchTier::ALL {
                let mut matches = candidates
                    .iter()
                    .filter(|candidate| tier.matches(query, keys_for(candidate, pass)));

                let Some(first) = matches.next() else {
                    continue;
                };

                if brand.is_empty() {
                    return ResolvedImage::hit(first, MatchInfo { tier, pass, brand_matched: false });
                }

                if carries_brand(first, &brand) {
                    return ResolvedImage::hit(first, MatchInfo { tier, pass, brand_matched: true });
                }

                if let Some(branded) = matches.find(|candidate| carries_brand(candidate, &brand)) {
                    return ResolvedImage::hit(branded, MatchInfo { tier, pass, brand_matched: true });
                }

                return ResolvedImage::hit(first, MatchInfo { tier, pass, brand_matched: false });
            }
        }

        ResolvedImage::placeholder(self.placeholder.as_str())
    }
}

fn keys_for(candidate: &ImageCandidate, pass: Pass) -> &NameKeys {
    match pass {
        Pass::Plain => &candidate.keys,
        Pass::Folded => &candidate.folded,
    }
}

/// Folded, normalized brand tokens with stopwords removed ("Tom Ford" -> ["tom", "ford"]).
fn brand_tokens(brand_name: &str) -> Vec<String> {
    strip_stopwords(&normalize_name(&fold_diacritics(brand_name)))
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn carries_brand(candidate: &ImageCandidate, brand: &[String]) -> bool {
    let name = &candidate.folded.normalized;
    brand.iter().any(|token| {
        name.split_whitespace().any(|word| word == token)
            || (token.chars().count() >= MIN_BRAND_SUBSTRING_CHARS && name.contains(token.as_str()))
    })
}

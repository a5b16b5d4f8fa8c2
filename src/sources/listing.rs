use serde::Deserialize;
use tracing::debug;

use super::{file_name_of, CandidateSource};
use crate::error::Result;
use crate::images::candidates::{CandidateSet, ImageCandidate};

/// One row of a catalog API response. Brand rows carry `logo_url`,
/// perfume rows carry `image_url`; anything else is ignored.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ListingRow {
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Responses are either a bare array or wrapped as `{ "data": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListingBody {
    Rows(Vec<ListingRow>),
    Wrapped { data: Vec<ListingRow> },
}

/// Candidates taken from a JSON listing returned by a trusted catalog endpoint.
///
/// The stored URL becomes the candidate path; the candidate's file name is
/// the decoded last path segment of that URL.
#[derive(Debug, Clone)]
pub struct ListingSource {
    body: String,
}

impl ListingSource {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    fn rows(&self) -> Result<Vec<ListingRow>> {
        let rows = match serde_json::from_str::<ListingBody>(&self.body)? {
            ListingBody::Rows(rows) => rows,
            ListingBody::Wrapped { data } => data,
        };
        Ok(rows)
    }
}

impl CandidateSource for ListingSource {
    fn label(&self) -> &str {
        "listing"
    }

    fn load(&self) -> Result<CandidateSet> {
        let rows = self.rows()?;
        let total = rows.len();

        let candidates: Vec<_> = rows
            .into_iter()
            .flat_map(|row| [row.logo_url, row.image_url])
            .flatten()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .filter_map(|url| {
                let file_name = file_name_of(&url)?;
                ImageCandidate::new(file_name, url)
            })
            .collect();

        debug!(rows = total, candidates = candidates.len(), "parsed image listing");
        Ok(CandidateSet::from_candidates(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_array_listing() {
        let body = r#"[
            {"id": 1, "name": "Tom Ford", "logo_url": "https://cdn.example.com/logos/Tom%20Ford.png"},
            {"id": 2, "name": "Black", "image_url": "photos/gucci black.avif?v=2"},
            {"id": 3, "name": "No image", "image_url": null},
            {"id": 4, "name": "Doc", "image_url": "docs/readme.pdf"}
        ]"#;

        let set = ListingSource::new(body).load().unwrap();
        let names: Vec<_> = set.iter().map(|c| (c.file_name.as_str(), c.path.as_str())).collect();
        assert_eq!(
            names,
            vec![
                ("Tom Ford.png", "https://cdn.example.com/logos/Tom%20Ford.png"),
                ("gucci black.avif", "photos/gucci black.avif?v=2"),
            ]
        );
    }

    #[test]
    fn test_wrapped_listing() {
        let body = r#"{"data": [{"logo_url": "Dior.svg", "image_url": "Sauvage.webp"}]}"#;

        let set = ListingSource::new(body).load().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).map(|c| c.path.as_str()), Some("Dior.svg"));
    }

    #[test]
    fn test_malformed_listing_is_an_error() {
        let source = ListingSource::new("<html>502 Bad Gateway</html>");
        assert!(matches!(source.load(), Err(Error::Json(_))));
        assert!(CandidateSet::load_or_empty(&source).is_empty());
    }
}

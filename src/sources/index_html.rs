use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{file_name_of, CandidateSource};
use crate::error::Result;
use crate::images::candidates::{CandidateSet, ImageCandidate};

/// Anchor `href` in double, single or no quotes.
static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*?href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("anchor pattern compiles")
});

/// Candidates scraped from a web server's auto-generated directory index.
///
/// Every anchor `href` is considered. Parent links, sort links (`?C=N;O=D`),
/// sub-directories and non-image files are skipped. Each remaining file is
/// emitted as `<base>/<file name>`.
#[derive(Debug, Clone)]
pub struct IndexHtmlSource {
    html: String,
    base: String,
}

impl IndexHtmlSource {
    pub fn new(html: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_path(path: &std::path::Path, base: impl Into<String>) -> Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?, base))
    }

    fn hrefs(&self) -> Vec<String> {
        ANCHOR_HREF
            .captures_iter(&self.html)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
            .map(|m| decode_entities(m.as_str()))
            .collect()
    }
}

impl CandidateSource for IndexHtmlSource {
    fn label(&self) -> &str {
        "index"
    }

    fn load(&self) -> Result<CandidateSet> {
        let hrefs = self.hrefs();
        let total = hrefs.len();

        let candidates: Vec<_> = hrefs
            .iter()
            .map(|href| href.trim())
            .filter(|href| !href.is_empty())
            .filter(|href| !href.starts_with('?') && !href.starts_with('#'))
            .filter(|href| !href.starts_with("..") && !href.ends_with('/'))
            .filter_map(file_name_of)
            .filter_map(|file_name| {
                let path = if self.base.is_empty() {
                    file_name.clone()
                } else {
                    format!("{}/{}", self.base, file_name)
                };
                ImageCandidate::new(file_name, path)
            })
            .collect();

        debug!(anchors = total, candidates = candidates.len(), "parsed directory index");
        Ok(CandidateSet::from_candidates(candidates))
    }
}

/// Undo the few HTML entities that show up in index hrefs.
fn decode_entities(href: &str) -> String {
    href.replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
}

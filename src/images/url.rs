//! Turns stored image references into URLs that are safe to fetch.
//!
//! Stored references come in every shape: absolute, protocol-relative,
//! plain `http`, repository-relative, bare filenames, backslash paths, and
//! half-encoded names like `Black%20tom ford.avif`. The output is always
//! one of: an untouched `data:` URI, an `https://` URL, or a relative path,
//! with each path segment percent-encoded exactly once.

use std::borrow::Cow;

use super::resolver::PLACEHOLDER_PATH;

/// Folder bare filenames are assumed to live in.
pub const IMAGE_DIR: &str = "photos";

/// Normalizes references with a given image folder and placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlNormalizer {
    image_dir: String,
    placeholder: String,
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        Self::new(IMAGE_DIR, PLACEHOLDER_PATH)
    }
}

impl UrlNormalizer {
    pub fn new(image_dir: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            image_dir: image_dir.into().trim_matches('/').to_string(),
            placeholder: placeholder.into(),
        }
    }

    /// Normalize one reference. Applying this twice gives the same result as once.
    pub fn normalize(&self, reference: Option<&str>) -> String {
        let reference = match reference.map(str::trim) {
            Some(r) if !r.is_empty() => r,
            _ => return encode_path(&self.placeholder),
        };

        if has_prefix_ignore_case(reference, "data:") {
            return reference.to_string();
        }

        let reference = reference.replace('\\', "/");

        if let Some(rest) = reference.strip_prefix("//") {
            return encode_absolute("https", rest);
        }

        if let Some((scheme, rest)) = split_scheme(&reference) {
            let scheme = if scheme.eq_ignore_ascii_case("http") {
                "https".to_string()
            } else {
                scheme.to_ascii_lowercase()
            };
            return encode_absolute(&scheme, rest);
        }

        if reference.contains('/') || self.image_dir.is_empty() {
            encode_path(&reference)
        } else {
            encode_path(&format!("{}/{}", self.image_dir, reference))
        }
    }
}

/// [`UrlNormalizer::normalize`] with the default folder and placeholder.
pub fn normalize_url(reference: Option<&str>) -> String {
    UrlNormalizer::default().normalize(reference)
}

fn has_prefix_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Split `scheme://rest` when the scheme is a valid URL scheme.
fn split_scheme(reference: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = reference.split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    valid.then_some((scheme, rest))
}

/// Rebuild `scheme://host/path?query#fragment`, encoding only the path.
fn encode_absolute(scheme: &str, rest: &str) -> String {
    let (before_suffix, suffix) = match rest.find(&['?', '#'][..]) {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };

    let (host, path) = match before_suffix.find('/') {
        Some(index) => before_suffix.split_at(index),
        None => (before_suffix, ""),
    };

    format!("{scheme}://{host}{}{suffix}", encode_path(path))
}

/// Encode every `/`-separated segment, keeping the slashes themselves.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode first so already-encoded segments are not encoded twice.
fn encode_segment(segment: &str) -> String {
    let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
    urlencoding::encode(&decoded).into_owned()
}

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::images::candidates::{CandidateSet, ImageCandidate, IMAGE_EXTENSIONS};

/// Default number of probes in flight at once.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Existence check for one storage path.
///
/// Implementations answer `false` for anything other than a definite "it
/// exists": timeouts, permission errors and the like all count as absent.
pub trait Probe: Send + Sync + 'static {
    fn exists(&self, path: &str) -> impl Future<Output = bool> + Send;
}

/// Probes files under a local folder.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Probe for FsProbe {
    async fn exists(&self, path: &str) -> bool {
        let full = self.root.join(path);
        match tokio::fs::metadata(&full).await {
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        }
    }
}

/// Brute-force discovery: try every `name x extension` pair.
///
/// Used when nothing can list the image folder. Probes run in fixed-size
/// groups; the probes within a group run concurrently and the next group
/// starts once the whole group has answered. Nothing is retried.
pub struct ProbeSource<P: Probe> {
    probe: Arc<P>,
    names: Vec<String>,
    extensions: Vec<String>,
    batch_size: usize,
    prefix: String,
}

impl<P: Probe> ProbeSource<P> {
    pub fn new(probe: P, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            probe: Arc::new(probe),
            names: names.into_iter().map(Into::into).collect(),
            extensions: IMAGE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            batch_size: DEFAULT_BATCH_SIZE,
            prefix: String::new(),
        }
    }

    /// Clamped to at least one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Prefix put in front of found file names to form candidate paths.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Every file name that will be probed, in probe order.
    pub fn file_names(&self) -> Vec<String> {
        self.names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .flat_map(|name| self.extensions.iter().map(move |ext| format!("{name}.{ext}")))
            .collect()
    }

    /// Run the probes and collect what exists. Never fails.
    pub async fn discover(&self) -> CandidateSet {
        let file_names = self.file_names();
        let total = file_names.len();
        info!(probes = total, batch_size = self.batch_size, "probing for images");

        let mut found: Vec<(usize, String)> = Vec::new();

        for (group_index, group) in file_names.chunks(self.batch_size).enumerate() {
            let mut set = JoinSet::new();

            for (offset, file_name) in group.iter().enumerate() {
                let index = group_index * self.batch_size + offset;
                let probe = Arc::clone(&self.probe);
                let file_name = file_name.clone();
                set.spawn(async move {
                    let exists = probe.exists(&file_name).await;
                    (index, file_name, exists)
                });
            }

            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((index, file_name, true)) => found.push((index, file_name)),
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "probe task failed, treating as absent"),
                }
            }
        }

        // Completion order is arbitrary; keep probe order
        found.sort_by_key(|(index, _)| *index);
        debug!(found = found.len(), probes = total, "probing finished");

        let candidates = found.into_iter().filter_map(|(_, file_name)| {
            let path = if self.prefix.is_empty() {
                file_name.clone()
            } else {
                format!("{}/{}", self.prefix, file_name)
            };
            ImageCandidate::new(file_name, path)
        });

        CandidateSet::from_candidates(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records how many probes overlap, answers from a fixed list.
    struct FakeProbe {
        present: HashSet<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn new(present: &[&str]) -> Self {
            Self {
                present: present.iter().map(|s| s.to_string()).collect(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Probe for FakeProbe {
        async fn exists(&self, path: &str) -> bool {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.seen.lock().unwrap().push(path.to_string());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.present.contains(path)
        }
    }

    #[test]
    fn test_file_names_cross_product() {
        let source = ProbeSource::new(FakeProbe::new(&[]), ["Dior", " ", "Chanel"]).with_extensions(["png", "svg"]);

        assert_eq!(
            source.file_names(),
            vec!["Dior.png", "Dior.svg", "Chanel.png", "Chanel.svg"]
        );
    }

    #[tokio::test]
    async fn test_discover_keeps_probe_order() {
        let probe = FakeProbe::new(&["Chanel.svg", "Dior.png", "Guerlain.webp"]);
        let source = ProbeSource::new(probe, ["Dior", "Chanel", "Guerlain"])
            .with_batch_size(2)
            .with_prefix("photos/brands/");

        let set = source.discover().await;
        let paths: Vec<_> = set.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["photos/brands/Dior.png", "photos/brands/Chanel.svg", "photos/brands/Guerlain.webp"]
        );
    }

    #[tokio::test]
    async fn test_batches_bound_concurrency() {
        let source = ProbeSource::new(FakeProbe::new(&[]), ["a", "b", "c", "d"]).with_batch_size(3);

        let set = source.discover().await;
        assert!(set.is_empty());

        let probe = &source.probe;
        assert_eq!(probe.seen.lock().unwrap().len(), 4 * IMAGE_EXTENSIONS.len());
        assert!(probe.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    /// Panics when asked about one file, answers from a fixed list otherwise.
    struct PanicsOn {
        bad: &'static str,
        present: HashSet<String>,
    }

    impl Probe for PanicsOn {
        async fn exists(&self, path: &str) -> bool {
            if path == self.bad {
                panic!("lookup blew up for {path}");
            }
            self.present.contains(path)
        }
    }

    #[tokio::test]
    async fn test_panicking_check_counts_as_absent() {
        let checker = PanicsOn {
            bad: "Dior.png",
            present: ["Chanel.svg", "Dior.png", "Guerlain.webp"].iter().map(|s| s.to_string()).collect(),
        };
        let source = ProbeSource::new(checker, ["Chanel", "Dior", "Guerlain"])
            .with_extensions(["png", "svg", "webp"])
            .with_batch_size(2);

        let set = source.discover().await;
        let names: Vec<_> = set.iter().map(|c| c.file_name.as_str()).collect();
        assert_eq!(names, vec!["Chanel.svg", "Guerlain.webp"]);
    }

    #[tokio::test]
    async fn test_fs_probe() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Lancome.png"), b"").unwrap();
        fs::create_dir(dir.path().join("Dior.png")).unwrap();

        let source = ProbeSource::new(FsProbe::new(dir.path()), ["Lancome", "Dior"]);
        let set = source.discover().await;

        // A directory named like an image is not a file
        let names: Vec<_> = set.iter().map(|c| c.file_name.as_str()).collect();
        assert_eq!(names, vec!["Lancome.png"]);
    }
}

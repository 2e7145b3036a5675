//! Concurrent codelab directory scanner.
//!
//! Every entry of the content root is handed to its own task. Each task
//! reports exactly one outcome (skipped, parsed or failed) over a channel,
//! and a single collector receives one message per dispatched task, so the
//! catalog and index are only ever mutated from one place.
//!
//! A broken codelab never hides the rest of the catalog: failures are
//! collected and returned together with whatever did parse.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::codelab::Codelab;

/// Scanner settings
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Deadline for reading and parsing a single metadata file (none by default)
    pub entry_timeout: Option<Duration>,
}

/// Codelabs found in a content root
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scan {
    /// Parsed codelabs, in no particular order
    pub codelabs: Vec<Codelab>,

    /// Source identifier to published URL
    pub index: BTreeMap<String, String>,
}

impl Scan {
    /// Get a codelab by source identifier
    pub fn get(&self, source: &str) -> Option<&Codelab> {
        self.codelabs.iter().find(|c| c.source == source)
    }

    /// Number of codelabs
    pub fn len(&self) -> usize {
        self.codelabs.len()
    }

    /// Check if no codelab was found
    pub fn is_empty(&self) -> bool {
        self.codelabs.is_empty()
    }

    /// Codelabs ordered by source identifier
    pub fn sorted(&self) -> Vec<&Codelab> {
        let mut codelabs: Vec<_> = self.codelabs.iter().collect();
        codelabs.sort_by(|a, b| a.source.cmp(&b.source));
        codelabs
    }
}

/// Why a single codelab directory could not be loaded
#[derive(Debug, Error)]
pub enum EntryFailure {
    #[error("{dir}: metadata unreadable ({}): {source}", .path.display())]
    Unreadable {
        dir: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("{dir}: metadata malformed ({}): {source}", .path.display())]
    Malformed {
        dir: String,
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{dir}: source {source_id} already used by {first_dir}")]
    DuplicateSource {
        dir: String,
        source_id: String,
        first_dir: String,
    },

    #[error("{dir}: metadata read timed out after {after:?}")]
    TimedOut { dir: String, after: Duration },

    #[error("{missing} scan task(s) exited without reporting")]
    Lost { missing: usize },
}

impl EntryFailure {
    /// Directory the failure originated from, when known
    pub fn dir(&self) -> Option<&str> {
        match self {
            Self::Unreadable { dir, .. }
            | Self::Malformed { dir, .. }
            | Self::DuplicateSource { dir, .. }
            | Self::TimedOut { dir, .. } => Some(dir),
            Self::Lost { .. } => None,
        }
    }
}

/// A scan where at least one directory failed
#[derive(Debug)]
pub struct IncompleteScan {
    /// Everything that did load
    pub partial: Scan,

    /// One entry per failed directory
    pub failures: Vec<EntryFailure>,
}

impl fmt::Display for IncompleteScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} codelab(s) failed to load: ", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

/// Scan errors
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to list codelab directory {}: {source}", .path.display())]
    ListRoot {
        path: PathBuf,
        source: io::Error,
    },

    #[error("{0}")]
    Incomplete(IncompleteScan),
}

impl ScanError {
    /// Codelabs that loaded despite the failure (none if listing failed)
    pub fn partial(&self) -> Option<&Scan> {
        match self {
            Self::Incomplete(incomplete) => Some(&incomplete.partial),
            Self::ListRoot { .. } => None,
        }
    }

    /// Take the partial scan out of the error
    pub fn into_partial(self) -> Option<Scan> {
        match self {
            Self::Incomplete(incomplete) => Some(incomplete.partial),
            Self::ListRoot { .. } => None,
        }
    }
}

/// What a scan task reports for one root entry
#[derive(Debug)]
enum EntryOutcome {
    /// Not a directory
    Skipped,
    Parsed { dir: String, codelab: Codelab },
    Failed(EntryFailure),
}

/// Scan every codelab directory directly under `root`.
///
/// Non-directory entries are skipped and symbolic links are not followed.
pub async fn scan_codelabs(root: &Path, options: &ScanOptions) -> Result<Scan, ScanError> {
    let list_error = |source| ScanError::ListRoot {
        path: root.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(root).await.map_err(list_error)?;
    let (tx, mut rx) = mpsc::unbounded_channel::<EntryOutcome>();
    let mut dispatched = 0usize;

    while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
        let tx = tx.clone();
        let timeout = options.entry_timeout;
        tokio::spawn(async move {
            let outcome = scan_entry(entry, timeout).await;
            // Receiver only goes away if the scan was abandoned
            let _ = tx.send(outcome);
        });
        dispatched += 1;
    }
    drop(tx);

    let mut parsed = Vec::new();
    let mut failures = Vec::new();
    let mut skipped = 0usize;
    let mut received = 0usize;

    while received < dispatched {
        let Some(outcome) = rx.recv().await else {
            failures.push(EntryFailure::Lost {
                missing: dispatched - received,
            });
            break;
        };
        received += 1;

        match outcome {
            EntryOutcome::Skipped => skipped += 1,
            EntryOutcome::Parsed { dir, codelab } => {
                debug!("Loaded codelab {} from {}", codelab.source, dir);
                parsed.push((dir, codelab));
            }
            EntryOutcome::Failed(failure) => {
                warn!("{}", failure);
                failures.push(failure);
            }
        }
    }

    let result = collect(parsed, failures);
    match &result {
        Ok(scan) => info!(
            "Scanned {}: {} codelab(s), {} non-directory entries skipped",
            root.display(),
            scan.len(),
            skipped
        ),
        Err(ScanError::Incomplete(incomplete)) => warn!(
            "Scan of {} incomplete: {} codelab(s) loaded, {} failed",
            root.display(),
            incomplete.partial.len(),
            incomplete.failures.len()
        ),
        Err(ScanError::ListRoot { .. }) => {}
    }
    result
}

async fn scan_entry(entry: fs::DirEntry, timeout: Option<Duration>) -> EntryOutcome {
    let dir = entry.file_name().to_string_lossy().into_owned();

    // file_type() reports the entry itself, so symlinks are never followed
    match entry.file_type().await {
        Ok(file_type) if file_type.is_dir() => {}
        Ok(_) => return EntryOutcome::Skipped,
        Err(source) => {
            return EntryOutcome::Failed(EntryFailure::Unreadable {
                dir,
                path: entry.path(),
                source,
            })
        }
    }

    let path = Codelab::metadata_path(&entry.path());
    let loaded = load_with_deadline(&dir, timeout, load_metadata(&dir, path)).await;
    match loaded {
        Ok(codelab) => EntryOutcome::Parsed { dir, codelab },
        Err(failure) => EntryOutcome::Failed(failure),
    }
}

/// Run `load`, giving up once `timeout` elapses.
///
/// Cancelling only drops the future. A read already handed to the blocking
/// pool runs to completion in the background, which is why `load_metadata`
/// refuses anything that is not a regular file before reading it.
async fn load_with_deadline<F>(
    dir: &str,
    timeout: Option<Duration>,
    load: F,
) -> Result<Codelab, EntryFailure>
where
    F: Future<Output = Result<Codelab, EntryFailure>>,
{
    let Some(limit) = timeout else {
        return load.await;
    };

    match tokio::time::timeout(limit, load).await {
        Ok(loaded) => loaded,
        Err(_) => Err(EntryFailure::TimedOut {
            dir: dir.to_string(),
            after: limit,
        }),
    }
}

async fn load_metadata(dir: &str, path: PathBuf) -> Result<Codelab, EntryFailure> {
    let unreadable = |path: PathBuf, source| EntryFailure::Unreadable {
        dir: dir.to_string(),
        path,
        source,
    };

    // FIFOs and device nodes would block a pool thread that a timeout cannot reclaim
    match fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            let source = io::Error::new(io::ErrorKind::InvalidInput, "not a regular file");
            return Err(unreadable(path, source));
        }
        Err(source) => return Err(unreadable(path, source)),
    }

    let content = match fs::read(&path).await {
        Ok(content) => content,
        Err(source) => return Err(unreadable(path, source)),
    };

    serde_json::from_slice(&content).map_err(|source| EntryFailure::Malformed {
        dir: dir.to_string(),
        path,
        source,
    })
}

/// Build the catalog and index from everything the tasks reported.
///
/// Entries are walked in directory-name order so that, when two directories
/// claim the same source, the first name alphabetically keeps it no matter
/// which task finished first.
fn collect(
    mut parsed: Vec<(String, Codelab)>,
    mut failures: Vec<EntryFailure>,
) -> Result<Scan, ScanError> {
    parsed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut scan = Scan::default();
    let mut owners: HashMap<String, String> = HashMap::new();

    for (dir, codelab) in parsed {
        if let Some(first_dir) = owners.get(&codelab.source) {
            let failure = EntryFailure::DuplicateSource {
                dir,
                source_id: codelab.source,
                first_dir: first_dir.clone(),
            };
            warn!("{}", failure);
            failures.push(failure);
            continue;
        }

        owners.insert(codelab.source.clone(), dir);
        scan.index.insert(codelab.source.clone(), codelab.url.clone());
        scan.codelabs.push(codelab);
    }

    if failures.is_empty() {
        return Ok(scan);
    }

    failures.sort_by(|a, b| a.dir().cmp(&b.dir()));
    Err(ScanError::Incomplete(IncompleteScan {
        partial: scan,
        failures,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codelab(source: &str, url: &str) -> Codelab {
        Codelab {
            source: source.to_string(),
            title: format!("Codelab {}", source),
            summary: String::new(),
            category: vec!["intro".to_string()],
            difficulty: 1,
            duration: 10,
            tags: Vec::new(),
            updated: "2017-01-01".to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_collect_builds_index() {
        let parsed = vec![
            ("b".to_string(), codelab("b", "/b/")),
            ("a".to_string(), codelab("a", "/a/")),
        ];

        let scan = collect(parsed, Vec::new()).unwrap();
        assert_eq!(scan.len(), 2);
        assert_eq!(scan.index["a"], "/a/");
        assert_eq!(scan.index["b"], "/b/");
    }

    #[test]
    fn test_duplicate_source_first_directory_wins() {
        // Arrival order must not matter
        let parsed = vec![
            ("zeta".to_string(), codelab("shared", "/zeta/")),
            ("alpha".to_string(), codelab("shared", "/alpha/")),
        ];

        let err = collect(parsed, Vec::new()).unwrap_err();
        let partial = err.partial().unwrap();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial.index["shared"], "/alpha/");

        match err {
            ScanError::Incomplete(incomplete) => {
                assert_eq!(incomplete.failures.len(), 1);
                match &incomplete.failures[0] {
                    EntryFailure::DuplicateSource {
                        dir,
                        source_id,
                        first_dir,
                    } => {
                        assert_eq!(dir, "zeta");
                        assert_eq!(source_id, "shared");
                        assert_eq!(first_dir, "alpha");
                    }
                    other => panic!("Expected DuplicateSource, got {:?}", other),
                }
            }
            other => panic!("Expected Incomplete, got {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_message_lists_every_failure() {
        let failures = vec![
            EntryFailure::TimedOut {
                dir: "slow".to_string(),
                after: Duration::from_secs(1),
            },
            EntryFailure::Lost { missing: 2 },
        ];

        let err = collect(vec![("a".to_string(), codelab("a", "/a/"))], failures).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("2 codelab(s) failed to load: "));
        assert!(message.contains("slow: metadata read timed out"));
        assert!(message.contains("2 scan task(s) exited without reporting"));
        assert_eq!(err.into_partial().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deadline_gives_up_on_a_stuck_load() {
        let limit = Duration::from_millis(50);
        let pending = std::future::pending::<Result<Codelab, EntryFailure>>();

        let failure = load_with_deadline("hang", Some(limit), pending)
            .await
            .unwrap_err();
        match failure {
            EntryFailure::TimedOut { dir, after } => {
                assert_eq!(dir, "hang");
                assert_eq!(after, limit);
            }
            other => panic!("Expected TimedOut, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_deadline_waits_for_the_load() {
        let ready = async { Ok(codelab("a", "/a/")) };
        let loaded = load_with_deadline("a", None, ready).await.unwrap();
        assert_eq!(loaded.source, "a");
    }

    #[tokio::test]
    async fn test_metadata_must_be_a_regular_file() {
        let temp = tempfile::TempDir::new().unwrap();
        // A directory named like the metadata file
        let path = temp.path().join("codelab.json");
        std::fs::create_dir(&path).unwrap();

        match load_metadata("odd", path).await.unwrap_err() {
            EntryFailure::Unreadable { dir, source, .. } => {
                assert_eq!(dir, "odd");
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput);
            }
            other => panic!("Expected Unreadable, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_dir() {
        let failure = EntryFailure::TimedOut {
            dir: "slow".to_string(),
            after: Duration::from_millis(5),
        };
        assert_eq!(failure.dir(), Some("slow"));
        assert_eq!(EntryFailure::Lost { missing: 1 }.dir(), None);
    }
}

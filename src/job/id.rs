use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;

static COUNTER: AtomicU64 = AtomicU64::new(0);

// Wall-clock anchor taken once, advanced by a monotonic clock afterwards.
static CLOCK: LazyLock<(i64, Instant)> =
    LazyLock::new(|| (Utc::now().timestamp_micros(), Instant::now()));

fn monotonic_micros() -> i64 {
    let (anchor, started) = *CLOCK;
    anchor + started.elapsed().as_micros() as i64
}

/// Identifier of a job: `job<pid>_<micros>_<counter>`.
///
/// Ordering is plain string ordering, which matches submission order for
/// IDs generated by the same process.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(String);

impl JobId {
    /// Generates an ID never returned before by this process.
    pub fn generate() -> Self {
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
        JobId(format!(
            "job{}_{}_{}",
            std::process::id(),
            monotonic_micros(),
            counter
        ))
    }

    /// Accepts any name usable as a single path component.
    pub fn parse(raw: &str) -> Option<Self> {
        let invalid = raw.is_empty()
            || raw == "."
            || raw == ".."
            || raw.contains(['/', '\\', '\0']);
        if invalid { None } else { Some(JobId(raw.to_string())) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn content_file(&self) -> String {
        format!("{}.txt", self.0)
    }

    pub fn meta_file(&self) -> String {
        format!("{}.meta", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

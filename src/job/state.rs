use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a job artifact currently lives.
///
/// Each state maps to one directory under the workspace root:
/// STAGING → QUEUED → CLAIMED → {COMPLETED | FAILED}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    /// Being written by the submitter; invisible to the scheduler.
    Staging,
    /// Published and waiting to be claimed.
    Queued,
    /// Owned by exactly one worker.
    Claimed,
    Completed,
    Failed,
}

impl JobState {
    pub const ALL: [JobState; 5] = [
        JobState::Staging,
        JobState::Queued,
        JobState::Claimed,
        JobState::Completed,
        JobState::Failed,
    ];

    /// Directory of this state relative to the workspace root.
    pub fn dir(self) -> &'static str {
        match self {
            JobState::Staging => "input/writing",
            JobState::Queued => "input/ready",
            JobState::Claimed => "processing",
            JobState::Completed => "output",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// `Claimed → Queued` is the scheduler releasing a job it claimed but
    /// never handed to a worker.
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Staging, JobState::Queued)
                | (JobState::Queued, JobState::Claimed)
                | (JobState::Claimed, JobState::Completed)
                | (JobState::Claimed, JobState::Failed)
                | (JobState::Claimed, JobState::Queued)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Staging => write!(f, "STAGING"),
            JobState::Queued => write!(f, "QUEUED"),
            JobState::Claimed => write!(f, "CLAIMED"),
            JobState::Completed => write!(f, "COMPLETED"),
            JobState::Failed => write!(f, "FAILED"),
        }
    }
}

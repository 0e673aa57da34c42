mod id;
mod metadata;
mod state;

pub use id::JobId;
pub use metadata::Metadata;
pub use state::JobState;

use crate::error::{NrvnaError, Result};

/// A single unit of submitted work as seen by one component at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub content: String,
    pub metadata: Metadata,
    pub state: JobState,
}

impl Job {
    /// A freshly identified job that has not been written anywhere yet.
    pub fn new(content: impl Into<String>, notify: Option<String>) -> Self {
        Self {
            id: JobId::generate(),
            content: content.into(),
            metadata: Metadata { email: notify },
            state: JobState::Staging,
        }
    }

    /// Moves the job to `next`, rejecting edges the lifecycle does not allow.
    pub fn advance(&mut self, next: JobState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(NrvnaError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub fn notify_target(&self) -> Option<&str> {
        self.metadata.email.as_deref()
    }
}

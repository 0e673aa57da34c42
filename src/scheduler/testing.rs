//! Test doubles for the inference and notification seams.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use crate::inference::{Engine, Inference, InferenceError};
use crate::job::JobId;
use crate::notify::{Notifier, NotifyError};

/// Echoes content back as `echo: <content>`. Content `"silent"` yields an
/// empty result; content equal to `fail_on` yields an error.
#[derive(Clone, Default)]
pub struct MockEngine {
    pub seen: Arc<Mutex<Vec<String>>>,
    pub started: Arc<Notify>,
    pub fail_on: Option<String>,
    pub delay: Duration,
    pub unavailable: bool,
}

impl MockEngine {
    pub fn failing_on(content: &str) -> Self {
        Self {
            fail_on: Some(content.to_string()),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Engine for MockEngine {
    type Runner = MockRunner;

    fn runner(&self) -> Result<MockRunner, InferenceError> {
        if self.unavailable {
            return Err(InferenceError::Unavailable {
                endpoint: "mock".into(),
                reason: "no model".into(),
            });
        }
        Ok(MockRunner {
            engine: self.clone(),
        })
    }
}

pub struct MockRunner {
    engine: MockEngine,
}

impl Inference for MockRunner {
    async fn infer(&self, content: &str) -> Result<String, InferenceError> {
        self.engine.started.notify_one();
        if !self.engine.delay.is_zero() {
            tokio::time::sleep(self.engine.delay).await;
        }
        self.engine.seen.lock().unwrap().push(content.to_string());

        if self.engine.fail_on.as_deref() == Some(content) {
            return Err(InferenceError::Rejected(format!("refusing {content:?}")));
        }
        if content == "silent" {
            return Ok(String::new());
        }
        Ok(format!("echo: {content}"))
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<(String, String, String)>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, target: &str, job_id: &JobId, result: &str) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap()
            .push((target.to_string(), job_id.to_string(), result.to_string()));
        if self.fail {
            return Err(NotifyError::InvalidTarget(target.to_string()));
        }
        Ok(())
    }
}

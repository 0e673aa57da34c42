//! Sidecar `<id>.meta` encoding: one `key=value` line per attribute.

/// Out-of-band attributes that travel next to a job's content file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Notification target for the finished result.
    pub email: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
    }

    pub fn render(&self) -> String {
        match &self.email {
            Some(email) => format!("email={email}\n"),
            None => String::new(),
        }
    }

    /// Reads the first value of each known key; unknown keys are ignored.
    pub fn parse(text: &str) -> Self {
        let email = text
            .lines()
            .find_map(|line| line.trim_end_matches('\r').strip_prefix("email="))
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Self { email }
    }
}

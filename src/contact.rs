use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MIN_MESSAGE_CHARS: usize = 10;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    /// Every failing rule, in field order.
    pub fn validate(&self) -> Result<(), Vec<&'static str>> {
        let mut issues = Vec::new();

        if self.name.is_empty() {
            issues.push("Name is required");
        }
        if !EMAIL.is_match(&self.email) {
            issues.push("Invalid email address");
        }
        if self.subject.is_empty() {
            issues.push("Subject is required");
        }
        if self.message.chars().count() < MIN_MESSAGE_CHARS {
            issues.push("Message must be at least 10 characters");
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

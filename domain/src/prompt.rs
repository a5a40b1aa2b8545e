//! Prompt value object

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// The user prompt every panel member receives (Value Object)
///
/// Normalized at the boundary: surrounding whitespace is stripped and blank
/// input is rejected, so a request can never exist without a usable prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prompt(String);

impl Prompt {
    /// Parse raw user input into a prompt, trimming surrounding whitespace
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyPrompt);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn content(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Prompt {
    type Error = DomainError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Prompt::parse(&raw)
    }
}

impl From<Prompt> for String {
    fn from(prompt: Prompt) -> Self {
        prompt.0
    }
}

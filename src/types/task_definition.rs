// ABOUTME: ECS task definition reference parsing and validation.
// ABOUTME: Handles formats like family, family:revision, and full task definition ARNs.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseTaskDefinitionError {
    #[error("task definition cannot be empty")]
    Empty,

    #[error("invalid character in task definition: {0}")]
    InvalidChar(char),

    #[error("invalid task definition revision: {0}")]
    InvalidRevision(String),
}

/// The release artifact being deployed: an ECS task definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    raw: String,
    family: String,
    revision: Option<u32>,
}

impl TaskDefinition {
    pub fn parse(input: &str) -> Result<Self, ParseTaskDefinitionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseTaskDefinitionError::Empty);
        }

        for c in input.chars() {
            if !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | ':' | '/' | '.') {
                return Err(ParseTaskDefinitionError::InvalidChar(c));
            }
        }

        // arn:aws:ecs:<region>:<account>:task-definition/<family>:<revision>
        let reference = match input.split_once("task-definition/") {
            Some((prefix, rest)) if prefix.starts_with("arn:") => rest,
            _ => input,
        };

        let (family, revision) = match reference.rsplit_once(':') {
            Some((family, rev)) => {
                let revision = rev
                    .parse::<u32>()
                    .map_err(|_| ParseTaskDefinitionError::InvalidRevision(rev.to_string()))?;
                (family, Some(revision))
            }
            None => (reference, None),
        };

        if family.is_empty() {
            return Err(ParseTaskDefinitionError::Empty);
        }

        Ok(Self {
            raw: input.to_string(),
            family: family.to_string(),
            revision,
        })
    }

    /// The reference exactly as given, suitable for the ECS API.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Revision, or `None` for "latest active revision of the family".
    pub fn revision(&self) -> Option<u32> {
        self.revision
    }
}

impl fmt::Display for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

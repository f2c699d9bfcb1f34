// ABOUTME: ECS cluster and service name validation.
// ABOUTME: Accepts plain names (letters, digits, hyphens, underscores) or full ARNs.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceNameError {
    #[error("resource name cannot be empty")]
    Empty,

    #[error("resource name exceeds maximum length of 255 characters")]
    TooLong,

    #[error("invalid character in resource name: '{0}'")]
    InvalidChar(char),
}

/// Name of an ECS cluster or service.
///
/// The ECS API accepts either the short name or the full ARN wherever a
/// cluster or service is referenced, so both forms are valid here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(value: &str) -> Result<Self, ResourceNameError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ResourceNameError::Empty);
        }

        if value.starts_with("arn:") {
            if let Some(c) = value.chars().find(|c| c.is_whitespace()) {
                return Err(ResourceNameError::InvalidChar(c));
            }
            return Ok(Self(value.to_string()));
        }

        if value.len() > 255 {
            return Err(ResourceNameError::TooLong);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
                return Err(ResourceNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_environment_prefixed_names() {
        let name = ResourceName::new("prod-connectly-atlantis-service").unwrap();
        assert_eq!(name.as_str(), "prod-connectly-atlantis-service");
    }

    #[test]
    fn accepts_arns() {
        let arn = "arn:aws:ecs:ap-northeast-2:123456789012:cluster/prod-cluster";
        assert_eq!(ResourceName::new(arn).unwrap().as_str(), arn);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(ResourceName::new("  "), Err(ResourceNameError::Empty));
    }

    #[test]
    fn rejects_slashes_in_plain_names() {
        assert_eq!(
            ResourceName::new("prod/cluster"),
            Err(ResourceNameError::InvalidChar('/'))
        );
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(256);
        assert_eq!(ResourceName::new(&long), Err(ResourceNameError::TooLong));
    }
}

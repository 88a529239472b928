// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Confession text validator.
//!
//! Runs before the submission limiter is consulted, so a rejected text never
//! costs the client a slot.

use crate::config::ValidationConfig;
use thiserror::Error;
use tracing::debug;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please write your confession before submitting.")]
    Empty,

    #[error("Your confession is too short. Please write a bit more.")]
    TooShort { min: usize, actual: usize },
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Text is acceptable; carries the trimmed confession
    Valid(String),
    /// Text is rejected
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<String, ValidationError> {
        match self {
            ValidationResult::Valid(text) => Ok(text),
            ValidationResult::Invalid(e) => Err(e),
        }
    }
}

/// Confession text validator.
pub struct ConfessionValidator {
    config: ValidationConfig,
}

impl ConfessionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Trim and check the submitted text. Length is counted in characters.
    pub fn validate(&self, raw: &str) -> ValidationResult {
        let text = raw.trim();
        if text.is_empty() {
            debug!("Empty confession");
            return ValidationResult::Invalid(ValidationError::Empty);
        }

        let actual = text.chars().count();
        if actual < self.config.min_length {
            debug!(length = actual, min = self.config.min_length, "Confession too short");
            return ValidationResult::Invalid(ValidationError::TooShort {
                min: self.config.min_length,
                actual,
            });
        }

        ValidationResult::Valid(text.to_string())
    }
}

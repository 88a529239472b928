// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the confession service.

use thiserror::Error;

pub use crate::limiter::RateLimitExceeded;
pub use crate::validator::ValidationError;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid bind address: {0}")]
    InvalidBindAddr(String),
}

/// Rendering errors. Never leave the renderer; they only decide the fallback path.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Font unavailable: {0}")]
    Font(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Rendering task failed: {0}")]
    Task(String),

    #[error("Confession too long for a card: {lines} lines, at most {max}")]
    TooLarge { lines: usize, max: usize },
}

/// Mail delivery errors.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail is not configured, missing: {}", .0.join(", "))]
    NotConfigured(Vec<&'static str>),

    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Transport failed: {0}")]
    Other(String),
}

/// Outcome of a rejected or failed submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),

    #[error("Delivery failed: {0}")]
    Transport(#[from] MailError),
}

impl SubmitError {
    /// Message shown to the visitor.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(err) => err.to_string(),
            SubmitError::RateLimited(err) => err.to_string(),
            SubmitError::Transport(_) => {
                "Sorry, there was an error sending your confession. Please try again later."
                    .to_string()
            }
        }
    }

    /// Label used for the submissions counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            SubmitError::Validation(_) => "invalid",
            SubmitError::RateLimited(_) => "rate_limited",
            SubmitError::Transport(_) => "transport_failed",
        }
    }
}

/// Result type alias
pub type Result<T, E = SubmitError> = std::result::Result<T, E>;

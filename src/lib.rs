// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Confession Box
//!
//! A single-page anonymous confession form. Each confession is rendered onto
//! a PNG card and mailed, text and image, to one fixed recipient.
//!
//! - Per-client allowance (3 confessions per 60 days by default)
//! - Lazy reset of expired allowances, no background sweep
//! - Minimum length validation before any slot is consumed
//! - Card rendering with a built-in font fallback
//! - SMTP delivery over implicit TLS

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod pages;
pub mod render;
pub mod service;
pub mod validator;

pub use config::Config;
pub use limiter::{RateLimitExceeded, SubmissionLimiter};
pub use render::ConfessionRenderer;
pub use service::{SubmissionReceipt, SubmissionService};
pub use validator::{ConfessionValidator, ValidationResult};

use axum::{
    routing::{get, post},
    Router,
};
use handlers::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/submit", post(handlers::submit))
        .route("/success", get(handlers::success))
        .route("/health", get(handlers::health))
        .route("/healthz", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

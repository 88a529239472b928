// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures: an in-memory mail transport and a service on a manual clock.

#![allow(dead_code)]

use async_trait::async_trait;
use confession_box::{
    clock::ManualClock,
    config::{RateLimitConfig, ValidationConfig},
    error::MailError,
    mailer::{ConfessionMail, MailTransport},
    render::font::FontSet,
    ConfessionRenderer, ConfessionValidator, SubmissionLimiter, SubmissionService,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<ConfessionMail>>,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<ConfessionMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, mail: &ConfessionMail) -> Result<(), MailError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Other("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Service with default policy, the bitmap font and a manual clock.
pub fn service_with(transport: Arc<RecordingTransport>) -> (SubmissionService, ManualClock) {
    let clock = ManualClock::new(chrono::Utc::now());
    let service = SubmissionService::new(
        ConfessionValidator::new(ValidationConfig::default()),
        SubmissionLimiter::with_clock(RateLimitConfig::default(), Arc::new(clock.clone())),
        ConfessionRenderer::with_fonts(FontSet::Builtin),
        transport,
        Arc::new(clock.clone()),
    )
    .unwrap();
    (service, clock)
}

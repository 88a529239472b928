// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The submission flow, independent of HTTP.
//!
//! validate → reserve a slot → render → send → commit the slot.
//! Validation and limit failures have no side effects. A failed send
//! releases the slot, so the client is not charged for it.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Result, SubmitError};
use crate::limiter::SubmissionLimiter;
use crate::mailer::{ConfessionMail, MailTransport};
use crate::metrics::Metrics;
use crate::render::ConfessionRenderer;
use crate::validator::ConfessionValidator;
use chrono::Local;
use std::sync::Arc;
use tracing::{info, warn};

/// Timestamp format shown in the mail and on the card.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Client's count after this submission
    pub count: u32,
    /// Submissions the client has left
    pub remaining: u32,
    /// Whether the image was attached
    pub image_attached: bool,
}

/// Everything a submission needs.
pub struct SubmissionService {
    validator: ConfessionValidator,
    limiter: SubmissionLimiter,
    renderer: Arc<ConfessionRenderer>,
    transport: Arc<dyn MailTransport>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl SubmissionService {
    /// Build the service from configuration with the given transport.
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn MailTransport>,
    ) -> prometheus::Result<Self> {
        Self::new(
            ConfessionValidator::new(config.validation.clone()),
            SubmissionLimiter::new(config.rate_limit.clone()),
            ConfessionRenderer::new(&config.render),
            transport,
            Arc::new(SystemClock),
        )
    }

    pub fn new(
        validator: ConfessionValidator,
        limiter: SubmissionLimiter,
        renderer: ConfessionRenderer,
        transport: Arc<dyn MailTransport>,
        clock: Arc<dyn Clock>,
    ) -> prometheus::Result<Self> {
        Ok(Self {
            validator,
            limiter,
            renderer: Arc::new(renderer),
            transport,
            clock,
            metrics: Metrics::new()?,
        })
    }

    pub fn limiter(&self) -> &SubmissionLimiter {
        &self.limiter
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn max_submissions(&self) -> u32 {
        self.limiter.max_submissions()
    }

    /// Submissions `client_id` may still make.
    pub fn remaining(&self, client_id: &str) -> u32 {
        self.limiter.remaining(client_id)
    }

    /// Run one submission for `client_id`.
    pub async fn submit(&self, client_id: &str, raw_text: &str) -> Result<SubmissionReceipt> {
        let result = self.process(client_id, raw_text).await;
        match &result {
            Ok(receipt) => {
                self.metrics.record_outcome("sent");
                info!(
                    client = %client_id,
                    count = receipt.count,
                    remaining = receipt.remaining,
                    image = receipt.image_attached,
                    "Confession sent"
                );
            }
            Err(e) => {
                self.metrics.record_outcome(e.outcome());
                match e {
                    SubmitError::Transport(err) => {
                        warn!(client = %client_id, error = %err, "Confession delivery failed")
                    }
                    other => info!(client = %client_id, reason = %other, "Confession rejected"),
                }
            }
        }
        result
    }

    async fn process(&self, client_id: &str, raw_text: &str) -> Result<SubmissionReceipt> {
        let text = self.validator.validate(raw_text).into_result()?;
        let permit = self.limiter.reserve(client_id)?;

        let timestamp = self
            .clock
            .now()
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string();

        let image = self
            .renderer
            .clone()
            .render_blocking(text.clone(), timestamp.clone())
            .await;
        if image.is_none() {
            self.metrics.record_render_failure();
            warn!("Sending confession without image");
        }
        let image_attached = image.is_some();

        let mail = ConfessionMail::compose(&text, &timestamp, image);
        self.transport.send(&mail).await?;

        let count = permit.commit();
        Ok(SubmissionReceipt {
            count,
            remaining: self.max_submissions().saturating_sub(count),
            image_attached,
        })
    }
}

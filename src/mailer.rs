// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Delivery of confessions by email.
//!
//! [`ConfessionMail`] holds what gets sent; [`MailTransport`] is the seam the
//! submission flow talks to. [`SmtpMailer`] is the production transport: one
//! message per confession over implicit-TLS SMTP with password login.

use crate::config::MailConfig;
use crate::error::MailError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

/// A confession ready to be delivered.
#[derive(Debug, Clone)]
pub struct ConfessionMail {
    pub subject: String,
    pub body: String,
    pub image: Option<ImageAttachment>,
}

/// PNG rendering of the confession.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub filename: String,
    pub data: Vec<u8>,
}

impl ConfessionMail {
    /// Compose the message for `confession` received at `timestamp`.
    pub fn compose(confession: &str, timestamp: &str, image: Option<Vec<u8>>) -> Self {
        let body = format!(
            "\nNew Anonymous Confession Received\n\
             ==================================\n\
             \n\
             Received At: {timestamp}\n\
             \n\
             Confession:\n\
             -----------\n\
             {confession}\n\
             \n\
             ==================================\n\
             This is an automated message from Anonymous Confessions.\n\
             \n\
             NOTE: The confession is also attached as an image below for easy viewing.\n"
        );

        Self {
            subject: format!("New Anonymous Confession - {timestamp}"),
            body,
            image: image.map(|data| ImageAttachment {
                filename: attachment_filename(timestamp),
                data,
            }),
        }
    }
}

/// `confession_2026-10-19_12-30-00.png` for `2026-10-19 12:30:00`.
pub fn attachment_filename(timestamp: &str) -> String {
    format!(
        "confession_{}.png",
        timestamp.replace(':', "-").replace(' ', "_")
    )
}

/// Something that can deliver a confession to the fixed recipient.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &ConfessionMail) -> Result<(), MailError>;
}

/// SMTP transport.
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Build the MIME message: a plain-text part plus the optional PNG.
    pub fn build_message(&self, mail: &ConfessionMail) -> Result<Message, MailError> {
        let (from, to) = self.addresses()?;

        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(mail.body.clone()));
        if let Some(image) = &mail.image {
            let content_type = ContentType::parse("image/png")
                .map_err(|e| MailError::Other(e.to_string()))?;
            parts = parts.singlepart(
                Attachment::new(image.filename.clone()).body(image.data.clone(), content_type),
            );
        }

        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.clone())
            .multipart(parts)?)
    }

    fn addresses(&self) -> Result<(Mailbox, Mailbox), MailError> {
        let missing = self.config.missing_fields();
        if !missing.is_empty() {
            return Err(MailError::NotConfigured(missing));
        }
        let from = self.config.sender_email.as_deref().unwrap_or_default().trim().parse()?;
        let to = self.config.receiver_email.as_deref().unwrap_or_default().trim().parse()?;
        Ok((from, to))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let username = self.config.sender_email.clone().unwrap_or_default();
        let password = self.config.sender_password.clone().unwrap_or_default();

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_server)?
                .port(self.config.smtp_port)
                .credentials(Credentials::new(username, password))
                .timeout(Some(self.config.timeout()))
                .build(),
        )
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &ConfessionMail) -> Result<(), MailError> {
        let message = self.build_message(mail)?;
        let transport = self.transport()?;

        debug!(
            server = %self.config.smtp_server,
            port = self.config.smtp_port,
            attachment = mail.image.is_some(),
            "Sending confession"
        );
        transport.send(message).await?;
        info!("Confession delivered");
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Confession Box Service
//!
//! Serves the anonymous confession form and mails each confession, as text
//! and as a rendered PNG card, to a fixed recipient.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (and `.env`):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:5000)
//! - `PORT`: Overrides the port of `BIND_ADDR`
//! - `SENDER_EMAIL`, `SENDER_PASSWORD`, `RECEIVER_EMAIL`: SMTP account and recipient
//! - `SMTP_SERVER` / `SMTP_PORT`: SMTPS relay (default: smtp.gmail.com:465)
//! - `MAX_SUBMISSIONS`: Confessions per client and window (default: 3)
//! - `RESET_PERIOD_DAYS`: Window length in days (default: 60)
//! - `MIN_CONFESSION_LENGTH`: Minimum characters (default: 10)
//! - `FONT_PATH`: Preferred TTF/OTF font for the card

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use confession_box::{
    build_router, config::Config, handlers::AppState, mailer::SmtpMailer, SubmissionService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        max_submissions = config.rate_limit.max_submissions,
        reset_period_days = config.rate_limit.reset_period_days,
        smtp_server = %config.mail.smtp_server,
        smtp_port = config.mail.smtp_port,
        "Starting confession box"
    );

    let missing = config.mail.missing_fields();
    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "Email configuration not found, confessions cannot be delivered until it is set"
        );
    }

    // Create application state
    let transport = Arc::new(SmtpMailer::new(config.mail.clone()));
    let service = SubmissionService::from_config(&config, transport)?;
    let state = Arc::new(AppState {
        service,
        config: config.clone(),
    });

    let app = build_router(state);

    // Start server
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

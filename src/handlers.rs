// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the confession form.

use crate::config::Config;
use crate::pages::{self, Flash};
use crate::service::SubmissionService;
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

const FLASH_COOKIE: &str = "flash";

/// Shared application state.
pub struct AppState {
    pub service: SubmissionService,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub mail_configured: bool,
}

/// Submitted form.
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub problem_description: String,
}

/// Identify the submitter: first `X-Forwarded-For` hop, else the peer address.
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let flash = Flash::decode(cookie.value());
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
}

fn flash_cookie(flash: &Flash) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, flash.encode()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Confession form.
pub async fn index(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    let client = client_id(&headers, peer.map(|ConnectInfo(addr)| addr));
    let (jar, flash) = take_flash(jar);
    let remaining = state.service.remaining(&client);

    debug!(client = %client, remaining, "Serving form");
    (
        jar,
        Html(pages::index_page(
            remaining,
            state.service.max_submissions(),
            flash.as_ref(),
        )),
    )
}

/// Form submission. Always redirects, carrying the outcome in a flash cookie.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<SubmitForm>,
) -> impl IntoResponse {
    let client = client_id(&headers, peer.map(|ConnectInfo(addr)| addr));

    match state.service.submit(&client, &form.problem_description).await {
        Ok(receipt) => {
            let flash = Flash::success(format!(
                "Your confession has been sent anonymously! ({} remaining)",
                receipt.remaining
            ));
            (jar.add(flash_cookie(&flash)), Redirect::to("/success"))
        }
        Err(e) => {
            let flash = Flash::error(e.user_message());
            (jar.add(flash_cookie(&flash)), Redirect::to("/"))
        }
    }
}

/// Thank-you page.
pub async fn success(jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = take_flash(jar);
    (jar, Html(pages::success_page(flash.as_ref())))
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "confession-box",
        version: env!("CARGO_PKG_VERSION"),
        mail_configured: state.config.mail.is_complete(),
    })
}

/// Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        state.service.metrics().render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_id_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();
        assert_eq!(client_id(&headers, Some(peer)), "203.0.113.9");
    }

    #[test]
    fn test_client_id_falls_back_to_peer() {
        let peer: SocketAddr = "192.0.2.4:40000".parse().unwrap();
        assert_eq!(client_id(&HeaderMap::new(), Some(peer)), "192.0.2.4");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(client_id(&headers, Some(peer)), "192.0.2.4");
    }

    #[test]
    fn test_client_id_unknown() {
        assert_eq!(client_id(&HeaderMap::new(), None), "unknown");
    }
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTML pages and flash messages.

use html_escape::encode_text;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

/// One-shot message shown on the next page view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub severity: Severity,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Cookie-safe encoding, `severity:message` percent-encoded.
    pub fn encode(&self) -> String {
        urlencoding::encode(&format!("{}:{}", self.severity.as_str(), self.message)).into_owned()
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?;
        let (severity, message) = decoded.split_once(':')?;
        let severity = match severity {
            "success" => Severity::Success,
            "error" => Severity::Error,
            _ => return None,
        };
        Some(Self {
            severity,
            message: message.to_string(),
        })
    }
}

const STYLE: &str = r#"
body { margin: 0; min-height: 100vh; font-family: system-ui, -apple-system, "Segoe UI", Arial, sans-serif;
       background: linear-gradient(180deg, #e0edff 0%, #c0d8ff 100%); color: #0f172a; }
main { max-width: 720px; margin: 48px auto; background: #fff; border-radius: 20px;
       border-top: 6px solid #2563eb; box-shadow: 8px 8px 0 rgba(0,0,0,0.12); padding: 40px 48px; }
h1 { margin-top: 0; }
.subtitle { color: #6b7280; }
textarea { width: 100%; min-height: 220px; box-sizing: border-box; padding: 12px; font: inherit;
           border: 1px solid #c0d8ff; border-radius: 10px; }
button, a.button { display: inline-block; margin-top: 16px; padding: 12px 28px; border: 0; border-radius: 10px;
                   background: #2563eb; color: #fff; font: inherit; text-decoration: none; cursor: pointer; }
button:disabled { background: #9ca3af; cursor: not-allowed; }
.flash { padding: 12px 16px; border-radius: 10px; margin-bottom: 16px; }
.flash.success { background: #dcfce7; color: #166534; }
.flash.error { background: #fee2e2; color: #991b1b; }
.remaining { margin-top: 8px; color: #6b7280; }
"#;

fn layout(title: &str, flash: Option<&Flash>, content: &str) -> String {
    let flash_html = flash
        .map(|f| {
            format!(
                r#"<div class="flash {}">{}</div>"#,
                f.severity.as_str(),
                encode_text(&f.message)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title><style>{STYLE}</style></head>
<body><main>{flash_html}{content}</main></body></html>"#,
        title = encode_text(title),
    )
}

/// The confession form.
pub fn index_page(remaining: u32, max_allowed: u32, flash: Option<&Flash>) -> String {
    let form = if remaining > 0 {
        format!(
            r#"<form method="post" action="/submit">
<textarea name="problem_description" placeholder="Write your confession here..." required></textarea>
<p class="remaining">You can send {remaining} of {max_allowed} confessions.</p>
<button type="submit">Send anonymously</button>
</form>"#
        )
    } else {
        format!(
            r#"<p class="remaining">You have used all {max_allowed} of your confessions. Come back later.</p>
<button type="button" disabled>Send anonymously</button>"#
        )
    };

    layout(
        "Anonymous Confessions",
        flash,
        &format!(
            r#"<h1>Anonymous Confessions</h1>
<p class="subtitle">Say what you never said. No names, no accounts.</p>
{form}"#
        ),
    )
}

/// Shown after a confession was sent.
pub fn success_page(flash: Option<&Flash>) -> String {
    layout(
        "Confession sent",
        flash,
        r#"<h1>Thank you</h1>
<p class="subtitle">Your confession is on its way.</p>
<a class="button" href="/">Back</a>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_encoding() {
        let flash = Flash::success("Sent! (2 remaining)");
        let encoded = flash.encode();
        assert!(!encoded.contains(' '));
        assert_eq!(Flash::decode(&encoded), Some(flash));
    }

    #[test]
    fn test_flash_decode_rejects_garbage() {
        assert_eq!(Flash::decode("no-separator"), None);
        assert_eq!(Flash::decode("warning%3Ahi"), None);
    }

    #[test]
    fn test_index_shows_remaining() {
        let html = index_page(2, 3, None);
        assert!(html.contains("You can send 2 of 3 confessions."));
        assert!(html.contains(r#"name="problem_description""#));
    }

    #[test]
    fn test_index_exhausted_hides_form() {
        let html = index_page(0, 3, None);
        assert!(!html.contains("<form"));
        assert!(html.contains("used all 3"));
    }

    #[test]
    fn test_flash_is_escaped() {
        let flash = Flash::error("<script>alert(1)</script>");
        let html = index_page(3, 3, Some(&flash));
        assert!(html.contains(r#"class="flash error""#));
        assert!(!html.contains("<script>"));
    }
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Confession card renderer.
//!
//! Lays the submitted text out on a fixed-width card and encodes it as PNG:
//!
//! - vertical two-color gradient background
//! - white rounded card with a soft drop shadow and an accent bar on top
//! - title, timestamp, separator, then the wrapped confession
//!
//! Rendering failures never reach the caller; they yield `None` and the
//! confession is delivered as text only.

pub mod font;
pub mod layout;

use crate::config::RenderConfig;
use crate::error::RenderError;
use font::{FontSet, TextRole};
use image::{ImageFormat, Rgb, RgbImage};
use layout::{CardLayout, Rect};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, warn};

/// Renders confession cards.
#[derive(Debug, Clone)]
pub struct ConfessionRenderer {
    fonts: FontSet,
}

impl ConfessionRenderer {
    /// Create a renderer, loading fonts according to `config`.
    pub fn new(config: &RenderConfig) -> Self {
        Self::with_fonts(FontSet::load(config.font_path.as_deref()))
    }

    pub fn with_fonts(fonts: FontSet) -> Self {
        Self { fonts }
    }

    pub fn uses_builtin_font(&self) -> bool {
        self.fonts.is_builtin()
    }

    /// Render the card as PNG bytes, or `None` if anything went wrong.
    pub fn render(&self, text: &str, timestamp: &str) -> Option<Vec<u8>> {
        match self.try_render(text, timestamp) {
            Ok(png) => {
                debug!(bytes = png.len(), "Rendered confession card");
                Some(png)
            }
            Err(e) => {
                warn!(error = %e, "Could not render confession card");
                None
            }
        }
    }

    /// Render on the blocking thread pool.
    pub async fn render_blocking(
        self: Arc<Self>,
        text: String,
        timestamp: String,
    ) -> Option<Vec<u8>> {
        let task = tokio::task::spawn_blocking(move || self.try_render(&text, &timestamp));
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(RenderError::Task(e.to_string())),
        };
        match result {
            Ok(png) => Some(png),
            Err(e) => {
                warn!(error = %e, "Could not render confession card");
                None
            }
        }
    }

    pub fn try_render(&self, text: &str, timestamp: &str) -> Result<Vec<u8>, RenderError> {
        let canvas = self.draw(text, timestamp)?;
        encode_png(&canvas)
    }

    /// Draw the card onto a fresh canvas.
    ///
    /// Text that wraps to more than [`layout::MAX_LINE_COUNT`] lines is
    /// refused before anything is allocated.
    pub fn draw(&self, text: &str, timestamp: &str) -> Result<RgbImage, RenderError> {
        let lines = layout::wrap_text(text);
        if lines.len() > layout::MAX_LINE_COUNT {
            return Err(RenderError::TooLarge {
                lines: lines.len(),
                max: layout::MAX_LINE_COUNT,
            });
        }
        let card = CardLayout::new(lines.len());

        let mut canvas = RgbImage::from_fn(card.width, card.height, |_, y| {
            layout::gradient_color(y, card.height)
        });

        let radius = layout::CORNER_RADIUS as i32;
        fill_rounded_rect(
            &mut canvas,
            card.shadow,
            radius,
            layout::SHADOW_COLOR,
            layout::SHADOW_ALPHA,
        );
        fill_rounded_rect(&mut canvas, card.card, radius, layout::CARD_COLOR, u8::MAX);
        fill_rounded_rect(
            &mut canvas,
            card.accent_bar,
            radius,
            layout::ACCENT_COLOR,
            u8::MAX,
        );

        self.fonts.draw(
            &mut canvas,
            TextRole::Title,
            card.text_x,
            card.title_y,
            layout::TITLE,
            layout::TEXT_COLOR,
        );
        self.fonts.draw(
            &mut canvas,
            TextRole::Timestamp,
            card.text_x,
            card.timestamp_y,
            &format!("Received: {timestamp}"),
            layout::SUBTITLE_COLOR,
        );
        fill_rounded_rect(&mut canvas, card.separator, 0, layout::ACCENT_COLOR, u8::MAX);

        for (line, y) in lines.iter().zip(&card.line_ys) {
            self.fonts.draw(
                &mut canvas,
                TextRole::Body,
                card.text_x,
                *y,
                line,
                layout::TEXT_COLOR,
            );
        }

        Ok(canvas)
    }
}

/// Encode the canvas as PNG.
pub fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut buffer = Cursor::new(Vec::new());
    canvas.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Fill a rounded rectangle, blending `color` over the canvas with `alpha`.
///
/// The corner radius is clamped to half the shorter side.
fn fill_rounded_rect(canvas: &mut RgbImage, rect: Rect, radius: i32, color: Rgb<u8>, alpha: u8) {
    let radius = radius.min(rect.width() / 2).min(rect.height() / 2).max(0);
    let top = rect.top.max(0);
    let bottom = rect.bottom.min(canvas.height() as i32 - 1);
    let left = rect.left.max(0);
    let right = rect.right.min(canvas.width() as i32 - 1);

    for y in top..=bottom {
        for x in left..=right {
            if !inside_rounded(rect, radius, x, y) {
                continue;
            }
            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            *pixel = blend(*pixel, color, alpha);
        }
    }
}

fn inside_rounded(rect: Rect, radius: i32, x: i32, y: i32) -> bool {
    if radius == 0 {
        return true;
    }
    let dx = if x < rect.left + radius {
        rect.left + radius - x
    } else if x > rect.right - radius {
        x - (rect.right - radius)
    } else {
        0
    };
    let dy = if y < rect.top + radius {
        rect.top + radius - y
    } else if y > rect.bottom - radius {
        y - (rect.bottom - radius)
    } else {
        0
    };
    dx * dx + dy * dy <= radius * radius
}

fn blend(under: Rgb<u8>, over: Rgb<u8>, alpha: u8) -> Rgb<u8> {
    if alpha == u8::MAX {
        return over;
    }
    let a = alpha as u32;
    let mix = |u: u8, o: u8| ((o as u32 * a + u as u32 * (255 - a) + 127) / 255) as u8;
    Rgb([
        mix(under.0[0], over.0[0]),
        mix(under.0[1], over.0[1]),
        mix(under.0[2], over.0[2]),
    ])
}

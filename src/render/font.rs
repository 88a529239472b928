// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fonts for the confession card.
//!
//! A scalable font is preferred. When none can be loaded every role falls
//! back to the built-in 8x8 bitmap font.

use crate::error::RenderError;
use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Common locations of a sans-serif font.
pub(crate) const SYSTEM_FONTS: &[&str] = &[
    "arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Upscale factor for the bitmap font, same for every role.
const BUILTIN_SCALE: u32 = 2;
const BUILTIN_GLYPH_SIZE: u32 = 8;

/// What a piece of text is on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Subtitle,
    Body,
    Timestamp,
}

impl TextRole {
    /// Pixel size used with a scalable font.
    pub fn size(self) -> f32 {
        match self {
            TextRole::Title => 48.0,
            TextRole::Subtitle => 24.0,
            TextRole::Body => 26.0,
            TextRole::Timestamp => 22.0,
        }
    }
}

/// Fonts used for all text roles.
#[derive(Clone)]
pub enum FontSet {
    Scalable(FontArc),
    Builtin,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontSet::Scalable(_) => write!(f, "FontSet::Scalable"),
            FontSet::Builtin => write!(f, "FontSet::Builtin"),
        }
    }
}

impl FontSet {
    /// Load the preferred font, then the system candidates, else the bitmap font.
    pub fn load(preferred: Option<&Path>) -> Self {
        let mut candidates: Vec<PathBuf> = preferred.map(Path::to_path_buf).into_iter().collect();
        candidates.extend(SYSTEM_FONTS.iter().map(PathBuf::from));
        Self::from_candidates(&candidates)
    }

    /// First candidate that loads wins; none loading selects the bitmap font.
    pub fn from_candidates(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            match load_scalable(path) {
                Ok(font) => {
                    info!(path = %path.display(), "Loaded card font");
                    return FontSet::Scalable(font);
                }
                Err(e) => debug!(path = %path.display(), error = %e, "Font candidate rejected"),
            }
        }
        info!("No scalable font available, using built-in bitmap font");
        FontSet::Builtin
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, FontSet::Builtin)
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn draw(
        &self,
        canvas: &mut RgbImage,
        role: TextRole,
        x: i32,
        y: i32,
        text: &str,
        color: Rgb<u8>,
    ) {
        if text.is_empty() {
            return;
        }
        match self {
            FontSet::Scalable(font) => {
                imageproc::drawing::draw_text_mut(
                    canvas,
                    color,
                    x,
                    y,
                    PxScale::from(role.size()),
                    font,
                    text,
                );
            }
            FontSet::Builtin => draw_bitmap_text(canvas, x, y, text, color),
        }
    }
}

/// Read and parse a scalable font file.
pub fn load_scalable(path: &Path) -> Result<FontArc, RenderError> {
    let data = std::fs::read(path)
        .map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
    FontArc::try_from_vec(data)
        .map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))
}

fn draw_bitmap_text(canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let advance = (BUILTIN_GLYPH_SIZE * BUILTIN_SCALE) as i32;
    for (i, c) in text.chars().enumerate() {
        let glyph = bitmap_glyph(c);
        let origin_x = x + i as i32 * advance;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..BUILTIN_GLYPH_SIZE {
                if (*bits >> col) & 1 == 0 {
                    continue;
                }
                let px = origin_x + (col * BUILTIN_SCALE) as i32;
                let py = y + (row as u32 * BUILTIN_SCALE) as i32;
                fill_block(canvas, px, py, BUILTIN_SCALE, color);
            }
        }
    }
}

/// Bitmap for `c`; characters outside ASCII render as `?`.
fn bitmap_glyph(c: char) -> [u8; 8] {
    let index = if c.is_ascii() { c as usize } else { '?' as usize };
    font8x8::legacy::BASIC_LEGACY[index]
}

fn fill_block(canvas: &mut RgbImage, x: i32, y: i32, size: u32, color: Rgb<u8>) {
    for dy in 0..size as i32 {
        for dx in 0..size as i32 {
            let (px, py) = (x + dx, y + dy);
            let inside = px >= 0
                && py >= 0
                && (px as u32) < canvas.width()
                && (py as u32) < canvas.height();
            if inside {
                canvas.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_font_falls_back_to_builtin() {
        let fonts = FontSet::from_candidates(&[PathBuf::from("/nonexistent/fonts/arial.ttf")]);
        assert!(fonts.is_builtin());
    }

    #[test]
    fn test_corrupt_font_falls_back_to_builtin() {
        let path = std::env::temp_dir()
            .join(format!("confession-box-bad-font-{}.ttf", std::process::id()));
        std::fs::write(&path, b"definitely not a font").unwrap();

        assert!(matches!(load_scalable(&path), Err(RenderError::Font(_))));
        assert!(FontSet::from_candidates(&[path.clone()]).is_builtin());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_role_sizes() {
        assert_eq!(TextRole::Title.size(), 48.0);
        assert_eq!(TextRole::Subtitle.size(), 24.0);
        assert_eq!(TextRole::Body.size(), 26.0);
        assert_eq!(TextRole::Timestamp.size(), 22.0);
    }

    #[test]
    fn test_bitmap_text_draws_pixels() {
        let mut canvas = RgbImage::from_pixel(64, 32, Rgb([255, 255, 255]));
        let ink = Rgb([0, 0, 0]);
        FontSet::Builtin.draw(&mut canvas, TextRole::Body, 0, 0, "Hi", ink);
        assert!(canvas.pixels().any(|p| *p == ink));
    }

    #[test]
    fn test_bitmap_text_clipped_at_edges() {
        let mut canvas = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        FontSet::Builtin.draw(&mut canvas, TextRole::Title, -5, 5, "WWW", Rgb([0, 0, 0]));
    }

    #[test]
    fn test_scalable_text_draws_pixels() {
        let Some(font) = SYSTEM_FONTS
            .iter()
            .find_map(|path| load_scalable(Path::new(path)).ok())
        else {
            eprintln!("no system font installed, skipping");
            return;
        };
        let mut canvas = RgbImage::from_pixel(200, 80, Rgb([255, 255, 255]));
        FontSet::Scalable(font).draw(&mut canvas, TextRole::Title, 4, 4, "Hi", Rgb([0, 0, 0]));
        assert!(canvas.pixels().any(|p| p.0[0] < 128));
    }

    #[test]
    fn test_non_ascii_uses_placeholder() {
        assert_eq!(bitmap_glyph('é'), bitmap_glyph('?'));
    }
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Card geometry: text wrapping and the positions of every element.

use image::Rgb;

pub const CANVAS_WIDTH: u32 = 1200;
pub const PADDING: u32 = 60;
pub const LINE_HEIGHT: u32 = 30;
pub const LINE_SPACING: u32 = 15;
pub const MAX_CHARS_PER_LINE: usize = 80;
pub const TITLE_HEIGHT: u32 = 120;
pub const TIMESTAMP_HEIGHT: u32 = 60;
pub const CARD_INSET: u32 = 40;
pub const SHADOW_OFFSET: u32 = 8;
pub const CORNER_RADIUS: u32 = 20;
pub const ACCENT_BAR_HEIGHT: u32 = 6;
pub const SEPARATOR_THICKNESS: u32 = 3;

pub const GRADIENT_START: Rgb<u8> = Rgb([224, 237, 255]);
pub const GRADIENT_END: Rgb<u8> = Rgb([192, 216, 255]);
pub const CARD_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const TEXT_COLOR: Rgb<u8> = Rgb([15, 23, 42]);
pub const ACCENT_COLOR: Rgb<u8> = Rgb([37, 99, 235]);
pub const SUBTITLE_COLOR: Rgb<u8> = Rgb([107, 114, 128]);
pub const SHADOW_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
pub const SHADOW_ALPHA: u8 = 30;

pub const TITLE: &str = "Anonymous Confession";

/// Vertical distance between consecutive body lines.
pub const LINE_STEP: u32 = LINE_HEIGHT + LINE_SPACING;

/// Tallest card the renderer will allocate (1200 x 16384 RGB is about 59 MB).
pub const MAX_CANVAS_HEIGHT: u32 = 16_384;

/// Most wrapped lines that fit within [`MAX_CANVAS_HEIGHT`].
pub const MAX_LINE_COUNT: usize =
    ((MAX_CANVAS_HEIGHT - TITLE_HEIGHT - TIMESTAMP_HEIGHT - PADDING * 4) / LINE_STEP) as usize;

/// Split text into paragraphs and wrap each to [`MAX_CHARS_PER_LINE`].
///
/// Every non-blank paragraph is followed by one blank line; a blank
/// paragraph becomes a single blank line.
pub fn wrap_text(text: &str) -> Vec<String> {
    let options = textwrap::Options::new(MAX_CHARS_PER_LINE)
        .break_words(true)
        .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let flattened: String = paragraph
            .chars()
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .collect();
        lines.extend(
            textwrap::wrap(flattened.trim(), &options)
                .into_iter()
                .map(|line| line.into_owned()),
        );
        lines.push(String::new());
    }

    lines
}

/// Canvas height for a card holding `line_count` wrapped lines.
///
/// Saturates at `u32::MAX` instead of overflowing.
pub fn canvas_height(line_count: usize) -> u32 {
    let lines = u32::try_from(line_count).unwrap_or(u32::MAX);
    lines
        .saturating_mul(LINE_STEP)
        .saturating_add(TITLE_HEIGHT + TIMESTAMP_HEIGHT + PADDING * 4)
}

/// Linear interpolation between the gradient colors for pixel row `y`.
pub fn gradient_color(y: u32, height: u32) -> Rgb<u8> {
    let ratio = if height == 0 {
        0.0
    } else {
        y as f32 / height as f32
    };
    let channel = |i: usize| {
        let start = GRADIENT_START.0[i] as f32;
        let end = GRADIENT_END.0[i] as f32;
        (start + (end - start) * ratio) as u8
    };
    Rgb([channel(0), channel(1), channel(2)])
}

/// Inclusive pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn offset(self, by: i32) -> Self {
        Self {
            left: self.left + by,
            top: self.top + by,
            right: self.right + by,
            bottom: self.bottom + by,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }
}

/// Positions of every element on the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLayout {
    pub width: u32,
    pub height: u32,
    pub card: Rect,
    pub shadow: Rect,
    pub accent_bar: Rect,
    pub text_x: i32,
    pub title_y: i32,
    pub timestamp_y: i32,
    pub separator: Rect,
    /// Top edge of each body line
    pub line_ys: Vec<i32>,
}

impl CardLayout {
    pub fn new(line_count: usize) -> Self {
        let width = CANVAS_WIDTH;
        let height = canvas_height(line_count);
        let inset = CARD_INSET as i32;
        let padding = PADDING as i32;

        let card = Rect {
            left: inset,
            top: inset,
            right: width as i32 - inset,
            bottom: height as i32 - inset,
        };
        let accent_bar = Rect {
            bottom: card.top + ACCENT_BAR_HEIGHT as i32,
            ..card
        };

        let text_x = card.left + padding;
        let title_y = card.top + padding;
        let timestamp_y = title_y + TITLE_HEIGHT as i32;
        let separator_y = timestamp_y + TIMESTAMP_HEIGHT as i32;
        let half = SEPARATOR_THICKNESS as i32 / 2;
        let separator = Rect {
            left: text_x,
            top: separator_y - half,
            right: card.right - padding,
            bottom: separator_y - half + SEPARATOR_THICKNESS as i32 - 1,
        };

        let first_line_y = separator_y + padding;
        let line_ys = (0..line_count)
            .map(|i| first_line_y + (i as u32 * LINE_STEP) as i32)
            .collect();

        Self {
            width,
            height,
            card,
            shadow: card.offset(SHADOW_OFFSET as i32),
            accent_bar,
            text_x,
            title_y,
            timestamp_y,
            separator,
            line_ys,
        }
    }
}

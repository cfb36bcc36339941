//! Line wrapping and block measurement
//!
//! Lines are wrapped greedily on whitespace at a wrapping width and centered
//! horizontally around a shared x; the block is anchored at its top edge.

use crate::fit::TextExtent;
use crate::font::FontHandle;

/// A single wrapped line
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    /// Advance width in pixels
    pub width: f32,
}

/// Wrapped text with the vertical metrics needed to place it
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<Line>,
    pub font_size: f32,
    /// Baseline offset of the first line from the block top
    pub ascent: f32,
    /// Height of one line without the gap (ascent - descent)
    pub line_height: f32,
    /// Baseline-to-baseline distance
    pub line_advance: f32,
}

impl TextLayout {
    /// Width of the widest line
    pub fn width(&self) -> f32 {
        self.lines.iter().map(|l| l.width).fold(0.0, f32::max)
    }

    /// Height of the block from the top of the first line to the bottom of the last
    pub fn height(&self) -> f32 {
        match self.lines.len() {
            0 => 0.0,
            n => self.line_height + (n - 1) as f32 * self.line_advance,
        }
    }

    pub fn extent(&self) -> TextExtent {
        TextExtent::new(self.width(), self.height())
    }
}

/// Lay out `text` with `font` at `font_size`, wrapping at `wrap_width`
pub fn layout_text(font: &FontHandle, text: &str, font_size: f32, wrap_width: f32) -> TextLayout {
    let ascent = font.ascent(font_size);
    let line_height = ascent - font.descent(font_size);
    let line_advance = line_height + font.line_gap(font_size);

    TextLayout {
        lines: wrap_lines(text, wrap_width, |s| font.text_width(s, font_size)),
        font_size,
        ascent,
        line_height,
        line_advance,
    }
}

/// Split `text` into lines no wider than `wrap_width`
///
/// Explicit newlines always break. Within a paragraph words are joined by a
/// single space while the measured width stays within `wrap_width`; a word
/// wider than the limit gets a line of its own. An empty paragraph between
/// others yields an empty line; trailing empty lines are dropped so they take
/// no room in the block.
pub fn wrap_lines<F>(text: &str, wrap_width: f32, measure: F) -> Vec<Line>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate = format!("{current} {word}");
            if measure(&candidate) <= wrap_width {
                current = candidate;
            } else {
                let width = measure(&current);
                lines.push(Line {
                    text: std::mem::replace(&mut current, word.to_string()),
                    width,
                });
            }
        }

        let width = measure(&current);
        lines.push(Line {
            text: current,
            width,
        });
    }

    while lines.last().is_some_and(|line| line.text.is_empty()) {
        lines.pop();
    }

    lines
}

//! Greedy word wrap driven by measured pixel widths.

use crate::text::engine::TextMeasure;

/// Glyph whose width, times a character budget, gives a caption's pixel limit.
pub const REFERENCE_GLYPH: &str = "A";

/// Wrap `text` into lines whose measured width stays under `max_width_px`.
///
/// Words are split on single spaces (runs of spaces yield empty words, which are kept). A word
/// joins the current line only when the joined line measures strictly less than the limit, so a
/// word that is too wide on its own still gets a line to itself; words are never split. The
/// result always holds at least one line.
pub fn wrap_lines<M>(measure: &mut M, text: &str, size_px: f32, max_width_px: f32) -> Vec<String>
where
    M: TextMeasure + ?Sized,
{
    let mut words = text.split(' ');
    let mut current = words.next().unwrap_or_default().to_owned();
    let mut lines = Vec::new();

    for word in words {
        let candidate = format!("{current} {word}");
        if measure.measure(&candidate, size_px) < max_width_px {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        }
    }
    lines.push(current);
    lines
}

/// Pixel limit for a character budget: `max_chars × width(REFERENCE_GLYPH)`.
///
/// This is an approximation of the real string width, and line breaks depend on it.
pub fn reference_width<M>(measure: &mut M, max_chars: u32, size_px: f32) -> f32
where
    M: TextMeasure + ?Sized,
{
    max_chars as f32 * measure.measure(REFERENCE_GLYPH, size_px)
}

/// [`wrap_lines`] with the limit derived from a character budget.
pub fn wrap_to_char_budget<M>(measure: &mut M, text: &str, size_px: f32, max_chars: u32) -> Vec<String>
where
    M: TextMeasure + ?Sized,
{
    let limit = reference_width(measure, max_chars, size_px);
    wrap_lines(measure, text, size_px, limit)
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;

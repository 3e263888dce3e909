//! Greedy word wrapping for bubble text.
//!
//! Break opportunities come from UAX#14, so explicit newlines force a break
//! and words are never split: a word wider than the line sits alone on its
//! own line and overflows.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use super::metrics::char_width;

/// One wrapped line, trailing whitespace removed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WrappedLine {
    pub text: String,
    /// Advance width in points at the wrap font size.
    pub width: f64,
}

/// UAX#14 break opportunities indexed by char position. Entry `i` is the
/// opportunity *before* `chars[i]`; index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() reports byte offsets of the segment that follows the break.
    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }
    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn make_line(chars: &[char], widths: &[f64]) -> WrappedLine {
    let end = chars
        .iter()
        .rposition(|c| !c.is_whitespace())
        .map_or(0, |i| i + 1);
    WrappedLine {
        text: chars[..end].iter().collect(),
        width: widths[..end].iter().sum(),
    }
}

/// Wrap `text` to `max_width` points at `font_size`. Always returns at
/// least one line.
pub fn wrap_text(text: &str, max_width: f64, font_size: f64) -> Vec<WrappedLine> {
    if text.is_empty() {
        return vec![WrappedLine::default()];
    }

    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<f64> = chars
        .iter()
        .map(|&ch| if is_newline(ch) { 0.0 } else { char_width(ch, font_size) })
        .collect();
    let break_opps = compute_break_opportunities(text);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    // First char of the segment after the latest allowed break.
    let mut last_break: Option<usize> = None;

    for (i, &ch) in chars.iter().enumerate() {
        match break_opps[i] {
            Some(BreakOpportunity::Mandatory) if i > 0 => {
                lines.push(make_line(&chars[line_start..i], &widths[line_start..i]));
                line_start = i;
                line_width = 0.0;
                last_break = None;
            }
            Some(BreakOpportunity::Allowed) if i > 0 => last_break = Some(i),
            _ => {}
        }

        line_width += widths[i];
        if ch.is_whitespace() || line_width <= max_width {
            continue;
        }
        if let Some(bp) = last_break.filter(|&bp| bp > line_start) {
            lines.push(make_line(&chars[line_start..bp], &widths[line_start..bp]));
            line_start = bp;
            line_width = widths[bp..=i].iter().sum();
            last_break = None;
        }
    }

    lines.push(make_line(&chars[line_start..], &widths[line_start..]));
    lines
}

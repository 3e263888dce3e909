//! Helvetica advance widths.
//!
//! Bubble text is set in the PDF standard font Helvetica, which needs no
//! embedding. Wrapping measures with the same AFM widths the PDF viewer
//! uses, so a line that fits in the preview fits on paper.

/// Advance widths for U+0020..=U+007E, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Width used for characters outside the table.
const DEFAULT_WIDTH: u16 = 556;

/// Ascender and descender, in em.
pub const ASCENT: f64 = 0.718;
pub const DESCENT: f64 = 0.207;

/// Advance width of `ch` in points at `font_size`.
pub fn char_width(ch: char, font_size: f64) -> f64 {
    let code = ch as u32;
    let units = if (0x20..=0x7E).contains(&code) {
        HELVETICA_WIDTHS[(code - 0x20) as usize]
    } else {
        match ch {
            '\u{00A0}' => 278,
            '\u{2018}' | '\u{2019}' => 222,
            '\u{201C}' | '\u{201D}' => 333,
            '\u{2013}' => 556,
            '\u{2014}' => 1000,
            '\u{2026}' => 1000,
            _ => DEFAULT_WIDTH,
        }
    };
    units as f64 / 1000.0 * font_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_width() {
        assert!((char_width(' ', 12.0) - 3.336).abs() < 1e-9);
    }

    #[test]
    fn test_table_alignment() {
        assert_eq!(HELVETICA_WIDTHS.len(), 95);
        assert!((char_width('@', 1000.0) - 1015.0).abs() < 1e-9);
        assert!((char_width('W', 1000.0) - 944.0).abs() < 1e-9);
        assert!((char_width('i', 1000.0) - 222.0).abs() < 1e-9);
        assert!((char_width('~', 1000.0) - 584.0).abs() < 1e-9);
    }
}

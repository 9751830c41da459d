//! Plain-text layout for the standard Helvetica font.
//!
//! Lines are measured with the Helvetica AFM advance widths (1/1000 em) and
//! encoded with WinAnsiEncoding, the encoding used for the standard 14 fonts.

use crate::error::{Error, Result};

/// Helvetica advance widths for U+0020..=U+007E
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Helvetica advance widths for WinAnsi bytes 0x80..=0xFF (0 for unused codes)
const HELVETICA_HIGH_WIDTHS: [u16; 128] = [
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0, // 0x80
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667, // 0x90
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xA0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xB0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xD0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 0xE0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 0xF0
];

/// Width used for characters WinAnsi cannot encode
const DEFAULT_WIDTH: u16 = 556;

const TAB_EXPANSION: &str = "    ";

fn char_width(c: char) -> u16 {
    match win_ansi_byte(c) {
        Some(byte @ 0x20..=0x7E) => HELVETICA_ASCII_WIDTHS[usize::from(byte - 0x20)],
        Some(byte @ 0x80..=0xFF) => HELVETICA_HIGH_WIDTHS[usize::from(byte - 0x80)],
        _ => DEFAULT_WIDTH,
    }
}

/// Rendered width of `text` at `font_size`, in PDF units.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    #[allow(clippy::cast_precision_loss)]
    let units = units as f32;
    units * font_size / 1000.0
}

/// Normalize line endings and expand tabs.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', TAB_EXPANSION)
}

/// Break text into lines no wider than `max_width`.
///
/// Explicit newlines always break. Lines wrap only at single spaces; runs of
/// spaces and leading indentation are kept as written, except at a wrap point
/// where the spaces are dropped. A word wider than `max_width` gets a line of
/// its own.
pub fn wrap_text(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let space_width = text_width(" ", font_size);
    let mut lines = Vec::new();

    for paragraph in normalize(text).split('\n') {
        let mut words = paragraph.split(' ');
        let mut current = words.next().unwrap_or_default().to_string();
        let mut at_wrap = false;

        for word in words {
            if at_wrap {
                if !word.is_empty() {
                    current.push_str(word);
                    at_wrap = false;
                }
                continue;
            }

            let candidate_width =
                text_width(&current, font_size) + space_width + text_width(word, font_size);

            // Indentation stays attached to the first word
            if candidate_width <= max_width || current.trim().is_empty() {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(current.trim_end().to_string());
                current.clear();
                if word.is_empty() {
                    at_wrap = true;
                } else {
                    current.push_str(word);
                }
            }
        }

        if !at_wrap {
            lines.push(current);
        }
    }

    lines
}

/// Map a Unicode character to its WinAnsiEncoding byte.
fn win_ansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => u8::try_from(code).ok(),
        _ => match c {
            '€' => Some(0x80),
            '‚' => Some(0x82),
            'ƒ' => Some(0x83),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '†' => Some(0x86),
            '‡' => Some(0x87),
            'ˆ' => Some(0x88),
            '‰' => Some(0x89),
            'Š' => Some(0x8A),
            '‹' => Some(0x8B),
            'Œ' => Some(0x8C),
            'Ž' => Some(0x8E),
            '\u{2018}' => Some(0x91),
            '\u{2019}' => Some(0x92),
            '\u{201C}' => Some(0x93),
            '\u{201D}' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '˜' => Some(0x98),
            '™' => Some(0x99),
            'š' => Some(0x9A),
            '›' => Some(0x9B),
            'œ' => Some(0x9C),
            'ž' => Some(0x9E),
            'Ÿ' => Some(0x9F),
            _ => None,
        },
    }
}

/// Encode one line of text for a WinAnsi-encoded standard font.
pub fn encode_win_ansi(line: &str) -> Result<Vec<u8>> {
    line.chars()
        .map(|c| win_ansi_byte(c).ok_or(Error::TextEncoding(c)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        // "Hi" = 722 + 222 units
        assert!((text_width("Hi", 10.0) - 9.44).abs() < 1e-4);
        assert!(text_width("", 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_wrap_short_text_single_line() {
        let lines = wrap_text("Hello world", 12.0, 512.0);
        assert_eq!(lines, ["Hello world"]);
    }

    #[test]
    fn test_wrap_breaks_on_width() {
        // Each "aaaa" is 4 * 556 = 2224 units -> 22.24pt at size 10
        let lines = wrap_text("aaaa aaaa aaaa", 10.0, 50.0);
        assert_eq!(lines, ["aaaa aaaa", "aaaa"]);
    }

    #[test]
    fn test_wrap_keeps_explicit_newlines_and_blank_lines() {
        let lines = wrap_text("first\r\n\nthird", 12.0, 512.0);
        assert_eq!(lines, ["first", "", "third"]);
    }

    #[test]
    fn test_wrap_long_word_on_own_line() {
        let lines = wrap_text("a Supercalifragilistic b", 10.0, 30.0);
        assert_eq!(lines, ["a", "Supercalifragilistic", "b"]);
    }

    #[test]
    fn test_wrap_is_stable_on_already_wrapped_lines() {
        let text = "The quick brown fox jumps over the lazy dog again and again and again";
        let once = wrap_text(text, 12.0, 120.0);
        let twice = wrap_text(&once.join("\n"), 12.0, 120.0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_wrap_keeps_indentation_and_space_runs() {
        let lines = wrap_text("def f():\n\treturn  1", 12.0, 512.0);
        assert_eq!(lines, ["def f():", "    return  1"]);
    }

    #[test]
    fn test_wrap_drops_spaces_at_wrap_point() {
        let lines = wrap_text("aaaa   aaaa", 10.0, 30.0);
        assert_eq!(lines, ["aaaa", "aaaa"]);

        let lines = wrap_text("aaaa      ", 10.0, 30.0);
        assert_eq!(lines, ["aaaa"]);
    }

    #[test]
    fn test_wide_punctuation_widths() {
        // em dash and ellipsis are a full em, bullet is 350 units
        assert!((text_width("\u{2014}", 10.0) - 10.0).abs() < 1e-4);
        assert!((text_width("\u{2026}", 10.0) - 10.0).abs() < 1e-4);
        assert!((text_width("\u{2022}", 10.0) - 3.5).abs() < 1e-4);
        // Latin-1: copyright 737, e-acute 556
        assert!((text_width("\u{a9}\u{e9}", 1000.0) - 1293.0).abs() < 1e-2);
    }

    #[test]
    fn test_wrap_accounts_for_wide_punctuation() {
        // "a" (5.56) + space (2.78) + em dash (10.0) = 18.34 at size 10
        assert_eq!(wrap_text("a \u{2014}", 10.0, 18.0), ["a", "\u{2014}"]);
        assert_eq!(wrap_text("a \u{2014}", 10.0, 18.5), ["a \u{2014}"]);
    }

    #[test]
    fn test_normalize_tabs() {
        assert_eq!(normalize("a\tb"), "a    b");
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Abc").unwrap(), b"Abc");
        assert_eq!(encode_win_ansi("café").unwrap(), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("€—").unwrap(), vec![0x80, 0x97]);
    }

    #[test]
    fn test_encode_rejects_unmappable() {
        assert!(matches!(encode_win_ansi("日本"), Err(Error::TextEncoding('日'))));
    }
}

//! Caret and display-width helpers.
//!
//! Carets throughout the engine are `char` offsets, the unit a host text
//! field reports. These helpers convert them to byte offsets for slicing.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Length of `s` in chars (the caret unit).
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `caret`-th char. Carets past the end clamp to `s.len()`.
pub fn caret_to_byte(s: &str, caret: usize) -> usize {
    s.char_indices().nth(caret).map_or(s.len(), |(i, _)| i)
}

/// Char offset of a byte offset. The byte offset must be a char boundary.
pub fn byte_to_caret(s: &str, byte_offset: usize) -> usize {
    s[..byte_offset.min(s.len())].chars().count()
}

/// Split `s` at a char caret, clamping carets past the end.
pub fn split_at_caret(s: &str, caret: usize) -> (&str, &str) {
    s.split_at(caret_to_byte(s, caret))
}

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.split('\t')
        .enumerate()
        .map(|(i, part)| {
            let w = UnicodeWidthStr::width(part);
            if i > 0 { w + 4 } else { w }
        })
        .sum()
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells <= 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1; // reserve 1 cell for '…'
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = grapheme_display_width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}

fn grapheme_display_width(g: &str) -> usize {
    if g == "\t" {
        return 4;
    }
    UnicodeWidthStr::width(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_to_byte_ascii() {
        assert_eq!(caret_to_byte("hello", 0), 0);
        assert_eq!(caret_to_byte("hello", 3), 3);
        assert_eq!(caret_to_byte("hello", 5), 5);
        assert_eq!(caret_to_byte("hello", 99), 5);
    }

    #[test]
    fn caret_to_byte_multibyte() {
        // "é" is two bytes, "日" three
        assert_eq!(caret_to_byte("é日x", 1), 2);
        assert_eq!(caret_to_byte("é日x", 2), 5);
        assert_eq!(byte_to_caret("é日x", 5), 2);
    }

    #[test]
    fn split_at_caret_clamps() {
        assert_eq!(split_at_caret("Write report", 5), ("Write", " report"));
        assert_eq!(split_at_caret("abc", 10), ("abc", ""));
        assert_eq!(split_at_caret("日本", 1), ("日", "本"));
    }

    #[test]
    fn display_width_cjk_and_tab() {
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width("日本"), 4);
        assert_eq!(display_width("a\tb"), 6);
    }

    #[test]
    fn truncate_behaviour() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 6), "hello\u{2026}");
        assert_eq!(truncate_to_width("日本語", 5), "日本\u{2026}");
        assert_eq!(truncate_to_width("hello", 0), "");
        assert_eq!(truncate_to_width("hello", 1), "\u{2026}");
    }
}

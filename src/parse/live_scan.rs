use indexmap::IndexSet;

use crate::parse::token_parser::{Token, classify};
use crate::util::unicode::{byte_to_caret, caret_to_byte};

/// Result of stripping finished tags from a field being typed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagScan {
    pub next_value: String,
    /// Char offset in `next_value`
    pub next_caret: usize,
    /// Lowercase names of the removed tags, deduplicated
    pub committed: Vec<String>,
}

/// Strip `#tag` tokens that are already followed by whitespace, keeping an
/// unterminated `#partial` intact.
///
/// Hosts call this only right after a whitespace character was typed. Each
/// removed span is the tag plus the one whitespace char that finished it.
/// The caret (a char offset) moves left by the length of every span removed
/// entirely before it. A tag the caret sits inside, or right at the end of,
/// is still being edited and is left alone.
pub fn scan_completed_tags(value: &str, caret: usize) -> TagScan {
    let caret_byte = caret_to_byte(value, caret);

    let mut removed: Vec<(usize, usize)> = Vec::new();
    let mut committed: IndexSet<String> = IndexSet::new();
    let mut word_start: Option<usize> = None;

    for (i, c) in value.char_indices() {
        if !c.is_whitespace() {
            word_start.get_or_insert(i);
            continue;
        }
        let Some(start) = word_start.take() else {
            continue;
        };
        let Some(Token::Tag(name)) = classify(&value[start..i]) else {
            continue;
        };
        if start < caret_byte && caret_byte <= i {
            continue;
        }
        committed.insert(name.to_lowercase());
        removed.push((start, i + c.len_utf8()));
    }

    if removed.is_empty() {
        return TagScan {
            next_value: value.to_string(),
            next_caret: caret.min(byte_to_caret(value, value.len())),
            committed: Vec::new(),
        };
    }

    let mut next_value = String::with_capacity(value.len());
    let mut cursor = 0;
    let mut next_caret_byte = caret_byte;
    for &(start, end) in &removed {
        next_value.push_str(&value[cursor..start]);
        cursor = end;
        if end <= caret_byte {
            next_caret_byte -= end - start;
        }
    }
    next_value.push_str(&value[cursor..]);

    TagScan {
        next_caret: byte_to_caret(&next_value, next_caret_byte),
        next_value,
        committed: committed.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_tag_is_removed_and_caret_follows() {
        let scan = scan_completed_tags("buy #milk ", 10);
        assert_eq!(scan.next_value, "buy ");
        assert_eq!(scan.next_caret, 4);
        assert_eq!(scan.committed, vec!["milk"]);
    }

    #[test]
    fn partial_tag_is_untouched() {
        let scan = scan_completed_tags("buy #mil", 8);
        assert_eq!(scan.next_value, "buy #mil");
        assert_eq!(scan.next_caret, 8);
        assert!(scan.committed.is_empty());
    }

    #[test]
    fn only_terminated_tags_go() {
        let scan = scan_completed_tags("#a then #b #par", 15);
        assert_eq!(scan.next_value, "then #par");
        assert_eq!(scan.next_caret, 9);
        assert_eq!(scan.committed, vec!["a", "b"]);
    }

    #[test]
    fn tags_after_caret_do_not_move_it() {
        // Space typed at offset 3; the tag later in the line is finished
        let scan = scan_completed_tags("go  #Later stuff", 3);
        assert_eq!(scan.next_value, "go  stuff");
        assert_eq!(scan.next_caret, 3);
        assert_eq!(scan.committed, vec!["later"]);
    }

    #[test]
    fn tag_containing_caret_is_kept() {
        let scan = scan_completed_tags("x #work y", 5);
        assert_eq!(scan.next_value, "x #work y");
        assert_eq!(scan.next_caret, 5);
        let at_end = scan_completed_tags("x #work y", 7);
        assert_eq!(at_end.next_value, "x #work y");
    }

    #[test]
    fn intent_tokens_are_not_scanned() {
        let scan = scan_completed_tags("call !soon ", 11);
        assert_eq!(scan.next_value, "call !soon ");
        assert!(scan.committed.is_empty());
    }

    #[test]
    fn caret_is_char_based() {
        let scan = scan_completed_tags("é #日x z", 7);
        // "#日x" is not a valid tag name, nothing changes
        assert_eq!(scan.next_value, "é #日x z");
        let scan = scan_completed_tags("é #t z", 5);
        assert_eq!(scan.next_value, "é z");
        assert_eq!(scan.next_caret, 2);
    }
}

use serde::Serialize;

/// A single timeline entry, text already flattened to one line
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: u64,
    pub text: String,
}

impl Post {
    pub fn new(id: u64, full_text: &str) -> Self {
        Self {
            id,
            text: flatten_text(full_text),
        }
    }
}

const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Joins every line of `text` with a single space.
///
/// `\r\n` counts as one break and a trailing break does not produce a trailing space.
/// Blank lines are kept as empty segments, so `"a\n\nb"` becomes `"a  b"`.
pub fn flatten_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let mut lines: Vec<&str> = text.split(LINE_BREAKS).collect();
    if lines.len() > 1 && lines.last() == Some(&"") {
        lines.pop();
    }
    lines.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn flattens_newlines_to_spaces() {
        assert_eq!(flatten_text("a\nb"), "a b");
        assert_eq!(flatten_text("one\r\ntwo\rthree"), "one two three");
        assert_eq!(flatten_text("para\u{2028}graph"), "para graph");
    }

    #[test]
    fn trailing_break_is_dropped() {
        assert_eq!(flatten_text("hello\n"), "hello");
        assert_eq!(flatten_text("\n"), "");
        assert_eq!(flatten_text(""), "");
    }

    #[test]
    fn blank_lines_keep_their_slot() {
        assert_eq!(flatten_text("a\n\nb"), "a  b");
    }

    #[test]
    fn single_line_is_untouched() {
        assert_eq!(flatten_text("just one line"), "just one line");
        assert_eq!(Post::new(7, "x\ny").text, "x y");
    }

    proptest! {
        #[test]
        fn flattened_text_has_no_line_breaks(
            parts in prop::collection::vec("[a-z ]{0,8}", 1..6),
            sep in prop::sample::select(vec!["\n", "\r\n", "\r", "\u{2028}", "\x0c"]),
        ) {
            let text = parts.join(sep);
            let flat = flatten_text(&text);
            prop_assert!(!flat.contains(LINE_BREAKS));
        }
    }
}

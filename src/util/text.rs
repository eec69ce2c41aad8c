use std::borrow::Cow;

use scraper::Html;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Decodes HTML character references (`&amp;`, `&hellip;`, `&#39;`, `&#x2019;`, ...).
///
/// Decoding is delegated to the html5ever tokenizer, so every named entity
/// HTML defines is handled. Input without `&` is returned borrowed.
///
/// Tag-like text is kept literally: `<` is escaped before tokenizing, so only
/// character references change.
///
/// # Examples
///
/// ```
/// use cragfeed::util::decode_entities;
///
/// assert_eq!(decode_entities("Tan &amp; Handsome"), "Tan & Handsome");
/// assert_eq!(decode_entities("Desert Pony&hellip;"), "Desert Pony\u{2026}");
/// assert_eq!(decode_entities("it&#39;s"), "it's");
/// ```
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let fragment = Html::parse_fragment(&s.replace('<', "&lt;"));
    Cow::Owned(fragment.root_element().text().collect())
}

/// Collapses every run of whitespace into a single space and trims both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turns a URL slug into a display name: `desert-pony-buttress` → `Desert Pony Buttress`.
///
/// Only the first character of each word is upper-cased; the rest is kept as is.
/// Empty words from doubled hyphens are skipped.
pub fn slug_to_title(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display width of a string in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: char = '…';

/// Truncates to at most `max_width` columns, ending with `…` when cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    let budget = max_width - 1;
    let mut width = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        end = idx + c.len_utf8();
    }
    let mut out = s[..end].trim_end().to_string();
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

/// Greedy word wrap to `width` columns.
///
/// Explicit newlines start a new line. Words wider than the line are split at
/// character boundaries. A zero width yields no lines.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = display_width(word);
            let sep = usize::from(!current.is_empty());

            if current_width + sep + word_width <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                current_width += sep + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }

            if word_width <= width {
                current.push_str(word);
                current_width = word_width;
            } else {
                for c in word.chars() {
                    let w = UnicodeWidthChar::width(c).unwrap_or(0);
                    if current_width + w > width && !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                        current_width = 0;
                    }
                    current.push(c);
                    current_width += w;
                }
            }
        }
        lines.push(current);
    }

    // Trailing blank lines from a trailing newline carry no content.
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

fn is_stripped_control(c: char) -> bool {
    c == '\u{7f}' || (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r'))
}

/// Removes terminal control characters and ANSI escape sequences.
///
/// Feed text is attacker-controlled; rendering a raw ESC sequence could move
/// the cursor or retitle the terminal. Strips CSI (`ESC [ ... final`), OSC
/// (`ESC ] ... BEL` or `ESC ] ... ESC \`), bare ESC, DEL and C0 controls other
/// than tab, newline and carriage return. Clean input is returned borrowed.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    for n in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&n) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(n) = chars.next() {
                        if n == '\x07' {
                            break;
                        }
                        if n == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_stripped_control(c) {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named_and_numeric() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&quot;quoted&quot;"), "\"quoted\"");
        assert_eq!(decode_entities("caf&#233;"), "café");
        assert_eq!(decode_entities("&#x2019;"), "\u{2019}");
        assert_eq!(decode_entities("wait&hellip;"), "wait\u{2026}");
    }

    #[test]
    fn test_decode_without_entities_is_borrowed() {
        let result = decode_entities("plain text");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_decode_bare_ampersand_kept() {
        assert_eq!(decode_entities("Tan & Handsome"), "Tan & Handsome");
    }

    #[test]
    fn test_decode_keeps_tag_like_text() {
        assert_eq!(
            decode_entities("a #2 &amp; a <blue> cam &amp; go"),
            "a #2 & a <blue> cam & go"
        );
        assert_eq!(decode_entities("&lt;blue&gt; <b>x</b>"), "<blue> <b>x</b>");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_slug_to_title() {
        assert_eq!(slug_to_title("desert-pony-buttress"), "Desert Pony Buttress");
        assert_eq!(slug_to_title("the-5-10-wall"), "The 5 10 Wall");
        assert_eq!(slug_to_title("double--dash"), "Double Dash");
        assert_eq!(slug_to_title(""), "");
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("Short", 10), "Short");
        assert_eq!(truncate_to_width("Hello World", 8), "Hello W…");
        assert_eq!(truncate_to_width("Hello World", 7), "Hello…");
        assert_eq!(truncate_to_width("Hello World", 0), "");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK char is two columns.
        assert_eq!(truncate_to_width("日本語テキスト", 7), "日本語…");
    }

    #[test]
    fn test_wrap_lines_words() {
        let lines = wrap_lines("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_wrap_lines_newlines_and_long_words() {
        let lines = wrap_lines("ab\nabcdefghij", 4);
        assert_eq!(lines, vec!["ab", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_lines_zero_width() {
        assert!(wrap_lines("anything", 0).is_empty());
        assert!(wrap_lines("", 10).is_empty());
    }

    #[test]
    fn test_strip_clean_text_borrowed() {
        let result = strip_control_chars("line1\nline2\ttab");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_controls_and_ansi() {
        assert_eq!(strip_control_chars("he\x00ll\x07o"), "hello");
        assert_eq!(strip_control_chars("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_control_chars("\x1b]0;title\x07safe"), "safe");
        assert_eq!(strip_control_chars("\x1b]0;title\x1b\\safe"), "safe");
        assert_eq!(strip_control_chars("a\x1bb"), "ab");
        assert_eq!(strip_control_chars("del\x7fete"), "delete");
    }
}

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{replace_any, replace_any_with, CharSet};

/// Characters that are invalid in filenames but still read as something
/// meaningful. These get swapped for their fullwidth homoglyphs.
pub const VISIBLE_INVALID_CHARS: CharSet<'static> =
    CharSet::new(&['"', '*', ':', '<', '>', '?', '|', '/', '\\']);

/// Every character that may not appear in a filename, including control codes.
///
/// This is the Windows set, used on every host: it is a superset of
/// [`VISIBLE_INVALID_CHARS`], and names built on one machine stay valid when
/// the files are moved to another.
pub const ALL_INVALID_CHARS: CharSet<'static> = CharSet::new(&[
    '"', '<', '>', '|', '\0', '\u{1}', '\u{2}', '\u{3}', '\u{4}', '\u{5}', '\u{6}', '\u{7}',
    '\u{8}', '\t', '\n', '\u{b}', '\u{c}', '\r', '\u{e}', '\u{f}', '\u{10}', '\u{11}', '\u{12}',
    '\u{13}', '\u{14}', '\u{15}', '\u{16}', '\u{17}', '\u{18}', '\u{19}', '\u{1a}', '\u{1b}',
    '\u{1c}', '\u{1d}', '\u{1e}', '\u{1f}', ':', '*', '?', '\\', '/',
]);

// https://en.wikipedia.org/wiki/Halfwidth_and_Fullwidth_Forms_(Unicode_block)
const FULL_WIDTH_OFFSET: u32 = 0xFEE0;

static TIMESTAMP_COLON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d:\d\d").expect("timestamp pattern is valid"));

/// Makes `name` safe to use as a single path component.
///
/// Clock-like colons (`12:34`) become `_`, the visible invalid characters
/// become their fullwidth forms and anything else the filesystem rejects
/// becomes `_`. The result never contains a character from
/// [`ALL_INVALID_CHARS`], and sanitizing it again returns it unchanged.
///
/// The input is borrowed back when nothing needed replacing.
pub fn sanitize_filename(name: &str) -> Cow<'_, str> {
    if name.is_empty() {
        return Cow::Borrowed(name);
    }

    let name = then(Cow::Borrowed(name), collapse_timestamps);
    let name = then(name, to_fullwidth);
    then(name, to_underscore)
}

fn then<'a>(input: Cow<'a, str>, step: fn(&str) -> Cow<'_, str>) -> Cow<'a, str> {
    match input {
        Cow::Borrowed(s) => step(s),
        Cow::Owned(s) => {
            let replaced = match step(&s) {
                Cow::Borrowed(_) => None,
                Cow::Owned(replaced) => Some(replaced),
            };
            Cow::Owned(replaced.unwrap_or(s))
        }
    }
}

/// Replaces each `:` sitting between a digit and two more digits with `_`.
fn collapse_timestamps(name: &str) -> Cow<'_, str> {
    let mut colons = Vec::new();
    let mut start = 0;
    // Resume right after each colon so the trailing digits of one match can
    // lead the next one ("1:23:45").
    while let Some(found) = TIMESTAMP_COLON.find_at(name, start) {
        let colon = found.start() + found.as_str().find(':').unwrap_or_default();
        colons.push(colon);
        start = colon + 1;
    }

    if colons.is_empty() {
        return Cow::Borrowed(name);
    }

    let mut out = String::with_capacity(name.len());
    let mut copied = 0;
    for colon in colons {
        out.push_str(&name[copied..colon]);
        out.push('_');
        copied = colon + 1;
    }
    out.push_str(&name[copied..]);

    Cow::Owned(out)
}

fn to_fullwidth(name: &str) -> Cow<'_, str> {
    replace_any_with(name, &VISIBLE_INVALID_CHARS, |ch| {
        char::from_u32(ch as u32 + FULL_WIDTH_OFFSET).unwrap_or('_')
    })
}

fn to_underscore(name: &str) -> Cow<'_, str> {
    replace_any(name, &ALL_INVALID_CHARS, '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("hello/world"), "hello／world");
        assert_eq!(sanitize_filename("test<>file"), "test＜＞file");
        assert_eq!(sanitize_filename("normal_file.mp4"), "normal_file.mp4");
        assert_eq!(sanitize_filename("a:bc"), "a：bc");
        assert_eq!(sanitize_filename("what?|*\"\\"), "what？｜＊＂＼");
    }

    #[test]
    fn test_timestamps_collapse_before_fullwidth() {
        assert_eq!(sanitize_filename("12:34:56"), "12_34_56");
        assert_eq!(sanitize_filename("1:23"), "1_23");
        // needs two digits after the colon
        assert_eq!(sanitize_filename("1:2"), "1：2");
        assert_eq!(sanitize_filename("a:12"), "a：12");
        assert_eq!(sanitize_filename("Round 3: 10:05 PM"), "Round 3： 10_05 PM");
    }

    #[test]
    fn test_control_chars_become_underscores() {
        assert_eq!(sanitize_filename("line\nbreak\ttab\0"), "line_break_tab_");
    }

    #[test]
    fn test_sanitize_returns_borrowed_when_clean() {
        assert!(matches!(sanitize_filename(""), Cow::Borrowed("")));
        assert!(matches!(sanitize_filename("clean name"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "",
            "12:34:56",
            "a:bc",
            "\"*:<>?|/\\",
            "\u{1}\u{1f}ctrl",
            "Just Chatting | !drops 10:00",
            "ＦＵＬＬ：ｗｉｄｔｈ",
            "日本語/タイトル?",
        ];

        for input in inputs {
            let once = sanitize_filename(input).into_owned();
            let twice = sanitize_filename(&once);
            assert_eq!(twice, once.as_str(), "input: {input:?}");
            assert!(matches!(twice, Cow::Borrowed(_)), "input: {input:?}");
        }
    }

    #[test]
    fn test_sanitize_covers_every_invalid_char() {
        let all: String = (0u32..128).filter_map(char::from_u32).collect();
        let sanitized = sanitize_filename(&all);
        assert!(!sanitized.chars().any(|ch| ALL_INVALID_CHARS.contains(ch)));
    }
}

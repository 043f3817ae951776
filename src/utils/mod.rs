pub mod sanitize;

use std::borrow::Cow;

pub use sanitize::{sanitize_filename, ALL_INVALID_CHARS, VISIBLE_INVALID_CHARS};

/// A fixed set of characters to search for.
///
/// ASCII members are kept in a bitmap so the common case is a single mask
/// test; anything wider falls back to a scan of the (small) source slice.
/// `new` is `const`, so sets used on every call can live in statics.
#[derive(Debug, Clone, Copy)]
pub struct CharSet<'a> {
    ascii: u128,
    chars: &'a [char],
}

impl<'a> CharSet<'a> {
    pub const fn new(chars: &'a [char]) -> Self {
        let mut ascii = 0u128;
        let mut i = 0;
        while i < chars.len() {
            let code = chars[i] as u32;
            if code < 128 {
                ascii |= 1u128 << code;
            }
            i += 1;
        }

        Self { ascii, chars }
    }

    pub fn contains(&self, ch: char) -> bool {
        let code = ch as u32;
        if code < 128 {
            self.ascii & (1u128 << code) != 0
        } else {
            self.chars.contains(&ch)
        }
    }
}

/// Replaces every character of `old_chars` found in `s` with `new_char`.
///
/// Returns `Cow::Borrowed(s)` when `s` is empty or contains none of the
/// characters, so callers can tell a no-op apart without comparing strings.
pub fn replace_any<'s>(s: &'s str, old_chars: &CharSet<'_>, new_char: char) -> Cow<'s, str> {
    replace_any_with(s, old_chars, |_| new_char)
}

/// Like [`replace_any`], but computes each replacement from the original
/// character. The callback runs exactly once per match, left to right.
pub fn replace_any_with<'s, F>(s: &'s str, old_chars: &CharSet<'_>, mut replacement: F) -> Cow<'s, str>
where
    F: FnMut(char) -> char,
{
    let Some(first) = s.find(|ch: char| old_chars.contains(ch)) else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);

    let mut copied = first;
    for (index, ch) in s[first..].char_indices() {
        if !old_chars.contains(ch) {
            continue;
        }
        let index = first + index;
        out.push_str(&s[copied..index]);
        out.push(replacement(ch));
        copied = index + ch.len_utf8();
    }
    out.push_str(&s[copied..]);

    Cow::Owned(out)
}

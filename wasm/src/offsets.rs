//! The engine counts offsets in chars; the DOM (`selectionStart`, `setSelectionRange`)
//! counts UTF-16 code units.

/// Char index at UTF-16 offset `units`. An offset inside a surrogate pair rounds up to the
/// end of that char; offsets past the end clamp to it.
pub fn char_offset(text: &str, units: usize) -> usize {
    let mut seen = 0;
    for (index, c) in text.chars().enumerate() {
        if seen >= units {
            return index;
        }
        seen += c.len_utf16();
    }
    text.chars().count()
}

/// UTF-16 offset of char index `chars`.
pub fn utf16_offset(text: &str, chars: usize) -> usize {
    text.chars().take(chars).map(char::len_utf16).sum()
}

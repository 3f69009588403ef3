//! Comment stripping and tokenizing

/// Remove any `#` or `//` comment and surrounding whitespace.
///
/// `#` opens a comment only at the start of a token, so sharps such as
/// `G#3` survive.
pub fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut end = line.len();
    for (i, &b) in bytes.iter().enumerate() {
        let token_start = i == 0 || bytes[i - 1].is_ascii_whitespace();
        if (b == b'#' && token_start) || bytes[i..].starts_with(b"//") {
            end = i;
            break;
        }
    }
    line[..end].trim()
}

/// Split a raw line into whitespace-separated tokens.
///
/// Blank and comment-only lines produce no tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    strip_comment(line).split_whitespace().collect()
}

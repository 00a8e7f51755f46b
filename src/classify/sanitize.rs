//! Gateway validation message splitting.

use regex::Regex;
use std::sync::LazyLock;

/// One `" : <text>"` segment, stopping at the next colon.
static SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(" : [^:]+").expect("segment pattern is a valid regex"));

/// Width of the `", 3095"` tail that the next error code leaves on a segment.
const NEXT_CODE_TAIL: usize = 6;

/// Split a gateway validation message into human-readable errors.
///
/// The gateway joins errors as `"<code> : <description>"` pairs, e.g.
///
/// ```text
/// 2174 : For inter-state transaction, CGST and SGST amounts are not applicable; only IGST amount is applicable, 3095 : Supplier GSTIN is inactive
/// ```
///
/// Each `" : [^:]+"` match is taken, its colons removed and whitespace
/// trimmed. Every segment except the last still ends with the next pair's
/// code (`", 3095"`), so its final 6 characters are cut off.
///
/// The cut is positional, not parsed. It assumes 4-digit codes joined by
/// `", "`; a 5-digit code leaves the separating comma behind
/// (`"a, 31095"` becomes `"a,"`) and a description containing `" : "` or
/// `":"` is split or truncated. Existing callers depend on this exact
/// output, so it is reproduced as is.
///
/// ```
/// use gstlink::classify::sanitize_error_message;
///
/// assert_eq!(
///     sanitize_error_message("2174 : msg1, 3095 : msg2"),
///     vec!["msg1", "msg2"],
/// );
/// assert!(sanitize_error_message("").is_empty());
/// assert_eq!(sanitize_error_message("plain message"), vec!["plain message"]);
/// ```
pub fn sanitize_error_message(message: &str) -> Vec<String> {
    if message.is_empty() {
        return Vec::new();
    }

    if !message.contains(" : ") {
        return vec![message.to_string()];
    }

    let segments: Vec<&str> = SEGMENT.find_iter(message).map(|m| m.as_str()).collect();
    let last = segments.len().saturating_sub(1);

    segments
        .iter()
        .enumerate()
        .map(|(idx, segment)| {
            let cleaned = segment.replace(':', "");
            let cleaned = cleaned.trim();
            if idx == last {
                cleaned.to_string()
            } else {
                drop_last_chars(cleaned, NEXT_CODE_TAIL).to_string()
            }
        })
        .collect()
}

/// Character-wise `s[..len - n]`, empty when `s` is not longer than `n`.
fn drop_last_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return "";
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

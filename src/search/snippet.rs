use std::collections::BTreeSet;

use super::tokenize::tokenize;

const ELLIPSIS: char = '…';

/// Short excerpt of `content` around the first line mentioning a query token.
///
/// Falls back to `title` when there is no content to excerpt.
pub fn make_snippet(
    content: Option<&str>,
    title: &str,
    query_tokens: &BTreeSet<String>,
    max_chars: usize,
) -> String {
    let content = match content.map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ => return title.to_string(),
    };

    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let start = lines
        .iter()
        .position(|line| tokenize(line).iter().any(|t| query_tokens.contains(t)))
        .unwrap_or(0);

    let joined = lines[start..].join(" ");
    truncate_chars(&joined, max_chars)
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].trim_end().to_string();
            cut.push(ELLIPSIS);
            cut
        }
    }
}

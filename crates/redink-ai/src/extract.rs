//! Pull a JSON payload out of free-form oracle replies.

use serde_json::Value;

/// Extract the first well-formed JSON payload from `text`.
///
/// A fenced code block is preferred. Otherwise the first balanced `{...}` or
/// `[...]` span is tried, starting from whichever opener comes first, then
/// the first span of the other kind.
pub fn parse_payload(text: &str) -> Option<Value> {
    if let Some(block) = fenced_block(text)
        && let Ok(value) = serde_json::from_str(block)
    {
        return Some(value);
    }

    let mut openers: Vec<(usize, char, char)> = [('{', '}'), ('[', ']')]
        .into_iter()
        .filter_map(|(open, close)| text.find(open).map(|at| (at, open, close)))
        .collect();
    openers.sort_by_key(|(at, _, _)| *at);

    openers.into_iter().find_map(|(at, open, close)| {
        let span = balanced_span(text, at, open, close)?;
        serde_json::from_str(span).ok()
    })
}

/// Contents of the first ``` fenced block, without its language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let body = &text[start..];
    let end = body.find("```")?;
    let body = &body[..end];

    let body = match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    };
    Some(body.trim())
}

/// The span from `start` to its matching closer, ignoring brackets in strings.
fn balanced_span(text: &str, start: usize, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

//! # Model Output Extraction
//!
//! Generative models rarely return bare JSON: responses arrive wrapped in
//! Markdown code fences, sentinel tokens, or conversational framing. This
//! module recovers the JSON payload from such a response so the rest of the
//! pipeline can parse it.

/// Recovers the most plausible JSON payload from a raw model response.
///
/// The text is cleaned in stages: surrounding whitespace is trimmed,
/// sentinel tokens (`<s>`, `</s>`) are removed, an `[OUT]...[/OUT]` wrapper
/// is reduced to its interior, and a Markdown code fence is unwrapped if
/// present. The cleaned text is then scanned for the outermost span of
/// whichever bracket kind opens first.
///
/// An empty input yields `"{}"`. Cleaned text whose first-opening bracket
/// kind has no well-ordered close is returned as-is, leaving the parse
/// failure to the caller.
pub fn extract_json(response: &str) -> String {
    if response.is_empty() {
        return "{}".to_string();
    }

    let mut text = response.trim().to_string();
    for token in ["<s>", "</s>"] {
        text = text.replace(token, "");
    }
    let mut text = text.trim();

    // An [OUT] wrapper marks the payload: only the first wrapper's interior
    // survives. A lone token without its counterpart is left in place.
    if let Some(open) = text.find("[OUT]") {
        let interior = &text[open + "[OUT]".len()..];
        if let Some(close) = interior.find("[/OUT]") {
            text = interior[..close].trim();
        }
    }

    let unfenced;
    if text.starts_with("```") {
        // Drop the opening fence line (which may carry a language tag) and
        // any closing fence.
        let body = match text.find('\n') {
            Some(pos) => &text[pos + 1..],
            None => text,
        };
        let body = body.trim_end();
        unfenced = body.strip_suffix("```").unwrap_or(body).to_string();
        text = unfenced.trim();
    }

    // The bracket kind that opens first owns the span. Its own last close
    // must follow the opener; the other kind is never substituted.
    let span = match (text.find('{'), text.find('[')) {
        (Some(obj), Some(arr)) if obj < arr => bracket_span(text, obj, '}'),
        (Some(obj), None) => bracket_span(text, obj, '}'),
        (_, Some(arr)) => bracket_span(text, arr, ']'),
        (None, None) => None,
    };

    match span {
        Some((start, end)) => text[start..=end].to_string(),
        None => text.to_string(),
    }
}

/// Returns the span from `start` to the last `close` character when that
/// close falls after the opener.
fn bracket_span(text: &str, start: usize, close: char) -> Option<(usize, usize)> {
    let end = text.rfind(close)?;
    (end > start).then_some((start, end))
}

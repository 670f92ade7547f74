//! String helpers shared by prompt rendering and reports.

/// Truncate a string to at most `max_len` bytes, appending `...` (UTF-8 safe).
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len.saturating_sub(3).min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Locate the JSON object embedded in a model response.
///
/// Checks, in order: a fenced block tagged with one of `tags` (or `json`),
/// the whole response, then the outermost `{ ... }` span.
pub fn extract_json_object<'a>(response: &'a str, tags: &[&str]) -> Option<&'a str> {
    let trimmed = response.trim();

    let mut search_from = 0;
    while let Some(rel) = trimmed[search_from..].find("```") {
        let fence_start = search_from + rel + 3;
        let Some(line_end) = trimmed[fence_start..].find('\n') else {
            break;
        };
        let tag = trimmed[fence_start..fence_start + line_end].trim();
        let body_start = fence_start + line_end + 1;
        let Some(close) = trimmed[body_start..].find("```") else {
            break;
        };
        let body = trimmed[body_start..body_start + close].trim();
        if (tag.is_empty() || tag == "json" || tags.contains(&tag)) && body.starts_with('{') {
            return Some(body);
        }
        search_from = body_start + close + 3;
    }

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

//! Parsing model output into typed results.

use copilot_common::{CopilotError, Result};
use serde::de::DeserializeOwned;
use std::str::FromStr;

/// Strip a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Deserialize a completion into `T`, tolerating code fences.
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T> {
    let body = strip_code_fences(content);
    if body.is_empty() {
        return Err(CopilotError::MalformedResponse(
            "completion was empty".into(),
        ));
    }
    serde_json::from_str(body).map_err(|e| {
        CopilotError::MalformedResponse(format!("completion is not the expected JSON: {e}"))
    })
}

/// Parse an optional enum field case-insensitively; absent means the default.
pub fn parse_enum<T>(field: &str, value: Option<&str>) -> Result<T>
where
    T: FromStr<Err = String> + Default,
{
    match value.map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(v) => v
            .parse()
            .map_err(|e| CopilotError::MalformedResponse(format!("invalid {field}: {e}"))),
    }
}

/// Keep non-blank list entries, trimmed.
pub fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

//! Locating the storyboard JSON inside free-form planner output.
//!
//! Planners often wrap JSON in markdown fences or surround it with prose.

use montage_error::{PlanningError, PlanningErrorKind};

/// Extract the storyboard JSON object from a planner response.
///
/// Tries a fenced code block first (```` ```json ```` or bare ```` ``` ````),
/// then the first balanced `{ ... }` span.
///
/// # Examples
///
/// ```
/// use montage_storyboard::extract_json;
///
/// let response = "Here is your storyboard:\n```json\n{\"scenes\": []}\n```\nEnjoy!";
/// assert_eq!(extract_json(response).unwrap(), "{\"scenes\": []}");
///
/// let response = "Sure! {\"scenes\": [{\"detailed_prompt\": \"a {curly} idea\"}]} Done.";
/// assert!(extract_json(response).unwrap().ends_with("]}"));
/// ```
pub fn extract_json(response: &str) -> Result<String, PlanningError> {
    if let Some(block) = extract_from_code_block(response)
        && let Some(json) = extract_balanced(&block, '{', '}')
    {
        return Ok(json);
    }

    if let Some(json) = extract_balanced(response, '{', '}') {
        return Ok(json);
    }

    tracing::warn!(
        response_length = response.len(),
        "No JSON object found in planner response"
    );
    Err(PlanningError::new(PlanningErrorKind::MissingPayload(
        format!("no JSON object in {} characters", response.len()),
    )))
}

/// Content of the first fenced code block, preferring a `json` fence.
///
/// An unclosed fence yields everything after it (truncated responses).
fn extract_from_code_block(response: &str) -> Option<String> {
    if let Some(start) = response.find("```json") {
        let content_start = start + "```json".len();
        return Some(match response[content_start..].find("```") {
            Some(end) => response[content_start..content_start + end].trim().to_string(),
            None => response[content_start..].trim().to_string(),
        });
    }

    let start = response.find("```")?;
    let content_start = start + 3;
    // Skip a language tag on the fence line
    let skip_to = response[content_start..]
        .find('\n')
        .map(|n| content_start + n + 1)
        .unwrap_or(content_start);

    Some(match response[skip_to..].find("```") {
        Some(end) => response[skip_to..skip_to + end].trim().to_string(),
        None => response[skip_to..].trim().to_string(),
    })
}

/// First span between balanced delimiters, ignoring delimiters in strings.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_json_fence_over_earlier_braces() {
        let response = "Note {not this}\n```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(response).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn bare_fence_with_language_tag() {
        let response = "```JSON\n{\"a\": 2}\n```";
        assert_eq!(extract_json(response).unwrap(), "{\"a\": 2}");
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let response = r#"{"a": "say \"}\" loudly"}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn unbalanced_object_is_missing_payload() {
        let err = extract_json("{\"a\": 1").unwrap_err();
        assert!(matches!(err.kind, PlanningErrorKind::MissingPayload(_)));
    }

    #[test]
    fn prose_only_is_missing_payload() {
        assert!(extract_json("I cannot help with that.").is_err());
    }
}

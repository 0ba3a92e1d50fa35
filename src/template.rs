//! Expansion of download URL patterns such as
//! `https://example.com/download/{{ .TagName }}/tool-{{ .TagName }}`.

use crate::error::TemplateError;
use regex::Regex;
use std::sync::LazyLock;

pub const TAG_NAME: &str = "TagName";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
});

/// Substitute every `{{ .Field }}` placeholder in `pattern` with its value from `params`.
pub fn expand(pattern: &str, params: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut expanded = String::with_capacity(pattern.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(pattern) {
        let (Some(whole), Some(field)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_literal(&mut expanded, &pattern[last..whole.start()], pattern)?;

        let value = params
            .iter()
            .find(|(name, _)| *name == field.as_str())
            .map(|(_, value)| *value)
            .ok_or_else(|| TemplateError::UnknownField {
                field: field.as_str().to_string(),
                pattern: pattern.to_string(),
            })?;
        expanded.push_str(value);
        last = whole.end();
    }
    push_literal(&mut expanded, &pattern[last..], pattern)?;

    Ok(expanded)
}

/// Expand a pattern whose only field is the release tag.
pub fn expand_tag(pattern: &str, tag_name: &str) -> Result<String, TemplateError> {
    expand(pattern, &[(TAG_NAME, tag_name)])
}

fn push_literal(out: &mut String, literal: &str, pattern: &str) -> Result<(), TemplateError> {
    if literal.contains("{{") || literal.contains("}}") {
        return Err(TemplateError::Malformed {
            pattern: pattern.to_string(),
        });
    }
    out.push_str(literal);
    Ok(())
}

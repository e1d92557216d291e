//! Placeholder substitution for config templates.
//!
//! Tokens look like `{{NAME}}`. Rendering is a single pass over the template,
//! so substituted values are never re-scanned for tokens.

use std::collections::HashMap;

use crate::error::TemplateError;

/// A resolved value ready for substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    /// Inserted inside a quoted field; validated before substitution.
    Text(String),
    /// Non-negative finite number; fractions allowed.
    Number(f64),
    /// Non-negative finite number that must be whole.
    Whole(f64),
    Integer(u64),
    Bool(bool),
    /// Pre-built block of template text, inserted as-is.
    Block(String),
}

impl TemplateValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    fn render(&self) -> String {
        match self {
            Self::Text(s) | Self::Block(s) => s.clone(),
            Self::Number(n) | Self::Whole(n) => format!("{n}"),
            Self::Integer(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// Reject text that would break out of a double-quoted TOML string.
pub fn validate_quoted(field: &str, value: &str) -> Result<(), TemplateError> {
    let invalid = |reason: &str| TemplateError::InvalidFieldValue {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let mut escaped = false;
    for c in value.chars() {
        match c {
            '\n' | '\r' => return Err(invalid("contains a line break")),
            '\\' => escaped = !escaped,
            '"' if !escaped => return Err(invalid("contains an unescaped '\"'")),
            _ => escaped = false,
        }
    }
    if escaped {
        return Err(invalid("ends with a backslash that escapes the closing quote"));
    }
    Ok(())
}

/// Reject numbers TOML cannot hold or a config field cannot take.
pub fn validate_number(field: &str, value: f64, whole: bool) -> Result<(), TemplateError> {
    let invalid = |reason: &str| TemplateError::InvalidFieldValue {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    if !value.is_finite() {
        return Err(invalid("must be a finite number"));
    }
    if value < 0.0 {
        return Err(invalid("must not be negative"));
    }
    if whole && value.fract() != 0.0 {
        return Err(invalid("must be a whole number"));
    }
    Ok(())
}

/// Substitute `values` into `template`.
///
/// Text and number values are validated first; the error names the offending
/// field (the token in lowercase, matching the config key it fills). Any token
/// without a value is an error.
pub fn render(
    kind: &str,
    template: &str,
    values: &[(&'static str, TemplateValue)],
) -> Result<String, TemplateError> {
    let mut lookup: HashMap<&str, String> = HashMap::with_capacity(values.len());
    for (token, value) in values {
        match value {
            TemplateValue::Text(text) => validate_quoted(&token.to_ascii_lowercase(), text)?,
            TemplateValue::Number(n) => validate_number(&token.to_ascii_lowercase(), *n, false)?,
            TemplateValue::Whole(n) => validate_number(&token.to_ascii_lowercase(), *n, true)?,
            TemplateValue::Integer(_) | TemplateValue::Bool(_) | TemplateValue::Block(_) => {}
        }
        lookup.insert(token, value.render());
    }

    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(TemplateError::UnresolvedToken {
                kind: kind.to_string(),
                token: after.to_string(),
            });
        };
        let token = &after[..end];
        let value = lookup
            .get(token)
            .ok_or_else(|| TemplateError::UnresolvedToken {
                kind: kind.to_string(),
                token: token.to_string(),
            })?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

//! Client-side check of the model's structured reply.
//!
//! The API is asked for JSON matching [`GeneratedContent`], but compliance is not
//! guaranteed, so every reply goes through [`validate`] before reaching callers.

use serde_json::{Map, Value};
use snafu::{OptionExt, ResultExt, Snafu};

use crate::{content::GeneratedContent, report::ErrorKind};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ValidationError {
    #[snafu(display("model reply is not valid JSON"))]
    MalformedJson { source: serde_json::Error },

    #[snafu(display("model reply has the wrong shape: '{field}' {problem}"))]
    SchemaMismatch { field: String, problem: String },
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Generation
    }
}

/// Parses `raw_text` as JSON and checks it against the content schema.
///
/// Malformed JSON and a well-formed document of the wrong shape are reported as
/// different variants. Values are returned as sent; unknown fields are ignored.
pub fn validate(raw_text: &str) -> Result<GeneratedContent, ValidationError> {
    let value: Value = serde_json::from_str(raw_text).context(MalformedJsonSnafu)?;

    let object = value.as_object().with_context(|| SchemaMismatchSnafu {
        field: "$",
        problem: format!("must be an object, found {}", type_name(&value)),
    })?;

    let title = required_text(object, "title")?;
    let caption = required_text(object, "caption")?;
    let hashtags = required_strings(object, "hashtags")?;

    Ok(GeneratedContent {
        title,
        caption,
        hashtags,
    })
}

fn required_text(object: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    let value = object.get(field).context(SchemaMismatchSnafu {
        field,
        problem: "is missing",
    })?;

    let text = value.as_str().with_context(|| SchemaMismatchSnafu {
        field,
        problem: format!("must be a string, found {}", type_name(value)),
    })?;

    if text.trim().is_empty() {
        return SchemaMismatchSnafu {
            field,
            problem: "must not be empty",
        }
        .fail();
    }

    Ok(text.to_string())
}

fn required_strings(
    object: &Map<String, Value>,
    field: &str,
) -> Result<Vec<String>, ValidationError> {
    let value = object.get(field).context(SchemaMismatchSnafu {
        field,
        problem: "is missing",
    })?;

    let items = value.as_array().with_context(|| SchemaMismatchSnafu {
        field,
        problem: format!("must be an array, found {}", type_name(value)),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .map(str::to_string)
                .with_context(|| SchemaMismatchSnafu {
                    field: format!("{field}[{index}]"),
                    problem: format!("must be a string, found {}", type_name(item)),
                })
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

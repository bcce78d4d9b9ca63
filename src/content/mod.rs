//! The title / caption / hashtags contract shared by requests and replies.

mod validator;

use schemars::{generate::SchemaSettings, JsonSchema, SchemaGenerator};
use serde::{Deserialize, Serialize};

pub use validator::{validate, ValidationError};

/// Social media copy generated for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedContent {
    /// A short, catchy title for the post.
    pub title: String,
    /// An engaging caption of two to four sentences.
    pub caption: String,
    /// Relevant hashtags, without the leading '#'.
    pub hashtags: Vec<String>,
}

impl GeneratedContent {
    /// The `responseSchema` sent with every generate and refine request.
    ///
    /// OpenAPI 3 flavoured with subschemas inlined, as the API expects.
    /// See: https://ai.google.dev/api/caching#Schema
    pub fn response_schema() -> serde_json::Value {
        let settings = SchemaSettings::openapi3().with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        });
        let mut schema = SchemaGenerator::new(settings).into_root_schema_for::<Self>();

        // Root schemas always include a title field, which the API does not accept
        schema.remove("title");

        schema.to_value()
    }

    /// Hashtags as they are shown and copied: exactly one leading `#` each.
    pub fn display_hashtags(&self) -> Vec<String> {
        self.hashtags
            .iter()
            .map(|tag| format!("#{}", tag.trim().trim_start_matches('#')))
            .collect()
    }

    /// All display hashtags on one line, separated by spaces.
    pub fn hashtag_line(&self) -> String {
        self.display_hashtags().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_schema_requires_all_three_fields() {
        let schema = GeneratedContent::response_schema();

        assert_eq!(schema["type"], "object");
        assert!(schema.get("title").is_none());
        assert_eq!(schema["properties"]["title"]["type"], "string");
        assert_eq!(schema["properties"]["caption"]["type"], "string");
        assert_eq!(schema["properties"]["hashtags"]["type"], "array");
        assert_eq!(schema["properties"]["hashtags"]["items"]["type"], "string");

        let mut required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        required.sort_unstable();
        assert_eq!(required, ["caption", "hashtags", "title"]);
    }

    #[test]
    fn display_hashtags_normalise_the_mark() {
        let content = GeneratedContent {
            title: "T".to_string(),
            caption: "C".to_string(),
            hashtags: vec!["beach".into(), "#summer".into(), "##fun".into()],
        };

        assert_eq!(content.display_hashtags(), ["#beach", "#summer", "#fun"]);
        assert_eq!(content.hashtag_line(), "#beach #summer #fun");
    }
}

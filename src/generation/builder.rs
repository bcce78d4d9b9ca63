use std::sync::Arc;
use tracing::instrument;

use crate::{
    client::{Error as ClientError, GeminiClient},
    generation::{GenerateContentRequest, GenerationConfig, GenerationResponse},
    models::{Blob, Content, Part, Role},
};

/// Builder for content generation requests
#[derive(Clone)]
pub struct ContentBuilder {
    client: Arc<GeminiClient>,
    pub contents: Vec<Content>,
    generation_config: Option<GenerationConfig>,
}

impl ContentBuilder {
    /// Creates a new `ContentBuilder`.
    pub(crate) fn new(client: Arc<GeminiClient>) -> Self {
        Self {
            client,
            contents: Vec::new(),
            generation_config: None,
        }
    }

    /// Adds a user message to the conversation.
    pub fn with_user_message(mut self, text: impl Into<String>) -> Self {
        self.contents.push(Content::text(text).with_role(Role::User));
        self
    }

    /// Adds a blob to the request.
    ///
    /// When the last content is a user turn the blob is appended to it, so a prompt and
    /// its media travel as parts of the same message.
    pub fn with_blob(mut self, blob: Blob) -> Self {
        let part = Part::InlineData { inline_data: blob };
        match self.contents.last_mut() {
            Some(content) if content.role == Some(Role::User) => {
                content.parts.get_or_insert_with(Vec::new).push(part);
            }
            _ => self
                .contents
                .push(Content::default().with_part(part).with_role(Role::User)),
        }
        self
    }

    /// Sets the temperature for the request.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .temperature = Some(temperature);
        self
    }

    /// Sets the response MIME type for the request.
    ///
    /// This can be used to request structured output, such as JSON.
    pub fn with_response_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .response_mime_type = Some(mime_type.into());
        self
    }

    /// Sets the response schema for structured output.
    ///
    /// Only honoured by the API together with a JSON MIME type.
    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .response_schema = Some(schema);
        self
    }

    /// Builds the `GenerateContentRequest`.
    pub fn build(self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.contents,
            generation_config: self.generation_config,
        }
    }

    /// Executes the content generation request.
    #[instrument(skip_all, fields(
        messages.count = self.contents.len(),
        schema.present = self
            .generation_config
            .as_ref()
            .is_some_and(|c| c.response_schema.is_some()),
    ))]
    pub async fn execute(self) -> Result<GenerationResponse, ClientError> {
        let client = self.client.clone();
        let request = self.build();
        client.generate_content_raw(request).await
    }
}

//! Generate and refine social media copy for a video.
//!
//! Both operations send the full video every time along with a prompt and the
//! [`GeneratedContent`] response schema, then run the reply through
//! [`validate`](crate::content::validate). There are no internal retries.
//!
//! ```rust,ignore
//! use clip_caption::prelude::*;
//!
//! let studio = Studio::from_env()?;
//! let video = encode_video_file("holiday.mp4").await?;
//! let draft = studio.generate(&video, Some("Family trip to Lisbon")).await?;
//! let better = studio.refine(&video, &draft, "Shorter caption, more emoji").await?;
//! ```

mod prompt;

use snafu::{ResultExt, Snafu};
use tracing::{instrument, warn};

use crate::{
    client::{Error as ClientError, Gemini},
    content::{validate, GeneratedContent, ValidationError},
    media::EncodedMedia,
    report::ErrorKind,
};

pub use prompt::RefinementRequest;

const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("client invocation error"))]
    Client { source: Box<ClientError> },

    #[snafu(display(
        "model returned no text (finish reason: {}, block reason: {})",
        finish_reason.as_deref().unwrap_or("none"),
        block_reason.as_deref().unwrap_or("none"),
    ))]
    EmptyResponse {
        finish_reason: Option<String>,
        block_reason: Option<String>,
    },

    #[snafu(display("model reply failed validation"))]
    Validation { source: ValidationError },

    #[snafu(display("refinement instruction is empty"))]
    EmptyInstruction,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Client { source } => source.kind(),
            Error::EmptyResponse { .. } => ErrorKind::Generation,
            Error::Validation { source } => source.kind(),
            Error::EmptyInstruction => ErrorKind::Media,
        }
    }
}

/// Generation and refinement client.
#[derive(Debug, Clone)]
pub struct Studio {
    gemini: Gemini,
    temperature: Option<f32>,
}

impl Studio {
    pub fn new(gemini: Gemini) -> Self {
        Self {
            gemini,
            temperature: None,
        }
    }

    /// A studio on the default model whose API key is read from the environment per call.
    pub fn from_env() -> Result<Self, ClientError> {
        Gemini::from_env().map(Self::new)
    }

    /// Sampling temperature for every request; the model default when unset.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn gemini(&self) -> &Gemini {
        &self.gemini
    }

    /// First draft of title, caption and hashtags for `video`.
    ///
    /// `context` is free text from the user appended to the prompt as is.
    #[instrument(skip_all, fields(
        video.mime = %video.mime_type(),
        video.encoded_len = video.encoded_len(),
        context.present = context.is_some_and(|c| !c.trim().is_empty()),
    ))]
    pub async fn generate(
        &self,
        video: &EncodedMedia,
        context: Option<&str>,
    ) -> Result<GeneratedContent, Error> {
        self.run(prompt::generation_prompt(context), video).await
    }

    /// Rewrites `prior` according to `instruction`, re-sending the same video.
    #[instrument(skip_all, fields(
        video.mime = %video.mime_type(),
        video.encoded_len = video.encoded_len(),
        prior.hashtags = prior.hashtags.len(),
    ))]
    pub async fn refine(
        &self,
        video: &EncodedMedia,
        prior: &GeneratedContent,
        instruction: &str,
    ) -> Result<GeneratedContent, Error> {
        if instruction.trim().is_empty() {
            return EmptyInstructionSnafu.fail();
        }

        let request = RefinementRequest { prior, instruction };
        self.run(request.prompt(), video).await
    }

    async fn run(&self, prompt: String, video: &EncodedMedia) -> Result<GeneratedContent, Error> {
        let mut builder = self
            .gemini
            .generate_content()
            .with_user_message(prompt)
            .with_blob(video.to_blob())
            .with_response_mime_type(JSON_MIME_TYPE)
            .with_response_schema(GeneratedContent::response_schema());
        if let Some(temperature) = self.temperature {
            builder = builder.with_temperature(temperature);
        }

        let response = builder.execute().await.map_err(Box::new).context(ClientSnafu)?;

        let text = response.text();
        if text.trim().is_empty() {
            warn!(finish_reason = ?response.finish_reason(), "model reply carried no text");
            return EmptyResponseSnafu {
                finish_reason: response.finish_reason().map(|r| format!("{r:?}")),
                block_reason: response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone()),
            }
            .fail();
        }

        validate(&text)
            .inspect_err(|err| warn!(error = %err, reply.len = text.len(), "model reply rejected"))
            .context(ValidationSnafu)
    }
}

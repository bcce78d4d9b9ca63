//! # clip-caption
//!
//! Social media titles, captions and hashtags for a video, written by Google Gemini.
//!
//! A video is base64 encoded ([`media`]), sent with a prompt and a structured-output
//! schema ([`Studio::generate`]), and the model's JSON reply is validated
//! ([`content::validate`]) before it is returned. [`Studio::refine`] rewrites earlier
//! results from a free-text instruction. [`Session`] holds the state of one editing
//! session for a UI.

mod client;
pub mod content;
mod generation;
pub mod media;
mod models;
pub mod prelude;
pub mod report;
pub mod session;
pub mod studio;
pub mod transport;

#[cfg(test)]
mod tests;

pub use client::{Credential, Error as ClientError, Gemini, Model, API_KEY_ENV_VARS};
pub use content::{GeneratedContent, ValidationError};
pub use generation::{
    Candidate, ContentBuilder, FinishReason, GenerateContentRequest, GenerationConfig,
    GenerationResponse, PromptFeedback, UsageMetadata,
};
pub use media::{EncodedMedia, Error as MediaError};
pub use models::{Blob, Content, Part, Role};
pub use report::{ErrorKind, ErrorReport};
pub use session::{InputMode, Outcome, Session, SessionError};
pub use studio::{Error as StudioError, RefinementRequest, Studio};

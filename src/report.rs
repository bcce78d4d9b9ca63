//! User-facing classification of failures.
//!
//! Every error type in the crate maps itself to an [`ErrorKind`] by variant.
//! [`ErrorReport`] turns that into a title and a short list of remedies.

use std::fmt;

use crate::{content::ValidationError, studio};

/// Broad failure classes shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid credential; needs operator action.
    Configuration,
    /// The model replied, but not with usable content.
    Generation,
    /// The supplied video or URL cannot be used.
    Media,
    /// Connectivity, service outages and anything unclassified.
    Unexpected,
}

impl ErrorKind {
    /// Whether simply trying again has a reasonable chance of success.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Generation | ErrorKind::Unexpected)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::Generation => "generation error",
            ErrorKind::Media => "media error",
            ErrorKind::Unexpected => "unexpected error",
        };
        f.write_str(name)
    }
}

/// A title plus remediation suggestions, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub title: String,
    pub suggestions: Vec<String>,
}

impl ErrorReport {
    pub fn new(kind: ErrorKind, title: impl Into<String>, suggestions: &[&str]) -> Self {
        Self {
            kind,
            title: title.into(),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Generic report for a kind.
    pub fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Configuration => Self::new(
                kind,
                "Configuration Error",
                &[
                    "The Gemini API key is missing or invalid.",
                    "Set GEMINI_API_KEY in the environment and restart.",
                ],
            ),
            ErrorKind::Generation => Self::new(
                kind,
                "Content Generation Issue",
                &[
                    "The AI returned a reply that could not be used.",
                    "This is often temporary, so please try generating again.",
                ],
            ),
            ErrorKind::Media => Self::new(
                kind,
                "Video Problem",
                &[
                    "The video may be corrupt or in an unsupported format.",
                    "Try a different file, or re-export it as MP4.",
                    "If you used a URL, make sure it links directly to a video file.",
                ],
            ),
            ErrorKind::Unexpected => Self::new(
                kind,
                "Something Went Wrong",
                &[
                    "Check your internet connection.",
                    "The service may be busy; please try again in a moment.",
                ],
            ),
        }
    }

    /// Report for a generate or refine failure.
    ///
    /// Parse and shape failures share a kind but get distinct wording.
    pub fn from_error(err: &studio::Error) -> Self {
        match err {
            studio::Error::Validation {
                source: ValidationError::MalformedJson { .. },
            } => Self::new(
                ErrorKind::Generation,
                "AI Returned Malformed JSON",
                &[
                    "The reply could not be parsed.",
                    "This is often temporary, so please try generating again.",
                ],
            ),
            studio::Error::Validation {
                source: ValidationError::SchemaMismatch { .. },
            } => Self::new(
                ErrorKind::Generation,
                "AI Returned JSON With the Wrong Shape",
                &[
                    "The reply was missing a title, caption or hashtags.",
                    "Please try generating again.",
                ],
            ),
            studio::Error::EmptyInstruction => Self::new(
                ErrorKind::Media,
                "Nothing to Refine With",
                &["Describe how the title, caption or hashtags should change."],
            ),
            other => Self::for_kind(other.kind()),
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        for suggestion in &self.suggestions {
            write!(f, "\n  - {suggestion}")?;
        }
        Ok(())
    }
}

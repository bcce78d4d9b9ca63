//! State of one editing session.
//!
//! [`Session`] is the only place the current video, content, busy flag and last
//! error live. All mutation goes through its methods. Starting an operation hands
//! out a [`RequestTicket`]; a result is applied only if its ticket is still the
//! current one, so a late reply for a replaced video can never overwrite newer state.

use snafu::{OptionExt, Snafu};
use std::sync::Arc;
use tracing::debug;

use crate::{
    content::GeneratedContent,
    media::EncodedMedia,
    report::ErrorReport,
    studio,
};

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum SessionError {
    #[snafu(display("no video selected"))]
    NoVideo,

    #[snafu(display("nothing generated yet"))]
    NoContent,

    #[snafu(display("a {operation:?} request is already running"))]
    Busy { operation: Operation },

    #[snafu(display("hashtag is empty"))]
    EmptyHashtag,
}

/// How the user supplies the video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Upload,
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Generate,
    Refine,
}

/// Identifies one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    operation: Operation,
}

impl RequestTicket {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Busy(RequestTicket),
}

/// What [`Session::complete`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The ticket was superseded; state is unchanged.
    Stale,
}

/// Everything a generate call needs.
#[derive(Debug, Clone)]
pub struct PendingGenerate {
    pub ticket: RequestTicket,
    pub video: Arc<EncodedMedia>,
}

/// Everything a refine call needs.
#[derive(Debug, Clone)]
pub struct PendingRefine {
    pub ticket: RequestTicket,
    pub video: Arc<EncodedMedia>,
    pub prior: GeneratedContent,
}

#[derive(Debug, Default)]
pub struct Session {
    mode: InputMode,
    video: Option<Arc<EncodedMedia>>,
    content: Option<GeneratedContent>,
    status: Status,
    error: Option<ErrorReport>,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn video(&self) -> Option<&EncodedMedia> {
        self.video.as_deref()
    }

    pub fn content(&self) -> Option<&GeneratedContent> {
        self.content.as_ref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.status, Status::Busy(_))
    }

    pub fn error(&self) -> Option<&ErrorReport> {
        self.error.as_ref()
    }

    /// Clears video, content, error and busy state in one step.
    ///
    /// The input mode is kept. Any outstanding ticket becomes stale.
    pub fn reset(&mut self) {
        self.video = None;
        self.content = None;
        self.error = None;
        self.status = Status::Idle;
        self.generation += 1;
        debug!(generation = self.generation, "session reset");
    }

    /// Switches between upload and URL input; a change resets the session.
    pub fn set_mode(&mut self, mode: InputMode) {
        if self.mode != mode {
            self.reset();
            self.mode = mode;
        }
    }

    /// Replaces the video, discarding everything derived from the previous one.
    pub fn select_video(&mut self, video: EncodedMedia) {
        self.reset();
        self.video = Some(Arc::new(video));
    }

    /// Records a failure that happened outside generate/refine, e.g. while ingesting.
    pub fn report_error(&mut self, report: ErrorReport) {
        self.error = Some(report);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Starts a generate request. Clears previous content and error.
    pub fn begin_generate(&mut self) -> Result<PendingGenerate, SessionError> {
        self.ensure_idle()?;
        let video = self.video.clone().context(NoVideoSnafu)?;

        let ticket = self.issue(Operation::Generate);
        self.content = None;
        Ok(PendingGenerate { ticket, video })
    }

    /// Starts a refine request. Current content stays visible until the result arrives.
    pub fn begin_refine(&mut self) -> Result<PendingRefine, SessionError> {
        self.ensure_idle()?;
        let video = self.video.clone().context(NoVideoSnafu)?;
        let prior = self.content.clone().context(NoContentSnafu)?;

        let ticket = self.issue(Operation::Refine);
        Ok(PendingRefine {
            ticket,
            video,
            prior,
        })
    }

    /// Applies the result of the request identified by `ticket`.
    ///
    /// Success replaces the content wholesale. Failure records an [`ErrorReport`]
    /// and leaves whatever content was there.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<GeneratedContent, studio::Error>,
    ) -> Outcome {
        if self.status != Status::Busy(ticket) {
            debug!(?ticket, current = self.generation, "discarding stale result");
            return Outcome::Stale;
        }

        self.status = Status::Idle;
        match result {
            Ok(content) => {
                self.content = Some(content);
                self.error = None;
            }
            Err(err) => self.error = Some(ErrorReport::from_error(&err)),
        }
        Outcome::Applied
    }

    pub fn edit_title(&mut self, title: impl Into<String>) -> Result<(), SessionError> {
        self.content_mut()?.title = title.into();
        Ok(())
    }

    pub fn edit_caption(&mut self, caption: impl Into<String>) -> Result<(), SessionError> {
        self.content_mut()?.caption = caption.into();
        Ok(())
    }

    /// Appends a hashtag, dropping any leading `#`.
    pub fn add_hashtag(&mut self, tag: &str) -> Result<(), SessionError> {
        let tag = tag.trim().trim_start_matches('#');
        if tag.is_empty() {
            return EmptyHashtagSnafu.fail();
        }
        self.content_mut()?.hashtags.push(tag.to_string());
        Ok(())
    }

    /// Removes and returns the hashtag at `index`, if there is one.
    pub fn remove_hashtag(&mut self, index: usize) -> Result<Option<String>, SessionError> {
        let hashtags = &mut self.content_mut()?.hashtags;
        Ok((index < hashtags.len()).then(|| hashtags.remove(index)))
    }

    pub fn set_hashtags(&mut self, hashtags: Vec<String>) -> Result<(), SessionError> {
        self.content_mut()?.hashtags = hashtags;
        Ok(())
    }

    fn content_mut(&mut self) -> Result<&mut GeneratedContent, SessionError> {
        self.content.as_mut().context(NoContentSnafu)
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.status {
            Status::Idle => Ok(()),
            Status::Busy(ticket) => BusySnafu {
                operation: ticket.operation,
            }
            .fail(),
        }
    }

    fn issue(&mut self, operation: Operation) -> RequestTicket {
        self.generation += 1;
        let ticket = RequestTicket {
            generation: self.generation,
            operation,
        };
        self.status = Status::Busy(ticket);
        self.error = None;
        ticket
    }
}

//! # Prelude
//!
//! The types needed for the usual encode → generate → refine flow.
//!
//! ```rust,ignore
//! use clip_caption::prelude::*;
//! ```

pub use crate::client::{Error as ClientError, Gemini, Model};
pub use crate::content::GeneratedContent;
pub use crate::media::{
    encode_file, encode_video_file, fetch_video, EncodedMedia, Error as MediaError,
};
pub use crate::report::{ErrorKind, ErrorReport};
pub use crate::session::{InputMode, Outcome, Session};
pub use crate::studio::{Error as StudioError, Studio};

//! Turning a video into something that can ride inside a JSON request.
//!
//! [`EncodedMedia`] is the MIME type plus the standard base64 of the bytes, without
//! any `data:` URL prefix. The encoder itself does not judge the format; the
//! ingestion helpers ([`encode_video_file`], [`fetch_video`]) reject anything that
//! is not `video/*` before it gets that far.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mime::Mime;
use reqwest::{header::CONTENT_TYPE, Client};
use snafu::{ResultExt, Snafu};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use url::Url;

use crate::{models::Blob, report::ErrorKind};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to read '{}'", path.display()))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("'{mime_type}' is not a video type"))]
    NotVideo { mime_type: String },

    #[snafu(display("failed to fetch '{url}'"))]
    Fetch { source: reqwest::Error, url: Url },

    #[snafu(display("fetching '{url}' returned HTTP {status}"))]
    BadStatus { url: Url, status: u16 },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Fetch { source, .. } if source.is_connect() || source.is_timeout() => {
                ErrorKind::Unexpected
            }
            _ => ErrorKind::Media,
        }
    }
}

/// A video ready for transmission.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedMedia {
    mime_type: Mime,
    data: String,
}

impl EncodedMedia {
    /// Encodes in-memory bytes with a declared MIME type.
    pub fn from_bytes(mime_type: Mime, bytes: impl AsRef<[u8]>) -> Self {
        Self {
            mime_type,
            data: STANDARD.encode(bytes),
        }
    }

    pub fn mime_type(&self) -> &Mime {
        &self.mime_type
    }

    /// Base64 payload
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Size of the base64 payload in bytes
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }

    /// The wire form used as an `inlineData` part
    pub fn to_blob(&self) -> Blob {
        Blob::new(self.mime_type.essence_str(), self.data.clone())
    }
}

impl std::fmt::Debug for EncodedMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedMedia")
            .field("mime_type", &self.mime_type.essence_str())
            .field("encoded_len", &self.data.len())
            .finish()
    }
}

/// Reads a file and encodes it, guessing the MIME type from its extension.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<EncodedMedia, Error> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.context(ReadFileSnafu { path })?;
    let mime_type = mime_guess::from_path(path).first_or_octet_stream();

    debug!(path = %path.display(), mime.type = %mime_type, size = bytes.len(), "encoded file");
    Ok(EncodedMedia::from_bytes(mime_type, bytes))
}

/// [`encode_file`] restricted to files whose extension maps to a `video/*` type.
pub async fn encode_video_file(path: impl AsRef<Path>) -> Result<EncodedMedia, Error> {
    let path = path.as_ref();
    ensure_video(&mime_guess::from_path(path).first_or_octet_stream())?;
    encode_file(path).await
}

/// Accepts only `video/*` types.
pub fn ensure_video(mime_type: &Mime) -> Result<(), Error> {
    if mime_type.type_() == mime::VIDEO {
        Ok(())
    } else {
        NotVideoSnafu {
            mime_type: mime_type.essence_str(),
        }
        .fail()
    }
}

/// Downloads a video and encodes it with the server-declared type.
///
/// Fails when the status is not a success or the `Content-Type` is missing or
/// not `video/*`.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_video(http_client: &Client, url: &Url) -> Result<EncodedMedia, Error> {
    let response = http_client
        .get(url.clone())
        .send()
        .await
        .context(FetchSnafu { url: url.clone() })?;

    let status = response.status();
    if !status.is_success() {
        return BadStatusSnafu {
            url: url.clone(),
            status: status.as_u16(),
        }
        .fail();
    }

    let declared = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let mime_type = parse_video_type(&declared)?;

    let bytes = response
        .bytes()
        .await
        .context(FetchSnafu { url: url.clone() })?;

    debug!(mime.type = %mime_type, size = bytes.len(), "fetched video");
    Ok(EncodedMedia::from_bytes(mime_type, bytes))
}

/// Parses a `Content-Type` header value and checks it is a video type.
fn parse_video_type(declared: &str) -> Result<Mime, Error> {
    let mime_type: Mime = declared.parse().map_err(|_| {
        NotVideoSnafu {
            mime_type: if declared.is_empty() {
                "<missing>".to_string()
            } else {
                declared.to_string()
            },
        }
        .build()
    })?;
    ensure_video(&mime_type)?;
    Ok(mime_type)
}

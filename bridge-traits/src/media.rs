//! Media Inspection Abstractions
//!
//! The engine never opens media files itself. Before an item is shown its
//! handler asks the host, through [`MediaProbe`], for the facts it needs to
//! schedule the item: the natural length of audio and video, the pixel size of
//! images, and the body of text slides.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// The closed set of media kinds a playlist item can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Text,
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Image,
        MediaKind::Video,
        MediaKind::Audio,
        MediaKind::Text,
    ];

    /// Returns `true` for kinds that play over time and end on their own.
    pub fn is_timed(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Text => "text",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel dimensions of a still image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Facts discovered about a media source.
///
/// Every field is optional: a probe fills in what it can learn for the given
/// kind and leaves the rest empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaInfo {
    /// Playback length for audio and video. `None` when the container does not
    /// declare one.
    pub duration: Option<Duration>,
    /// Pixel size for images.
    pub dimensions: Option<Dimensions>,
    /// Text content for text slides.
    pub body: Option<String>,
}

impl MediaInfo {
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(Dimensions { width, height });
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Host capability that inspects a media source before it is presented.
///
/// Implementations may block on disk or decoder work internally but must do
/// so off the async executor (for example with `spawn_blocking`).
///
/// # Errors
///
/// - `BridgeError::NotAvailable` when the source does not exist
/// - `BridgeError::Unsupported` when the format cannot be read
/// - `BridgeError::Io` for any other I/O failure
///
/// # Example
///
/// ```ignore
/// use bridge_traits::media::{MediaKind, MediaProbe};
///
/// async fn length(probe: &dyn MediaProbe) {
///     let info = probe.probe(MediaKind::Video, "/media/intro.mp4").await?;
///     println!("intro runs for {:?}", info.duration);
/// }
/// ```
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Inspect `source`, interpreting it as media of the given `kind`.
    async fn probe(&self, kind: MediaKind, source: &str) -> Result<MediaInfo>;
}

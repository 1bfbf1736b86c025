//! # Media Handlers
//!
//! A handler owns the lifecycle of one item's presentation. The orchestrator
//! creates a fresh handler per item through the [`HandlerRegistry`], loads it
//! on a spawned task and activates it once the load reports back.
//!
//! ## Lifecycle
//!
//! ```text
//! Fresh -> Loading -> Ready -> Active <-> Paused
//!             |                  |
//!           Failed            Retired (deactivate, from any phase)
//! ```
//!
//! `deactivate()` may arrive at any point, including while `load()` is still
//! running. A load that finishes after retirement reports an error and
//! releases whatever it claimed.
//!
//! ## Completion
//!
//! Video and audio handlers run a pause-aware [`PlaybackClock`] while active.
//! When the media reaches its end the clock fires the [`CompletionSignal`],
//! which posts [`HandlerEvent::Finished`] back to the orchestrator.
//!
//! [`PlaybackClock`]: timed::PlaybackClock

pub mod audio;
pub mod image;
pub mod registry;
pub mod text;
pub(crate) mod timed;
pub mod video;

pub use audio::AudioHandler;
pub use image::ImageHandler;
pub use registry::{HandlerFactory, HandlerRegistry};
pub use text::TextHandler;
pub use video::VideoHandler;

use crate::error::{PlaybackError, Result};
use crate::item::MediaItem;
use async_trait::async_trait;
use bridge_traits::media::MediaKind;
use bridge_traits::surface::RenderCue;
use core_async::sync::mpsc;
use std::fmt;
use std::time::Duration;

// ============================================================================
// Handler Events
// ============================================================================

/// Identifies one handler created by the orchestrator. Every load gets a new
/// id, so events from a superseded handler can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Asynchronous reports from handlers to the orchestrator.
#[derive(Debug)]
pub enum HandlerEvent {
    /// `load()` completed.
    Loaded {
        instance: InstanceId,
        result: Result<()>,
    },
    /// Playback reached the end of the media.
    Finished { instance: InstanceId },
}

impl HandlerEvent {
    pub fn instance(&self) -> InstanceId {
        match self {
            HandlerEvent::Loaded { instance, .. } | HandlerEvent::Finished { instance } => {
                *instance
            }
        }
    }
}

/// Handed to [`MediaHandler::activate`]; fire it when playback ends.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    instance: InstanceId,
    events: mpsc::UnboundedSender<HandlerEvent>,
}

impl CompletionSignal {
    pub fn new(instance: InstanceId, events: mpsc::UnboundedSender<HandlerEvent>) -> Self {
        Self { instance, events }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Reports end of media. Returns `false` if the engine has gone away.
    pub fn finished(&self) -> bool {
        self.events
            .send(HandlerEvent::Finished {
                instance: self.instance,
            })
            .is_ok()
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// Length of the media itself, independent of any display hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalDuration {
    Finite(Duration),
    /// Unknown, or the media has no inherent end.
    Indefinite,
}

impl NaturalDuration {
    pub fn is_finite(&self) -> bool {
        matches!(self, NaturalDuration::Finite(_))
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            NaturalDuration::Finite(duration) => Some(*duration),
            NaturalDuration::Indefinite => None,
        }
    }
}

impl From<Option<Duration>> for NaturalDuration {
    fn from(value: Option<Duration>) -> Self {
        value.map_or(NaturalDuration::Indefinite, NaturalDuration::Finite)
    }
}

/// Presentation lifecycle of one item.
///
/// Implementations must tolerate `deactivate()` at any time and must not
/// call the completion signal after it.
#[async_trait]
pub trait MediaHandler: Send + Sync {
    fn kind(&self) -> MediaKind;

    /// Prepares the item. Runs on a spawned task; may take arbitrarily long.
    async fn load(&self, item: &MediaItem) -> Result<()>;

    /// Starts presenting a loaded item and returns what the display should
    /// render.
    fn activate(&self, finished: CompletionSignal) -> Result<RenderCue>;

    /// Stops presenting and releases everything the handler holds.
    /// Idempotent.
    fn deactivate(&self);

    fn natural_duration(&self) -> NaturalDuration;

    fn pause(&self) -> Result<()> {
        Err(PlaybackError::UnsupportedOperation {
            kind: self.kind(),
            operation: "pause",
        })
    }

    fn resume(&self) -> Result<()> {
        Err(PlaybackError::UnsupportedOperation {
            kind: self.kind(),
            operation: "resume",
        })
    }

    /// Whether the handler fires its completion signal at end of media.
    fn emits_finished(&self) -> bool {
        false
    }
}

// ============================================================================
// Lifecycle Phase
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerPhase {
    #[default]
    Fresh,
    Loading,
    Failed,
    Ready,
    Active,
    Paused,
    Retired,
}

impl HandlerPhase {
    pub(crate) fn begin_load(&mut self, item_id: &str) -> Result<()> {
        match self {
            HandlerPhase::Fresh => {
                *self = HandlerPhase::Loading;
                Ok(())
            }
            HandlerPhase::Retired => Err(superseded(item_id)),
            other => Err(PlaybackError::Internal(format!(
                "load of '{item_id}' requested in phase {other:?}"
            ))),
        }
    }

    pub(crate) fn finish_load(&mut self, item_id: &str) -> Result<()> {
        match self {
            HandlerPhase::Loading => {
                *self = HandlerPhase::Ready;
                Ok(())
            }
            HandlerPhase::Retired => Err(superseded(item_id)),
            other => Err(PlaybackError::Internal(format!(
                "load of '{item_id}' finished in phase {other:?}"
            ))),
        }
    }

    pub(crate) fn fail(&mut self) {
        if *self != HandlerPhase::Retired {
            *self = HandlerPhase::Failed;
        }
    }

    pub(crate) fn begin_activate(&mut self) -> Result<()> {
        match self {
            HandlerPhase::Ready => {
                *self = HandlerPhase::Active;
                Ok(())
            }
            other => Err(PlaybackError::NotLoaded(format!(
                "cannot activate in phase {other:?}"
            ))),
        }
    }

    pub(crate) fn retire(&mut self) -> HandlerPhase {
        std::mem::replace(self, HandlerPhase::Retired)
    }

    pub fn is_retired(&self) -> bool {
        *self == HandlerPhase::Retired
    }
}

fn superseded(item_id: &str) -> PlaybackError {
    PlaybackError::load_failure(item_id, "handler was deactivated before loading finished")
}

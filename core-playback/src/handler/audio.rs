//! Audio playback handler.

use super::timed::{playback_cue, TimedMedia};
use super::{CompletionSignal, HandlerPhase, MediaHandler, NaturalDuration};
use crate::device::{Device, DeviceArbiter};
use crate::error::Result;
use crate::item::MediaItem;
use async_trait::async_trait;
use bridge_traits::media::{MediaKind, MediaProbe};
use bridge_traits::surface::RenderCue;
use std::sync::Arc;

/// Plays an audio file. Holds the audio output for as long as it is loaded
/// or active.
pub struct AudioHandler {
    media: TimedMedia,
}

impl AudioHandler {
    pub fn new(probe: Arc<dyn MediaProbe>, arbiter: DeviceArbiter) -> Self {
        Self {
            media: TimedMedia::new(MediaKind::Audio, &[Device::AudioOutput], probe, arbiter),
        }
    }

    pub fn phase(&self) -> HandlerPhase {
        self.media.phase()
    }
}

#[async_trait]
impl MediaHandler for AudioHandler {
    fn kind(&self) -> MediaKind {
        MediaKind::Audio
    }

    async fn load(&self, item: &MediaItem) -> Result<()> {
        self.media.load(item).await
    }

    fn activate(&self, finished: CompletionSignal) -> Result<RenderCue> {
        let (source, duration_ms) = self.media.activate(finished)?;
        Ok(playback_cue(MediaKind::Audio, source, duration_ms))
    }

    fn deactivate(&self) {
        self.media.deactivate();
    }

    fn natural_duration(&self) -> NaturalDuration {
        self.media.natural_duration()
    }

    fn pause(&self) -> Result<()> {
        self.media.pause()
    }

    fn resume(&self) -> Result<()> {
        self.media.resume()
    }

    fn emits_finished(&self) -> bool {
        true
    }
}

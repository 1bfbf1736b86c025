//! Video playback handler.

use super::timed::{playback_cue, TimedMedia};
use super::{CompletionSignal, HandlerPhase, MediaHandler, NaturalDuration};
use crate::device::{Device, DeviceArbiter};
use crate::error::Result;
use crate::item::MediaItem;
use async_trait::async_trait;
use bridge_traits::media::{MediaKind, MediaProbe};
use bridge_traits::surface::RenderCue;
use std::sync::Arc;

/// Plays a video file. Holds the video decoder and the audio output for as
/// long as it is loaded or active.
pub struct VideoHandler {
    media: TimedMedia,
}

impl VideoHandler {
    pub fn new(probe: Arc<dyn MediaProbe>, arbiter: DeviceArbiter) -> Self {
        Self {
            media: TimedMedia::new(
                MediaKind::Video,
                &[Device::VideoDecoder, Device::AudioOutput],
                probe,
                arbiter,
            ),
        }
    }

    pub fn phase(&self) -> HandlerPhase {
        self.media.phase()
    }
}

#[async_trait]
impl MediaHandler for VideoHandler {
    fn kind(&self) -> MediaKind {
        MediaKind::Video
    }

    async fn load(&self, item: &MediaItem) -> Result<()> {
        self.media.load(item).await
    }

    fn activate(&self, finished: CompletionSignal) -> Result<RenderCue> {
        let (source, duration_ms) = self.media.activate(finished)?;
        Ok(playback_cue(MediaKind::Video, source, duration_ms))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::InstanceId;
    use bridge_traits::media::MediaInfo;
    use core_async::sync::{mpsc, Notify};
    use std::time::Duration;

    /// Probe that blocks until released.
    struct GatedProbe {
        gate: Notify,
    }

    #[async_trait]
    impl MediaProbe for GatedProbe {
        async fn probe(
            &self,
            _kind: MediaKind,
            _source: &str,
        ) -> bridge_traits::error::Result<MediaInfo> {
            self.gate.notified().await;
            Ok(MediaInfo::default().with_duration(Duration::from_secs(30)))
        }
    }

    fn clip(id: &str) -> MediaItem {
        MediaItem::new(id, MediaKind::Video, format!("{id}.mp4"))
    }

    #[tokio::test]
    async fn test_video_claims_decoder_and_audio() {
        let probe = Arc::new(GatedProbe {
            gate: Notify::new(),
        });
        probe.gate.notify_one();

        let arbiter = DeviceArbiter::new();
        let handler = VideoHandler::new(probe, arbiter.clone());
        handler.load(&clip("clip")).await.unwrap();

        assert_eq!(arbiter.holder(Device::VideoDecoder).as_deref(), Some("clip"));
        assert_eq!(arbiter.holder(Device::AudioOutput).as_deref(), Some("clip"));

        let (tx, _rx) = mpsc::unbounded_channel();
        let cue = handler
            .activate(CompletionSignal::new(InstanceId(2), tx))
            .unwrap();
        assert_eq!(
            cue,
            RenderCue::Video {
                source: "clip.mp4".into(),
                duration_ms: Some(30_000),
            }
        );

        handler.deactivate();
        assert!(arbiter.is_free(Device::VideoDecoder));
        assert!(arbiter.is_free(Device::AudioOutput));
    }

    #[tokio::test]
    async fn test_deactivate_during_load_releases_devices() {
        let probe = Arc::new(GatedProbe {
            gate: Notify::new(),
        });
        let arbiter = DeviceArbiter::new();
        let handler = Arc::new(VideoHandler::new(probe.clone(), arbiter.clone()));

        let loading = {
            let handler = Arc::clone(&handler);
            core_async::spawn(async move { handler.load(&clip("clip")).await })
        };

        while arbiter.is_free(Device::VideoDecoder) {
            core_async::task::yield_now().await;
        }

        handler.deactivate();
        assert!(arbiter.is_free(Device::VideoDecoder));

        probe.gate.notify_one();
        let result = loading.await.unwrap();
        assert!(result.unwrap_err().is_load_failure());
        assert!(handler.phase().is_retired());
        assert!(arbiter.is_free(Device::AudioOutput));
    }
}

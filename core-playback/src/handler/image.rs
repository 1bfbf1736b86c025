//! Still image handler.

use super::{CompletionSignal, HandlerPhase, MediaHandler, NaturalDuration};
use crate::error::{PlaybackError, Result};
use crate::item::MediaItem;
use async_trait::async_trait;
use bridge_traits::media::{MediaKind, MediaProbe};
use bridge_traits::surface::{ImageLayer, RenderCue};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
struct ImageState {
    phase: HandlerPhase,
    layers: Vec<ImageLayer>,
    hint: Option<Duration>,
}

/// Presents a still image, or a stack of layers composited bottom to top.
/// Loading probes every layer so a missing or corrupt image fails before
/// anything reaches the display.
pub struct ImageHandler {
    probe: Arc<dyn MediaProbe>,
    state: Mutex<ImageState>,
}

impl ImageHandler {
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self {
            probe,
            state: Mutex::new(ImageState::default()),
        }
    }

    pub fn phase(&self) -> HandlerPhase {
        self.state.lock().phase
    }
}

#[async_trait]
impl MediaHandler for ImageHandler {
    fn kind(&self) -> MediaKind {
        MediaKind::Image
    }

    async fn load(&self, item: &MediaItem) -> Result<()> {
        self.state.lock().phase.begin_load(&item.id)?;

        let sources = item.image_layers();
        let mut layers = Vec::with_capacity(sources.len());
        for source in sources {
            match self.probe.probe(MediaKind::Image, source).await {
                Ok(info) => layers.push(ImageLayer {
                    source: source.to_string(),
                    dimensions: info.dimensions,
                }),
                Err(err) => {
                    self.state.lock().phase.fail();
                    return Err(PlaybackError::load_failure(&item.id, err));
                }
            }
        }

        let mut state = self.state.lock();
        state.phase.finish_load(&item.id)?;
        debug!(item_id = %item.id, layers = layers.len(), "Image ready");
        state.layers = layers;
        state.hint = item.duration_hint();
        Ok(())
    }

    fn activate(&self, _finished: CompletionSignal) -> Result<RenderCue> {
        let mut state = self.state.lock();
        state.phase.begin_activate()?;
        Ok(RenderCue::Image {
            layers: state.layers.clone(),
        })
    }

    fn deactivate(&self) {
        self.state.lock().phase.retire();
    }

    fn natural_duration(&self) -> NaturalDuration {
        self.state.lock().hint.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerEvent, InstanceId};
    use bridge_traits::error::BridgeError;
    use bridge_traits::media::{Dimensions, MediaInfo};
    use core_async::sync::mpsc;
    use mockall::mock;

    mock! {
        Probe {}

        #[async_trait]
        impl MediaProbe for Probe {
            async fn probe(&self, kind: MediaKind, source: &str) -> bridge_traits::error::Result<MediaInfo>;
        }
    }

    fn signal() -> (CompletionSignal, mpsc::UnboundedReceiver<HandlerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CompletionSignal::new(InstanceId(1), tx), rx)
    }

    #[tokio::test]
    async fn test_load_and_activate() {
        let mut probe = MockProbe::new();
        probe
            .expect_probe()
            .withf(|kind, source| *kind == MediaKind::Image && source == "slides/a.png")
            .times(1)
            .returning(|_, _| Ok(MediaInfo::default().with_dimensions(1920, 1080)));

        let handler = ImageHandler::new(Arc::new(probe));
        let item = MediaItem::new("a", MediaKind::Image, "slides/a.png")
            .with_duration_hint(Duration::from_secs(5));

        handler.load(&item).await.unwrap();
        assert_eq!(handler.phase(), HandlerPhase::Ready);
        assert_eq!(
            handler.natural_duration(),
            NaturalDuration::Finite(Duration::from_secs(5))
        );

        let (finished, _rx) = signal();
        let cue = handler.activate(finished).unwrap();
        assert_eq!(
            cue,
            RenderCue::Image {
                layers: vec![ImageLayer {
                    source: "slides/a.png".into(),
                    dimensions: Some(Dimensions {
                        width: 1920,
                        height: 1080
                    }),
                }],
            }
        );
        assert!(handler.pause().is_err());
        assert!(!handler.emits_finished());
    }

    #[tokio::test]
    async fn test_probe_failure_is_load_failure() {
        let mut probe = MockProbe::new();
        probe
            .expect_probe()
            .returning(|_, source| Err(BridgeError::NotAvailable(source.to_string())));

        let handler = ImageHandler::new(Arc::new(probe));
        let item = MediaItem::new("missing", MediaKind::Image, "nope.png");

        let err = handler.load(&item).await.unwrap_err();
        assert!(matches!(err, PlaybackError::LoadFailure { ref item_id, .. } if item_id == "missing"));
        assert_eq!(handler.phase(), HandlerPhase::Failed);

        let (finished, _rx) = signal();
        assert!(handler.activate(finished).is_err());
    }

    #[tokio::test]
    async fn test_layers_are_probed_in_order() {
        let mut probe = MockProbe::new();
        let mut seq = mockall::Sequence::new();
        for (source, width) in [("backdrop.png", 1920), ("lyrics.png", 1280)] {
            probe
                .expect_probe()
                .withf(move |kind, s| *kind == MediaKind::Image && s == source)
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _| Ok(MediaInfo::default().with_dimensions(width, 720)));
        }

        let handler = ImageHandler::new(Arc::new(probe));
        handler
            .load(&MediaItem::layered("chorus", ["backdrop.png", "lyrics.png"]))
            .await
            .unwrap();

        let (finished, _rx) = signal();
        let RenderCue::Image { layers } = handler.activate(finished).unwrap() else {
            panic!("expected an image cue");
        };
        let sources: Vec<_> = layers.iter().map(|layer| layer.source.as_str()).collect();
        assert_eq!(sources, vec!["backdrop.png", "lyrics.png"]);
        assert_eq!(layers[1].dimensions.map(|d| d.width), Some(1280));
    }

    #[tokio::test]
    async fn test_one_unreadable_layer_fails_the_slide() {
        let mut probe = MockProbe::new();
        probe
            .expect_probe()
            .returning(|_, source| match source {
                "missing.png" => Err(BridgeError::NotAvailable(source.to_string())),
                _ => Ok(MediaInfo::default()),
            });

        let handler = ImageHandler::new(Arc::new(probe));
        let err = handler
            .load(&MediaItem::layered(
                "chorus",
                ["backdrop.png", "missing.png", "logo.png"],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::LoadFailure { ref item_id, .. } if item_id == "chorus"));
        assert_eq!(handler.phase(), HandlerPhase::Failed);
    }

    #[tokio::test]
    async fn test_slide_without_layers_presents_nothing() {
        let handler = ImageHandler::new(Arc::new(MockProbe::new()));
        handler
            .load(&MediaItem::layered("blank", Vec::<String>::new()))
            .await
            .unwrap();

        let (finished, _rx) = signal();
        assert_eq!(
            handler.activate(finished).unwrap(),
            RenderCue::Image { layers: Vec::new() }
        );
    }

    #[tokio::test]
    async fn test_without_hint_duration_is_indefinite() {
        let mut probe = MockProbe::new();
        probe
            .expect_probe()
            .returning(|_, _| Ok(MediaInfo::default()));

        let handler = ImageHandler::new(Arc::new(probe));
        handler
            .load(&MediaItem::new("a", MediaKind::Image, "a.png"))
            .await
            .unwrap();
        assert_eq!(handler.natural_duration(), NaturalDuration::Indefinite);
    }

    #[tokio::test]
    async fn test_deactivate_is_idempotent() {
        let handler = ImageHandler::new(Arc::new(MockProbe::new()));
        handler.deactivate();
        handler.deactivate();
        assert!(handler.phase().is_retired());

        let err = handler
            .load(&MediaItem::new("a", MediaKind::Image, "a.png"))
            .await
            .unwrap_err();
        assert!(err.is_load_failure());
    }
}

//! # Slideshow Demo
//!
//! Runs a short playlist against the tracing surfaces and drives it with a
//! few simulated key presses. Media files are faked by an in-memory probe so
//! the demo needs nothing on disk.
//!
//! Run with: `cargo run --example slideshow_demo --package core-service`

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::media::{MediaInfo, MediaKind, MediaProbe};
use core_playback::{MediaItem, Playlist, TransitionMode};
use core_runtime::config::{CoreConfig, EndBehavior, PlaybackSettings};
use core_runtime::events::{CoreEvent, EventStream, PlaybackEvent};
use core_runtime::logging::{LogFormat, LoggingConfig};
use core_service::CoreService;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// In-Memory Probe (for demonstration)
// ============================================================================

struct DemoProbe;

#[async_trait]
impl MediaProbe for DemoProbe {
    async fn probe(&self, kind: MediaKind, source: &str) -> BridgeResult<MediaInfo> {
        tokio::time::sleep(Duration::from_millis(150)).await;
        match (kind, source) {
            (MediaKind::Image, _) => Ok(MediaInfo::default().with_dimensions(1920, 1080)),
            (MediaKind::Audio, "chime.ogg") => {
                Ok(MediaInfo::default().with_duration(Duration::from_secs(3)))
            }
            _ => Err(BridgeError::NotAvailable(format!("{source} not found"))),
        }
    }
}

fn playlist() -> anyhow::Result<Playlist> {
    let auto = |item: MediaItem| {
        item.with_duration_hint(Duration::from_secs(2))
            .with_transition(TransitionMode::Auto)
    };

    Ok(Playlist::new(vec![
        auto(MediaItem::text("welcome", "Welcome to the show")),
        auto(MediaItem::layered("stage", ["stage.png", "lower-third.png"])),
        MediaItem::new("chime", MediaKind::Audio, "chime.ogg")
            .with_transition(TransitionMode::Auto),
        MediaItem::new("missing", MediaKind::Video, "missing.mp4"),
        MediaItem::text("goodbye", "Thanks for coming"),
    ])?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = PlaybackSettings {
        end_of_playlist: EndBehavior::Hold,
        ..Default::default()
    };

    let config = CoreConfig::builder()
        .settings(settings)
        .media_probe(Arc::new(DemoProbe))
        .logging(
            LoggingConfig::default()
                .with_format(LogFormat::Compact)
                .with_filter("info,core_playback=debug"),
        )
        .build()?;

    let core = CoreService::start(config)?;
    let mut events = EventStream::new(core.subscribe()).filter(|event| {
        matches!(
            event,
            CoreEvent::Playback(PlaybackEvent::NowShowing { .. } | PlaybackEvent::Error { .. })
        )
    });
    core.load_playlist(playlist()?)?;

    // Let the automatic items run, then take over from the keyboard once the
    // failed video has been skipped.
    loop {
        match events.recv().await? {
            CoreEvent::Playback(PlaybackEvent::NowShowing { item_id, .. }) => {
                if item_id == "goodbye" {
                    break;
                }
            }
            CoreEvent::Playback(PlaybackEvent::Error { message, .. }) => {
                println!("operator sees: {message}");
            }
            _ => {}
        }
    }

    for key in ["Left", "Space", "Escape", "Space"] {
        tokio::time::sleep(Duration::from_millis(500)).await;
        println!("key {key:>6} -> {:?}", core.handle_key(key)?);
    }

    tokio::time::sleep(Duration::from_millis(500)).await;
    core.handle_key("Ctrl+Q")?;
    core.stopped().cancelled().await;
    core.shutdown().await?;
    Ok(())
}

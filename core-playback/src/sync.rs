//! # Surface Synchronisation
//!
//! Projects engine events onto the two host surfaces. The flow is strictly
//! one way: surfaces are told what to show and can never steer the engine.
//!
//! - The display gets [`DisplayInstruction`]s. It never sees an error as
//!   such; when the item it shows is gone it is told to blank.
//! - The control surface gets a full [`ControlStatus`] snapshot after every
//!   engine event, errors included.
//!
//! Both projections are plain functions of the event stream so they can be
//! tested without a runtime. [`SurfaceSync`] wires them to the event bus.

use bridge_traits::surface::{
    ControlStatus, ControlSurface, DisplayInstruction, DisplaySurface, RenderCue, StatusPhase,
    StatusSeverity,
};
use core_async::task::JoinHandle;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, PlaylistEvent, Receiver, RecvError};
use std::sync::Arc;
use tracing::{debug, warn};

// ============================================================================
// Display Projection
// ============================================================================

/// Tracks what the display currently shows and derives the next
/// instruction from each engine event.
#[derive(Debug, Clone, Default)]
pub struct DisplayProjection {
    shown: Option<(String, RenderCue)>,
}

impl DisplayProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the item currently on screen.
    pub fn shown_item(&self) -> Option<&str> {
        self.shown.as_ref().map(|(item_id, _)| item_id.as_str())
    }

    /// Returns the instruction for `event`, if the display needs one.
    pub fn apply(&mut self, event: &CoreEvent) -> Option<DisplayInstruction> {
        let CoreEvent::Playback(event) = event else {
            return None;
        };

        match event {
            PlaybackEvent::NowShowing { item_id, cue, .. } => {
                self.shown = Some((item_id.clone(), cue.clone()));
                Some(DisplayInstruction::Present {
                    item_id: item_id.clone(),
                    cue: cue.clone(),
                })
            }
            // Stills stay up while the next item loads; running playback
            // must stop because its handler is already gone.
            PlaybackEvent::NowLoading { .. } => {
                let playing = self
                    .shown
                    .as_ref()
                    .is_some_and(|(_, cue)| cue.is_playback());
                if playing {
                    self.blank()
                } else {
                    None
                }
            }
            PlaybackEvent::Paused { .. } if self.shown.is_some() => Some(DisplayInstruction::Pause),
            PlaybackEvent::Resumed { .. } if self.shown.is_some() => {
                Some(DisplayInstruction::Resume)
            }
            PlaybackEvent::Error {
                item_id: Some(item_id),
                ..
            } => {
                let stale = self.shown_item().is_some_and(|shown| shown != item_id);
                if stale {
                    self.blank()
                } else {
                    None
                }
            }
            PlaybackEvent::Cleared | PlaybackEvent::Stopped => self.blank(),
            _ => None,
        }
    }

    fn blank(&mut self) -> Option<DisplayInstruction> {
        self.shown = None;
        Some(DisplayInstruction::Blank)
    }
}

// ============================================================================
// Control Projection
// ============================================================================

/// Folds engine events into the operator's status snapshot.
#[derive(Debug, Clone)]
pub struct ControlProjection {
    status: ControlStatus,
}

impl Default for ControlProjection {
    fn default() -> Self {
        Self {
            status: ControlStatus::idle(),
        }
    }
}

impl ControlProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ControlStatus {
        &self.status
    }

    /// Updates the snapshot for `event` and returns it, or `None` when the
    /// event does not change what the operator sees.
    pub fn apply(&mut self, event: &CoreEvent) -> Option<ControlStatus> {
        let status = &mut self.status;
        status.severity = StatusSeverity::Info;

        match event {
            CoreEvent::Playlist(PlaylistEvent::Loaded { count, issues }) => {
                status.total = *count;
                status.item_id = None;
                status.index = None;
                if issues.is_empty() {
                    status.message = format!("Loaded {count} items");
                } else {
                    status.severity = StatusSeverity::Warning;
                    status.message = format!("Loaded {count} items ({} warnings)", issues.len());
                }
            }
            // The accompanying error event carries the same message.
            CoreEvent::Playlist(PlaylistEvent::Rejected { .. }) => return None,
            CoreEvent::Playback(event) => match event {
                PlaybackEvent::NowLoading {
                    item_id,
                    index,
                    total,
                } => {
                    status.phase = StatusPhase::Loading;
                    status.item_id = Some(item_id.clone());
                    status.index = Some(*index);
                    status.total = *total;
                    status.message = format!("Loading {item_id}");
                }
                PlaybackEvent::NowShowing {
                    item_id,
                    index,
                    total,
                    ..
                } => {
                    status.phase = StatusPhase::Showing;
                    status.item_id = Some(item_id.clone());
                    status.index = Some(*index);
                    status.total = *total;
                    status.message = format!("Showing {item_id}");
                }
                PlaybackEvent::Paused { item_id } => {
                    status.phase = StatusPhase::Paused;
                    status.message = format!("Paused {item_id}");
                }
                PlaybackEvent::Resumed { item_id } => {
                    status.phase = StatusPhase::Showing;
                    status.message = format!("Showing {item_id}");
                }
                PlaybackEvent::Error { message, .. } => {
                    status.severity = StatusSeverity::Error;
                    status.message = message.clone();
                }
                PlaybackEvent::PlaylistExhausted { .. } => {
                    status.phase = StatusPhase::Exhausted;
                    status.message = "End of playlist".to_string();
                }
                PlaybackEvent::Cleared => {
                    status.phase = StatusPhase::Cleared;
                    status.message = "Display cleared".to_string();
                }
                PlaybackEvent::Stopped => {
                    status.phase = StatusPhase::Stopped;
                    status.message = "Stopped".to_string();
                }
            },
        }

        Some(status.clone())
    }
}

// ============================================================================
// Surface Sync Task
// ============================================================================

/// Forwards projected engine events to the host surfaces.
pub struct SurfaceSync {
    display: Option<Arc<dyn DisplaySurface>>,
    control: Option<Arc<dyn ControlSurface>>,
    display_projection: DisplayProjection,
    control_projection: ControlProjection,
}

impl SurfaceSync {
    pub fn new(
        display: Option<Arc<dyn DisplaySurface>>,
        control: Option<Arc<dyn ControlSurface>>,
    ) -> Self {
        Self {
            display,
            control,
            display_projection: DisplayProjection::new(),
            control_projection: ControlProjection::new(),
        }
    }

    /// Subscribes to `bus` immediately and forwards events on a background
    /// task until the engine stops or the bus closes.
    pub fn spawn(self, bus: &EventBus) -> JoinHandle<()> {
        let receiver = bus.subscribe();
        core_async::spawn(self.run(receiver))
    }

    async fn run(mut self, mut receiver: Receiver<CoreEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.apply(&event).await;
                    if event.is_terminal() {
                        debug!("Surface sync finished");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Surface sync fell behind; some updates were dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    /// Projects one event and delivers the results. Surface errors are logged
    /// and otherwise ignored.
    pub async fn apply(&mut self, event: &CoreEvent) {
        if let Some(instruction) = self.display_projection.apply(event) {
            if let Some(display) = &self.display {
                if let Err(err) = display.render(instruction).await {
                    warn!(error = %err, "Display surface rejected an instruction");
                }
            }
        }

        if let Some(status) = self.control_projection.apply(event) {
            if let Some(control) = &self.control {
                if let Err(err) = control.update(status).await {
                    warn!(error = %err, "Control surface rejected a status update");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::media::Dimensions;
    use bridge_traits::surface::ImageLayer;

    fn showing(item_id: &str, cue: RenderCue) -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::NowShowing {
            item_id: item_id.into(),
            index: 0,
            total: 3,
            cue,
        })
    }

    fn loading(item_id: &str, index: usize) -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::NowLoading {
            item_id: item_id.into(),
            index,
            total: 3,
        })
    }

    fn image() -> RenderCue {
        RenderCue::Image {
            layers: vec![ImageLayer {
                source: "a.png".into(),
                dimensions: Some(Dimensions {
                    width: 800,
                    height: 600,
                }),
            }],
        }
    }

    fn video() -> RenderCue {
        RenderCue::Video {
            source: "b.mp4".into(),
            duration_ms: Some(12_000),
        }
    }

    #[test]
    fn test_display_presents_shown_items() {
        let mut display = DisplayProjection::new();
        assert_eq!(display.apply(&loading("a", 0)), None);
        assert_eq!(
            display.apply(&showing("a", image())),
            Some(DisplayInstruction::Present {
                item_id: "a".into(),
                cue: image(),
            })
        );
        assert_eq!(display.shown_item(), Some("a"));
    }

    #[test]
    fn test_display_holds_stills_but_stops_playback_while_loading() {
        let mut display = DisplayProjection::new();
        display.apply(&showing("a", image()));
        assert_eq!(display.apply(&loading("b", 1)), None);

        display.apply(&showing("b", video()));
        assert_eq!(
            display.apply(&loading("c", 2)),
            Some(DisplayInstruction::Blank)
        );
        assert_eq!(display.shown_item(), None);
    }

    #[test]
    fn test_display_blanks_when_next_item_fails() {
        let mut display = DisplayProjection::new();
        display.apply(&showing("a", image()));

        let same_item_error = CoreEvent::Playback(PlaybackEvent::Error {
            item_id: Some("a".into()),
            message: "oops".into(),
            recoverable: true,
        });
        assert_eq!(display.apply(&same_item_error), None);

        let navigation_error = CoreEvent::Playback(PlaybackEvent::Error {
            item_id: None,
            message: "Index 9 is out of range".into(),
            recoverable: true,
        });
        assert_eq!(display.apply(&navigation_error), None);

        let load_error = CoreEvent::Playback(PlaybackEvent::Error {
            item_id: Some("b".into()),
            message: "Failed to load 'b'".into(),
            recoverable: true,
        });
        assert_eq!(
            display.apply(&load_error),
            Some(DisplayInstruction::Blank)
        );

        // Already blank.
        assert_eq!(display.apply(&load_error), None);
    }

    #[test]
    fn test_display_pause_resume_clear() {
        let mut display = DisplayProjection::new();
        let paused = CoreEvent::Playback(PlaybackEvent::Paused {
            item_id: "b".into(),
        });
        assert_eq!(display.apply(&paused), None);

        display.apply(&showing("b", video()));
        assert_eq!(display.apply(&paused), Some(DisplayInstruction::Pause));
        assert_eq!(
            display.apply(&CoreEvent::Playback(PlaybackEvent::Resumed {
                item_id: "b".into()
            })),
            Some(DisplayInstruction::Resume)
        );
        assert_eq!(
            display.apply(&CoreEvent::Playback(PlaybackEvent::PlaylistExhausted {
                last_item_id: Some("b".into())
            })),
            None
        );
        assert_eq!(
            display.apply(&CoreEvent::Playback(PlaybackEvent::Cleared)),
            Some(DisplayInstruction::Blank)
        );
    }

    #[test]
    fn test_control_tracks_position_and_errors() {
        let mut control = ControlProjection::new();
        assert_eq!(control.status().phase, StatusPhase::Idle);

        let loaded = control
            .apply(&CoreEvent::Playlist(PlaylistEvent::Loaded {
                count: 3,
                issues: vec!["'b' loops to itself".into()],
            }))
            .unwrap();
        assert_eq!(loaded.total, 3);
        assert_eq!(loaded.severity, StatusSeverity::Warning);

        let status = control.apply(&loading("a", 0)).unwrap();
        assert_eq!(status.phase, StatusPhase::Loading);
        assert_eq!(status.severity, StatusSeverity::Info);

        let status = control.apply(&showing("a", image())).unwrap();
        assert_eq!(status.phase, StatusPhase::Showing);
        assert_eq!(status.position_label(), "1 / 3");

        let status = control
            .apply(&CoreEvent::Playback(PlaybackEvent::Error {
                item_id: Some("b".into()),
                message: "Failed to load 'b': missing".into(),
                recoverable: true,
            }))
            .unwrap();
        assert_eq!(status.severity, StatusSeverity::Error);
        assert_eq!(status.message, "Failed to load 'b': missing");
        assert_eq!(status.phase, StatusPhase::Showing);

        let status = control
            .apply(&CoreEvent::Playback(PlaybackEvent::PlaylistExhausted {
                last_item_id: None,
            }))
            .unwrap();
        assert_eq!(status.phase, StatusPhase::Exhausted);
        assert_eq!(status.severity, StatusSeverity::Info);
    }

    #[test]
    fn test_control_ignores_rejected_playlist() {
        let mut control = ControlProjection::new();
        assert!(control
            .apply(&CoreEvent::Playlist(PlaylistEvent::Rejected {
                reason: "Playlist is empty".into()
            }))
            .is_none());
    }
}

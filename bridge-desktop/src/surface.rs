//! Surfaces that write to the tracing log.
//!
//! Headless hosts and the demo use these when no real window exists. Every
//! instruction and status update is logged under the `presenter::display`
//! and `presenter::control` targets.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    surface::{
        ControlStatus, ControlSurface, DisplayInstruction, DisplaySurface, RenderCue,
        StatusSeverity,
    },
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

/// Display surface that logs what it would render.
#[derive(Debug, Default)]
pub struct TracingDisplaySurface {
    rendered: AtomicU64,
}

impl TracingDisplaySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instructions received so far.
    pub fn rendered(&self) -> u64 {
        self.rendered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DisplaySurface for TracingDisplaySurface {
    async fn render(&self, instruction: DisplayInstruction) -> Result<()> {
        self.rendered.fetch_add(1, Ordering::Relaxed);

        match &instruction {
            DisplayInstruction::Present { item_id, cue } => match cue {
                RenderCue::Image { layers } => {
                    for (depth, layer) in layers.iter().enumerate() {
                        debug!(
                            target: "presenter::display",
                            %item_id,
                            depth,
                            source = %layer.source,
                            dimensions = ?layer.dimensions,
                            "Image layer"
                        );
                    }
                    info!(target: "presenter::display", %item_id, layers = layers.len(), "Show image")
                }
                RenderCue::Video {
                    source,
                    duration_ms,
                } => {
                    info!(target: "presenter::display", %item_id, %source, ?duration_ms, "Play video")
                }
                RenderCue::Audio {
                    source,
                    duration_ms,
                } => {
                    info!(target: "presenter::display", %item_id, %source, ?duration_ms, "Play audio")
                }
                RenderCue::Text { body } => {
                    info!(target: "presenter::display", %item_id, chars = body.chars().count(), "Show text")
                }
            },
            DisplayInstruction::Pause => info!(target: "presenter::display", "Pause"),
            DisplayInstruction::Resume => info!(target: "presenter::display", "Resume"),
            DisplayInstruction::Blank => info!(target: "presenter::display", "Blank"),
        }
        Ok(())
    }
}

/// Control surface that logs each status line at the status's severity.
#[derive(Debug, Default)]
pub struct TracingControlSurface;

impl TracingControlSurface {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ControlSurface for TracingControlSurface {
    async fn update(&self, status: ControlStatus) -> Result<()> {
        let position = status.position_label();
        match status.severity {
            StatusSeverity::Info => {
                info!(target: "presenter::control", phase = ?status.phase, %position, "{}", status.message)
            }
            StatusSeverity::Warning => {
                warn!(target: "presenter::control", phase = ?status.phase, %position, "{}", status.message)
            }
            StatusSeverity::Error => {
                error!(target: "presenter::control", phase = ?status.phase, %position, "{}", status.message)
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_display_counts_instructions() {
        let display = TracingDisplaySurface::new();
        display
            .render(DisplayInstruction::Present {
                item_id: "welcome".into(),
                cue: RenderCue::Text {
                    body: "Welcome".into(),
                },
            })
            .await
            .unwrap();
        display.render(DisplayInstruction::Blank).await.unwrap();
        assert_eq!(display.rendered(), 2);
    }

    #[tokio::test]
    async fn test_control_accepts_every_severity() {
        let control = TracingControlSurface::new();
        for severity in [
            StatusSeverity::Info,
            StatusSeverity::Warning,
            StatusSeverity::Error,
        ] {
            let status = ControlStatus {
                severity,
                ..ControlStatus::idle()
            };
            control.update(status).await.unwrap();
        }
    }
}

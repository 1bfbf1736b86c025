//! Presentation Surface Abstractions
//!
//! The presenter drives two host surfaces. The display surface faces the
//! audience and only renders what it is told. The control surface faces the
//! operator and shows the engine's status, including errors. Both are pure
//! sinks: neither can change what the engine is doing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::media::Dimensions;

/// What the display surface should put on screen for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderCue {
    /// Show a stack of still images, first layer at the bottom.
    Image { layers: Vec<ImageLayer> },
    /// Start video playback from the beginning.
    Video {
        source: String,
        duration_ms: Option<u64>,
    },
    /// Start audio playback from the beginning.
    Audio {
        source: String,
        duration_ms: Option<u64>,
    },
    /// Render a text slide.
    Text { body: String },
}

/// One image of a composited slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLayer {
    pub source: String,
    pub dimensions: Option<Dimensions>,
}

impl RenderCue {
    /// Returns `true` when the cue starts time-based playback.
    pub fn is_playback(&self) -> bool {
        matches!(self, RenderCue::Video { .. } | RenderCue::Audio { .. })
    }
}

/// Instruction sent to the audience-facing display.
///
/// Errors never reach the display as such; when something goes wrong it is
/// simply told to stop showing the current item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "instruction")]
pub enum DisplayInstruction {
    /// Replace whatever is on screen with the given item.
    Present { item_id: String, cue: RenderCue },
    /// Freeze running playback.
    Pause,
    /// Continue frozen playback.
    Resume,
    /// Stop showing anything.
    Blank,
}

/// Coarse presentation phase reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusPhase {
    Idle,
    Loading,
    Showing,
    Paused,
    Exhausted,
    Cleared,
    Stopped,
}

/// Severity attached to an operator status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusSeverity {
    Info,
    Warning,
    Error,
}

/// Snapshot of what the operator should see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlStatus {
    pub phase: StatusPhase,
    /// Item under the cursor, if any.
    pub item_id: Option<String>,
    /// Zero-based position of that item.
    pub index: Option<usize>,
    /// Number of items in the loaded playlist.
    pub total: usize,
    /// Human-readable status line.
    pub message: String,
    pub severity: StatusSeverity,
}

impl ControlStatus {
    pub fn idle() -> Self {
        Self {
            phase: StatusPhase::Idle,
            item_id: None,
            index: None,
            total: 0,
            message: "No playlist loaded".to_string(),
            severity: StatusSeverity::Info,
        }
    }

    /// One-based "3 / 10" position string, or `-` when nothing is selected.
    pub fn position_label(&self) -> String {
        match self.index {
            Some(index) => format!("{} / {}", index + 1, self.total),
            None => "-".to_string(),
        }
    }
}

/// Audience-facing render target.
#[async_trait]
pub trait DisplaySurface: Send + Sync {
    /// Apply a display instruction.
    async fn render(&self, instruction: DisplayInstruction) -> Result<()>;
}

/// Operator-facing status view.
#[async_trait]
pub trait ControlSurface: Send + Sync {
    /// Replace the displayed status with `status`.
    async fn update(&self, status: ControlStatus) -> Result<()>;
}

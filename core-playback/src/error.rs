//! # Playback Error Types
//!
//! Errors raised while loading items, navigating the playlist and driving
//! the orchestrator. None of them is fatal to the engine: a failing item is
//! reported and skipped, a bad navigation request is reported and ignored.

use bridge_traits::error::BridgeError;
use bridge_traits::media::MediaKind;
use thiserror::Error;

/// Errors that can occur during playback orchestration.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Load Errors
    // ========================================================================
    /// An item could not be prepared for presentation.
    #[error("Failed to load '{item_id}': {reason}")]
    LoadFailure { item_id: String, reason: String },

    /// An exclusive output device is held by another item.
    #[error("Device {device} is held by '{holder}'")]
    DeviceClaim { device: String, holder: String },

    /// No handler factory exists for the item's media kind.
    #[error("No handler registered for {0} items")]
    NoHandlerRegistered(MediaKind),

    /// A bridge implementation failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    // ========================================================================
    // Navigation Errors
    // ========================================================================
    /// Requested index lies outside the playlist.
    #[error("Index {index} is out of range for a playlist of {len} items")]
    OutOfRange { index: usize, len: usize },

    /// A playlist with no items was offered.
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Two items in one playlist share an id.
    #[error("Duplicate item id: {0}")]
    DuplicateItemId(String),

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// The handler does not support the requested operation.
    #[error("{kind} items do not support {operation}")]
    UnsupportedOperation {
        kind: MediaKind,
        operation: &'static str,
    },

    /// A handler method was called out of lifecycle order.
    #[error("Handler not ready: {0}")]
    NotLoaded(String),

    /// The orchestrator task has exited.
    #[error("Playback engine has stopped")]
    EngineStopped,

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Builds a [`PlaybackError::LoadFailure`] for `item_id`.
    pub fn load_failure(item_id: impl Into<String>, reason: impl ToString) -> Self {
        PlaybackError::LoadFailure {
            item_id: item_id.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` if the engine keeps running after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PlaybackError::EngineStopped | PlaybackError::Internal(_)
        )
    }

    /// Returns `true` if this error means an item could not be presented.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            PlaybackError::LoadFailure { .. }
                | PlaybackError::DeviceClaim { .. }
                | PlaybackError::NoHandlerRegistered(_)
                | PlaybackError::Bridge(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

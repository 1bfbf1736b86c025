//! # Event Bus System
//!
//! Provides the notification channel from the playback engine to everything
//! that observes it, using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for playback and playlist notifications
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//! - **Subscription Management**: Multiple subscribers can listen independently
//!
//! ## Architecture
//!
//! ```text
//!                               ┌───────────┐     subscribe    ┌──────────────┐
//!                               │           ├─────────────────>│ SurfaceSync  │
//! ┌──────────────┐     emit     │ EventBus  │                  └──────────────┘
//! │ Orchestrator ├─────────────>│ (broadcast│
//! └──────────────┘              │  channel) │     subscribe    ┌──────────────┐
//!                               │           ├─────────────────>│ Host / tests │
//!                               └───────────┘                  └──────────────┘
//! ```
//!
//! The orchestrator is the only publisher. Subscribers never feed anything
//! back; commands travel on a separate channel.
//!
//! ## Usage
//!
//! ### Publishing Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, PlaybackEvent};
//!
//! let event_bus = EventBus::new(100);
//! let _sub = event_bus.subscribe();
//! let event = CoreEvent::Playback(PlaybackEvent::NowLoading {
//!     item_id: "welcome".to_string(),
//!     index: 0,
//!     total: 3,
//! });
//!
//! event_bus.emit(event).ok();
//! ```
//!
//! ### Subscribing to Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, RecvError};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! tokio::spawn(async move {
//!     loop {
//!         match stream.recv().await {
//!             Ok(event) => println!("Received: {:?}", event),
//!             Err(RecvError::Lagged(n)) => eprintln!("Missed {} events", n),
//!             Err(RecvError::Closed) => break,
//!         }
//!     }
//! });
//! # }
//! ```
//!
//! ## Event Types
//!
//! ### Playback Events
//! - `NowLoading`: An item's handler started loading
//! - `NowShowing`: An item is on the display
//! - `Paused` / `Resumed`: Timed media was frozen or continued
//! - `Error`: A recoverable failure the operator should see
//! - `PlaylistExhausted`: The end was reached and nothing further will play
//! - `Cleared`: The display was blanked on request
//! - `Stopped`: The engine shut down
//!
//! ### Playlist Events
//! - `Loaded`: A new playlist replaced the previous one
//! - `Rejected`: A reload was refused and the previous playlist kept
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   Non-fatal; the subscriber continues with newer events.
//! - **`RecvError::Closed`**: All senders have been dropped. Treat as shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

use bridge_traits::surface::RenderCue;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind than this receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Presentation lifecycle events
    Playback(PlaybackEvent),
    /// Playlist replacement events
    Playlist(PlaylistEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Playlist(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Playlist(PlaylistEvent::Rejected { .. }) => EventSeverity::Error,
            CoreEvent::Playlist(PlaylistEvent::Loaded { issues, .. }) if !issues.is_empty() => {
                EventSeverity::Warning
            }
            CoreEvent::Playback(PlaybackEvent::PlaylistExhausted { .. })
            | CoreEvent::Playback(PlaybackEvent::NowShowing { .. })
            | CoreEvent::Playback(PlaybackEvent::Stopped)
            | CoreEvent::Playlist(PlaylistEvent::Loaded { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Returns `true` for the event that ends the engine's lifetime.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CoreEvent::Playback(PlaybackEvent::Stopped))
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events describing what the presentation is doing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The handler for an item started loading.
    NowLoading {
        /// The item being loaded.
        item_id: String,
        /// Zero-based playlist position.
        index: usize,
        /// Playlist length.
        total: usize,
    },
    /// An item became the active presentation.
    NowShowing {
        /// The item on display.
        item_id: String,
        /// Zero-based playlist position.
        index: usize,
        /// Playlist length.
        total: usize,
        /// What the display surface should render.
        cue: RenderCue,
    },
    /// Timed playback was frozen.
    Paused {
        /// The paused item.
        item_id: String,
    },
    /// Timed playback continued.
    Resumed {
        /// The resumed item.
        item_id: String,
    },
    /// A recoverable failure occurred.
    Error {
        /// The item involved, if any.
        item_id: Option<String>,
        /// Human-readable error message.
        message: String,
        /// Whether the engine carries on after this error.
        recoverable: bool,
    },
    /// The end of the playlist was reached with no wrap.
    PlaylistExhausted {
        /// The item left on display, if one is.
        last_item_id: Option<String>,
    },
    /// The display was blanked on operator request.
    Cleared,
    /// The engine shut down.
    Stopped,
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::NowLoading { .. } => "Loading item",
            PlaybackEvent::NowShowing { .. } => "Showing item",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Error { .. } => "Playback error",
            PlaybackEvent::PlaylistExhausted { .. } => "End of playlist reached",
            PlaybackEvent::Cleared => "Display cleared",
            PlaybackEvent::Stopped => "Presentation stopped",
        }
    }

    /// The item this event concerns, if any.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            PlaybackEvent::NowLoading { item_id, .. }
            | PlaybackEvent::NowShowing { item_id, .. }
            | PlaybackEvent::Paused { item_id }
            | PlaybackEvent::Resumed { item_id } => Some(item_id),
            PlaybackEvent::Error { item_id, .. } => item_id.as_deref(),
            PlaybackEvent::PlaylistExhausted { last_item_id } => last_item_id.as_deref(),
            PlaybackEvent::Cleared | PlaybackEvent::Stopped => None,
        }
    }
}

// ============================================================================
// Playlist Events
// ============================================================================

/// Events about playlist replacement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaylistEvent {
    /// A new playlist is now current.
    Loaded {
        /// Number of items.
        count: usize,
        /// Non-blocking configuration warnings found in the playlist.
        issues: Vec<String>,
    },
    /// A reload was refused; the previous playlist is still current.
    Rejected {
        /// Why the playlist was refused.
        reason: String,
    },
}

impl PlaylistEvent {
    fn description(&self) -> &str {
        match self {
            PlaylistEvent::Loaded { .. } => "Playlist loaded",
            PlaylistEvent::Rejected { .. } => "Playlist rejected",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering capabilities.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let errors_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| event.severity() >= core_runtime::events::EventSeverity::Error);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! # Host Bridge Traits
//!
//! Capability traits the presenter core needs from its host.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback engine and the
//! application embedding it. The engine decides what to show and when; the
//! host inspects media files and draws pixels.
//!
//! ## Traits
//!
//! ### Media
//! - [`MediaProbe`](media::MediaProbe) - Reads durations, image sizes and text bodies
//!
//! ### Surfaces
//! - [`DisplaySurface`](surface::DisplaySurface) - Audience-facing renderer
//! - [`ControlSurface`](surface::ControlSurface) - Operator-facing status view
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive `CapabilityMissing` error when a
//! required capability such as the media probe is not injected. Desktop hosts
//! get defaults from `bridge-desktop` through the `desktop-shims` feature.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors to it and include the offending source path
//! in the message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared between the engine task and the surface sync task.

pub mod error;
pub mod logging;
pub mod media;
pub mod surface;

pub use error::BridgeError;

// Re-export commonly used types
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{Dimensions, MediaInfo, MediaKind, MediaProbe};
pub use surface::{
    ControlStatus, ControlSurface, DisplayInstruction, DisplaySurface, ImageLayer, RenderCue,
    StatusPhase, StatusSeverity,
};

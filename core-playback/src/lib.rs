//! # Playback Orchestration
//!
//! Drives a playlist of images, videos, audio clips and text slides across
//! the presenter's two surfaces.
//!
//! ## Overview
//!
//! This crate handles:
//! - Playlist model and validation ([`item`], [`validation`])
//! - Cursor movement with hold or wrap at the end ([`cursor`])
//! - Per-kind media handlers with a load/activate/deactivate lifecycle
//!   ([`handler`])
//! - Automatic advance planning ([`policy`])
//! - The single-task state machine that ties it together ([`orchestrator`])
//! - Projection of engine events onto the display and control surfaces
//!   ([`sync`])
//!
//! ## Example
//!
//! ```ignore
//! use core_playback::{HandlerRegistry, MediaItem, PlaybackOrchestrator, Playlist};
//! use core_runtime::config::PlaybackSettings;
//! use core_runtime::events::EventBus;
//!
//! let registry = HandlerRegistry::with_defaults(probe, DeviceArbiter::new());
//! let engine = PlaybackOrchestrator::spawn(PlaybackSettings::default(), registry, EventBus::default());
//! engine.reload(Playlist::new(items)?)?;
//! engine.next()?;
//! ```

pub mod command;
pub mod cursor;
pub mod device;
pub mod error;
pub mod handler;
pub mod item;
pub mod orchestrator;
pub mod policy;
pub mod sync;
pub mod validation;

pub use command::Command;
pub use cursor::{Advance, PlaylistCursor, Retreat};
pub use device::{Device, DeviceArbiter, DeviceLease};
pub use error::{PlaybackError, Result};
pub use handler::{
    CompletionSignal, HandlerEvent, HandlerPhase, HandlerRegistry, InstanceId, MediaHandler,
    NaturalDuration,
};
pub use item::{MediaItem, Playlist, TransitionMode};
pub use orchestrator::{EngineHandle, EngineState, PlaybackOrchestrator};
pub use policy::{AdvancePlan, DelaySource, TransitionPolicy};
pub use sync::{ControlProjection, DisplayProjection, SurfaceSync};
pub use validation::{validate_playlist, PlaylistIssue};

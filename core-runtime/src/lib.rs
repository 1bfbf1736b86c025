//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the presenter core:
//! - Logging and tracing infrastructure
//! - Playback settings and configuration management
//! - Event bus system carrying engine notifications
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the engine and its hosts share.
//! It establishes the logging conventions, the injected configuration and the
//! one-directional event channel from the engine to the presentation
//! surfaces.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};

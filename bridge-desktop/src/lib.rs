//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - [`LocalMediaProbe`] inspects files on disk using `lofty` for audio and
//!   video length and `image` for picture sizes
//! - [`TracingDisplaySurface`] and [`TracingControlSurface`] log what a real
//!   window would show, for headless runs and the demo
//!
//! These are injected automatically when `core-runtime` is built with the
//! `desktop-shims` feature.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::LocalMediaProbe;
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .media_probe(Arc::new(LocalMediaProbe::with_base_dir("/shows/sunday")))
//!     .build()?;
//! ```

mod probe;
mod surface;

pub use probe::LocalMediaProbe;
pub use surface::{TracingControlSurface, TracingDisplaySurface};

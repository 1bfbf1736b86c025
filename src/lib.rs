//! Workspace placeholder crate.
//!
//! Exposes the feature flags that map onto the individual workspace crates so
//! a host can depend on `presenter-workspace` and enable `desktop-shims`
//! without wiring `core-service` and `bridge-desktop` by hand.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

//! # Core Configuration Module
//!
//! Provides configuration management for the presenter core.
//!
//! ## Overview
//!
//! Two layers live here:
//!
//! - [`PlaybackSettings`] is plain data: end-of-playlist behaviour, the default
//!   transition mode, timing knobs and key bindings. It deserializes from the
//!   host's settings file with a default for every field.
//! - [`CoreConfig`] bundles the settings with the bridge implementations the
//!   engine needs. It is built through [`CoreConfigBuilder`], which fails fast
//!   when a required bridge is missing.
//!
//! ## Required Dependencies
//!
//! - `MediaProbe` - Required to learn media durations, sizes and text bodies
//!
//! ## Optional Dependencies
//!
//! - `DisplaySurface` - Audience-facing renderer
//! - `ControlSurface` - Operator status view
//!
//! When the `desktop-shims` feature is enabled, `bridge-desktop` defaults are
//! injected for every bridge that was not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, EndBehavior, PlaybackSettings};
//! use std::sync::Arc;
//!
//! let settings = PlaybackSettings {
//!     end_of_playlist: EndBehavior::Wrap,
//!     ..Default::default()
//! };
//!
//! let config = CoreConfig::builder()
//!     .settings(settings)
//!     .media_probe(Arc::new(MyProbe))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::{ControlSurface, DisplaySurface, MediaProbe};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Playback Settings
// ============================================================================

/// What happens when playback advances past the last item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndBehavior {
    /// Stay on the last item and report that the playlist is exhausted.
    #[default]
    Hold,
    /// Continue from the first item.
    Wrap,
}

/// Resolved transition mode of an item; also the default for items that
/// inherit theirs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceMode {
    /// Advance when the item's duration elapses.
    Auto,
    /// Wait for the operator.
    #[default]
    Manual,
}

/// Operator actions that can be bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    Next,
    Previous,
    Show,
    Clear,
    TogglePause,
    Quit,
}

/// Mapping from operator actions to key names such as `Right` or `Ctrl+Q`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    bindings: BTreeMap<KeyAction, Vec<String>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert(KeyAction::Next, keys(&["Right", "Down", "PageDown"]));
        bindings.insert(KeyAction::Previous, keys(&["Left", "Up", "PageUp"]));
        bindings.insert(KeyAction::Show, keys(&["Space"]));
        bindings.insert(KeyAction::Clear, keys(&["Escape"]));
        bindings.insert(KeyAction::TogglePause, keys(&["P"]));
        bindings.insert(KeyAction::Quit, keys(&["Ctrl+Q"]));
        Self { bindings }
    }
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn normalize_key(key: &str) -> String {
    key.split('+')
        .map(|part| part.trim().to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("+")
}

impl KeyBindings {
    /// Creates an empty binding table.
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Replaces the keys bound to `action`.
    pub fn bind(mut self, action: KeyAction, keys: &[&str]) -> Self {
        self.bindings
            .insert(action, keys.iter().map(|k| k.to_string()).collect());
        self
    }

    /// Keys currently bound to `action`.
    pub fn keys_for(&self, action: KeyAction) -> &[String] {
        self.bindings
            .get(&action)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolves a key name to its action. Matching ignores case and spacing
    /// around `+`.
    pub fn action_for(&self, key: &str) -> Option<KeyAction> {
        let wanted = normalize_key(key);
        self.bindings.iter().find_map(|(action, keys)| {
            keys.iter()
                .any(|bound| normalize_key(bound) == wanted)
                .then_some(*action)
        })
    }

    /// Returns the first key bound to more than one action.
    pub fn find_conflict(&self) -> Option<(String, KeyAction, KeyAction)> {
        let mut seen: BTreeMap<String, KeyAction> = BTreeMap::new();
        for (action, keys) in &self.bindings {
            for key in keys {
                let normalized = normalize_key(key);
                if let Some(previous) = seen.get(&normalized) {
                    if previous != action {
                        return Some((key.clone(), *previous, *action));
                    }
                }
                seen.insert(normalized, *action);
            }
        }
        None
    }
}

/// Engine behaviour knobs, injected at construction time.
///
/// Every field has a serde default, so a partial settings file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Whether advancing past the last item holds or wraps.
    ///
    /// Default: hold.
    #[serde(default)]
    pub end_of_playlist: EndBehavior,

    /// Mode used by items whose transition is `inherit`.
    ///
    /// Default: manual.
    #[serde(default)]
    pub default_transition: AdvanceMode,

    /// Extra time added after a natural media duration before the automatic
    /// advance fires. Explicit duration hints are used as-is.
    ///
    /// Default: zero.
    #[serde(default = "default_auto_advance_grace")]
    pub auto_advance_grace: Duration,

    /// Upper bound on how long an item may take to load before it is treated
    /// as a load failure.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_load_timeout")]
    pub load_timeout: Duration,

    /// Capacity of the notification bus.
    ///
    /// Default: 100 events.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Operator key bindings.
    #[serde(default)]
    pub key_bindings: KeyBindings,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            end_of_playlist: EndBehavior::default(),
            default_transition: AdvanceMode::default(),
            auto_advance_grace: default_auto_advance_grace(),
            load_timeout: default_load_timeout(),
            event_buffer_size: default_event_buffer_size(),
            key_bindings: KeyBindings::default(),
        }
    }
}

impl PlaybackSettings {
    /// Settings for an unattended kiosk loop: wrap at the end and advance
    /// automatically unless an item says otherwise.
    pub fn kiosk() -> Self {
        Self {
            end_of_playlist: EndBehavior::Wrap,
            default_transition: AdvanceMode::Auto,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.load_timeout.is_zero() {
            return Err("load_timeout must be > 0".to_string());
        }

        if self.auto_advance_grace > Duration::from_secs(60) {
            return Err("auto_advance_grace cannot exceed 60 seconds".to_string());
        }

        if self.event_buffer_size == 0 {
            return Err("event_buffer_size must be > 0".to_string());
        }

        if let Some((key, first, second)) = self.key_bindings.find_conflict() {
            return Err(format!(
                "key '{}' is bound to both {:?} and {:?}",
                key, first, second
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_auto_advance_grace() -> Duration {
    Duration::ZERO
}

fn default_load_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_event_buffer_size() -> usize {
    crate::events::DEFAULT_EVENT_BUFFER_SIZE
}

// ============================================================================
// Core Configuration
// ============================================================================

/// Core configuration for the presenter engine.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Engine behaviour settings
    pub settings: PlaybackSettings,

    /// Media inspection bridge (required)
    pub media_probe: Arc<dyn MediaProbe>,

    /// Audience-facing renderer (optional)
    pub display_surface: Option<Arc<dyn DisplaySurface>>,

    /// Operator status view (optional)
    pub control_surface: Option<Arc<dyn ControlSurface>>,

    /// Logging to install when the service starts. `None` leaves the host's
    /// subscriber alone.
    pub logging: Option<LoggingConfig>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("settings", &self.settings)
            .field("media_probe", &"MediaProbe { ... }")
            .field(
                "display_surface",
                &self
                    .display_surface
                    .as_ref()
                    .map(|_| "DisplaySurface { ... }"),
            )
            .field(
                "control_surface",
                &self
                    .control_surface
                    .as_ref()
                    .map(|_| "ControlSurface { ... }"),
            )
            .field("logging", &self.logging)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.settings
            .validate()
            .map_err(|msg| Error::Config(format!("Invalid playback settings: {}", msg)))
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn media_probe_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaProbe".to_string(),
        message: "MediaProbe implementation is required to inspect media before it is shown. \
                 Desktop: enable the 'desktop-shims' feature to use the default LocalMediaProbe. \
                 Embedded hosts: inject a probe backed by the platform media framework."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_media_probe() -> Result<Arc<dyn MediaProbe>> {
    use bridge_desktop::LocalMediaProbe;

    let probe: Arc<dyn MediaProbe> = Arc::new(LocalMediaProbe::new());
    Ok(probe)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_media_probe() -> Result<Arc<dyn MediaProbe>> {
    Err(media_probe_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_display_surface() -> Option<Arc<dyn DisplaySurface>> {
    Some(Arc::new(bridge_desktop::TracingDisplaySurface::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_display_surface() -> Option<Arc<dyn DisplaySurface>> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_control_surface() -> Option<Arc<dyn ControlSurface>> {
    Some(Arc::new(bridge_desktop::TracingControlSurface::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_control_surface() -> Option<Arc<dyn ControlSurface>> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    settings: Option<PlaybackSettings>,
    media_probe: Option<Arc<dyn MediaProbe>>,
    display_surface: Option<Arc<dyn DisplaySurface>>,
    control_surface: Option<Arc<dyn ControlSurface>>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Sets the playback settings.
    ///
    /// Default: [`PlaybackSettings::default()`].
    pub fn settings(mut self, settings: PlaybackSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the media probe implementation (required).
    ///
    /// If not provided, the desktop default is used when the `desktop-shims`
    /// feature is enabled.
    pub fn media_probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.media_probe = Some(probe);
        self
    }

    /// Sets the audience-facing display surface.
    pub fn display_surface(mut self, surface: Arc<dyn DisplaySurface>) -> Self {
        self.display_surface = Some(surface);
        self
    }

    /// Sets the operator-facing control surface.
    pub fn control_surface(mut self, surface: Arc<dyn ControlSurface>) -> Self {
        self.control_surface = Some(surface);
        self
    }

    /// Installs a tracing subscriber with `config` when the service starts.
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns an error if:
    /// - The media probe is missing and no desktop default is available
    /// - The playback settings fail validation
    pub fn build(self) -> Result<CoreConfig> {
        let media_probe = match self.media_probe {
            Some(probe) => probe,
            None => provide_default_media_probe()?,
        };

        let config = CoreConfig {
            settings: self.settings.unwrap_or_default(),
            media_probe,
            display_surface: self
                .display_surface
                .or_else(provide_default_display_surface),
            control_surface: self
                .control_surface
                .or_else(provide_default_control_surface),
            logging: self.logging,
        };

        config.validate()?;

        Ok(config)
    }
}

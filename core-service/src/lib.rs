//! Core service façade and bootstrap helpers.
//!
//! This crate wires a [`CoreConfig`] into a running presenter: it creates the
//! event bus, starts the surface sync task and the playback orchestrator, and
//! turns operator key presses into engine commands. Desktop apps typically
//! enable the `desktop-shims` feature (which depends on `bridge-desktop`) and
//! call [`bootstrap_desktop`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use core_async::sync::CancellationToken;
use core_async::task::JoinHandle;
use core_playback::{
    Command, DeviceArbiter, EngineHandle, EngineState, HandlerRegistry, PlaybackOrchestrator,
    Playlist, SurfaceSync,
};
use core_runtime::config::{CoreConfig, KeyAction, KeyBindings};
use core_runtime::events::{CoreEvent, EventBus, Receiver};
use core_runtime::logging::init_logging;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

#[cfg(feature = "desktop-shims")]
use core_runtime::config::PlaybackSettings;
#[cfg(feature = "desktop-shims")]
use std::path::PathBuf;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    engine: EngineHandle,
    key_bindings: Arc<KeyBindings>,
    surface_sync: Arc<Mutex<Option<JoinHandle<()>>>>,
    stopped: CancellationToken,
}

impl CoreService {
    /// Starts the engine described by `config` on the current tokio runtime.
    ///
    /// The surface sync task subscribes before the orchestrator starts, so
    /// the surfaces see every event from the first one on.
    pub fn start(config: CoreConfig) -> Result<Self> {
        if !core_async::runtime::in_runtime() {
            return Err(CoreError::InitializationFailed(
                "CoreService::start must be called from within a tokio runtime".to_string(),
            ));
        }

        config.validate()?;

        if let Some(logging) = config.logging.clone() {
            if let Err(err) = init_logging(logging) {
                warn!(error = %err, "Keeping the existing tracing subscriber");
            }
        }

        let CoreConfig {
            settings,
            media_probe,
            display_surface,
            control_surface,
            ..
        } = config;

        let bus = EventBus::new(settings.event_buffer_size);
        let surface_sync = SurfaceSync::new(display_surface, control_surface).spawn(&bus);

        let registry = HandlerRegistry::with_defaults(media_probe, DeviceArbiter::new());
        let key_bindings = Arc::new(settings.key_bindings.clone());
        let engine = PlaybackOrchestrator::spawn(settings, registry, bus);

        let stopped = CancellationToken::new();
        {
            let engine = engine.clone();
            let stopped = stopped.clone();
            core_async::spawn(async move {
                let _ = engine
                    .wait_for_state(|state| *state == EngineState::Stopped)
                    .await;
                stopped.cancel();
            });
        }

        info!("Presenter core started");
        Ok(Self {
            engine,
            key_bindings,
            surface_sync: Arc::new(Mutex::new(Some(surface_sync))),
            stopped,
        })
    }

    /// The underlying engine handle.
    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn send(&self, command: Command) -> Result<()> {
        Ok(self.engine.send(command)?)
    }

    /// Replaces the playlist and starts presenting its first item.
    pub fn load_playlist(&self, playlist: Playlist) -> Result<()> {
        self.send(Command::Reload(playlist))
    }

    /// Dispatches an operator key press.
    ///
    /// Returns the bound action, or `None` when the key is not bound.
    pub fn handle_key(&self, key: &str) -> Result<Option<KeyAction>> {
        let Some(action) = self.key_bindings.action_for(key) else {
            debug!(key, "Unbound key");
            return Ok(None);
        };

        debug!(key, ?action, "Key pressed");
        self.send(Command::from(action))?;
        Ok(Some(action))
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.engine.subscribe()
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    /// Token cancelled once the engine has stopped, whether through
    /// [`shutdown`](Self::shutdown) or the quit key.
    pub fn stopped(&self) -> CancellationToken {
        self.stopped.clone()
    }

    /// Stops the engine and waits for the surfaces to receive the final
    /// update.
    pub async fn shutdown(&self) -> Result<()> {
        self.engine.shutdown().await?;

        let surface_sync = self.surface_sync.lock().take();
        if let Some(task) = surface_sync {
            task.await.map_err(|err| {
                CoreError::InitializationFailed(format!("surface sync task failed: {err}"))
            })?;
        }

        self.stopped.cancel();
        info!("Presenter core stopped");
        Ok(())
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("engine", &self.engine)
            .field("stopped", &self.stopped.is_cancelled())
            .finish()
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Media sources resolve relative to `media_dir`, and the tracing surfaces
/// stand in for real windows.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::config::PlaybackSettings;
///
/// let core = core_service::bootstrap_desktop(PlaybackSettings::kiosk(), "/shows/sunday")?;
/// core.handle_key("Right")?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(
    settings: PlaybackSettings,
    media_dir: impl Into<PathBuf>,
) -> Result<CoreService> {
    let config = CoreConfig::builder()
        .settings(settings)
        .media_probe(Arc::new(bridge_desktop::LocalMediaProbe::with_base_dir(
            media_dir,
        )))
        .build()?;
    CoreService::start(config)
}

//! # Playback Orchestrator
//!
//! Owns the playback session and serialises everything that can change it.
//!
//! ## Overview
//!
//! The orchestrator runs as a single task. Operator commands, handler
//! reports and the auto-advance deadline all arrive as inputs and are
//! processed one at a time, in this priority order:
//!
//! 1. Commands from [`EngineHandle`]
//! 2. Handler events (`Loaded`, `Finished`)
//! 3. The auto-advance deadline
//!
//! An explicit command therefore wins over a deadline that expires at the
//! same moment.
//!
//! ## States
//!
//! ```text
//!            Reload            Loaded(ok)
//!   Idle ─────────────> Loading ─────────> Active ──┐
//!                        ^   │                      │ Next / Previous / JumpTo
//!                        │   │ Loaded(err)          │ deadline / finished
//!                        │   v                      │
//!                        │ (skip to next) ──────────┘
//!                        │   │ nothing left
//!                        │   v
//!                        │ Exhausted
//!                        │
//!   Clear: Active/Loading/Exhausted -> Cleared, Show: Cleared -> Loading
//!   Shutdown: any -> Stopped
//! ```
//!
//! ## Stale events
//!
//! Every load gets a fresh [`InstanceId`]. When navigation supersedes an item
//! its handler is deactivated at once, and any `Loaded` or `Finished` event
//! that still carries the old id is dropped on arrival.

use crate::command::Command;
use crate::cursor::{Advance, PlaylistCursor, Retreat};
use crate::error::{PlaybackError, Result};
use crate::handler::{CompletionSignal, HandlerEvent, HandlerRegistry, InstanceId, MediaHandler};
use crate::item::{MediaItem, Playlist};
use crate::policy::{AdvancePlan, TransitionPolicy};
use crate::validation::validate_playlist;
use core_async::sync::{mpsc, watch};
use core_async::task::JoinHandle;
use core_async::time::{sleep_until, timeout, Instant};
use core_runtime::config::PlaybackSettings;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, PlaylistEvent, Receiver};
use core_runtime::logging::strip_path;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

// ============================================================================
// Engine State
// ============================================================================

/// Observable state of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// No playlist has been loaded yet.
    Idle,
    Loading {
        index: usize,
        item_id: String,
    },
    Active {
        index: usize,
        item_id: String,
        paused: bool,
    },
    /// Nothing could be shown: the last item failed or every item failed.
    Exhausted,
    /// The operator blanked the display.
    Cleared,
    Stopped,
}

impl EngineState {
    pub fn label(&self) -> &'static str {
        match self {
            EngineState::Idle => "idle",
            EngineState::Loading { .. } => "loading",
            EngineState::Active { paused: false, .. } => "active",
            EngineState::Active { paused: true, .. } => "paused",
            EngineState::Exhausted => "exhausted",
            EngineState::Cleared => "cleared",
            EngineState::Stopped => "stopped",
        }
    }

    pub fn item_id(&self) -> Option<&str> {
        match self {
            EngineState::Loading { item_id, .. } | EngineState::Active { item_id, .. } => {
                Some(item_id)
            }
            _ => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            EngineState::Loading { index, .. } | EngineState::Active { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, EngineState::Active { .. })
    }
}

// ============================================================================
// Engine Handle
// ============================================================================

/// Cloneable front door to a running orchestrator.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<EngineState>,
    bus: EventBus,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl EngineHandle {
    /// Queues a command. Fails with [`PlaybackError::EngineStopped`] once the
    /// orchestrator has exited.
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::EngineStopped)
    }

    pub fn next(&self) -> Result<()> {
        self.send(Command::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(Command::Previous)
    }

    pub fn jump_to(&self, index: usize) -> Result<()> {
        self.send(Command::JumpTo(index))
    }

    pub fn toggle_pause(&self) -> Result<()> {
        self.send(Command::TogglePause)
    }

    pub fn reload(&self, playlist: Playlist) -> Result<()> {
        self.send(Command::Reload(playlist))
    }

    pub fn clear(&self) -> Result<()> {
        self.send(Command::Clear)
    }

    pub fn show(&self) -> Result<()> {
        self.send(Command::Show)
    }

    /// Latest published state.
    pub fn state(&self) -> EngineState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<EngineState> {
        self.state.clone()
    }

    /// Waits until the state satisfies `predicate` and returns it.
    pub async fn wait_for_state<F>(&self, mut predicate: F) -> Result<EngineState>
    where
        F: FnMut(&EngineState) -> bool,
    {
        let mut state = self.state.clone();
        // Bound to a local so the `watch::Ref` is dropped before `state`.
        let result = state
            .wait_for(|current| predicate(current))
            .await
            .map(|current| current.clone())
            .map_err(|_| PlaybackError::EngineStopped);
        result
    }

    /// Subscribes to the engine's notification bus.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.bus.subscribe()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Asks the orchestrator to stop and waits for it to exit.
    pub async fn shutdown(&self) -> Result<()> {
        let _ = self.send(Command::Shutdown);
        self.join().await
    }

    /// Waits for the orchestrator task to exit. Only the first caller
    /// actually waits; later calls return immediately.
    pub async fn join(&self) -> Result<()> {
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.await.map_err(|err| {
                PlaybackError::Internal(format!("orchestrator task failed: {err}"))
            })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("state", &*self.state.borrow())
            .field("running", &self.is_running())
            .finish()
    }
}

// ============================================================================
// Session Bookkeeping
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotPhase {
    Loading,
    Active,
    Paused,
}

/// The item currently being loaded or presented.
struct Slot {
    instance: InstanceId,
    index: usize,
    item: MediaItem,
    /// `None` when no handler could be created; the failure is already
    /// queued as a `Loaded` event.
    handler: Option<Arc<dyn MediaHandler>>,
    phase: SlotPhase,
    /// An automatic advance is still pending for this item.
    armed: bool,
    /// End of media also triggers the advance.
    race_finished: bool,
}

#[derive(Debug, Clone, Copy)]
enum Deadline {
    Running { instance: InstanceId, at: Instant },
    Frozen { instance: InstanceId, remaining: Duration },
}

enum Input {
    Command(Command),
    Handler(HandlerEvent),
    Deadline(InstanceId),
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Single-task state machine driving playback.
pub struct PlaybackOrchestrator {
    cursor: PlaylistCursor,
    policy: TransitionPolicy,
    settings: PlaybackSettings,
    registry: HandlerRegistry,
    bus: EventBus,
    state: EngineState,
    state_tx: watch::Sender<EngineState>,
    commands: mpsc::UnboundedReceiver<Command>,
    handler_tx: mpsc::UnboundedSender<HandlerEvent>,
    handler_rx: mpsc::UnboundedReceiver<HandlerEvent>,
    slot: Option<Slot>,
    deadline: Option<Deadline>,
    next_instance: u64,
    consecutive_failures: usize,
}

impl PlaybackOrchestrator {
    /// Starts the orchestrator on the current tokio runtime.
    ///
    /// The engine begins in [`EngineState::Idle`]; send
    /// [`Command::Reload`] to give it a playlist.
    pub fn spawn(
        settings: PlaybackSettings,
        registry: HandlerRegistry,
        bus: EventBus,
    ) -> EngineHandle {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(EngineState::Idle);
        let (handler_tx, handler_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            cursor: PlaylistCursor::new(settings.end_of_playlist),
            policy: TransitionPolicy::from_settings(&settings),
            settings,
            registry,
            bus: bus.clone(),
            state: EngineState::Idle,
            state_tx,
            commands,
            handler_tx,
            handler_rx,
            slot: None,
            deadline: None,
            next_instance: 0,
            consecutive_failures: 0,
        };

        let task = core_async::spawn(
            orchestrator
                .run()
                .instrument(info_span!("playback_orchestrator")),
        );

        EngineHandle {
            commands: command_tx,
            state: state_rx,
            bus,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    async fn run(mut self) {
        info!(
            end_of_playlist = ?self.settings.end_of_playlist,
            default_transition = ?self.settings.default_transition,
            "Playback orchestrator started"
        );

        loop {
            let deadline = self.running_deadline();
            let input = core_async::select! {
                biased;
                command = self.commands.recv() => {
                    Input::Command(command.unwrap_or(Command::Shutdown))
                }
                Some(event) = self.handler_rx.recv() => Input::Handler(event),
                instance = wait_for_deadline(deadline) => Input::Deadline(instance),
            };

            if !self.process(input) {
                break;
            }
        }

        info!("Playback orchestrator stopped");
    }

    fn process(&mut self, input: Input) -> bool {
        match input {
            Input::Command(command) => return self.handle_command(command),
            Input::Handler(HandlerEvent::Loaded { instance, result }) => {
                self.on_loaded(instance, result)
            }
            Input::Handler(HandlerEvent::Finished { instance }) => self.on_finished(instance),
            Input::Deadline(instance) => self.on_deadline(instance),
        }
        true
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    fn handle_command(&mut self, command: Command) -> bool {
        debug!(command = command.name(), state = self.state.label(), "Command received");

        if matches!(
            command,
            Command::Next | Command::Previous | Command::JumpTo(_) | Command::Show
        ) {
            self.consecutive_failures = 0;
        }

        match command {
            Command::Next => self.next(),
            Command::Previous => self.previous(),
            Command::JumpTo(index) => self.jump_to(index),
            Command::TogglePause => self.toggle_pause(),
            Command::Reload(playlist) => self.reload(playlist),
            Command::Clear => self.clear(),
            Command::Show => self.show(),
            Command::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    fn next(&mut self) {
        if self.state == EngineState::Idle {
            debug!("Next ignored: no playlist loaded");
            return;
        }

        match self.cursor.advance() {
            Advance::Moved(index) | Advance::Wrapped(index) => self.present(index),
            Advance::AtEnd if matches!(self.state, EngineState::Loading { .. }) => {
                debug!("Next ignored: last item is still loading");
            }
            Advance::AtEnd if self.state == EngineState::Cleared => {
                debug!("Next ignored: display is cleared at the last item");
            }
            Advance::AtEnd => self.report_end(),
        }
    }

    fn previous(&mut self) {
        if self.state == EngineState::Idle {
            debug!("Previous ignored: no playlist loaded");
            return;
        }

        match self.cursor.retreat() {
            Retreat::Moved(index) => self.present(index),
            Retreat::AtStart => debug!("Previous ignored: already at the first item"),
        }
    }

    fn jump_to(&mut self, index: usize) {
        match self.cursor.jump_to(index) {
            Ok(index) => self.present(index),
            Err(err) => {
                warn!(index, error = %err, "Jump rejected");
                self.emit(PlaybackEvent::Error {
                    item_id: None,
                    message: err.to_string(),
                    recoverable: err.is_recoverable(),
                });
            }
        }
    }

    fn toggle_pause(&mut self) {
        let Some(slot) = self.slot.as_ref() else {
            debug!("Pause ignored: nothing is showing");
            return;
        };
        let (Some(handler), phase) = (slot.handler.clone(), slot.phase) else {
            return;
        };
        let item_id = slot.item.id.clone();
        let index = slot.index;

        let pausing = match phase {
            SlotPhase::Active => true,
            SlotPhase::Paused => false,
            SlotPhase::Loading => {
                debug!(item_id = %item_id, "Pause ignored: item is still loading");
                return;
            }
        };

        let result = if pausing {
            handler.pause()
        } else {
            handler.resume()
        };

        match result {
            Ok(()) => {}
            Err(PlaybackError::UnsupportedOperation { kind, operation }) => {
                info!(item_id = %item_id, %kind, operation, "Pause not supported for this item");
                return;
            }
            Err(err) => {
                warn!(item_id = %item_id, error = %err, "Pause toggle failed");
                return;
            }
        }

        if let Some(slot) = self.slot.as_mut() {
            slot.phase = if pausing {
                SlotPhase::Paused
            } else {
                SlotPhase::Active
            };
        }

        if pausing {
            self.freeze_deadline();
            debug!(item_id = %item_id, "Paused");
            self.set_state(EngineState::Active {
                index,
                item_id: item_id.clone(),
                paused: true,
            });
            self.emit(PlaybackEvent::Paused { item_id });
        } else {
            self.thaw_deadline();
            debug!(item_id = %item_id, "Resumed");
            self.set_state(EngineState::Active {
                index,
                item_id: item_id.clone(),
                paused: false,
            });
            self.emit(PlaybackEvent::Resumed { item_id });
        }
    }

    fn reload(&mut self, playlist: Playlist) {
        let issues = validate_playlist(&playlist, &self.settings);
        let count = playlist.len();

        if let Err(err) = self.cursor.reset(playlist) {
            warn!(error = %err, "Playlist rejected; keeping the current one");
            self.emit_playlist(PlaylistEvent::Rejected {
                reason: err.to_string(),
            });
            self.emit(PlaybackEvent::Error {
                item_id: None,
                message: err.to_string(),
                recoverable: true,
            });
            return;
        }

        for issue in &issues {
            warn!(item_id = issue.item_id(), "Playlist issue: {issue}");
        }
        info!(count, issues = issues.len(), "Playlist loaded");

        self.consecutive_failures = 0;
        self.emit_playlist(PlaylistEvent::Loaded {
            count,
            issues: issues.iter().map(ToString::to_string).collect(),
        });
        self.present(0);
    }

    fn clear(&mut self) {
        if matches!(
            self.state,
            EngineState::Idle | EngineState::Cleared | EngineState::Stopped
        ) {
            debug!(state = self.state.label(), "Clear ignored");
            return;
        }

        self.release();
        info!("Display cleared");
        self.set_state(EngineState::Cleared);
        self.emit(PlaybackEvent::Cleared);
    }

    fn show(&mut self) {
        if !matches!(self.state, EngineState::Cleared | EngineState::Exhausted) {
            debug!(state = self.state.label(), "Show ignored");
            return;
        }

        match self.cursor.current_index() {
            Some(index) => self.present(index),
            None => debug!("Show ignored: no playlist loaded"),
        }
    }

    fn shutdown(&mut self) {
        self.release();
        info!("Shutting down playback");
        self.set_state(EngineState::Stopped);
        self.emit(PlaybackEvent::Stopped);
    }

    // ------------------------------------------------------------------------
    // Handler events
    // ------------------------------------------------------------------------

    fn on_loaded(&mut self, instance: InstanceId, result: Result<()>) {
        let current = self
            .slot
            .as_ref()
            .is_some_and(|slot| slot.instance == instance && slot.phase == SlotPhase::Loading);

        if !current {
            debug!(%instance, ok = result.is_ok(), "Discarding stale load result");
            return;
        }

        match result {
            Ok(()) => self.activate_current(),
            Err(err) => self.on_load_failure(err),
        }
    }

    fn on_finished(&mut self, instance: InstanceId) {
        let armed = self.slot.as_ref().is_some_and(|slot| {
            slot.instance == instance
                && slot.phase == SlotPhase::Active
                && slot.armed
                && slot.race_finished
        });

        if armed {
            debug!(%instance, "End of media");
            self.auto_advance();
        } else {
            trace!(%instance, "Ignoring finished signal");
        }
    }

    fn on_deadline(&mut self, instance: InstanceId) {
        let due = matches!(
            self.deadline,
            Some(Deadline::Running { instance: pending, .. }) if pending == instance
        );
        if !due {
            return;
        }
        self.deadline = None;

        let armed = self.slot.as_ref().is_some_and(|slot| {
            slot.instance == instance && slot.phase == SlotPhase::Active && slot.armed
        });
        if armed {
            debug!(%instance, "Display duration elapsed");
            self.auto_advance();
        }
    }

    fn activate_current(&mut self) {
        let Some((instance, index, item, handler)) = self.slot.as_ref().and_then(|slot| {
            slot.handler
                .clone()
                .map(|handler| (slot.instance, slot.index, slot.item.clone(), handler))
        }) else {
            return;
        };

        let signal = CompletionSignal::new(instance, self.handler_tx.clone());
        let cue = match handler.activate(signal) {
            Ok(cue) => cue,
            Err(err) => {
                self.on_load_failure(err);
                return;
            }
        };

        let plan = self
            .policy
            .plan(&item, handler.natural_duration(), handler.emits_finished());

        if let Some(slot) = self.slot.as_mut() {
            slot.phase = SlotPhase::Active;
            slot.armed = plan.is_auto();
            slot.race_finished = matches!(
                plan,
                AdvancePlan::After {
                    race_finished: true,
                    ..
                }
            );
        }
        self.deadline = plan.delay().map(|delay| Deadline::Running {
            instance,
            at: Instant::now() + delay,
        });
        self.consecutive_failures = 0;

        info!(item_id = %item.id, index, kind = %item.kind, ?plan, "Now showing");
        self.set_state(EngineState::Active {
            index,
            item_id: item.id.clone(),
            paused: false,
        });
        self.emit(PlaybackEvent::NowShowing {
            item_id: item.id,
            index,
            total: self.cursor.len(),
            cue,
        });
    }

    fn on_load_failure(&mut self, err: PlaybackError) {
        let failed = self.slot.as_ref().map(|slot| slot.item.id.clone());
        self.release();

        error!(item_id = ?failed, error = %err, "Item failed to load");
        self.emit(PlaybackEvent::Error {
            item_id: failed,
            message: err.to_string(),
            recoverable: true,
        });

        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.cursor.len() {
            warn!(
                failures = self.consecutive_failures,
                "Every item in the playlist failed to load"
            );
            self.exhaust();
            return;
        }

        match self.cursor.advance() {
            Advance::Moved(index) | Advance::Wrapped(index) => self.present(index),
            Advance::AtEnd => self.exhaust(),
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Tears down the current item and starts loading `index`.
    fn present(&mut self, index: usize) {
        self.release();

        let Some(item) = self.cursor.playlist().get(index).cloned() else {
            warn!(index, "Cursor points outside the playlist");
            return;
        };

        self.next_instance += 1;
        let instance = InstanceId(self.next_instance);

        debug!(
            %instance,
            item_id = %item.id,
            index,
            kind = %item.kind,
            source = strip_path(&item.source),
            "Loading item"
        );
        self.set_state(EngineState::Loading {
            index,
            item_id: item.id.clone(),
        });
        self.emit(PlaybackEvent::NowLoading {
            item_id: item.id.clone(),
            index,
            total: self.cursor.len(),
        });

        let handler = match self.registry.create(item.kind) {
            Ok(handler) => {
                self.spawn_load(instance, Arc::clone(&handler), item.clone());
                Some(handler)
            }
            Err(err) => {
                let _ = self.handler_tx.send(HandlerEvent::Loaded {
                    instance,
                    result: Err(err),
                });
                None
            }
        };

        self.slot = Some(Slot {
            instance,
            index,
            item,
            handler,
            phase: SlotPhase::Loading,
            armed: false,
            race_finished: false,
        });
    }

    fn spawn_load(&self, instance: InstanceId, handler: Arc<dyn MediaHandler>, item: MediaItem) {
        let events = self.handler_tx.clone();
        let limit = self.settings.load_timeout;

        core_async::spawn(async move {
            let result = match timeout(limit, handler.load(&item)).await {
                Ok(result) => result,
                Err(_) => Err(PlaybackError::load_failure(
                    &item.id,
                    format!("timed out after {}ms", limit.as_millis()),
                )),
            };
            let _ = events.send(HandlerEvent::Loaded { instance, result });
        });
    }

    fn auto_advance(&mut self) {
        self.deadline = None;
        let Some(slot) = self.slot.as_mut() else {
            return;
        };
        slot.armed = false;
        let item_id = slot.item.id.clone();

        if let Some(target) = slot.item.loop_to {
            match self.cursor.jump_to(target) {
                Ok(index) => {
                    debug!(item_id = %item_id, target, "Following loop target");
                    self.present(index);
                    return;
                }
                Err(err) => warn!(item_id = %item_id, error = %err, "Ignoring loop target"),
            }
        }

        match self.cursor.advance() {
            Advance::Moved(index) | Advance::Wrapped(index) => self.present(index),
            Advance::AtEnd => self.report_end(),
        }
    }

    /// Signals that there is nothing after the current item. The current
    /// item stays on screen.
    fn report_end(&mut self) {
        self.deadline = None;
        let last_item_id = self.slot.as_mut().and_then(|slot| {
            slot.armed = false;
            (slot.phase != SlotPhase::Loading).then(|| slot.item.id.clone())
        });

        info!(last_item_id = ?last_item_id, "End of playlist reached");
        self.emit(PlaybackEvent::PlaylistExhausted { last_item_id });
    }

    fn exhaust(&mut self) {
        self.release();
        self.set_state(EngineState::Exhausted);
        self.emit(PlaybackEvent::PlaylistExhausted { last_item_id: None });
    }

    /// Deactivates the current handler and cancels its deadline.
    fn release(&mut self) {
        self.deadline = None;
        if let Some(slot) = self.slot.take() {
            if let Some(handler) = slot.handler {
                handler.deactivate();
            }
            trace!(instance = %slot.instance, item_id = %slot.item.id, "Handler released");
        }
    }

    // ------------------------------------------------------------------------
    // Deadline bookkeeping
    // ------------------------------------------------------------------------

    fn running_deadline(&self) -> Option<(InstanceId, Instant)> {
        match self.deadline {
            Some(Deadline::Running { instance, at }) => Some((instance, at)),
            _ => None,
        }
    }

    fn freeze_deadline(&mut self) {
        if let Some(Deadline::Running { instance, at }) = self.deadline {
            self.deadline = Some(Deadline::Frozen {
                instance,
                remaining: at.saturating_duration_since(Instant::now()),
            });
        }
    }

    fn thaw_deadline(&mut self) {
        if let Some(Deadline::Frozen {
            instance,
            remaining,
        }) = self.deadline
        {
            self.deadline = Some(Deadline::Running {
                instance,
                at: Instant::now() + remaining,
            });
        }
    }

    // ------------------------------------------------------------------------
    // Publication
    // ------------------------------------------------------------------------

    fn set_state(&mut self, state: EngineState) {
        self.state = state.clone();
        self.state_tx.send_replace(state);
    }

    fn emit(&self, event: PlaybackEvent) {
        if self.bus.emit(CoreEvent::Playback(event)).is_err() {
            trace!("No subscribers for playback event");
        }
    }

    fn emit_playlist(&self, event: PlaylistEvent) {
        if self.bus.emit(CoreEvent::Playlist(event)).is_err() {
            trace!("No subscribers for playlist event");
        }
    }
}

async fn wait_for_deadline(deadline: Option<(InstanceId, Instant)>) -> InstanceId {
    match deadline {
        Some((instance, at)) => {
            sleep_until(at).await;
            instance
        }
        None => std::future::pending().await,
    }
}

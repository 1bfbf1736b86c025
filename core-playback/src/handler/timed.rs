//! Shared machinery for time-based media.
//!
//! The host's display does the actual decoding; the engine only needs to
//! know when playback would end. [`PlaybackClock`] tracks that by counting
//! down the probed length, freezing while paused.

use super::{CompletionSignal, HandlerPhase, NaturalDuration};
use crate::device::{Device, DeviceArbiter, DeviceLease};
use crate::error::{PlaybackError, Result};
use crate::item::MediaItem;
use bridge_traits::media::{MediaKind, MediaProbe};
use bridge_traits::surface::RenderCue;
use core_async::sync::mpsc;
use core_async::task::JoinHandle;
use core_async::time::{sleep, Instant};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

// ============================================================================
// Playback Clock
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum ClockControl {
    Pause,
    Resume,
}

/// Countdown to end of media. Fires the completion signal once; stops when
/// dropped.
#[derive(Debug)]
pub(crate) struct PlaybackClock {
    control: mpsc::UnboundedSender<ClockControl>,
    task: JoinHandle<()>,
}

impl PlaybackClock {
    pub(crate) fn start(length: Duration, finished: CompletionSignal) -> Self {
        let (control, rx) = mpsc::unbounded_channel();
        let task = core_async::spawn(run_clock(length, rx, finished));
        Self { control, task }
    }

    pub(crate) fn pause(&self) {
        let _ = self.control.send(ClockControl::Pause);
    }

    pub(crate) fn resume(&self) {
        let _ = self.control.send(ClockControl::Resume);
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_clock(
    length: Duration,
    mut control: mpsc::UnboundedReceiver<ClockControl>,
    finished: CompletionSignal,
) {
    let mut remaining = length;
    let mut running = true;

    loop {
        if !running {
            match control.recv().await {
                Some(ClockControl::Resume) => running = true,
                Some(ClockControl::Pause) => {}
                None => return,
            }
            continue;
        }

        let started = Instant::now();
        core_async::select! {
            _ = sleep(remaining) => {
                trace!(instance = %finished.instance(), "Playback clock elapsed");
                finished.finished();
                return;
            }
            message = control.recv() => {
                remaining = remaining.saturating_sub(started.elapsed());
                match message {
                    Some(ClockControl::Pause) => running = false,
                    Some(ClockControl::Resume) => {}
                    None => return,
                }
            }
        }
    }
}

// ============================================================================
// Timed Media
// ============================================================================

#[derive(Debug, Default)]
struct TimedState {
    phase: HandlerPhase,
    source: String,
    length: Option<Duration>,
    leases: Vec<DeviceLease>,
    clock: Option<PlaybackClock>,
}

/// Lifecycle shared by the audio and video handlers.
pub(crate) struct TimedMedia {
    kind: MediaKind,
    devices: &'static [Device],
    probe: Arc<dyn MediaProbe>,
    arbiter: DeviceArbiter,
    state: Mutex<TimedState>,
}

impl TimedMedia {
    pub(crate) fn new(
        kind: MediaKind,
        devices: &'static [Device],
        probe: Arc<dyn MediaProbe>,
        arbiter: DeviceArbiter,
    ) -> Self {
        Self {
            kind,
            devices,
            probe,
            arbiter,
            state: Mutex::new(TimedState::default()),
        }
    }

    pub(crate) fn phase(&self) -> HandlerPhase {
        self.state.lock().phase
    }

    pub(crate) async fn load(&self, item: &MediaItem) -> Result<()> {
        self.state.lock().phase.begin_load(&item.id)?;

        let mut leases = Vec::with_capacity(self.devices.len());
        for device in self.devices {
            match self.arbiter.claim(*device, &item.id) {
                Ok(lease) => leases.push(lease),
                Err(err) => {
                    self.state.lock().phase.fail();
                    return Err(err);
                }
            }
        }

        {
            // Leases live in the state from here on so deactivate() can drop
            // them while the probe is in flight.
            let mut state = self.state.lock();
            if state.phase.is_retired() {
                return Err(PlaybackError::load_failure(
                    &item.id,
                    "handler was deactivated before loading finished",
                ));
            }
            state.leases = leases;
        }

        let info = match self.probe.probe(self.kind, &item.source).await {
            Ok(info) => info,
            Err(err) => {
                let mut state = self.state.lock();
                state.phase.fail();
                state.leases.clear();
                return Err(PlaybackError::load_failure(&item.id, err));
            }
        };

        let mut state = self.state.lock();
        if let Err(err) = state.phase.finish_load(&item.id) {
            state.leases.clear();
            return Err(err);
        }
        state.source = item.source.clone();
        state.length = info.duration.filter(|length| !length.is_zero());
        debug!(
            item_id = %item.id,
            kind = %self.kind,
            length = ?state.length,
            "Timed media ready"
        );
        Ok(())
    }

    /// Starts the clock and returns the source and length for the cue.
    pub(crate) fn activate(&self, finished: CompletionSignal) -> Result<(String, Option<u64>)> {
        let mut state = self.state.lock();
        state.phase.begin_activate()?;
        if let Some(length) = state.length {
            state.clock = Some(PlaybackClock::start(length, finished));
        }
        let length_ms = state
            .length
            .map(|length| u64::try_from(length.as_millis()).unwrap_or(u64::MAX));
        Ok((state.source.clone(), length_ms))
    }

    pub(crate) fn deactivate(&self) {
        let mut state = self.state.lock();
        state.phase.retire();
        state.clock = None;
        state.leases.clear();
    }

    pub(crate) fn natural_duration(&self) -> NaturalDuration {
        self.state.lock().length.into()
    }

    pub(crate) fn pause(&self) -> Result<()> {
        let mut state = self.state.lock();
        match state.phase {
            HandlerPhase::Active => {
                state.phase = HandlerPhase::Paused;
                if let Some(clock) = &state.clock {
                    clock.pause();
                }
                Ok(())
            }
            HandlerPhase::Paused => Ok(()),
            other => Err(PlaybackError::NotLoaded(format!(
                "cannot pause {} in phase {other:?}",
                self.kind
            ))),
        }
    }

    pub(crate) fn resume(&self) -> Result<()> {
        let mut state = self.state.lock();
        match state.phase {
            HandlerPhase::Paused => {
                state.phase = HandlerPhase::Active;
                if let Some(clock) = &state.clock {
                    clock.resume();
                }
                Ok(())
            }
            HandlerPhase::Active => Ok(()),
            other => Err(PlaybackError::NotLoaded(format!(
                "cannot resume {} in phase {other:?}",
                self.kind
            ))),
        }
    }
}

/// Builds the playback cue for `kind`.
pub(crate) fn playback_cue(kind: MediaKind, source: String, duration_ms: Option<u64>) -> RenderCue {
    match kind {
        MediaKind::Audio => RenderCue::Audio {
            source,
            duration_ms,
        },
        _ => RenderCue::Video {
            source,
            duration_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerEvent, InstanceId};

    fn clock(length: Duration) -> (PlaybackClock, mpsc::UnboundedReceiver<HandlerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signal = CompletionSignal::new(InstanceId(3), tx);
        (PlaybackClock::start(length, signal), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_fires_at_end_of_media() {
        let (_clock, mut rx) = clock(Duration::from_secs(12));
        let start = Instant::now();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.instance(), InstanceId(3));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(12) && elapsed < Duration::from_secs(13));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_freezes_while_paused() {
        let (clock, mut rx) = clock(Duration::from_secs(10));
        let start = Instant::now();

        sleep(Duration::from_secs(4)).await;
        clock.pause();
        sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());

        clock.resume();
        rx.recv().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(40) && elapsed < Duration::from_secs(41));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_clock_never_fires() {
        let (clock, mut rx) = clock(Duration::from_secs(2));
        drop(clock);
        sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}

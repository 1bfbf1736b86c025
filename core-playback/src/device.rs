//! Exclusive output devices.
//!
//! Only one item at a time may hold the audio output or the video decoder.
//! A handler claims a [`DeviceLease`] while it loads and keeps it while it
//! is active; dropping the lease releases the device.

use crate::error::{PlaybackError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    AudioOutput,
    VideoDecoder,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::AudioOutput => f.write_str("audio-output"),
            Device::VideoDecoder => f.write_str("video-decoder"),
        }
    }
}

#[derive(Debug)]
struct Holder {
    item_id: String,
    token: u64,
}

#[derive(Debug, Default)]
struct ArbiterState {
    holders: HashMap<Device, Holder>,
    next_token: u64,
}

/// Hands out exclusive device leases. Clones share the same devices.
#[derive(Debug, Clone, Default)]
pub struct DeviceArbiter {
    state: Arc<Mutex<ArbiterState>>,
}

impl DeviceArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `device` for `item_id`.
    ///
    /// Fails with [`PlaybackError::DeviceClaim`] naming the current holder
    /// when the device is taken.
    pub fn claim(&self, device: Device, item_id: &str) -> Result<DeviceLease> {
        let mut state = self.state.lock();
        if let Some(holder) = state.holders.get(&device) {
            return Err(PlaybackError::DeviceClaim {
                device: device.to_string(),
                holder: holder.item_id.clone(),
            });
        }

        state.next_token += 1;
        let token = state.next_token;
        state.holders.insert(
            device,
            Holder {
                item_id: item_id.to_string(),
                token,
            },
        );
        debug!(%device, item_id, "Device claimed");

        Ok(DeviceLease {
            device,
            token,
            arbiter: self.clone(),
        })
    }

    /// Item currently holding `device`.
    pub fn holder(&self, device: Device) -> Option<String> {
        self.state
            .lock()
            .holders
            .get(&device)
            .map(|holder| holder.item_id.clone())
    }

    pub fn is_free(&self, device: Device) -> bool {
        !self.state.lock().holders.contains_key(&device)
    }

    fn release(&self, device: Device, token: u64) {
        let mut state = self.state.lock();
        if state
            .holders
            .get(&device)
            .is_some_and(|holder| holder.token == token)
        {
            if let Some(holder) = state.holders.remove(&device) {
                debug!(%device, item_id = %holder.item_id, "Device released");
            }
        }
    }
}

/// Proof of exclusive access to a device. Released on drop.
#[derive(Debug)]
pub struct DeviceLease {
    device: Device,
    token: u64,
    arbiter: DeviceArbiter,
}

impl DeviceLease {
    pub fn device(&self) -> Device {
        self.device
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.arbiter.release(self.device, self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_is_exclusive() {
        let arbiter = DeviceArbiter::new();
        let lease = arbiter.claim(Device::AudioOutput, "song").unwrap();
        assert_eq!(lease.device(), Device::AudioOutput);
        assert_eq!(arbiter.holder(Device::AudioOutput).as_deref(), Some("song"));

        let err = arbiter.claim(Device::AudioOutput, "jingle").unwrap_err();
        match err {
            PlaybackError::DeviceClaim { device, holder } => {
                assert_eq!(device, "audio-output");
                assert_eq!(holder, "song");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_devices_are_independent() {
        let arbiter = DeviceArbiter::new();
        let _audio = arbiter.claim(Device::AudioOutput, "song").unwrap();
        let _video = arbiter.claim(Device::VideoDecoder, "clip").unwrap();
        assert!(!arbiter.is_free(Device::AudioOutput));
        assert!(!arbiter.is_free(Device::VideoDecoder));
    }

    #[test]
    fn test_drop_releases_device() {
        let arbiter = DeviceArbiter::new();
        let lease = arbiter.claim(Device::VideoDecoder, "clip").unwrap();
        drop(lease);
        assert!(arbiter.is_free(Device::VideoDecoder));
        assert!(arbiter.claim(Device::VideoDecoder, "next").is_ok());
    }

    #[test]
    fn test_clones_share_devices() {
        let arbiter = DeviceArbiter::new();
        let other = arbiter.clone();
        let _lease = arbiter.claim(Device::AudioOutput, "song").unwrap();
        assert!(other.claim(Device::AudioOutput, "other").is_err());
    }
}

//! Time-related abstractions.
//!
//! `Instant` is tokio's instant rather than `std`'s so that deadlines computed
//! by the engine follow the runtime clock. Under `#[tokio::test(start_paused =
//! true)]` the clock only moves when every task is idle, which makes
//! timer-driven behaviour deterministic in tests.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, Duration, Instant};
//!
//! async fn example() {
//!     let start = Instant::now();
//!     sleep(Duration::from_millis(5)).await;
//!     assert!(start.elapsed() >= Duration::from_millis(5));
//! }
//! ```

pub use tokio::time::{error::Elapsed, sleep, sleep_until, timeout, Instant, Sleep, Timeout};

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};

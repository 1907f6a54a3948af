//! Per-room countdown timer engine for Pollcast.
//!
//! A [`Countdown`] drives the one-second ticks of the question currently
//! active in a room. Each room actor owns exactly one, which makes the
//! "at most one timer per room" invariant structural: starting a new
//! question resets the same countdown instead of racing a second one.
//!
//! # Integration
//!
//! The countdown is designed to sit inside a room actor's
//! `tokio::select!` loop. While idle it pends forever, so the select
//! simply never takes the tick branch:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         remaining = countdown.tick() => {
//!             // broadcast the new remaining value; 0 means expiry
//!         }
//!     }
//! }
//! ```
//!
//! Because ticks arrive through the same loop as commands, a tick can
//! never run concurrently with an answer submission for the same room.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// The tick cadence. Fixed: the wire protocol promises one `timer` event
/// per second while a question is active.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// A one-second countdown for the currently active question.
///
/// State machine: `Idle → Running → Idle`. [`start`](Self::start) always
/// replaces any countdown in progress; [`tick`](Self::tick) returns to
/// `Idle` on its own after reporting 0.
#[derive(Debug)]
pub struct Countdown {
    remaining: u32,
    /// Deadline of the next tick. `None` means idle.
    next_tick: Option<Instant>,
}

impl Countdown {
    /// Creates an idle countdown.
    pub fn new() -> Self {
        Self {
            remaining: 0,
            next_tick: None,
        }
    }

    /// Arms the countdown for `seconds`, cancelling any countdown already
    /// running. The first tick fires one second from now.
    ///
    /// A question with `seconds = n` produces exactly `n` ticks, counting
    /// `n-1` down to `0`. `start(0)` arms a single tick that reports 0.
    pub fn start(&mut self, seconds: u32) {
        if self.next_tick.is_some() {
            debug!(
                remaining = self.remaining,
                "countdown preempted by new start"
            );
        }
        self.remaining = seconds;
        self.next_tick = Some(Instant::now() + TICK_INTERVAL);
        debug!(seconds, "countdown started");
    }

    /// Stops the countdown immediately without a final tick. Idempotent.
    pub fn cancel(&mut self) {
        if self.next_tick.take().is_some() {
            debug!(remaining = self.remaining, "countdown cancelled");
        }
        self.remaining = 0;
    }

    /// Waits for the next tick and returns the new remaining value.
    ///
    /// While idle this future pends forever — it never resolves on its
    /// own, but `tokio::select!` still processes other branches. After
    /// returning 0 the countdown is idle again; the 0 tick is the expiry
    /// signal.
    ///
    /// Cancellation-safe: state is only mutated after the sleep completes,
    /// so a tick abandoned by `select!` is simply retried.
    pub async fn tick(&mut self) -> u32 {
        let Some(deadline) = self.next_tick else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.next_tick = None;
        } else {
            // Fixed cadence: schedule from the previous deadline, not from
            // now, so handler latency doesn't stretch the countdown.
            self.next_tick = Some(deadline + TICK_INTERVAL);
        }

        trace!(remaining = self.remaining, "countdown tick");
        self.remaining
    }

    /// Seconds left. 0 when idle or expired.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether a countdown is currently running.
    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A sleep implementation whose clock only moves when a test calls `tick()`.
//!
//! Handy for checking exactly which attempt timeouts a combinator asked for and in which order
//! they fire, without depending on Tokio's paused clock.
//!
//! ```rust,no_run
//! use async_combinators::rt::sleep::{AsyncSleep, SharedAsyncSleep};
//! use async_combinators::test_util::tick_advance_sleep::tick_advance_time_and_sleep;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let (time, sleep) = tick_advance_time_and_sleep();
//! let task = tokio::spawn(sleep.sleep(Duration::from_secs(1)));
//! tokio::task::yield_now().await;
//! assert!(!task.is_finished());
//!
//! time.tick(Duration::from_secs(1)).await;
//! task.await.unwrap();
//! assert_eq!(vec![Duration::from_secs(1)], sleep.requested());
//! # }
//! ```

use crate::rt::sleep::{AsyncSleep, Sleep};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot::Sender;

#[derive(Debug)]
struct QueuedSleep {
    presents_at: Duration,
    notify: Sender<()>,
}

#[derive(Default, Debug)]
struct Clock {
    queued: Vec<QueuedSleep>,
    requested: Vec<Duration>,
    now: Duration,
}

#[derive(Clone, Default, Debug)]
struct SharedClock(Arc<Mutex<Clock>>);

impl SharedClock {
    fn lock(&self) -> MutexGuard<'_, Clock> {
        self.0.lock().unwrap()
    }

    /// Remove and return every queued sleep due at or before `time`, earliest first.
    fn take_due(&self, time: Duration) -> Vec<QueuedSleep> {
        let mut clock = self.lock();
        clock.queued.sort_by_key(|s| s.presents_at);
        let due = clock
            .queued
            .iter()
            .position(|s| s.presents_at > time)
            .unwrap_or(clock.queued.len());
        clock.queued.drain(..due).collect()
    }
}

/// Sleep implementation driven by [`TickAdvanceTime::tick`].
#[derive(Clone, Debug)]
pub struct TickAdvanceSleep {
    clock: SharedClock,
}

impl TickAdvanceSleep {
    /// Every duration passed to [`AsyncSleep::sleep`] so far, in request order.
    pub fn requested(&self) -> Vec<Duration> {
        self.clock.lock().requested.clone()
    }
}

impl AsyncSleep for TickAdvanceSleep {
    fn sleep(&self, duration: Duration) -> Sleep {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut clock = self.clock.lock();
        let presents_at = clock.now + duration;
        clock.requested.push(duration);
        clock.queued.push(QueuedSleep {
            presents_at,
            notify: tx,
        });
        Sleep::new(async move {
            let _ = rx.await;
        })
    }
}

/// Handle used to advance the clock shared with a [`TickAdvanceSleep`].
#[derive(Clone, Debug)]
pub struct TickAdvanceTime {
    clock: SharedClock,
}

impl TickAdvanceTime {
    /// Time elapsed since the clock was created.
    pub fn now(&self) -> Duration {
        self.clock.lock().now
    }

    /// Advance the clock by `duration`.
    ///
    /// Sleeps fire one at a time in deadline order and the runtime is yielded after each, so
    /// tasks woken by an earlier sleep run (and may queue further sleeps inside the window)
    /// before later sleeps fire.
    pub async fn tick(&self, duration: Duration) {
        let target = self.now() + duration;

        let mut due = self.clock.take_due(target);
        while !due.is_empty() {
            for sleep in due {
                self.clock.lock().now = sleep.presents_at;
                let _ = sleep.notify.send(());
                tokio::task::yield_now().await;
            }
            due = self.clock.take_due(target);
        }

        self.clock.lock().now = target;
    }
}

/// Create a connected clock handle and sleep implementation, starting at zero.
pub fn tick_advance_time_and_sleep() -> (TickAdvanceTime, TickAdvanceSleep) {
    let clock = SharedClock::default();
    (
        TickAdvanceTime {
            clock: clock.clone(),
        },
        TickAdvanceSleep { clock },
    )
}

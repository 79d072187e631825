/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Per-attempt timeouts for [`retry`](crate::future::retry::retry).

use std::time::Duration;

/// The timeouts applied to successive retry attempts.
///
/// A schedule hands out one timeout per attempt. A zero or [`Duration::MAX`] entry means the
/// attempt is not bounded at all.
///
/// ```rust
/// use async_combinators::TimeoutSchedule;
/// use std::time::Duration;
///
/// // 100ms for every attempt
/// let every: TimeoutSchedule = Duration::from_millis(100).into();
///
/// // Entries are consumed from the tail: the first attempt gets 1s, the second 2s,
/// // the third 5s and any later attempt has no timeout.
/// let tail = TimeoutSchedule::from_tail(vec![
///     Duration::from_secs(5),
///     Duration::from_secs(2),
///     Duration::from_secs(1),
/// ]);
/// # let _ = (every, tail);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeoutSchedule {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Kind {
    #[default]
    Unbounded,
    Every(Duration),
    Tail(Vec<Duration>),
}

impl TimeoutSchedule {
    /// No attempt ever times out.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every attempt is bounded by `timeout`.
    pub fn every(timeout: Duration) -> Self {
        Self {
            kind: Kind::Every(timeout),
        }
    }

    /// One timeout per attempt, popped from the end of `timeouts`.
    ///
    /// Attempts made after the list is exhausted are not bounded.
    pub fn from_tail(timeouts: Vec<Duration>) -> Self {
        Self {
            kind: Kind::Tail(timeouts),
        }
    }

    /// Returns true if at least one attempt would be bounded, i.e. a timer is needed.
    pub fn requires_timer(&self) -> bool {
        match &self.kind {
            Kind::Unbounded => false,
            Kind::Every(timeout) => bounded(*timeout).is_some(),
            Kind::Tail(timeouts) => timeouts.iter().any(|t| bounded(*t).is_some()),
        }
    }

    /// Take the timeout for the next attempt. `None` means the attempt runs unbounded.
    pub(crate) fn next_timeout(&mut self) -> Option<Duration> {
        match &mut self.kind {
            Kind::Unbounded => None,
            Kind::Every(timeout) => bounded(*timeout),
            Kind::Tail(timeouts) => timeouts.pop().and_then(bounded),
        }
    }
}

fn bounded(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() || timeout == Duration::MAX {
        None
    } else {
        Some(timeout)
    }
}

impl From<Duration> for TimeoutSchedule {
    fn from(timeout: Duration) -> Self {
        Self::every(timeout)
    }
}

impl From<Option<Duration>> for TimeoutSchedule {
    fn from(timeout: Option<Duration>) -> Self {
        timeout.map(Self::every).unwrap_or_default()
    }
}

impl From<Vec<Duration>> for TimeoutSchedule {
    fn from(timeouts: Vec<Duration>) -> Self {
        Self::from_tail(timeouts)
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Configuration for [`Retry`](crate::future::retry::Retry).

use crate::future::schedule::TimeoutSchedule;
use crate::rt::sleep::{default_async_sleep, SharedAsyncSleep};

/// Retry budget, attempt timeouts and the timer used to enforce them.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    max_retries: u32,
    timeouts: TimeoutSchedule,
    sleep_impl: Option<SharedAsyncSleep>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfigBuilder::default().build()
    }
}

impl RetryConfig {
    /// A single attempt with no timeout, using the default sleep implementation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`RetryConfigBuilder`].
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// The number of retries made after the first attempt.
    ///
    /// The factory is invoked at most `max_retries + 1` times.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The per-attempt timeouts.
    pub fn timeouts(&self) -> &TimeoutSchedule {
        &self.timeouts
    }

    /// The timer used to enforce attempt timeouts.
    pub fn sleep_impl(&self) -> Option<&SharedAsyncSleep> {
        self.sleep_impl.as_ref()
    }

    pub(crate) fn into_parts(self) -> (u32, TimeoutSchedule, Option<SharedAsyncSleep>) {
        (self.max_retries, self.timeouts, self.sleep_impl)
    }
}

/// Builder for [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryConfigBuilder {
    max_retries: Option<u32>,
    timeouts: Option<TimeoutSchedule>,
    sleep_impl: Option<SharedAsyncSleep>,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self {
            max_retries: None,
            timeouts: None,
            sleep_impl: default_async_sleep(),
        }
    }
}

impl RetryConfigBuilder {
    /// Create a new `RetryConfigBuilder`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the number of retries. `None` resets to the default of zero (one attempt only).
    pub fn set_max_retries(&mut self, max_retries: Option<u32>) -> &mut Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the number of retries made after the first attempt.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.set_max_retries(Some(max_retries));
        self
    }

    /// Sets the per-attempt timeouts. `None` means no attempt times out.
    pub fn set_timeouts(&mut self, timeouts: Option<TimeoutSchedule>) -> &mut Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets the per-attempt timeouts.
    pub fn timeouts(mut self, timeouts: impl Into<TimeoutSchedule>) -> Self {
        self.set_timeouts(Some(timeouts.into()));
        self
    }

    /// Sets the timer. The builder starts out with
    /// [`default_async_sleep`](crate::rt::sleep::default_async_sleep); `None` removes it, after
    /// which only unbounded attempts can be made.
    pub fn set_sleep_impl(&mut self, sleep_impl: Option<SharedAsyncSleep>) -> &mut Self {
        self.sleep_impl = sleep_impl;
        self
    }

    /// Sets the timer used to enforce attempt timeouts.
    pub fn sleep_impl(mut self, sleep_impl: SharedAsyncSleep) -> Self {
        self.set_sleep_impl(Some(sleep_impl));
        self
    }

    /// Build a [`RetryConfig`].
    pub fn build(self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries.unwrap_or_default(),
            timeouts: self.timeouts.unwrap_or_default(),
            sleep_impl: self.sleep_impl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RetryConfig;
    use crate::future::schedule::TimeoutSchedule;
    use std::time::Duration;

    #[test]
    fn defaults_to_a_single_unbounded_attempt() {
        let config = RetryConfig::new();
        assert_eq!(0, config.max_retries());
        assert_eq!(&TimeoutSchedule::none(), config.timeouts());
        assert_eq!(cfg!(feature = "rt-tokio"), config.sleep_impl().is_some());
    }

    #[test]
    fn unset_fields_fall_back_to_defaults() {
        let mut builder = RetryConfig::builder()
            .max_retries(3)
            .timeouts(Duration::from_millis(100));
        builder.set_max_retries(None);
        let config = builder.build();
        assert_eq!(0, config.max_retries());
        assert_eq!(
            &TimeoutSchedule::every(Duration::from_millis(100)),
            config.timeouts()
        );
    }

    #[test]
    fn sleep_impl_can_be_removed() {
        let mut builder = RetryConfig::builder();
        builder.set_sleep_impl(None);
        assert!(builder.build().sleep_impl().is_none());
    }
}

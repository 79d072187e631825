/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! Combinators for fallible futures that the standard future toolbox does not provide.
//!
//! An *operation* is any future whose output is a `Result`. This crate offers:
//!
//! - [`some`](future::some::some): succeed with the first operation that succeeds, fail only
//!   once every operation has failed, carrying every failure reason in settlement order.
//! - [`none`](future::none::none): the negation of `some`.
//! - [`retry`](future::retry::retry): invoke an operation factory repeatedly, racing each
//!   attempt against an optional timeout, until it succeeds or the retry budget runs out.
//! - [`always`](future::always::always): run a callback with the outcome of an operation
//!   regardless of whether it succeeded.
//!
//! Timers are abstracted behind the [`AsyncSleep`](rt::sleep::AsyncSleep) trait. A Tokio
//! implementation is provided with the `rt-tokio` feature.

pub mod config;
pub mod future;
pub mod reason_log;
pub mod rt;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use config::{RetryConfig, RetryConfigBuilder};
pub use future::always::{always, Always, OperationExt};
pub use future::none::{none, AllFailed};
pub use future::retry::{retry, AttemptFailure, Retry, RetryError};
pub use future::schedule::TimeoutSchedule;
pub use future::some::{some, FirstSuccess, Remaining};
pub use reason_log::ReasonLog;

/// Given an `Instant` and a `Duration`, assert time elapsed since `Instant` is equal to `Duration`.
/// This macro allows for a 5ms margin of error.
///
/// Intended for tests running on a paused Tokio clock, where elapsed time is exact.
#[macro_export]
macro_rules! assert_elapsed {
    ($start:expr, $dur:expr) => {
        $crate::assert_elapsed!($start, $dur, std::time::Duration::from_millis(5));
    };
    ($start:expr, $dur:expr, $margin_of_error:expr) => {{
        let elapsed = $start.elapsed();
        let lower: std::time::Duration = $dur;
        let margin_of_error: std::time::Duration = $margin_of_error;

        assert!(
            elapsed >= lower && elapsed <= lower + margin_of_error,
            "actual = {:?}, expected = {:?}",
            elapsed,
            lower
        );
    }};
}

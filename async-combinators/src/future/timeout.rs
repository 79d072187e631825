/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Provides the [`Timeout`] future, which races a value future against a timer.
//!
//! The timer winning does nothing to the value future beyond dropping it together with the
//! `Timeout`; no cancellation signal is sent anywhere.

use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Error returned when the timer of a [`Timeout`] fires before the value is ready.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("timed out")]
pub struct TimedOutError;

pin_project! {
    /// Resolves with the output of `value`, or [`TimedOutError`] if `sleep` completes first.
    #[non_exhaustive]
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    #[derive(Debug)]
    pub struct Timeout<T, S> {
        #[pin]
        value: T,
        #[pin]
        sleep: S,
    }
}

impl<T, S> Timeout<T, S> {
    /// Race `value` against `sleep`.
    pub fn new(value: T, sleep: S) -> Timeout<T, S> {
        Timeout { value, sleep }
    }
}

impl<T, S> Future for Timeout<T, S>
where
    T: Future,
    S: Future,
{
    type Output = Result<T::Output, TimedOutError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.project();

        // A value that is ready at the same time as the timer wins
        if let Poll::Ready(v) = me.value.poll(cx) {
            return Poll::Ready(Ok(v));
        }

        match me.sleep.poll(cx) {
            Poll::Ready(_) => Poll::Ready(Err(TimedOutError)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TimedOutError, Timeout};
    use crate::future::never::Never;
    use std::time::Duration;

    #[tokio::test]
    async fn failure_of_the_value_is_not_a_timeout() {
        assert_eq!(
            Ok(Err("boom")),
            Timeout::new(async { Err::<u8, _>("boom") }, Never::new()).await
        );
    }

    #[tokio::test]
    async fn timer_wins_against_a_pending_value() {
        assert_eq!(Err(TimedOutError), Timeout::new(Never::new(), async {}).await);
    }

    #[tokio::test]
    async fn ready_value_beats_ready_timer() {
        assert_eq!(Ok(5), Timeout::new(async { 5 }, async {}).await);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_value_loses_to_short_timer() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            7
        };
        let timer = tokio::time::sleep(Duration::from_millis(100));
        assert_eq!(Err(TimedOutError), Timeout::new(slow, timer).await);
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Retry an operation factory, bounding each attempt by an optional timeout.
//!
//! Attempts run strictly one after another. Each attempt races the operation returned by the
//! factory against a timer built from the next entry of the [`TimeoutSchedule`]; an attempt
//! without a timeout races against [`Never`]. A timed out operation is dropped, not awaited.

use crate::config::RetryConfig;
use crate::future::never::Never;
use crate::future::schedule::TimeoutSchedule;
use crate::future::timeout::{TimedOutError, Timeout};
use crate::reason_log::ReasonLog;
use crate::rt::sleep::{AsyncSleep, SharedAsyncSleep, Sleep};
use futures_util::future::{IntoFuture, TryFuture, TryFutureExt};
use futures_util::ready;
use pin_project_lite::pin_project;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::debug;

/// Why a single attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptFailure<E> {
    /// The operation failed on its own.
    #[error("attempt failed: {0}")]
    Failed(E),
    /// The attempt timeout fired before the operation settled.
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),
}

impl<E> AttemptFailure<E> {
    /// Returns the operation's own error, if the attempt did not time out.
    pub fn as_failed(&self) -> Option<&E> {
        match self {
            AttemptFailure::Failed(err) => Some(err),
            AttemptFailure::TimedOut(_) => None,
        }
    }

    /// Returns true if the attempt timed out.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, AttemptFailure::TimedOut(_))
    }
}

/// Error returned by [`Retry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError<E> {
    /// Every attempt failed. Reasons are in attempt order, index 0 being the first attempt.
    #[error("{} attempt(s) failed", .0.len())]
    AttemptsExhausted(ReasonLog<AttemptFailure<E>>),
    /// An attempt timeout was configured but there is no sleep implementation to enforce it.
    ///
    /// Reported before the factory is invoked for the first time.
    #[error("attempt timeouts were configured but no sleep implementation is available")]
    MissingSleepImpl,
}

impl<E> RetryError<E> {
    /// The per-attempt failure reasons, if attempts were made.
    pub fn reasons(&self) -> Option<&ReasonLog<AttemptFailure<E>>> {
        match self {
            RetryError::AttemptsExhausted(reasons) => Some(reasons),
            RetryError::MissingSleepImpl => None,
        }
    }

    /// Consume the error, returning the per-attempt failure reasons if attempts were made.
    pub fn into_reasons(self) -> Option<ReasonLog<AttemptFailure<E>>> {
        match self {
            RetryError::AttemptsExhausted(reasons) => Some(reasons),
            RetryError::MissingSleepImpl => None,
        }
    }
}

/// Invoke `factory` until the operation it returns succeeds, at most `max_retries + 1` times.
///
/// Each attempt is bounded by the next timeout from `timeouts`. Timers come from
/// [`default_async_sleep`](crate::rt::sleep::default_async_sleep); use [`Retry::with_config`]
/// to supply another one.
///
/// Every retry starts on a fresh poll, so a factory that fails immediately does not hold on to
/// the executor for the whole retry budget.
///
/// An operation that loses to its attempt timeout is dropped, which cancels it. Unlike
/// [`some`](crate::future::some::some), where the losers can be taken back with
/// [`into_remaining`](crate::future::some::FirstSuccess::into_remaining), there is nothing to
/// hand back: the next attempt replaces it. Make the factory spawn the work onto a runtime if
/// it must run to completion regardless of the timeout.
///
/// ```rust
/// use async_combinators::retry;
/// use std::future::ready;
/// use std::time::Duration;
///
/// # async fn docs() {
/// let mut calls = 0;
/// let result = retry(
///     || {
///         calls += 1;
///         ready(if calls < 3 { Err("not yet") } else { Ok(calls) })
///     },
///     Duration::from_secs(1),
///     5,
/// )
/// .await;
/// assert_eq!(Ok(3), result);
/// # }
/// ```
pub fn retry<F, Fut>(
    factory: F,
    timeouts: impl Into<TimeoutSchedule>,
    max_retries: u32,
) -> Retry<F, Fut>
where
    F: FnMut() -> Fut,
    Fut: TryFuture,
{
    let config = RetryConfig::builder()
        .timeouts(timeouts)
        .max_retries(max_retries)
        .build();
    Retry::with_config(factory, config)
}

struct AttemptState<E> {
    // retries consumed so far; the attempt in flight is number `retries + 1`
    retries: u32,
    max_retries: u32,
    timeouts: TimeoutSchedule,
    current_timeout: Option<Duration>,
    sleep_impl: Option<SharedAsyncSleep>,
    reasons: ReasonLog<AttemptFailure<E>>,
    validated: bool,
    finished: bool,
}

pin_project! {
    /// Future returned by [`retry`].
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct Retry<F, Fut>
    where
        Fut: TryFuture,
    {
        factory: F,
        #[pin]
        attempt: Option<Timeout<IntoFuture<Fut>, Sleep>>,
        state: AttemptState<Fut::Error>,
    }
}

impl<F, Fut> Retry<F, Fut>
where
    F: FnMut() -> Fut,
    Fut: TryFuture,
{
    /// Retry `factory` as described by `config`.
    pub fn with_config(factory: F, config: RetryConfig) -> Self {
        let (max_retries, timeouts, sleep_impl) = config.into_parts();
        Retry {
            factory,
            attempt: None,
            state: AttemptState {
                retries: 0,
                max_retries,
                timeouts,
                current_timeout: None,
                sleep_impl,
                reasons: ReasonLog::new(),
                validated: false,
                finished: false,
            },
        }
    }
}

impl<F, Fut> fmt::Debug for Retry<F, Fut>
where
    Fut: TryFuture,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("attempt", &self.state.retries.saturating_add(1))
            .field("max_attempts", &self.state.max_retries.saturating_add(1))
            .field("failed", &self.state.reasons.len())
            .field("timeouts", &self.state.timeouts)
            .finish()
    }
}

impl<F, Fut> Future for Retry<F, Fut>
where
    F: FnMut() -> Fut,
    Fut: TryFuture,
{
    type Output = Result<Fut::Ok, RetryError<Fut::Error>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut me = self.project();
        let state = me.state;
        assert!(!state.finished, "`Retry` polled after completion");

        if !state.validated {
            state.validated = true;
            if state.timeouts.requires_timer() && state.sleep_impl.is_none() {
                debug!(
                    timeouts = ?state.timeouts,
                    "cannot enforce attempt timeouts without a sleep implementation"
                );
                state.finished = true;
                return Poll::Ready(Err(RetryError::MissingSleepImpl));
            }
        }

        if me.attempt.is_none() {
            let timeout = state.timeouts.next_timeout();
            let sleep = match (timeout, &state.sleep_impl) {
                (Some(timeout), Some(sleep_impl)) => sleep_impl.sleep(timeout),
                _ => Sleep::new(Never::new()),
            };
            debug!(
                attempt = state.retries.saturating_add(1),
                max_attempts = state.max_retries.saturating_add(1),
                ?timeout,
                "starting attempt"
            );
            state.current_timeout = timeout;
            let operation = TryFutureExt::into_future((me.factory)());
            me.attempt.set(Some(Timeout::new(operation, sleep)));
        }

        let outcome = match me.attempt.as_mut().as_pin_mut() {
            Some(attempt) => ready!(attempt.poll(cx)),
            None => unreachable!("an attempt was started above"),
        };
        me.attempt.set(None);

        let failure = match outcome {
            Ok(Ok(value)) => {
                debug!(attempt = state.retries.saturating_add(1), "attempt succeeded");
                state.finished = true;
                return Poll::Ready(Ok(value));
            }
            Ok(Err(err)) => AttemptFailure::Failed(err),
            Err(TimedOutError) => {
                AttemptFailure::TimedOut(state.current_timeout.unwrap_or_default())
            }
        };
        debug!(
            attempt = state.retries.saturating_add(1),
            timed_out = failure.is_timed_out(),
            "attempt did not succeed"
        );
        state.reasons.push(failure);

        if state.retries < state.max_retries {
            state.retries += 1;
            // The next attempt starts on the next poll so the executor gets control back
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        debug!(attempts = state.reasons.len(), "out of attempts");
        state.finished = true;
        Poll::Ready(Err(RetryError::AttemptsExhausted(state.reasons.take())))
    }
}

#[cfg(test)]
mod tests {
    use super::{retry, AttemptFailure, Retry, RetryError, TimeoutSchedule};
    use crate::config::RetryConfig;
    use crate::future::never::Never;
    use crate::rt::sleep::SharedAsyncSleep;
    use crate::test_util::capture_test_logs;
    use crate::test_util::tick_advance_sleep::tick_advance_time_and_sleep;
    use std::future::ready;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[derive(Clone, Default)]
    struct Invocations(Arc<AtomicUsize>);

    impl Invocations {
        // returns the 1-based number of this invocation
        fn record(&self) -> usize {
            self.0.fetch_add(1, Ordering::SeqCst) + 1
        }

        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn failed(reasons: Vec<&'static str>) -> RetryError<&'static str> {
        RetryError::AttemptsExhausted(
            reasons
                .into_iter()
                .map(AttemptFailure::Failed)
                .collect::<Vec<_>>()
                .into(),
        )
    }

    #[tokio::test]
    async fn exhausts_every_attempt_and_keeps_every_reason() {
        let calls = Invocations::default();
        let result = retry(
            || {
                calls.record();
                ready(Err::<(), _>("e"))
            },
            TimeoutSchedule::none(),
            2,
        )
        .await;
        assert_eq!(Err(failed(vec!["e", "e", "e"])), result);
        assert_eq!(3, calls.count());
    }

    #[tokio::test]
    async fn stops_at_the_first_success() {
        let calls = Invocations::default();
        let result = retry(
            || {
                let n = calls.record();
                ready(if n < 3 { Err("e") } else { Ok(7) })
            },
            TimeoutSchedule::none(),
            5,
        )
        .await;
        assert_eq!(Ok(7), result);
        assert_eq!(3, calls.count());
    }

    #[tokio::test]
    async fn no_retries_means_a_single_attempt() {
        let calls = Invocations::default();
        let result = retry(
            || {
                calls.record();
                ready(Err::<(), _>("once"))
            },
            TimeoutSchedule::none(),
            0,
        )
        .await;
        assert_eq!(Err(failed(vec!["once"])), result);
        assert_eq!(1, calls.count());
    }

    #[tokio::test]
    async fn reasons_are_kept_in_attempt_order() {
        let calls = Invocations::default();
        let reasons = ["first", "second", "third"];
        let result = retry(
            || ready(Err::<(), _>(reasons[calls.record() - 1])),
            TimeoutSchedule::none(),
            2,
        )
        .await;
        assert_eq!(Err(failed(reasons.to_vec())), result);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operations_time_out_and_are_retried() {
        let calls = Invocations::default();
        let start = tokio::time::Instant::now();
        let result = retry(
            || {
                calls.record();
                async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok::<_, &str>("too late")
                }
            },
            Duration::from_millis(100),
            1,
        )
        .await;

        let timed_out = AttemptFailure::TimedOut(Duration::from_millis(100));
        assert_eq!(
            Err(RetryError::AttemptsExhausted(
                vec![timed_out.clone(), timed_out].into()
            )),
            result
        );
        assert_eq!(2, calls.count());
        crate::assert_elapsed!(start, Duration::from_millis(200));
    }

    #[tokio::test]
    async fn timeout_schedule_is_consumed_one_entry_per_attempt() {
        let (time, sleep) = tick_advance_time_and_sleep();
        let calls = Invocations::default();
        let config = RetryConfig::builder()
            .max_retries(2)
            .timeouts(vec![Duration::from_secs(3), Duration::from_secs(1)])
            .sleep_impl(SharedAsyncSleep::new(sleep.clone()))
            .build();
        let mut attempts = task::spawn(Retry::with_config(
            || {
                calls.record();
                async {
                    Never::new().await;
                    Ok::<(), &str>(())
                }
            },
            config,
        ));

        assert_pending!(attempts.poll());
        assert_eq!(vec![Duration::from_secs(1)], sleep.requested());

        time.tick(Duration::from_secs(1)).await;
        // the timed out attempt is recorded, the retry starts on the next poll
        assert_pending!(attempts.poll());
        assert_eq!(1, calls.count());
        assert!(attempts.is_woken());
        assert_pending!(attempts.poll());
        assert_eq!(2, calls.count());

        time.tick(Duration::from_secs(3)).await;
        assert_pending!(attempts.poll());
        // the third attempt is unbounded since the schedule ran out
        assert_pending!(attempts.poll());
        assert_eq!(3, calls.count());
        assert_eq!(
            vec![Duration::from_secs(1), Duration::from_secs(3)],
            sleep.requested()
        );
    }

    #[tokio::test]
    async fn each_retry_yields_to_the_executor() {
        let calls = Invocations::default();
        let mut attempts = task::spawn(retry(
            || {
                calls.record();
                ready(Err::<(), _>("e"))
            },
            TimeoutSchedule::none(),
            1_000_000,
        ));

        assert_pending!(attempts.poll());
        assert_eq!(1, calls.count());
        assert!(attempts.is_woken());

        assert_pending!(attempts.poll());
        assert_eq!(2, calls.count());
    }

    #[tokio::test]
    async fn missing_sleep_impl_fails_before_any_attempt() {
        let calls = Invocations::default();
        let mut builder = RetryConfig::builder()
            .max_retries(3)
            .timeouts(Duration::from_millis(100));
        builder.set_sleep_impl(None);
        let mut attempts = task::spawn(Retry::with_config(
            || {
                calls.record();
                ready(Ok::<_, ()>(1))
            },
            builder.build(),
        ));
        assert_ready_eq!(attempts.poll(), Err(RetryError::MissingSleepImpl));
        assert_eq!(0, calls.count());
    }

    #[tokio::test]
    async fn unbounded_attempts_do_not_need_a_timer() {
        let mut builder = RetryConfig::builder();
        builder.set_sleep_impl(None);
        let result = Retry::with_config(|| ready(Ok::<_, ()>("done")), builder.build()).await;
        assert_eq!(Ok("done"), result);
    }

    #[tokio::test]
    async fn attempts_are_logged() {
        let (_guard, rx) = capture_test_logs();
        let _ = retry(|| ready(Err::<(), _>("e")), TimeoutSchedule::none(), 1).await;
        let logs = rx.contents();
        assert_eq!(2, logs.matches("starting attempt").count(), "{logs}");
        assert!(logs.contains("out of attempts"), "{logs}");
    }

    #[tokio::test(start_paused = true)]
    async fn reasons_distinguish_timeouts_from_failures() {
        let calls = Invocations::default();
        let err = retry(
            || {
                let n = calls.record();
                async move {
                    if n == 1 {
                        Never::new().await;
                    }
                    Err::<(), _>("refused")
                }
            },
            Duration::from_millis(10),
            1,
        )
        .await
        .unwrap_err();

        let reasons = err.reasons().expect("attempts were made");
        assert_eq!(2, reasons.len());
        let first = reasons.iter().next().expect("two reasons");
        assert!(first.is_timed_out());
        assert_eq!(None, first.as_failed());
        assert_eq!(Some(&"refused"), reasons.last().and_then(|r| r.as_failed()));
        assert_eq!(None, RetryError::<()>::MissingSleepImpl.reasons());
    }

    #[test]
    fn errors_render_attempt_counts() {
        assert_eq!("3 attempt(s) failed", failed(vec!["a", "b", "c"]).to_string());
        assert_eq!(
            "attempt timed out after 100ms",
            AttemptFailure::<&str>::TimedOut(Duration::from_millis(100)).to_string()
        );
    }
}

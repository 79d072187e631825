/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Race a set of operations for the first success.

use crate::reason_log::ReasonLog;
use futures_util::future::{FusedFuture, IntoFuture, TryFuture, TryFutureExt};
use futures_util::ready;
use futures_util::stream::{FuturesUnordered, Stream, StreamExt};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, trace};

/// Race `operations`, resolving with the first one that succeeds.
///
/// - An empty input resolves immediately with `Ok(None)`.
/// - The first operation to succeed resolves the race with `Ok(Some(value))`. Operations that
///   are still pending at that point are not touched; see [`FirstSuccess::into_remaining`].
/// - Once every operation has failed, the race resolves with `Err(log)` where `log` holds every
///   failure reason in the order the operations failed (not the input order).
///
/// ```rust
/// use async_combinators::some;
/// use std::future::ready;
///
/// # async fn docs() {
/// let first = some(vec![ready(Err("down")), ready(Ok(1)), ready(Ok(2))]).await;
/// assert_eq!(Ok(Some(1)), first);
/// # }
/// ```
pub fn some<I>(operations: I) -> FirstSuccess<I::Item>
where
    I: IntoIterator,
    I::Item: TryFuture,
{
    let pending: FuturesUnordered<_> = operations
        .into_iter()
        .map(TryFutureExt::into_future)
        .collect();
    let total = pending.len();
    trace!(total, "racing operations for the first success");
    FirstSuccess {
        pending,
        reasons: ReasonLog::new(),
        total,
        terminated: false,
    }
}

/// Future returned by [`some`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct FirstSuccess<F: TryFuture> {
    pending: FuturesUnordered<IntoFuture<F>>,
    reasons: ReasonLog<F::Error>,
    total: usize,
    terminated: bool,
}

// Operations are pinned inside `FuturesUnordered`; nothing else is structurally pinned.
impl<F: TryFuture> Unpin for FirstSuccess<F> {}

impl<F: TryFuture> fmt::Debug for FirstSuccess<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirstSuccess")
            .field("total", &self.total)
            .field("pending", &self.pending.len())
            .field("failed", &self.reasons.len())
            .finish()
    }
}

impl<F: TryFuture> FirstSuccess<F> {
    /// Number of operations that have not settled yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Give up on the race and take back the operations that have not settled yet.
    ///
    /// Typically called after the race was won, to keep driving (or explicitly drop) the
    /// losing operations.
    ///
    /// ```rust
    /// use async_combinators::some;
    /// use futures_util::StreamExt;
    /// use std::future::ready;
    ///
    /// # async fn docs() {
    /// let mut race = some(vec![ready(Ok::<_, ()>(1)), ready(Ok(2))]);
    /// assert_eq!(Ok(Some(1)), (&mut race).await);
    /// let rest: Vec<_> = race.into_remaining().collect().await;
    /// assert_eq!(vec![Ok(2)], rest);
    /// # }
    /// ```
    pub fn into_remaining(self) -> Remaining<F> {
        Remaining {
            pending: self.pending,
        }
    }
}

impl<F: TryFuture> Future for FirstSuccess<F> {
    type Output = Result<Option<F::Ok>, ReasonLog<F::Error>>;

    /// # Panics
    /// Panics if polled again after it resolved. Use [`FirstSuccess::into_remaining`] to keep
    /// driving the operations that lost the race.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        assert!(!this.terminated, "`FirstSuccess` polled after completion");
        let outcome = ready!(this.poll_race(cx));
        this.terminated = true;
        Poll::Ready(outcome)
    }
}

impl<F: TryFuture> FusedFuture for FirstSuccess<F> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<F: TryFuture> FirstSuccess<F> {
    #[allow(clippy::type_complexity)]
    fn poll_race(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<F::Ok>, ReasonLog<F::Error>>> {
        loop {
            match ready!(self.pending.poll_next_unpin(cx)) {
                Some(Ok(value)) => {
                    debug!(
                        failed = self.reasons.len(),
                        still_pending = self.pending.len(),
                        "operation succeeded"
                    );
                    return Poll::Ready(Ok(Some(value)));
                }
                Some(Err(reason)) => {
                    self.reasons.push(reason);
                    trace!(
                        failed = self.reasons.len(),
                        total = self.total,
                        "operation failed"
                    );
                    if self.reasons.len() == self.total {
                        debug!(total = self.total, "every operation failed");
                        return Poll::Ready(Err(self.reasons.take()));
                    }
                }
                None if self.total == 0 => return Poll::Ready(Ok(None)),
                None => return Poll::Ready(Err(self.reasons.take())),
            }
        }
    }
}

/// Operations left unsettled when a [`FirstSuccess`] race was decided.
///
/// Yields each outcome as the operation settles.
#[must_use = "streams do nothing unless polled"]
pub struct Remaining<F: TryFuture> {
    pending: FuturesUnordered<IntoFuture<F>>,
}

impl<F: TryFuture> Remaining<F> {
    /// Number of operations that have not settled yet.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if every operation has settled.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<F: TryFuture> fmt::Debug for Remaining<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remaining")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<F: TryFuture> Stream for Remaining<F> {
    type Item = Result<F::Ok, F::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.pending.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.pending.len(), Some(self.pending.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::some;
    use futures_util::future::FusedFuture;
    use futures_util::StreamExt;
    use std::future::{ready, Ready};
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    async fn settle_after(
        millis: u64,
        outcome: Result<&'static str, &'static str>,
    ) -> Result<&'static str, &'static str> {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        outcome
    }

    #[tokio::test]
    async fn empty_input_is_a_vacuous_success() {
        let empty: Vec<Ready<Result<u8, ()>>> = vec![];
        assert_eq!(Ok(None), some(empty).await);
        assert_eq!(Ok(None), some(None::<Ready<Result<u8, ()>>>).await);
    }

    #[tokio::test(start_paused = true)]
    async fn earliest_success_wins_regardless_of_input_order() {
        let result = some(vec![
            settle_after(30, Ok("a")),
            settle_after(10, Err("b")),
            settle_after(20, Ok("c")),
        ])
        .await;
        assert_eq!(Ok(Some("c")), result);
    }

    #[tokio::test(start_paused = true)]
    async fn all_failures_are_logged_in_settlement_order() {
        let result = some(vec![
            settle_after(30, Err("z")),
            settle_after(10, Err("x")),
            settle_after(20, Err("y")),
        ])
        .await;
        assert_eq!(vec!["x", "y", "z"], result.unwrap_err().into_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn log_order_is_stable_across_runs() {
        let run = || {
            some(vec![
                settle_after(15, Err("slow")),
                settle_after(5, Err("fast")),
                settle_after(10, Err("medium")),
            ])
        };
        let first = run().await.unwrap_err();
        for _ in 0..3 {
            assert_eq!(first, run().await.unwrap_err());
        }
    }

    #[tokio::test]
    async fn stays_pending_while_a_success_is_still_possible() {
        let (tx, rx) = tokio::sync::oneshot::channel::<Result<u8, &str>>();
        let waiting = async move { rx.await.unwrap_or(Err("sender dropped")) };
        let mut race = task::spawn(some(vec![
            futures_util::future::Either::Left(ready(Err("nope"))),
            futures_util::future::Either::Right(waiting),
        ]));
        assert_pending!(race.poll());

        tx.send(Ok(9)).unwrap();
        assert!(race.is_woken());
        assert_ready_eq!(race.poll(), Ok(Some(9)));
    }

    #[tokio::test(start_paused = true)]
    async fn losing_operations_can_be_taken_back() {
        let mut race = some(vec![
            settle_after(10, Ok("first")),
            settle_after(20, Err("late failure")),
            settle_after(30, Ok("late success")),
        ]);
        assert_eq!(Ok(Some("first")), (&mut race).await);
        assert_eq!(2, race.pending());

        let rest: Vec<_> = race.into_remaining().collect().await;
        assert_eq!(vec![Err("late failure"), Ok("late success")], rest);
    }

    #[tokio::test]
    #[should_panic(expected = "`FirstSuccess` polled after completion")]
    async fn polling_a_settled_race_panics() {
        let mut race = task::spawn(some(vec![ready(Ok::<_, ()>(1)), ready(Ok(2))]));
        assert_ready_eq!(race.poll(), Ok(Some(1)));
        assert!(race.is_terminated());
        // the second operation must not be settled as a new outcome
        let _ = race.poll();
    }
}

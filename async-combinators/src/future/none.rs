/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The negation of [`some`](crate::future::some::some).

use crate::future::some::{some, FirstSuccess};
use crate::reason_log::ReasonLog;
use futures_util::future::{FusedFuture, TryFuture};
use futures_util::ready;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Resolve successfully only if every operation fails.
///
/// This is [`some`] with its outcomes swapped: the success value is the failure log `some`
/// would have produced, and the failure is whatever `some` would have succeeded with. An empty
/// input therefore fails with `Err(None)`.
///
/// ```rust
/// use async_combinators::none;
/// use std::future::ready;
///
/// # async fn docs() {
/// let all_failed = none(vec![ready(Err::<u8, _>("a")), ready(Err("b"))]).await;
/// assert_eq!(vec!["a", "b"], all_failed.unwrap().into_vec());
/// # }
/// ```
pub fn none<I>(operations: I) -> AllFailed<I::Item>
where
    I: IntoIterator,
    I::Item: TryFuture,
{
    AllFailed {
        inner: some(operations),
    }
}

/// Future returned by [`none`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct AllFailed<F: TryFuture> {
    inner: FirstSuccess<F>,
}

impl<F: TryFuture> AllFailed<F> {
    /// Take back the operations that have not settled yet.
    pub fn into_remaining(self) -> crate::future::some::Remaining<F> {
        self.inner.into_remaining()
    }
}

impl<F: TryFuture> Future for AllFailed<F> {
    type Output = Result<ReasonLog<F::Error>, Option<F::Ok>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcome = ready!(Pin::new(&mut self.inner).poll(cx));
        Poll::Ready(match outcome {
            Ok(value) => Err(value),
            Err(reasons) => Ok(reasons),
        })
    }
}

impl<F: TryFuture> FusedFuture for AllFailed<F> {
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

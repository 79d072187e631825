/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Run a callback once an operation settles, whatever the outcome.

use futures_util::future::TryFuture;
use futures_util::ready;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Call `callback` with the outcome of `operation`, success or failure.
///
/// The returned future resolves with whatever `callback` returns. Nothing is swallowed: a
/// callback that wants to keep the failure can simply return the `Result` it was given.
///
/// ```rust
/// use async_combinators::always;
/// use std::future::ready;
///
/// # async fn docs() {
/// let described = always(ready(Err::<u8, _>("refused")), |outcome| format!("{outcome:?}")).await;
/// assert_eq!("Err(\"refused\")", described);
/// # }
/// ```
pub fn always<Fut, C, R>(operation: Fut, callback: C) -> Always<Fut, C>
where
    Fut: TryFuture,
    C: FnOnce(Result<Fut::Ok, Fut::Error>) -> R,
{
    Always {
        operation,
        callback: Some(callback),
    }
}

pin_project! {
    /// Future returned by [`always`] and [`OperationExt::always`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct Always<Fut, C> {
        #[pin]
        operation: Fut,
        callback: Option<C>,
    }
}

impl<Fut, C, R> Future for Always<Fut, C>
where
    Fut: TryFuture,
    C: FnOnce(Result<Fut::Ok, Fut::Error>) -> R,
{
    type Output = R;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.project();
        let outcome = ready!(me.operation.try_poll(cx));
        let callback = me
            .callback
            .take()
            .expect("`Always` polled after completion");
        Poll::Ready(callback(outcome))
    }
}

/// Combinator methods available on every operation.
pub trait OperationExt: TryFuture {
    /// See [`always`].
    fn always<C, R>(self, callback: C) -> Always<Self, C>
    where
        Self: Sized,
        C: FnOnce(Result<Self::Ok, Self::Error>) -> R,
    {
        always(self, callback)
    }
}

impl<Fut: TryFuture> OperationExt for Fut {}

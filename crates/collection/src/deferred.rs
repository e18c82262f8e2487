//! Values that are either available now or resolve later.
//!
//! Backends may answer synchronously (an in-memory array) or asynchronously
//! (a remote service). `Deferred` covers both: it is a `Future`, so callers
//! can always `.await` it, but a ready value can also be taken straight out
//! with [`Deferred::try_now`] without involving an executor.

use alloc::boxed::Box;
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use stowage_core::Result;

/// Boxed future used for the pending state.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

enum Inner<'a, T> {
    /// `None` once the value has been handed out by `poll`.
    Ready(Option<T>),
    Pending(BoxFuture<'a, T>),
}

/// A value that is ready now or pending on a future.
pub struct Deferred<'a, T> {
    inner: Inner<'a, T>,
}

// The ready value is never pinned in place; it is moved out on completion.
impl<T> Unpin for Deferred<'_, T> {}

impl<'a, T> Deferred<'a, T> {
    /// Wraps an immediately available value.
    pub fn ready(value: T) -> Self {
        Self {
            inner: Inner::Ready(Some(value)),
        }
    }

    /// Wraps a future.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = T> + 'a,
    {
        Self {
            inner: Inner::Pending(Box::pin(future)),
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, Inner::Ready(Some(_)))
    }

    /// Takes the value if it is available now, otherwise hands `self` back.
    pub fn try_now(self) -> core::result::Result<T, Self> {
        match self.inner {
            Inner::Ready(Some(value)) => Ok(value),
            inner => Err(Self { inner }),
        }
    }

    /// Maps the value: right away when ready, after resolution otherwise.
    pub fn then<U, F>(self, f: F) -> Deferred<'a, U>
    where
        F: FnOnce(T) -> U + 'a,
        T: 'a,
        U: 'a,
    {
        match self.inner {
            Inner::Ready(Some(value)) => Deferred::ready(f(value)),
            Inner::Ready(None) => panic!("`Deferred` used after completion"),
            Inner::Pending(future) => Deferred::pending(async move { f(future.await) }),
        }
    }
}

impl<'a, T: 'a> Deferred<'a, Result<T>> {
    /// Chains a fallible step onto a successful value; errors pass through.
    pub fn and_then_ready<U, F>(self, f: F) -> Deferred<'a, Result<U>>
    where
        F: FnOnce(T) -> Result<U> + 'a,
        U: 'a,
    {
        self.then(|result| result.and_then(f))
    }
}

impl<T> Future for Deferred<'_, T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        match &mut self.get_mut().inner {
            Inner::Ready(value) => match value.take() {
                Some(value) => Poll::Ready(value),
                None => panic!("`Deferred` polled after completion"),
            },
            Inner::Pending(future) => future.as_mut().poll(cx),
        }
    }
}

impl<T> From<T> for Deferred<'_, T> {
    fn from(value: T) -> Self {
        Self::ready(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Ready(Some(value)) => f.debug_tuple("Ready").field(value).finish(),
            Inner::Ready(None) => f.write_str("Done"),
            Inner::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Future that suspends exactly once before completing.
///
/// Used to give a synchronous answer an asynchronous shape.
#[derive(Debug, Default)]
pub struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

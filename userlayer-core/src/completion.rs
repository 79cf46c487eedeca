//! Dual completion for facade operations.
//!
//! Every facade operation produces a single [`Deferred`] value wrapping one internal result
//! channel. Callers choose how to observe it:
//!
//! - await it directly (it implements [`IntoFuture`]), or
//! - hand it a completion handler with [`Deferred::complete`].
//!
//! Both paths drive the same future, so they observe the same result value and the same error
//! value for the same backend response. A handler is `FnOnce` and a deferred value is consumed
//! when observed, which makes "exactly one completion signal per invocation" a property of the
//! types.
//!
//! A deferred value that is never awaited does nothing; one whose backend call never finishes
//! stays pending forever. Timeouts belong to the caller.

use futures::future::{BoxFuture, FutureExt, ready};
use std::{
    fmt,
    future::{Future, IntoFuture},
};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// The pending outcome of one facade operation.
#[must_use = "a deferred value does nothing unless awaited or completed"]
pub struct Deferred<'a, T> {
    inner: BoxFuture<'a, DocumentStoreResult<T>>,
}

impl<'a, T: Send + 'a> Deferred<'a, T> {
    /// Wraps an in-flight operation.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = DocumentStoreResult<T>> + Send + 'a,
    {
        Self { inner: future.boxed() }
    }

    /// A deferred value that settles with `err` without any backend involvement.
    pub fn failed(err: DocumentStoreError) -> Self {
        Self { inner: ready(Err(err)).boxed() }
    }

    /// Drives the operation and passes its outcome to `handler`, returning whatever the
    /// handler returns.
    ///
    /// # Example
    ///
    /// ```ignore
    /// users
    ///     .find_one("a@b.com")
    ///     .complete(|result| match result {
    ///         Ok(found) => println!("found: {found:?}"),
    ///         Err(err) => eprintln!("lookup failed: {err}"),
    ///     })
    ///     .await;
    /// ```
    pub async fn complete<F, R>(self, handler: F) -> R
    where
        F: FnOnce(DocumentStoreResult<T>) -> R,
    {
        handler(self.inner.await)
    }

    /// Transforms the successful value without changing when or how the operation settles.
    pub fn map_ok<U, F>(self, f: F) -> Deferred<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        Deferred::new(self.inner.map(|result| result.map(f)))
    }
}

impl<'a, T: Send + 'a> IntoFuture for Deferred<'a, T> {
    type Output = DocumentStoreResult<T>;
    type IntoFuture = BoxFuture<'a, DocumentStoreResult<T>>;

    fn into_future(self) -> Self::IntoFuture {
        self.inner
    }
}

impl<T> fmt::Debug for Deferred<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

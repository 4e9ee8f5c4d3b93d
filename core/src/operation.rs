//! In-flight request handle.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::ApiError;

/// A request already running on the tokio runtime.
///
/// Awaiting it yields the outcome exactly once. Dropping the handle does not
/// stop the request; `cancel` does.
#[derive(Debug)]
pub struct Operation<T> {
    handle: JoinHandle<Result<T, ApiError>>,
}

impl<T: Send + 'static> Operation<T> {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }
}

impl<T> Operation<T> {
    /// Abort the request. Awaiting afterwards yields `ApiError::Cancelled`
    /// unless the request had already finished.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for Operation<T> {
    type Output = Result<T, ApiError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) if e.is_cancelled() => Poll::Ready(Err(ApiError::Cancelled)),
            Poll::Ready(Err(e)) => Poll::Ready(Err(ApiError::Transport(e.to_string()))),
        }
    }
}

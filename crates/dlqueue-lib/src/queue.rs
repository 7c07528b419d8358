//! Single-concurrency FIFO processor.
//!
//! Items are handed to the processor strictly in enqueue order and one at a
//! time: the next item is only popped after the previous processor future has
//! settled. A failed (or panicking) item is logged and the queue moves on.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Processor<T, E> = dyn Fn(T) -> BoxFuture<'static, Result<(), E>> + Send + Sync;

struct QueueState<T> {
    pending: VecDeque<T>,
    processing: bool,
}

struct Inner<T, E> {
    state: Mutex<QueueState<T>>,
    processor: Box<Processor<T, E>>,
}

impl<T, E> Inner<T, E> {
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Queue<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for Queue<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> Queue<T, E>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    pub fn new<F, Fut>(processor: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    processing: false,
                }),
                processor: Box::new(move |item| processor(item).boxed()),
            }),
        }
    }

    /// Appends to the tail and starts draining if the queue was idle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue(&self, item: T) {
        let start_draining = {
            let mut state = self.inner.lock();
            state.pending.push_back(item);
            !std::mem::replace(&mut state.processing, true)
        };

        if start_draining {
            tokio::spawn(Self::drain(self.inner.clone()));
        }
    }

    /// Removes the head item that has not started processing yet.
    pub fn dequeue(&self) -> Option<T> {
        self.inner.lock().pending.pop_front()
    }

    /// Number of items waiting; the one being processed is not counted.
    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_processing(&self) -> bool {
        self.inner.lock().processing
    }

    async fn drain(inner: Arc<Inner<T, E>>) {
        loop {
            let item = {
                let mut state = inner.lock();
                match state.pending.pop_front() {
                    Some(item) => item,
                    None => {
                        state.processing = false;
                        return;
                    }
                }
            };

            match AssertUnwindSafe((inner.processor)(item))
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!("Queued item failed: {}", err),
                Err(_) => tracing::error!("Queued item processor panicked"),
            }
        }
    }
}

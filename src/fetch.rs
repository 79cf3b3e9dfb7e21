//! Async-state adapter around a fallible operation.
//!
//! A [`Fetcher`] publishes a [`Snapshot`] of `status`, `data` and `error` through a
//! `tokio::sync::watch` channel. Runs are never cancelled; whichever run settles last
//! decides the final snapshot. Results that settle after the fetcher is dropped are
//! discarded.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Weak},
};

use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};

type BoxedOp<A, T, E> =
    Arc<dyn Fn(A) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// `data` holds the last success and survives later failures. `error` is cleared by a success.
#[derive(Debug)]
pub struct Snapshot<T, E> {
    pub status: Status,
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<E>>,
}

impl<T, E> Clone for Snapshot<T, E> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
        }
    }
}

impl<T, E> Default for Snapshot<T, E> {
    fn default() -> Self {
        Self {
            status: Status::Idle,
            data: None,
            error: None,
        }
    }
}

pub struct Fetcher<A, T, E> {
    op: BoxedOp<A, T, E>,
    state: Arc<watch::Sender<Snapshot<T, E>>>,
}

impl<A, T, E> Fetcher<A, T, E>
where
    A: Send + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new<F, Fut>(op: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (state, _) = watch::channel(Snapshot::default());

        Self {
            op: Arc::new(move |args| Box::pin(op(args))),
            state: Arc::new(state),
        }
    }

    /// Marks the fetcher pending and runs the operation in the background.
    pub fn run(&self, args: A) -> JoinHandle<()> {
        self.state.send_modify(|s| s.status = Status::Pending);

        let future = (self.op)(args);
        let state: Weak<watch::Sender<Snapshot<T, E>>> = Arc::downgrade(&self.state);

        tokio::spawn(async move {
            let result = future.await;

            let Some(state) = state.upgrade() else {
                log::debug!("Fetcher dropped before its run settled, discarding result");
                return;
            };

            state.send_modify(|s| match result {
                Ok(data) => {
                    s.status = Status::Succeeded;
                    s.data = Some(Arc::new(data));
                    s.error = None;
                }
                Err(error) => {
                    s.status = Status::Failed;
                    s.error = Some(Arc::new(error));
                }
            });
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T, E>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot<T, E> {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> Status {
        self.state.borrow().status
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.state.borrow().data.clone()
    }

    pub fn error(&self) -> Option<Arc<E>> {
        self.state.borrow().error.clone()
    }
}

use std::{
    error::Error,
    fmt::Display,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use futures::{stream, StreamExt, TryStreamExt};
use tokio::{
    runtime::Handle,
    task::{JoinError, JoinHandle},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::query::QuerySet;

/// Calls `func` against every record, returning how many were visited.
pub fn each<Q, F>(qs: &Q, mut func: F) -> usize
where
    Q: QuerySet,
    F: FnMut(Q::Item),
{
    qs.iter().fold(0, |count, record| {
        func(record);
        count + 1
    })
}

/// Awaits `func` for every record in order, stopping at the first error.
pub async fn each_async<Q, F, Fut, E>(qs: &Q, mut func: F) -> Result<usize, E>
where
    Q: QuerySet,
    F: FnMut(Q::Item) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    stream::iter(qs.iter())
        .map(Ok::<_, E>)
        .try_fold(0, |count, record| {
            let future = func(record);
            async move {
                future.await?;
                Ok::<_, E>(count + 1)
            }
        })
        .await
}

/// Runs [`each`] on tokio's blocking pool. Fails with [`TaskError::NoRuntime`]
/// when called outside of a tokio runtime.
///
/// The returned [`EachTask`] reports the number of visited records, the first
/// error returned by `func`, a panic or a cancellation through
/// [`join`](EachTask::join).
pub fn each_spawned<Q, F, E>(qs: Q, mut func: F) -> Result<EachTask, TaskError>
where
    Q: QuerySet + Send + 'static,
    F: FnMut(Q::Item) -> Result<(), E> + Send + 'static,
    E: Error + Send + Sync + 'static,
{
    let runtime = Handle::try_current().map_err(|err| TaskError::NoRuntime(err.to_string()))?;
    let uuid = Uuid::new_v4();
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();

    debug!(msg = format!("Spawning each task."), task = uuid.to_string());

    let handle = runtime.spawn_blocking(move || -> Result<usize, TaskError> {
        let mut count = 0;
        for record in qs.iter() {
            if flag.load(Ordering::Acquire) {
                info!(
                    msg = format!("Cancelled after {count} records."),
                    task = uuid.to_string()
                );
                return Err(TaskError::Cancelled);
            }
            func(record).map_err(|err| {
                warn!(
                    msg = format!("Callback failed on record {count}: {err}"),
                    task = uuid.to_string()
                );
                TaskError::Callback(Box::new(err))
            })?;
            count += 1;
        }
        debug!(
            msg = format!("Finished after {count} records."),
            task = uuid.to_string()
        );
        Ok(count)
    });

    Ok(EachTask {
        uuid,
        cancelled,
        handle,
    })
}

/// Handle to a running [`each_spawned`].
///
/// Dropping the handle or calling [`detach`](EachTask::detach) lets the task
/// run to completion on its own. Its outcome is then only visible in the logs.
pub struct EachTask {
    uuid: Uuid,
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<Result<usize, TaskError>>,
}

impl EachTask {
    pub fn id(&self) -> Uuid {
        self.uuid
    }

    /// Stops the task before it visits the next record. The record being
    /// visited is finished first.
    pub fn cancel(&self) {
        info!(msg = format!("Cancelling each task."), task = self.uuid.to_string());
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> Result<usize, TaskError> {
        self.handle.await.map_err(TaskError::from)?
    }

    pub fn detach(self) {
        info!(msg = format!("Detaching each task."), task = self.uuid.to_string());
    }
}

#[derive(Debug)]
pub enum TaskError {
    Cancelled,
    Panicked(String),
    Callback(Box<dyn Error + Send + Sync>),
    Aborted(String),
    NoRuntime(String),
}

impl TaskError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl Display for TaskError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(fmt, "the task was cancelled"),
            Self::Panicked(msg) => write!(fmt, "the task panicked: {msg}"),
            Self::Callback(err) => write!(fmt, "the callback failed: {err}"),
            Self::Aborted(msg) => write!(fmt, "the task was aborted: {msg}"),
            Self::NoRuntime(msg) => write!(fmt, "no runtime to spawn on: {msg}"),
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Callback(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<JoinError> for TaskError {
    fn from(value: JoinError) -> Self {
        if value.is_panic() {
            let payload = value.into_panic();
            let msg = payload
                .downcast_ref::<&str>()
                .map(|msg| String::from(*msg))
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| String::from("unknown panic payload"));
            Self::Panicked(msg)
        } else {
            Self::Aborted(format!("{value}"))
        }
    }
}

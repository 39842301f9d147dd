use crate::catalog::{MatchFlags, MediaRecord, Pattern, SharedCatalog};
use crate::error::Error;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace};

pub type QueryCallback = Box<dyn FnOnce(Vec<MediaRecord>) + Send + 'static>;

/// A unit of queued catalog work.
pub enum Task {
    /// Run `Catalog::find` and hand the matches to `callback`, if any.
    Query {
        pattern: Pattern,
        flags: MatchFlags,
        callback: Option<QueryCallback>,
    },
}

impl Task {
    pub fn query(pattern: Pattern) -> Self {
        Task::Query {
            pattern,
            flags: MatchFlags::default(),
            callback: None,
        }
    }

    pub fn with_callback(self, callback: impl FnOnce(Vec<MediaRecord>) + Send + 'static) -> Self {
        match self {
            Task::Query { pattern, flags, .. } => Task::Query {
                pattern,
                flags,
                callback: Some(Box::new(callback)),
            },
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Query {
                pattern,
                flags,
                callback,
            } => f
                .debug_struct("Query")
                .field("pattern", pattern)
                .field("flags", flags)
                .field("callback", &callback.is_some())
                .finish(),
        }
    }
}

enum Message {
    Run(Task),
    Quit,
}

/// Unbounded FIFO queue drained by one dedicated worker thread.
pub struct TaskQueue {
    tx: Sender<Message>,
    handle: Option<JoinHandle<Result<usize, Error>>>,
}

impl TaskQueue {
    pub fn spawn(catalog: SharedCatalog) -> Result<Self, Error> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("catalog-worker".to_string())
            .spawn(move || run_worker(rx, catalog))?;
        debug!("Catalog worker started");
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, task: Task) -> Result<(), Error> {
        trace!("Queueing {:?}", task);
        self.tx
            .send(Message::Run(task))
            .map_err(|_| Error::WorkerStopped)
    }

    pub fn query(
        &self,
        pattern: Pattern,
        callback: impl FnOnce(Vec<MediaRecord>) + Send + 'static,
    ) -> Result<(), Error> {
        self.submit(Task::query(pattern).with_callback(callback))
    }

    /// Send the termination sentinel and wait for the worker to act on it.
    /// Tasks queued before the sentinel are still executed. Returns the
    /// number of executed tasks, or the error that halted the worker.
    pub fn shutdown(mut self) -> Result<usize, Error> {
        self.stop()
    }

    fn stop(&mut self) -> Result<usize, Error> {
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        // The worker may already have halted and dropped its receiver.
        let _ = self.tx.send(Message::Quit);
        let result = handle.join().map_err(|_| Error::WorkerPanicked)?;
        debug!("Catalog worker stopped");
        result
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Catalog worker ended with error: {}", e);
        }
    }
}

fn run_worker(rx: Receiver<Message>, catalog: SharedCatalog) -> Result<usize, Error> {
    let mut executed = 0;
    while let Ok(Message::Run(task)) = rx.recv() {
        match task {
            Task::Query {
                pattern,
                flags,
                callback,
            } => {
                let records = catalog.find(&pattern, flags).map_err(|e| {
                    error!("Catalog worker halted on {:?}: {}", pattern, e);
                    e
                })?;
                trace!("Query {:?} matched {} record(s)", pattern, records.len());
                if let Some(callback) = callback {
                    callback(records);
                }
            }
        }
        executed += 1;
    }
    Ok(executed)
}

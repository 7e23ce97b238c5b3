//! A dedicated thread for hosts that require a single dispatch context.
//!
//! Jobs are handed over through a tokio channel and the caller blocks until
//! the job's result comes back. Nothing here needs a running async runtime.

use crate::constants::DISPATCH_THREAD_NAME;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("The dispatch thread is no longer running")]
    Closed,

    #[error("The job panicked on the dispatch thread")]
    JobLost,
}

pub struct DispatchThread {
    sender: Option<mpsc::UnboundedSender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl DispatchThread {
    pub fn spawn() -> io::Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let handle = thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.to_string())
            .spawn(move || {
                tracing::debug!("[DISPATCH_THREAD_ENTER]");
                while let Some(job) = receiver.blocking_recv() {
                    // A panicking job drops its result sender; the caller sees `JobLost`.
                    let _ = panic::catch_unwind(AssertUnwindSafe(job));
                }
                tracing::debug!("[DISPATCH_THREAD_EXIT]");
            })?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Run `job` on the dispatch thread and block until it finished.
    ///
    /// Called from the dispatch thread itself, the job runs inline.
    pub fn run_and_wait<T, F>(&self, job: F) -> Result<T, DispatchError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if Self::is_current() {
            return Ok(job());
        }
        let sender = self.sender.as_ref().ok_or(DispatchError::Closed)?;
        let (result_tx, result_rx) = oneshot::channel();
        sender
            .send(Box::new(move || {
                let _ = result_tx.send(job());
            }))
            .map_err(|_| DispatchError::Closed)?;
        result_rx.blocking_recv().map_err(|_| DispatchError::JobLost)
    }

    pub fn is_current() -> bool {
        thread::current().name() == Some(DISPATCH_THREAD_NAME)
    }
}

impl Drop for DispatchThread {
    fn drop(&mut self) {
        // Closing the channel ends the receive loop.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Dispatch thread terminated abnormally");
            }
        }
    }
}

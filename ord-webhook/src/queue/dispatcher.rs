//! Sending side of the job channel.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use super::types::InscriptionJob;

/// The worker has stopped and no longer accepts jobs.
#[derive(Debug, Error)]
#[error("inscription worker is not running")]
pub struct DispatchError;

/// Cheap, cloneable handle for enqueueing inscription jobs.
///
/// The channel is unbounded: inscriptions are never throttled or rejected
/// for load, only when the worker has shut down.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<InscriptionJob>,
}

impl Dispatcher {
    /// Create a dispatcher and the receiver the worker drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InscriptionJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue a job without waiting for it to run.
    pub fn dispatch(&self, job: InscriptionJob) -> Result<(), DispatchError> {
        let job_id = job.job_id;
        self.tx.send(job).map_err(|_| DispatchError)?;
        info!(job_id = %job_id, "inscription_dispatched");
        Ok(())
    }
}

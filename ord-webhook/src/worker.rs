//! Inscription worker.
//!
//! Drains the job channel and spawns one pipeline task per job. There is
//! no concurrency limit and no retry. When shutdown is signalled (or every
//! [`crate::queue::Dispatcher`] is dropped) the worker stops taking jobs and
//! waits for the ones already running.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::pipeline::InscriptionPipeline;
use crate::queue::InscriptionJob;

/// Run the worker until `shutdown` resolves or the channel closes.
pub async fn run<F>(
    mut jobs: mpsc::UnboundedReceiver<InscriptionJob>,
    pipeline: Arc<InscriptionPipeline>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    let mut in_flight = JoinSet::new();

    tokio::pin!(shutdown);

    info!("worker_ready");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("worker_stopping");
                break;
            }
            // Reap finished tasks so the set does not grow without bound
            Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = result {
                    error!(error = %e, "inscription_task_panicked");
                }
            }
            job = jobs.recv() => {
                match job {
                    Some(job) => {
                        info!(job_id = %job.job_id, in_flight = in_flight.len(), "inscription_received");
                        let pipeline = Arc::clone(&pipeline);
                        in_flight.spawn(async move {
                            pipeline.execute(job).await;
                        });
                    }
                    None => {
                        warn!("worker_channel_closed");
                        break;
                    }
                }
            }
        }
    }

    jobs.close();

    if !in_flight.is_empty() {
        info!(in_flight = in_flight.len(), "worker_draining");
    }
    while let Some(result) = in_flight.join_next().await {
        if let Err(e) = result {
            error!(error = %e, "inscription_task_panicked");
        }
    }

    info!("worker_shutdown_complete");
}

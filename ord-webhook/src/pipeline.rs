//! The inscription pipeline: download, inscribe, send.
//!
//! Steps run strictly in order and the first failure stops the job. The
//! inscription id printed by `inscribe` is not passed to `send`; `send`
//! only reuses the job's fee rate and address.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info};

use crate::command::{CommandError, CommandOutput, CommandRunner, WalletCli};
use crate::fetch::{DownloadError, Fetcher};
use crate::queue::InscriptionJob;
use crate::Config;

/// Errors that stop a pipeline run, tagged by the step that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("inscribe failed: {0}")]
    Inscribe(#[source] CommandError),

    #[error("send failed: {0}")]
    Send(#[source] CommandError),
}

impl PipelineError {
    /// Step name used in logs.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Download(_) => "download",
            PipelineError::Inscribe(_) => "inscribe",
            PipelineError::Send(_) => "send",
        }
    }
}

/// What a successful run produced.
#[derive(Debug)]
pub struct InscriptionReport {
    pub file_path: PathBuf,
    pub inscribe: CommandOutput,
    pub send: CommandOutput,
}

/// Downloads a file and drives the wallet through inscribe and send.
#[derive(Clone)]
pub struct InscriptionPipeline {
    fetcher: Fetcher,
    wallet: WalletCli,
    runner: CommandRunner,
}

impl InscriptionPipeline {
    pub fn new(fetcher: Fetcher, wallet: WalletCli) -> Self {
        Self {
            fetcher,
            wallet,
            runner: CommandRunner::new(),
        }
    }

    /// Build the pipeline described by `config`.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let fetcher = Fetcher::new(&config.download_dir, &config.user_agent)?;
        let wallet = WalletCli::new(
            &config.ord_bin,
            config.ord_args.clone(),
            &config.ord_wallet,
        );
        Ok(Self::new(fetcher, wallet))
    }

    /// Run every step, returning the first error.
    pub async fn run(&self, job: &InscriptionJob) -> Result<InscriptionReport, PipelineError> {
        let file_path = self.fetcher.fetch(&job.file_url).await?;

        let inscribe = self
            .runner
            .run(&self.wallet.inscribe(&file_path, job.fee_rate))
            .await
            .map_err(PipelineError::Inscribe)?;

        info!(
            job_id = %job.job_id,
            stdout = %inscribe.stdout.trim(),
            "inscribe_complete"
        );

        let send = self
            .runner
            .run(&self.wallet.send(&job.address, job.fee_rate))
            .await
            .map_err(PipelineError::Send)?;

        Ok(InscriptionReport {
            file_path,
            inscribe,
            send,
        })
    }

    /// Run the job and record the outcome in the log.
    ///
    /// The webhook caller was answered before this started, so failures
    /// have nowhere to go but the log.
    pub async fn execute(&self, job: InscriptionJob) {
        info!(
            job_id = %job.job_id,
            file_url = %job.file_url,
            fee_rate = job.fee_rate.get(),
            address = %job.address,
            wallet = %self.wallet.wallet(),
            "inscription_starting"
        );

        match self.run(&job).await {
            Ok(report) => {
                info!(
                    job_id = %job.job_id,
                    file_path = %report.file_path.display(),
                    inscribe_stdout = %report.inscribe.stdout.trim(),
                    send_stdout = %report.send.stdout.trim(),
                    "inscription_complete"
                );
            }
            Err(e) => {
                error!(
                    job_id = %job.job_id,
                    stage = e.stage(),
                    error = %e,
                    "inscription_failed"
                );
            }
        }
    }
}

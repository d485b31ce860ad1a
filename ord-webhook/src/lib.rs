//! ord-webhook - signed webhook that inscribes remote files with `ord`.
//!
//! ## Architecture
//!
//! ```text
//! POST /webhook → signature check → Dispatcher → worker → download → ord inscribe → ord send
//! ```
//!
//! The HTTP caller gets `{"result":"OK"}` as soon as the job is queued.
//! Everything after that is reported through `tracing` only.

pub mod command;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod queue;
pub mod web;
pub mod worker;

// Re-export commonly used types
pub use command::{CommandError, CommandInvocation, CommandOutput, CommandRunner, WalletCli};
pub use config::Config;
pub use fetch::{DownloadError, Fetcher};
pub use pipeline::{InscriptionPipeline, InscriptionReport, PipelineError};
pub use queue::{Dispatcher, FeeRate, InscriptionJob};
pub use web::AppState;

//! In-process job queue between the web handler and the inscription worker.
//!
//! ```text
//! POST /webhook → Dispatcher → channel → worker → InscriptionPipeline
//! ```
//!
//! The handler only enqueues; the HTTP response never waits on the pipeline.

pub mod dispatcher;
pub mod types;

pub use dispatcher::{DispatchError, Dispatcher};
pub use types::{FeeRate, InscriptionJob, InvalidJob};

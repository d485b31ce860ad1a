//! Job types carried from the web handler to the inscription worker.

use std::fmt;

use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Reasons a webhook body cannot become a job.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidJob {
    #[error("fileUrl is not a valid URL: {0}")]
    FileUrl(#[from] url::ParseError),

    #[error("fileUrl must be http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("feeRate must be a positive number, got {0}")]
    FeeRate(f64),

    #[error("address must be non-empty and must not start with '-'")]
    Address,
}

/// Fee rate in sat/vB, passed through to `ord --fee-rate`.
///
/// Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FeeRate(f64);

impl FeeRate {
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for FeeRate {
    type Error = InvalidJob;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidJob::FeeRate(value))
    }
}

/// Integral rates print without a fractional part (`10`, not `10.0`).
impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated request to inscribe a file and send the inscription.
#[derive(Debug, Clone, PartialEq)]
pub struct InscriptionJob {
    /// Correlates log lines for one webhook call
    pub job_id: Uuid,
    /// Remote file to inscribe
    pub file_url: Url,
    /// Fee rate for both wallet commands
    pub fee_rate: FeeRate,
    /// Destination address for `wallet send`
    pub address: String,
}

impl InscriptionJob {
    /// Validate raw webhook fields into a job.
    pub fn new(file_url: &str, fee_rate: f64, address: String) -> Result<Self, InvalidJob> {
        let file_url = Url::parse(file_url)?;
        if !matches!(file_url.scheme(), "http" | "https") {
            return Err(InvalidJob::UnsupportedScheme(file_url.scheme().to_string()));
        }

        let fee_rate = FeeRate::try_from(fee_rate)?;

        if address.is_empty() || address.starts_with('-') {
            return Err(InvalidJob::Address);
        }

        Ok(Self {
            job_id: Uuid::new_v4(),
            file_url,
            fee_rate,
            address,
        })
    }
}

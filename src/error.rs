//! # Errors
//!
//! $$
//! \text{fit}:(Y,p)\mapsto \hat\theta \;\text{ or }\; \bot
//! $$
//!
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VarError {
  #[error("insufficient data: {nobs} observations, need more than {required}")]
  InsufficientData { nobs: usize, required: usize },

  #[error("singular matrix: {0}")]
  SingularMatrix(String),

  #[error("misaligned samples: {0}")]
  MisalignedSamples(String),

  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("schema error: {0}")]
  Schema(String),

  #[error("missing value in column '{column}' at data row {row}")]
  MissingValue { column: String, row: usize },

  #[error("non-finite value in column '{column}' at row {row}")]
  NonFinite { column: String, row: usize },

  #[error("dates must be strictly increasing: {previous} is followed by {next}")]
  UnorderedDates { previous: String, next: String },

  #[error("failed to parse '{value}' in column '{column}': {reason}")]
  Parse {
    column: String,
    value: String,
    reason: String,
  },

  #[error("distribution error: {0}")]
  Distribution(String),

  #[error(transparent)]
  Csv(#[from] csv::Error),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VarError>;

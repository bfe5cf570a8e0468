//! Pipeline error type.
//!
//! Collaborator, model and dataframe failures are wrapped transparently so
//! the caller sees the original error message. Missing optional columns are
//! never errors; they are null-filled by the normalization and projection
//! steps.

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::data::ProviderError;
use crate::model::ModelError;
use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("feature column '{0}' not found in snapshot")]
    MissingFeature(String),

    #[error("model returned {actual} predictions for {expected} rows")]
    PredictionLength { expected: usize, actual: usize },
}

//! Value-model collaborator.
//!
//! Training happens elsewhere. The pipeline only needs something that maps
//! a matrix of named feature columns to one predicted value per row.
//! [`LinearModel`] is the serialized form the offline tooling exports.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("feature '{column}' is null at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("model has no coefficient for feature '{0}'")]
    UnknownFeature(String),

    #[error("model expects feature '{0}' which was not supplied")]
    MissingFeature(String),

    #[error("failed to read model {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feature matrix error: {0}")]
    Polars(#[from] PolarsError),
}

/// A fitted regression model.
///
/// `features` holds exactly the configured feature columns, in order, cast
/// to Float64. Implementations return one value per row.
pub trait ValuePredictor: Send + Sync {
    /// Human-readable model name, recorded in report manifests.
    fn name(&self) -> &str;

    fn predict(&self, features: &DataFrame) -> Result<Vec<f64>, ModelError>;
}

/// Linear regressor: `intercept + Σ coefficient[f] * x[f]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub name: String,
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
}

impl LinearModel {
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Feature names the model was fitted on, sorted.
    pub fn feature_names(&self) -> Vec<&str> {
        self.coefficients.keys().map(String::as_str).collect()
    }
}

impl ValuePredictor for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &DataFrame) -> Result<Vec<f64>, ModelError> {
        if let Some(missing) = self
            .coefficients
            .keys()
            .find(|name| features.get_column_index(name.as_str()).is_none())
        {
            return Err(ModelError::MissingFeature(missing.clone()));
        }

        let mut out = vec![self.intercept; features.height()];
        for column in features.get_columns() {
            let name = column.name().as_str();
            let weight = *self
                .coefficients
                .get(name)
                .ok_or_else(|| ModelError::UnknownFeature(name.to_string()))?;
            let values = column.cast(&DataType::Float64)?;
            for (row, value) in values.f64()?.into_iter().enumerate() {
                let value = value.ok_or_else(|| ModelError::MissingValue {
                    column: name.to_string(),
                    row,
                })?;
                out[row] += weight * value;
            }
        }
        Ok(out)
    }
}

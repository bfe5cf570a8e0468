//! Daily snapshot I/O.
//!
//! Snapshots are produced upstream as Parquet (preferred) or CSV. This
//! module only reads them; the pipeline never writes a snapshot.

use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::schema::columns::DATE;
use crate::schema::has_column;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to open snapshot {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported snapshot format: {} (expected .parquet or .csv)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("snapshot read error: {0}")]
    Polars(#[from] PolarsError),
}

/// Load a snapshot table from a `.parquet` or `.csv` file.
pub fn load_snapshot(path: &Path) -> Result<DataFrame, SnapshotError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let df = match extension.as_deref() {
        Some("parquet") => {
            let file = fs::File::open(path).map_err(|source| SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            ParquetReader::new(file).finish()?
        }
        Some("csv") => {
            if !path.exists() {
                return Err(SnapshotError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            CsvReadOptions::default()
                .with_has_header(true)
                .map_parse_options(|options| options.with_try_parse_dates(true))
                .try_into_reader_with_file_path(Some(path.to_path_buf()))?
                .finish()?
        }
        _ => return Err(SnapshotError::UnsupportedFormat(path.to_path_buf())),
    };

    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded snapshot"
    );
    Ok(df)
}

/// BLAKE3 hex digest of the snapshot file, recorded in report manifests.
pub fn snapshot_fingerprint(path: &Path) -> Result<String, SnapshotError> {
    let bytes = fs::read(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Keep only the snapshot rows for `day`.
///
/// The `date` column may be a Date, a Datetime or an ISO `YYYY-MM-DD`
/// string. A snapshot without a `date` column, or with a date column of any
/// other type, is returned unchanged.
pub fn select_reporting_day(snapshot: &DataFrame, day: NaiveDate) -> PolarsResult<DataFrame> {
    if !has_column(snapshot, DATE) {
        return Ok(snapshot.clone());
    }

    let predicate = match snapshot.column(DATE)?.dtype() {
        DataType::Date => col(DATE).eq(lit(day)),
        DataType::Datetime(_, _) => col(DATE).cast(DataType::Date).eq(lit(day)),
        DataType::String => col(DATE).eq(lit(day.format("%Y-%m-%d").to_string())),
        other => {
            warn!(dtype = %other, "unrecognized date column type, keeping all rows");
            return Ok(snapshot.clone());
        }
    };

    let selected = snapshot.clone().lazy().filter(predicate).collect()?;
    info!(%day, rows = selected.height(), "selected reporting day");
    Ok(selected)
}

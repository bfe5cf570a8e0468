//! Report artifacts: CSV tables plus a JSON manifest.
//!
//! Layout: `{output_dir}/{reporting_date}/`
//! - `predictions.csv`: ranked prediction table
//! - `squad.csv`: squad report
//! - `market.csv`: market report
//! - `manifest.json`: provenance and row counts
//!
//! Every file is written to `.tmp` and renamed into place. The manifest
//! carries a `schema_version`; newer versions are rejected on load.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::pipeline::DailyReports;

pub const SCHEMA_VERSION: u32 = 1;

pub const PREDICTIONS_FILE: &str = "predictions.csv";
pub const SQUAD_FILE: &str = "squad.csv";
pub const MARKET_FILE: &str = "market.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] PolarsError),

    #[error("manifest serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported manifest schema version {found} (max supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Provenance of one set of report artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportManifest {
    pub schema_version: u32,
    pub reporting_date: chrono::NaiveDate,
    /// RFC 3339, league-local offset.
    pub generated_at: String,
    pub model: String,
    pub snapshot_hash: String,
    pub prediction_rows: usize,
    pub squad_rows: usize,
    pub market_rows: usize,
}

impl ReportManifest {
    pub fn for_reports(reports: &DailyReports, snapshot_hash: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            reporting_date: reports.reporting_date,
            generated_at: reports.generated_at.to_rfc3339(),
            model: reports.model_name.clone(),
            snapshot_hash: snapshot_hash.to_string(),
            prediction_rows: reports.predictions.height(),
            squad_rows: reports.squad.height(),
            market_rows: reports.market.height(),
        }
    }
}

/// Write all artifacts for `reports`. Returns the report directory.
///
/// Re-running for the same reporting date overwrites the previous files.
pub fn save_reports(
    reports: &DailyReports,
    output_dir: &Path,
    snapshot_hash: &str,
) -> Result<PathBuf, ExportError> {
    let report_dir = output_dir.join(reports.reporting_date.format("%Y-%m-%d").to_string());
    fs::create_dir_all(&report_dir).map_err(|source| ExportError::Io {
        path: report_dir.clone(),
        source,
    })?;

    write_csv(&reports.predictions, &report_dir.join(PREDICTIONS_FILE))?;
    write_csv(&reports.squad, &report_dir.join(SQUAD_FILE))?;
    write_csv(&reports.market, &report_dir.join(MARKET_FILE))?;

    let manifest = ReportManifest::for_reports(reports, snapshot_hash);
    let json = serde_json::to_string_pretty(&manifest)?;
    let manifest_path = report_dir.join(MANIFEST_FILE);
    write_atomic(&manifest_path, |file| {
        file.write_all(json.as_bytes())
            .map_err(|source| ExportError::Io {
                path: manifest_path.clone(),
                source,
            })
    })?;

    info!(dir = %report_dir.display(), "saved report artifacts");
    Ok(report_dir)
}

/// Load a manifest from a report directory, rejecting newer schema versions.
pub fn load_manifest(report_dir: &Path) -> Result<ReportManifest, ExportError> {
    let path = report_dir.join(MANIFEST_FILE);
    let json = fs::read_to_string(&path).map_err(|source| ExportError::Io { path, source })?;
    let manifest: ReportManifest = serde_json::from_str(&json)?;
    if manifest.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedVersion {
            found: manifest.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(manifest)
}

/// Write `df` as CSV with a header row.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<(), ExportError> {
    let mut df = df.clone();
    write_atomic(path, |file| {
        CsvWriter::new(file).include_header(true).finish(&mut df)?;
        Ok(())
    })
}

fn write_atomic(
    path: &Path,
    write: impl FnOnce(&mut fs::File) -> Result<(), ExportError>,
) -> Result<(), ExportError> {
    let tmp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path).map_err(|source| ExportError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    if let Err(e) = write(&mut file) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    drop(file);

    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

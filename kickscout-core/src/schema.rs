//! Fixed output schemas for the three report tables.
//!
//! Every report is projected onto its schema as the last step: columns are
//! emitted in schema order, anything outside the schema is dropped and
//! missing members are created as typed all-null columns. Callers never see
//! a missing column.

use polars::prelude::*;

/// Column names shared across snapshot, collaborator payloads and reports.
pub mod columns {
    pub const PLAYER_ID: &str = "player_id";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const POSITION: &str = "position";
    pub const TEAM_NAME: &str = "team_name";
    pub const DATE: &str = "date";
    pub const MV: &str = "mv";
    pub const MV_CHANGE_1D: &str = "mv_change_1d";
    pub const MV_TREND_1D: &str = "mv_trend_1d";
    pub const PREDICTED_MV_TARGET: &str = "predicted_mv_target";
    pub const MV_CHANGE_YESTERDAY: &str = "mv_change_yesterday";
    pub const S_11_PROB: &str = "s_11_prob";
    pub const HOURS_TO_EXP: &str = "hours_to_exp";
    pub const EXPIRING_TODAY: &str = "expiring_today";

    /// Roster identifier in squad payloads.
    pub const SQUAD_PLAYER_ID: &str = "i";
    /// Listing identifier in market payloads.
    pub const MARKET_PLAYER_ID: &str = "id";
    /// Seconds until a market listing expires.
    pub const EXPIRY_SECS: &str = "exp";
}

use columns::*;

/// Expected schemas for the report tables.
pub struct ReportSchema;

impl ReportSchema {
    /// Ranked prediction table produced by the shaper.
    pub fn predictions() -> Schema {
        Schema::from_iter(vec![
            Field::new(PLAYER_ID.into(), DataType::String),
            Field::new(FIRST_NAME.into(), DataType::String),
            Field::new(LAST_NAME.into(), DataType::String),
            Field::new(POSITION.into(), DataType::String),
            Field::new(TEAM_NAME.into(), DataType::String),
            Field::new(DATE.into(), DataType::Date),
            Field::new(MV_CHANGE_1D.into(), DataType::Float64),
            Field::new(MV_TREND_1D.into(), DataType::Float64),
            Field::new(MV.into(), DataType::Float64),
            Field::new(PREDICTED_MV_TARGET.into(), DataType::Float64),
        ])
    }

    /// Squad report.
    pub fn squad() -> Schema {
        Schema::from_iter(Self::reconciled_fields())
    }

    /// Market (bidding) report: the squad columns plus expiry information.
    pub fn market() -> Schema {
        let mut fields = Self::reconciled_fields();
        fields.push(Field::new(HOURS_TO_EXP.into(), DataType::Float64));
        fields.push(Field::new(EXPIRING_TODAY.into(), DataType::Boolean));
        Schema::from_iter(fields)
    }

    fn reconciled_fields() -> Vec<Field> {
        vec![
            Field::new(FIRST_NAME.into(), DataType::String),
            Field::new(LAST_NAME.into(), DataType::String),
            Field::new(TEAM_NAME.into(), DataType::String),
            Field::new(MV.into(), DataType::Float64),
            Field::new(MV_CHANGE_YESTERDAY.into(), DataType::Float64),
            Field::new(PREDICTED_MV_TARGET.into(), DataType::Float64),
            Field::new(S_11_PROB.into(), DataType::Float64),
        ]
    }

    /// Project `df` onto `schema`.
    ///
    /// Present columns keep their own dtype; absent ones are filled with
    /// nulls of the schema dtype.
    pub fn project(df: &DataFrame, schema: &Schema) -> PolarsResult<DataFrame> {
        let height = df.height();
        let projected = schema
            .iter_fields()
            .map(|field| match df.column(field.name().as_str()) {
                Ok(column) => column.clone(),
                Err(_) => Column::full_null(field.name().clone(), height, field.dtype()),
            })
            .collect::<Vec<_>>();
        DataFrame::new(projected)
    }

    /// Check that every named column exists in `df`.
    pub fn require_columns<S: AsRef<str>>(df: &DataFrame, names: &[S]) -> Result<(), SchemaError> {
        for name in names {
            if !has_column(df, name.as_ref()) {
                return Err(SchemaError::MissingColumn(name.as_ref().to_string()));
            }
        }
        Ok(())
    }
}

/// True when `df` has a column called `name`.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Column names of `df` as owned strings, for logging and assertions.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

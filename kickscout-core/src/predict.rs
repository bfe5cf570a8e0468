//! Predictor invocation and result shaping.
//!
//! The model scores every snapshot row; rows without a current market value
//! are dropped afterwards, since a player with unknown value cannot be
//! ranked. The result is sorted by predicted target, highest first, and
//! projected onto [`ReportSchema::predictions`].

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::ReportError;
use crate::model::ValuePredictor;
use crate::round2;
use crate::schema::columns::{MV, PREDICTED_MV_TARGET};
use crate::schema::{column_names, ReportSchema};

/// Score `snapshot` with `model` and shape it into the prediction table.
pub fn predict_and_shape(
    snapshot: &DataFrame,
    model: &dyn ValuePredictor,
    features: &[String],
) -> Result<DataFrame, ReportError> {
    ReportSchema::require_columns(snapshot, &[MV])?;

    let matrix = feature_matrix(snapshot, features)?;
    let raw = model.predict(&matrix)?;
    if raw.len() != snapshot.height() {
        return Err(ReportError::PredictionLength {
            expected: snapshot.height(),
            actual: raw.len(),
        });
    }

    let predicted: Vec<f64> = raw.into_iter().map(round2).collect();
    let mut scored = snapshot.clone();
    scored.with_column(Column::new(PREDICTED_MV_TARGET.into(), predicted))?;
    let mv = nan_as_null(scored.column(MV)?)?;
    scored.with_column(mv)?;

    let shaped = scored
        .lazy()
        .filter(col(MV).is_not_null())
        .sort(
            [PREDICTED_MV_TARGET],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()?;

    let dropped = snapshot.height() - shaped.height();
    let shaped = ReportSchema::project(&shaped, &ReportSchema::predictions())?;

    debug!(columns = ?column_names(&shaped), "prediction table columns");
    info!(
        model = model.name(),
        scored = snapshot.height(),
        dropped_without_mv = dropped,
        "shaped predictions"
    );
    Ok(shaped)
}

/// The configured feature columns, in order, cast to Float64.
pub fn feature_matrix(snapshot: &DataFrame, features: &[String]) -> Result<DataFrame, ReportError> {
    let columns = features
        .iter()
        .map(|name| {
            let column = snapshot
                .column(name)
                .map_err(|_| ReportError::MissingFeature(name.clone()))?;
            Ok(column.cast(&DataType::Float64)?)
        })
        .collect::<Result<Vec<_>, ReportError>>()?;
    Ok(DataFrame::new(columns)?)
}

/// Float NaN means "unknown" in upstream snapshots; treat it as null.
fn nan_as_null(column: &Column) -> PolarsResult<Column> {
    if !column.dtype().is_float() {
        return Ok(column.clone());
    }
    let values: Float64Chunked = column
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| v.filter(|v| !v.is_nan()))
        .collect();
    Ok(values.with_name(column.name().clone()).into_column())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinearModel, ModelError};
    use std::collections::BTreeMap;

    fn snapshot() -> DataFrame {
        df!(
            "player_id" => &[1i64, 2, 3, 4],
            "first_name" => &["Florian", "Granit", "Victor", "Jonathan"],
            "last_name" => &["Wirtz", "Xhaka", "Boniface", "Tah"],
            "position" => &["MID", "MID", "FWD", "DEF"],
            "team_name" => &["Leverkusen"; 4],
            "date" => &["2024-11-19"; 4],
            "mv_change_1d" => &[200_000.0, -30_000.0, 90_000.0, 10_000.0],
            "mv_trend_1d" => &[1i64, -1, 1, 0],
            "mv" => &[Some(130_000_000.0), Some(12_000_000.0), None, Some(f64::NAN)],
            "form" => &[8.1, 6.0, 7.5, 5.5],
            "internal_rank" => &[1i64, 2, 3, 4],
        )
        .unwrap()
    }

    fn model() -> LinearModel {
        LinearModel {
            name: "test".into(),
            intercept: 0.0,
            coefficients: BTreeMap::from([
                ("mv_change_1d".to_string(), 0.5),
                ("form".to_string(), 1000.0),
            ]),
        }
    }

    fn features() -> Vec<String> {
        vec!["mv_change_1d".into(), "form".into()]
    }

    #[test]
    fn shapes_to_prediction_schema() {
        let shaped = predict_and_shape(&snapshot(), &model(), &features()).unwrap();
        assert_eq!(
            column_names(&shaped),
            [
                "player_id",
                "first_name",
                "last_name",
                "position",
                "team_name",
                "date",
                "mv_change_1d",
                "mv_trend_1d",
                "mv",
                "predicted_mv_target"
            ]
        );
    }

    #[test]
    fn drops_rows_without_market_value() {
        let shaped = predict_and_shape(&snapshot(), &model(), &features()).unwrap();
        assert_eq!(shaped.height(), 2);
        assert_eq!(shaped.column("mv").unwrap().null_count(), 0);
    }

    #[test]
    fn sorted_by_prediction_descending_and_rounded() {
        let shaped = predict_and_shape(&snapshot(), &model(), &features()).unwrap();
        let predicted = shaped.column("predicted_mv_target").unwrap().f64().unwrap();
        // Wirtz: 100000 + 8100; Xhaka: -15000 + 6000
        assert_eq!(predicted.get(0), Some(108_100.0));
        assert_eq!(predicted.get(1), Some(-9_000.0));
    }

    #[test]
    fn predictions_are_rounded_to_cents() {
        let mut model = model();
        model.intercept = 0.123_456;
        let shaped = predict_and_shape(&snapshot(), &model, &features()).unwrap();
        let predicted = shaped.column("predicted_mv_target").unwrap().f64().unwrap();
        assert_eq!(predicted.get(0), Some(108_100.12));
    }

    #[test]
    fn missing_feature_column_is_an_error() {
        let features = vec!["mv_change_1d".to_string(), "xg".to_string()];
        let err = predict_and_shape(&snapshot(), &model(), &features).unwrap_err();
        assert!(matches!(err, ReportError::MissingFeature(ref f) if f == "xg"));
    }

    #[test]
    fn missing_mv_column_is_an_error() {
        let mut snapshot = snapshot();
        snapshot.drop_in_place("mv").unwrap();
        let err = predict_and_shape(&snapshot, &model(), &features()).unwrap_err();
        assert!(matches!(err, ReportError::Schema(_)));
    }

    #[test]
    fn model_errors_propagate() {
        let mut snapshot = snapshot();
        snapshot
            .with_column(Column::new("form".into(), [Some(1.0), None, Some(1.0), Some(1.0)]))
            .unwrap();
        let err = predict_and_shape(&snapshot, &model(), &features()).unwrap_err();
        assert!(matches!(
            err,
            ReportError::Model(ModelError::MissingValue { row: 1, .. })
        ));
    }

    struct ShortModel;

    impl ValuePredictor for ShortModel {
        fn name(&self) -> &str {
            "short"
        }

        fn predict(&self, _features: &DataFrame) -> Result<Vec<f64>, ModelError> {
            Ok(vec![1.0])
        }
    }

    #[test]
    fn prediction_length_mismatch_is_an_error() {
        let err = predict_and_shape(&snapshot(), &ShortModel, &features()).unwrap_err();
        assert!(matches!(
            err,
            ReportError::PredictionLength {
                expected: 4,
                actual: 1
            }
        ));
    }

    #[test]
    fn feature_matrix_preserves_configured_order() {
        let features = vec!["form".to_string(), "mv_trend_1d".to_string()];
        let matrix = feature_matrix(&snapshot(), &features).unwrap();
        assert_eq!(column_names(&matrix), ["form", "mv_trend_1d"]);
        assert_eq!(matrix.column("mv_trend_1d").unwrap().dtype(), &DataType::Float64);
    }
}

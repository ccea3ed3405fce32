#![cfg(feature = "polars")]

use crate::data_types::SpatialDataSource;
use eyre::WrapErr;
use polars::prelude::*;

/// f64 column storage: borrowed from the frame when it is contiguous and
/// null-free, otherwise materialized with nulls as NaN.
enum F64Column {
    Native(Float64Chunked),
    Owned(Vec<f64>),
}

impl F64Column {
    fn extract(df: &DataFrame, name: &str) -> eyre::Result<Self> {
        let column = df
            .column(name)
            .wrap_err_with(|| format!("missing column '{}'", name))?;
        let ca = column
            .as_series()
            .and_then(|s| s.f64().ok())
            .ok_or_else(|| eyre::eyre!("column '{}' is not an f64 series", name))?;

        Ok(match ca.cont_slice() {
            Ok(_) => F64Column::Native(ca.clone()),
            Err(_) => {
                tracing::debug!("Column '{}' has nulls or chunks, materializing", name);
                F64Column::Owned(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            }
        })
    }

    fn as_slice(&self) -> &[f64] {
        match self {
            F64Column::Native(ca) => ca.cont_slice().unwrap_or(&[]),
            F64Column::Owned(v) => v,
        }
    }
}

/// Exposes DataFrame columns as the raw arrays the mapper streams from.
pub struct PolarsDataSource {
    x: F64Column,
    y: F64Column,
    weights: Option<F64Column>,
    height: usize,
}

impl PolarsDataSource {
    pub fn new(mut df: DataFrame, x_col: &str, y_col: &str) -> eyre::Result<Self> {
        // Single chunk per column so slices can be borrowed without copying.
        df.rechunk_mut();
        Ok(Self {
            x: F64Column::extract(&df, x_col)?,
            y: F64Column::extract(&df, y_col)?,
            weights: None,
            height: df.height(),
        })
    }

    pub fn with_weights(mut df: DataFrame, x_col: &str, y_col: &str, weight_col: &str) -> eyre::Result<Self> {
        df.rechunk_mut();
        Ok(Self {
            x: F64Column::extract(&df, x_col)?,
            y: F64Column::extract(&df, y_col)?,
            weights: Some(F64Column::extract(&df, weight_col)?),
            height: df.height(),
        })
    }
}

impl SpatialDataSource for PolarsDataSource {
    fn len(&self) -> usize {
        self.height
    }

    fn x_data(&self) -> &[f64] {
        self.x.as_slice()
    }

    fn y_data(&self) -> &[f64] {
        self.y.as_slice()
    }

    fn weight_data(&self) -> Option<&[f64]> {
        self.weights.as_ref().map(F64Column::as_slice)
    }
}

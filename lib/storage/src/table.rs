//! On-disk layouts of the reference table

use anyhow::{anyhow, bail, Result};
use foilsim_core::{Feature, FeatureVector, Geometry, ReferenceRecord, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Storage layout, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Columnar JSON object, one array per column
    Json,
    /// bincode-encoded [`TableSnapshot`]
    Binary,
}

impl TableFormat {
    /// Detect the format from `path`, ignoring a trailing `.gz`
    pub fn from_path(path: &Path) -> Result<Self> {
        let inner = if crate::is_gzip(path) {
            path.file_stem().map(Path::new).unwrap_or(path)
        } else {
            path
        };
        match inner.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(TableFormat::Json),
            Some("bin") => Ok(TableFormat::Binary),
            other => bail!("unsupported table format {:?} (expected .json or .bin)", other),
        }
    }
}

/// Columnar JSON table: `airfoil_name`, the six feature columns and `geometry`.
///
/// Feature cells may be `null` for missing values. Any other columns are ignored.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ColumnarTable {
    pub airfoil_name: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometry: Vec<Value>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Value>,
}

/// Compact binary table; geometry is kept as JSON text
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub airfoil_name: Vec<String>,
    pub features: Vec<FeatureVector>,
    pub geometry: Vec<String>,
}

/// Rows decoded from storage, plus how many were unusable
#[derive(Debug)]
pub struct DecodedRows {
    pub records: Vec<ReferenceRecord>,
    pub dropped: usize,
}

impl ColumnarTable {
    pub fn from_records(records: &[ReferenceRecord]) -> Self {
        let mut columns = BTreeMap::new();
        for feature in Feature::ALL {
            let column: Vec<Value> = records
                .iter()
                .map(|r| Value::from(r.features[feature.index()]))
                .collect();
            columns.insert(feature.name().to_string(), Value::Array(column));
        }
        Self {
            airfoil_name: records.iter().map(|r| r.airfoil_name.clone()).collect(),
            geometry: records
                .iter()
                .map(|r| match &r.geometry {
                    Geometry::Encoded(text) => Value::String(text.clone()),
                    Geometry::Decoded(value) => value.clone(),
                })
                .collect(),
            columns,
        }
    }

    pub fn into_rows(mut self) -> Result<DecodedRows> {
        let n = self.airfoil_name.len();
        if !self.geometry.is_empty() && self.geometry.len() != n {
            bail!(
                "geometry column has {} rows, airfoil_name has {}",
                self.geometry.len(),
                n
            );
        }

        let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(FEATURE_COUNT);
        for feature in Feature::ALL {
            let column = self
                .columns
                .remove(feature.name())
                .ok_or_else(|| anyhow!("missing column '{}'", feature))?;
            columns.push(numeric_column(feature, column, n)?);
        }

        let mut geometry = std::mem::take(&mut self.geometry).into_iter();
        let mut records = Vec::with_capacity(n);
        let mut dropped = 0;
        for (row, name) in self.airfoil_name.into_iter().enumerate() {
            let payload = geometry.next().unwrap_or(Value::Null);
            let mut features = [0.0; FEATURE_COUNT];
            let mut usable = true;
            for (i, column) in columns.iter().enumerate() {
                match column[row] {
                    Some(v) if v.is_finite() => features[i] = v,
                    _ => usable = false,
                }
            }
            if usable {
                records.push(ReferenceRecord::new(name, features, Geometry::from(payload)));
            } else {
                dropped += 1;
            }
        }

        Ok(DecodedRows { records, dropped })
    }
}

fn numeric_column(feature: Feature, column: Value, rows: usize) -> Result<Vec<Option<f64>>> {
    let Value::Array(cells) = column else {
        bail!("column '{}' is not an array", feature);
    };
    if cells.len() != rows {
        bail!(
            "column '{}' has {} rows, airfoil_name has {}",
            feature,
            cells.len(),
            rows
        );
    }
    cells
        .into_iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            other => Err(anyhow!("column '{}' row {}: expected number, got {}", feature, row, other)),
        })
        .collect()
}

impl TableSnapshot {
    pub fn from_records(records: &[ReferenceRecord]) -> Self {
        Self {
            airfoil_name: records.iter().map(|r| r.airfoil_name.clone()).collect(),
            features: records.iter().map(|r| r.features).collect(),
            geometry: records.iter().map(|r| r.geometry.encode()).collect(),
        }
    }

    pub fn into_rows(self) -> Result<DecodedRows> {
        let n = self.airfoil_name.len();
        if self.features.len() != n || self.geometry.len() != n {
            bail!(
                "snapshot columns disagree: {} names, {} feature rows, {} geometries",
                n,
                self.features.len(),
                self.geometry.len()
            );
        }

        let mut records = Vec::with_capacity(n);
        let mut dropped = 0;
        for ((name, features), geometry) in self
            .airfoil_name
            .into_iter()
            .zip(self.features)
            .zip(self.geometry)
        {
            if features.iter().all(|v| v.is_finite()) {
                records.push(ReferenceRecord::new(name, features, Geometry::Encoded(geometry)));
            } else {
                dropped += 1;
            }
        }
        Ok(DecodedRows { records, dropped })
    }
}

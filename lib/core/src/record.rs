//! Reference records and the immutable table they live in

use crate::error::{Error, Result};
use crate::feature::{Feature, FeatureVector};
use serde_json::Value;

/// Opaque airfoil geometry carried alongside a record
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// JSON text as stored by the ingestion pipeline
    Encoded(String),
    /// Already-structured payload
    Decoded(Value),
}

impl Geometry {
    /// Structured form of the payload, decoding stored JSON text
    pub fn decode(&self) -> Result<Value> {
        match self {
            Geometry::Encoded(text) => serde_json::from_str(text)
                .map_err(|e| Error::Internal(format!("malformed geometry payload: {}", e))),
            Geometry::Decoded(value) => Ok(value.clone()),
        }
    }

    /// JSON text form of the payload
    pub fn encode(&self) -> String {
        match self {
            Geometry::Encoded(text) => text.clone(),
            Geometry::Decoded(value) => value.to_string(),
        }
    }
}

impl From<Value> for Geometry {
    /// JSON strings are treated as encoded payloads
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Geometry::Encoded(text),
            other => Geometry::Decoded(other),
        }
    }
}

/// One airfoil sample at one operating condition, features in scaled space
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub airfoil_name: String,
    pub features: FeatureVector,
    pub geometry: Geometry,
}

impl ReferenceRecord {
    pub fn new(airfoil_name: impl Into<String>, features: FeatureVector, geometry: Geometry) -> Self {
        Self {
            airfoil_name: airfoil_name.into(),
            features,
            geometry,
        }
    }
}

/// Non-empty, read-only set of pre-scaled reference records
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    records: Vec<ReferenceRecord>,
}

impl ReferenceTable {
    pub fn new(records: Vec<ReferenceRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::Configuration("reference table is empty".to_string()));
        }
        for (row, record) in records.iter().enumerate() {
            if let Some(feature) = Feature::ALL
                .into_iter()
                .find(|f| !record.features[f.index()].is_finite())
            {
                return Err(Error::Configuration(format!(
                    "reference record {} ('{}') has non-finite {}",
                    row, record.airfoil_name, feature
                )));
            }
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ReferenceRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceRecord> {
        self.records.iter()
    }
}

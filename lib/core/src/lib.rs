//! # foilsim Core
//!
//! Core library for foilsim, the airfoil similarity search service.
//!
//! This crate provides the ranking pipeline and the types it works on:
//!
//! - [`Feature`] - The ordered six-feature schema shared by every component
//! - [`FeatureScaler`] - Fitted transform between physical units and scaled space
//! - [`ReferenceTable`] - Immutable, pre-scaled reference records
//! - [`SimilarityEngine`] - Weighted L2 ranking with adaptive decay scoring
//!
//! ## Example
//!
//! ```rust
//! use foilsim_core::{
//!     FeatureScaler, Geometry, Query, ReferenceRecord, ReferenceTable,
//!     SearchConfig, SimilarityEngine,
//! };
//!
//! let raw = vec![
//!     [2.0e5, 0.0, 0.25, 0.008, -0.05, 31.0],
//!     [5.0e5, 4.0, 0.70, 0.010, -0.06, 70.0],
//!     [1.0e6, 8.0, 1.10, 0.015, -0.08, 73.0],
//! ];
//! let scaler = FeatureScaler::fit_standard(&raw).unwrap();
//! let records = raw
//!     .iter()
//!     .enumerate()
//!     .map(|(i, row)| {
//!         ReferenceRecord::new(format!("foil-{}", i), scaler.transform(row), Geometry::Decoded(serde_json::json!([])))
//!     })
//!     .collect();
//! let table = ReferenceTable::new(records).unwrap();
//! let engine = SimilarityEngine::new(table, scaler, SearchConfig::default()).unwrap();
//!
//! let query = Query::from_vectors(&[5.0e5, 4.0, 0.70, 0.010, -0.06, 70.0], &[1.0; 6]);
//! let results = engine.search(&query, 2).unwrap();
//! assert_eq!(results[0].airfoil_name, "foil-1");
//! assert_eq!(results[0].similarity, 100.0);
//! ```

pub mod decay;
pub mod distance;
pub mod engine;
pub mod error;
pub mod feature;
pub mod query;
pub mod record;
pub mod scaler;

pub use decay::DecayCalibration;
pub use engine::{RankedResult, SearchConfig, SimilarityEngine};
pub use error::{Error, Result, ValidationError};
pub use feature::{Feature, FeatureVector, FEATURE_COUNT};
pub use query::{Query, ValidatedQuery, WeightVector};
pub use record::{Geometry, ReferenceRecord, ReferenceTable};
pub use scaler::{FeatureScaler, ScalerParams, ScalerState};

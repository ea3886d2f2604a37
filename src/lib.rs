//! # foilsim
//!
//! Airfoil similarity search: given target aerodynamic properties and how much
//! each one matters, find the closest airfoil operating points in a fixed
//! reference dataset and score them on a 0-100 scale.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! foilsim --data-dir ./data --http-port 5000
//! curl -X POST localhost:5000/api/similarity-search \
//!   -H 'content-type: application/json' \
//!   -d '{"targets": {"reynolds_number": 500000, "angle_of_attack": 4, "cl": 0.7,
//!                    "cd": 0.01, "cm": -0.06, "cl_cd_ratio": 70},
//!        "weights": {"reynolds_number": 1, "angle_of_attack": 1, "cl": 2,
//!                    "cd": 2, "cm": 1, "cl_cd_ratio": 3}}'
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use foilsim::prelude::*;
//!
//! let files = DataFiles::in_dir("./data");
//! let engine = load_engine(&files, SearchConfig::default()).unwrap();
//!
//! let query = Query::from_vectors(
//!     &[5.0e5, 4.0, 0.7, 0.01, -0.06, 70.0],
//!     &[1.0, 1.0, 2.0, 2.0, 1.0, 3.0],
//! );
//! for hit in engine.search(&query, 3).unwrap() {
//!     println!("{} {:.1}", hit.airfoil_name, hit.similarity);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `foilsim-core` - Feature schema, scaler, similarity engine
//! - `foilsim-storage` - Reference table and scaler loading
//! - `foilsim-api` - REST API

// Re-export core types
pub use foilsim_core::{
    DecayCalibration, Error, Feature, FeatureScaler, FeatureVector, Geometry, Query, RankedResult,
    ReferenceRecord, ReferenceTable, Result, ScalerParams, ScalerState, SearchConfig,
    SimilarityEngine, ValidationError, WeightVector, FEATURE_COUNT,
};

// Re-export storage
pub use foilsim_storage::{load_engine, load_scaler, load_table, save_scaler, save_table, DataFiles};

// Re-export API
pub use foilsim_api::{EngineState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_engine, DataFiles, EngineState, Error, Feature, FeatureScaler, Query, RankedResult,
        ReferenceRecord, ReferenceTable, RestApi, Result, SearchConfig, SimilarityEngine,
    };
}

//! Feature schema
//!
//! The single ordered definition of the six aerodynamic features. The scaler,
//! the reference table, the engine and the wire format all index features
//! through [`Feature::ALL`], so the column order fixed at fit time is the
//! order used at query time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of features in every vector
pub const FEATURE_COUNT: usize = 6;

/// A point in feature space, indexed in [`Feature::ALL`] order
pub type FeatureVector = [f64; FEATURE_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    ReynoldsNumber,
    AngleOfAttack,
    Cl,
    Cd,
    Cm,
    ClCdRatio,
}

impl Feature {
    /// All features in schema order
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::ReynoldsNumber,
        Feature::AngleOfAttack,
        Feature::Cl,
        Feature::Cd,
        Feature::Cm,
        Feature::ClCdRatio,
    ];

    /// Column / wire name of the feature
    pub const fn name(self) -> &'static str {
        match self {
            Feature::ReynoldsNumber => "reynolds_number",
            Feature::AngleOfAttack => "angle_of_attack",
            Feature::Cl => "cl",
            Feature::Cd => "cd",
            Feature::Cm => "cm",
            Feature::ClCdRatio => "cl_cd_ratio",
        }
    }

    /// Position of the feature inside a [`FeatureVector`]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column names in schema order
pub fn feature_names() -> [&'static str; FEATURE_COUNT] {
    Feature::ALL.map(Feature::name)
}

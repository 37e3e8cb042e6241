use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Categories hidden on connection, as in the stock deployment.
pub const DEFAULT_HIDDEN_CATEGORIES: &[&str] = &[
    "Geom_Baseline",
    "TC_Aggregate",
    "TC_Grass",
    "TC_Rail Ballast",
    "TC_Rail Conc Sleeper",
    "TC_Rail Subballast",
    "TL_Rail Subballast",
    "TL_Rail Ballast",
    "Default",
    "S-PILE-CONC",
    "S-WALL-CONC",
    "A-GLAZ",
    "A-GLAZ-CLER",
    "A-HRAL-MWRK",
    "ARC01",
    "S-BEAM",
    "S-BEAM-STEL-PRI",
    "S-COLS",
    "S-JOIS-ENVL",
    "S-SLAB-CONC",
    "C-RAIL-EQPM",
    "A-WALL-BLOC",
    "A-WALL-LINE",
    "A-WALL-METL",
    "A-WALL-STUD",
    "A-WALL-TPAR",
    "S-COLS-FRAM",
    "S-BEAM-CONC",
    "S-COLS-CONC",
    "A-CLNG-TILE",
];

pub const DEFAULT_ELEMENT_LABEL: &str = "A_Platform.dgn.i.dgn";
pub const DEFAULT_KNOWN_ELEMENT: &str = "3259120";
pub const DEFAULT_KNOWN_POSITION: [f64; 3] = [114.6131, 50.8122, 30.8884];
pub const DEFAULT_MARKER_SIZE: [f64; 2] = [50.0, 50.0];
pub const DEFAULT_CLUSTER_THRESHOLD_PX: f64 = 10.0;

/// Startup configuration for the annotation subsystem.
///
/// Every section defaults independently, so a file only needs the keys it
/// overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub visibility: VisibilityConfig,
    pub annotations: ResolverConfig,
    pub clustering: ClusterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Category code values to hide. Quoted literals (`'S-BEAM'`) are accepted.
    pub hidden_categories: Vec<String>,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            hidden_categories: DEFAULT_HIDDEN_CATEGORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Elements whose user label equals this value are annotated.
    pub label: String,
    /// Known element id -> world position.
    pub positions: BTreeMap<String, [f64; 3]>,
    /// Position for elements missing from `positions`.
    pub fallback: [f64; 3],
    pub marker_size: [f64; 2],
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let mut positions = BTreeMap::new();
        positions.insert(DEFAULT_KNOWN_ELEMENT.to_string(), DEFAULT_KNOWN_POSITION);
        Self {
            label: DEFAULT_ELEMENT_LABEL.to_string(),
            positions,
            fallback: [0.0, 0.0, 0.0],
            marker_size: DEFAULT_MARKER_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Markers whose projections are closer than this share a cluster.
    pub threshold_px: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            threshold_px: DEFAULT_CLUSTER_THRESHOLD_PX,
        }
    }
}

impl AnnotationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.clustering.threshold_px;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "clustering.threshold_px must be a non-negative number, got {threshold}"
            )));
        }
        let [w, h] = self.annotations.marker_size;
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "annotations.marker_size must be positive, got [{w}, {h}]"
            )));
        }
        if self.annotations.label.trim().is_empty() {
            return Err(ConfigError::Invalid("annotations.label is empty".into()));
        }
        Ok(())
    }
}

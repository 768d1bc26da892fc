use crate::error::{StrataError, StrataResult};
use serde::{Deserialize, Serialize};

/// Configuration parameters for the HNSW graph.
///
/// All fields must be set before the first insert; the graph never rereads
/// them mid-operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The maximum number of neighbors kept per node on every layer.
    pub m: usize,
    /// Level-generation decay factor, strictly between 0 and 1. Smaller
    /// values produce taller, sparser hierarchies.
    pub ml: f64,
    /// The size of the candidate frontier during search (higher means better
    /// recall, slower search).
    pub ef_search: usize,
    /// The size of the candidate frontier during insertion neighbor
    /// discovery (higher means better quality, slower build).
    pub ef_construction: usize,
    /// Seed for the random number generator used for level assignment.
    /// `None` seeds from the OS. Fixed seeds make graph construction and
    /// search reproducible, which is unsafe against adversarial inputs.
    pub seed: Option<u64>,
}

impl Config {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> StrataResult<()> {
        if self.m == 0 {
            return Err(StrataError::Configuration(
                "M must be greater than 0".to_string(),
            ));
        }
        if self.ef_search == 0 {
            return Err(StrataError::Configuration(
                "ef_search must be greater than 0".to_string(),
            ));
        }
        if self.ef_construction == 0 {
            return Err(StrataError::Configuration(
                "ef_construction must be greater than 0".to_string(),
            ));
        }
        if self.ml <= 0.0 || self.ml >= 1.0 {
            return Err(StrataError::Configuration(
                "Ml must be strictly between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            m: 16,
            ml: 0.25,
            ef_search: 20,
            ef_construction: 40,
            seed: None,
        }
    }
}

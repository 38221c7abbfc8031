use super::errors::ConfigError;

use serde::{Deserialize, Serialize};

/// Construction parameters for a [`Population`].
///
/// The node counts fix each individual's *initial* mix; the function
/// alphabet sizes and the fractal policy are immutable for the population's
/// lifetime.
///
/// [`Population`]: crate::populations::Population
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Seed for the master random generator. The seed uniquely determines
    /// every subsequent draw, given the same sequence of calls.
    pub seed: u64,
    /// Number of individuals (`ni`).
    pub individuals: usize,
    /// Initial judgment nodes per individual.
    pub judgment_nodes: usize,
    /// Size of the judgment function alphabet (feature count used by
    /// judgment nodes).
    pub judgment_functions: usize,
    /// Initial processing nodes per individual.
    pub processing_nodes: usize,
    /// Size of the processing function alphabet (decision label count).
    pub processing_functions: usize,
    /// Whether judgment boundaries follow the fractal subdivision policy.
    pub fractal_judgment: bool,
}

impl PopulationConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] describing the first violated constraint:
    /// a zero-sized population, an empty function alphabet, no processing
    /// nodes (a graph that can never emit a decision), or too few inner
    /// nodes for judgment edges to have at least two distinct non-self
    /// targets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.individuals == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.judgment_functions == 0 || self.processing_functions == 0 {
            return Err(ConfigError::EmptyFunctionAlphabet);
        }
        if self.processing_nodes == 0 {
            return Err(ConfigError::NoProcessingNodes);
        }
        let node_count = self.judgment_nodes + self.processing_nodes;
        let minimum = if self.judgment_nodes > 0 { 3 } else { 2 };
        if node_count < minimum {
            return Err(ConfigError::TooFewInnerNodes {
                requested: node_count,
                minimum,
            });
        }
        Ok(())
    }
}

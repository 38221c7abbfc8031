use std::error::Error;
use std::fmt;

/// A caller-supplied configuration the engine cannot work with, reported at
/// the construction or initialization boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The population size was zero.
    EmptyPopulation,
    /// A function alphabet (judgment features or processing decisions) was
    /// empty.
    EmptyFunctionAlphabet,
    /// No processing nodes were requested; such graphs can never emit a
    /// decision.
    NoProcessingNodes,
    /// Too few inner nodes for every node to receive valid non-self edges.
    TooFewInnerNodes { requested: usize, minimum: usize },
    /// The per-feature range vectors are shorter than the judgment function
    /// alphabet.
    FeatureRangesTooShort { provided: usize, required: usize },
    /// A feature's range is empty (`min >= max`).
    EmptyFeatureRange { feature: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPopulation => write!(f, "population size must be at least 1"),
            Self::EmptyFunctionAlphabet => {
                write!(f, "function alphabets must contain at least one entry")
            }
            Self::NoProcessingNodes => {
                write!(f, "at least one processing node is required to emit decisions")
            }
            Self::TooFewInnerNodes { requested, minimum } => write!(
                f,
                "{} inner nodes requested but at least {} are required",
                requested, minimum
            ),
            Self::FeatureRangesTooShort { provided, required } => write!(
                f,
                "feature ranges cover {} features but {} are required",
                provided, required
            ),
            Self::EmptyFeatureRange { feature } => {
                write!(f, "feature {} has an empty range (min >= max)", feature)
            }
        }
    }
}

impl Error for ConfigError {}

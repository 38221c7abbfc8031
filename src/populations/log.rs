use super::Population;
use crate::networks::Network;

use std::fmt;

/// How much of the population a [`GenerationLog`] snapshot retains.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clones every individual.
    AllIndividuals,
    /// Clones only the current champion.
    Champion,
    /// Clones no individuals.
    NoIndividuals,
}

/// Basic statistics over a sequence of values.
#[derive(Clone, Debug)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Computes statistics over the values of a sequence.
    ///
    /// # Examples
    /// ```
    /// use fracnetics::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        let (mut max, mut min, mut sum) = (f64::MIN, f64::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mid = data.len() / 2;
        let mut median = *data
            .select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap())
            .1;
        if data.len() % 2 == 0 {
            median = (median
                + *data
                    .select_nth_unstable_by(mid - 1, |a, b| a.partial_cmp(b).unwrap())
                    .1)
                / 2.0;
        }
        Stats {
            maximum: max,
            minimum: min,
            mean: sum / data.len() as f64,
            median,
        }
    }
}

/// A reporting-level dependent sample of individuals.
#[derive(Clone, Debug)]
pub enum GenerationRecord {
    /// Every individual of the generation.
    Individuals(Vec<Network>),
    /// Only the generation's champion.
    Champion(Network),
    /// Empty.
    None,
}

/// A snapshot of one generation.
#[derive(Clone, Debug)]
pub struct GenerationLog {
    pub generation: usize,
    pub sample: GenerationRecord,
    pub fitness: Stats,
    pub node_count: Stats,
}

impl fmt::Display for GenerationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GenerationLog {{ generation: {}, fitness: {:?}, node_count: {:?} }}",
            self.generation, self.fitness, self.node_count,
        )
    }
}

/// An in-memory record of a population's evolution over time.
///
/// # Examples
/// ```
/// use fracnetics::{EvolutionLogger, Population, PopulationConfig, ReportingLevel};
///
/// let config = PopulationConfig {
///     seed: 1,
///     individuals: 5,
///     judgment_nodes: 2,
///     judgment_functions: 1,
///     processing_nodes: 2,
///     processing_functions: 2,
///     fractal_judgment: false,
/// };
/// let mut population = Population::new(config).unwrap();
/// population.set_all_node_boundaries(&[0.0], &[1.0]).unwrap();
///
/// let mut logger = EvolutionLogger::new(ReportingLevel::Champion);
/// population.accuracy_fitness(&[vec![0.3]], &[0], 20, 0.0);
/// logger.log(&population);
/// assert_eq!(logger.iter().count(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<GenerationLog>,
}

impl EvolutionLogger {
    /// Returns a logger with the given reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: Vec::new(),
        }
    }

    /// Stores a snapshot of the population's current generation.
    pub fn log(&mut self, population: &Population) {
        self.logs.push(GenerationLog {
            generation: self.logs.len(),
            sample: match self.reporting_level {
                ReportingLevel::AllIndividuals => {
                    GenerationRecord::Individuals(population.individuals().cloned().collect())
                }
                ReportingLevel::Champion => {
                    GenerationRecord::Champion(population.champion().clone())
                }
                ReportingLevel::NoIndividuals => GenerationRecord::None,
            },
            fitness: Stats::from(population.individuals().map(Network::fitness)),
            node_count: Stats::from(population.individuals().map(|n| n.node_count() as f64)),
        });
    }

    /// Iterates over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &GenerationLog> {
        self.logs.iter()
    }
}

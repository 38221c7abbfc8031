//! A [`Population`] owns a fixed-size vector of networks and the seeded
//! master random generator, and orchestrates the generational loop:
//! fitness evaluation, tournament selection with elitism, positional
//! crossover, the variable-size operator, and edge/boundary mutation.
//!
//! The recommended generation order is: evaluate, tournament selection,
//! add/delete, crossover, boundary mutation, edge mutation. The
//! variable-size dispatch must run before the other operators because its
//! decisions depend on the `used` flags of the last traversal, and any
//! other operator can invalidate them (crossover in particular swaps
//! nodes, and their flags, between individuals).

mod config;
mod errors;
mod log;

pub use config::PopulationConfig;
pub use errors::ConfigError;
pub use log::{EvolutionLogger, GenerationLog, GenerationRecord, ReportingLevel, Stats};

use crate::environments::{Environment, EpisodeConfig};
use crate::genomics::{fractal_lengths, random_cuts, sort_and_distance, NodeType};
use crate::networks::{BoundaryMutation, Network};

use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A population of GNP individuals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Population {
    config: PopulationConfig,
    individuals: Vec<Network>,
    best_fit: f64,
    mean_fitness: f64,
    min_fitness: f64,
    elite_indices: Vec<usize>,
    rng: ChaCha8Rng,
}

impl Population {
    /// Builds `config.individuals` random networks sharing a master
    /// generator seeded from `config.seed`.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the configuration is invalid; see
    /// [`PopulationConfig::validate`].
    pub fn new(config: PopulationConfig) -> Result<Population, ConfigError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let individuals = (0..config.individuals)
            .map(|_| {
                Network::new(
                    config.judgment_nodes,
                    config.judgment_functions,
                    config.processing_nodes,
                    config.processing_functions,
                    config.fractal_judgment,
                    &mut rng,
                )
            })
            .collect();
        Ok(Population {
            config,
            individuals,
            best_fit: f64::MIN,
            mean_fitness: 0.0,
            min_fitness: f64::MAX,
            elite_indices: Vec::new(),
            rng,
        })
    }

    /// Initializes the boundaries of every judgment node in every
    /// individual over the per-feature ranges `[min_f[f], max_f[f]]`:
    /// equal-width intervals in plain mode, or a fresh production rule and
    /// its fractal subdivision in fractal mode.
    ///
    /// Call exactly once, after construction and before the first fitness
    /// evaluation.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the ranges cover fewer features than
    /// the judgment alphabet or any range is empty.
    pub fn set_all_node_boundaries(
        &mut self,
        min_f: &[f64],
        max_f: &[f64],
    ) -> Result<(), ConfigError> {
        let required = self.config.judgment_functions;
        let provided = min_f.len().min(max_f.len());
        if provided < required {
            return Err(ConfigError::FeatureRangesTooShort { provided, required });
        }
        for feature in 0..required {
            if min_f[feature] >= max_f[feature] {
                return Err(ConfigError::EmptyFeatureRange { feature });
            }
        }

        let fractal = self.config.fractal_judgment;
        let rng = &mut self.rng;
        for network in &mut self.individuals {
            for node in &mut network.inner {
                if node.node_type != NodeType::Judgment {
                    continue;
                }
                let (min, max) = (min_f[node.function], max_f[node.function]);
                if fractal {
                    let (k, d) = node.k_d.expect("fractal judgment node has (k, d)");
                    let rule = random_cuts(k - 1, rng);
                    let lengths = fractal_lengths(d, &sort_and_distance(&rule));
                    node.set_boundaries(min, max, Some(&lengths));
                    node.production_rule = Some(rule);
                } else {
                    node.set_boundaries(min, max, None);
                }
            }
        }
        Ok(())
    }

    /// Evaluates the supervised accuracy fitness of every individual
    /// against the batch `(x, y)`. Individuals are independent during
    /// traversal, so evaluation runs in parallel.
    pub fn accuracy_fitness(&mut self, x: &[Vec<f64>], y: &[i64], d_max: usize, penalty: f64) {
        assert_eq!(x.len(), y.len(), "sample and target counts differ");
        self.individuals
            .par_iter_mut()
            .for_each(|network| network.accuracy_fitness(x, y, d_max, penalty));
    }

    /// Evaluates the reinforcement fitness of every individual: one episode
    /// each on the shared environment, all reset with the same configured
    /// seed. Runs serially, since the environment is a single mutable
    /// resource.
    ///
    /// # Errors
    /// The first environment failure aborts the sweep and is returned
    /// unchanged.
    pub fn environment_fitness<E: Environment>(
        &mut self,
        env: &mut E,
        episode: &EpisodeConfig,
    ) -> Result<(), E::Error> {
        for network in &mut self.individuals {
            network.environment_fitness(env, episode)?;
        }
        Ok(())
    }

    /// Runs a decisions-only batch traversal on every individual, leaving
    /// fitness untouched so the caller can compute a custom score from
    /// [`Network::decisions`]. Invalid samples record
    /// [`INVALID_DECISION`](crate::networks::INVALID_DECISION); filter it
    /// explicitly.
    pub fn traverse(&mut self, x: &[Vec<f64>], d_max: usize) {
        self.individuals
            .par_iter_mut()
            .for_each(|network| network.traverse_path(x, d_max));
    }

    /// Tournament selection with elitism: rebuilds the population from
    /// `ni - elite_size` tournament winners (each tournament samples
    /// `tournament_size` distinct individuals and copies the fittest)
    /// followed by the `elite_size` best individuals copied verbatim.
    /// Elite positions are recorded and protected from crossover and
    /// mutation until the next selection.
    ///
    /// Running statistics are refreshed: `best_fit` and `min_fitness` are
    /// seeded from individual 0, the tournament winners accumulate the
    /// mean, and elites update `best_fit`.
    ///
    /// # Panics
    /// Panics if `tournament_size` is zero or exceeds the population size,
    /// or if `elite_size` exceeds the population size.
    pub fn tournament_selection(&mut self, tournament_size: usize, elite_size: usize) {
        let ni = self.individuals.len();
        assert!(
            tournament_size >= 1 && tournament_size <= ni,
            "tournament size {} out of range for population of {}",
            tournament_size,
            ni
        );
        assert!(
            elite_size <= ni,
            "elite size {} exceeds population of {}",
            elite_size,
            ni
        );

        self.best_fit = self.individuals[0].fitness;
        self.min_fitness = self.individuals[0].fitness;
        self.mean_fitness = 0.0;
        self.elite_indices.clear();

        let mut selection: Vec<Network> = Vec::with_capacity(ni);
        for _ in 0..ni - elite_size {
            let entrants = index::sample(&mut self.rng, ni, tournament_size);
            let winner = entrants
                .iter()
                .reduce(|best, candidate| {
                    if self.individuals[candidate].fitness > self.individuals[best].fitness {
                        candidate
                    } else {
                        best
                    }
                })
                .expect("tournament has at least one entrant");
            let fitness = self.individuals[winner].fitness;
            self.mean_fitness += fitness;
            if fitness < self.min_fitness {
                self.min_fitness = fitness;
            }
            if fitness > self.best_fit {
                self.best_fit = fitness;
            }
            selection.push(self.individuals[winner].clone());
        }

        self.set_elite(elite_size, &mut selection);

        self.individuals = selection;
        self.mean_fitness /= ni as f64;
    }

    /// Moves the `elite_size` fittest remaining individuals verbatim into
    /// the selection, recording their destination indices.
    fn set_elite(&mut self, elite_size: usize, selection: &mut Vec<Network>) {
        let mut pool = std::mem::take(&mut self.individuals);
        for _ in 0..elite_size {
            let best = fittest_index(&pool);
            let champion = pool.remove(best);
            if champion.fitness > self.best_fit {
                self.best_fit = champion.fitness;
            }
            self.elite_indices.push(selection.len());
            selection.push(champion);
        }
    }

    /// Positional crossover: shuffles the individual indices, pairs them
    /// off, and (skipping any pair containing an elite) swaps the nodes
    /// at each shared position with probability `p` per position. After
    /// every swap the strictly smaller parent is repaired, since adopted
    /// nodes may carry edges beyond its range.
    pub fn crossover(&mut self, p: f64) {
        let ni = self.individuals.len();
        let mut order: Vec<usize> = (0..ni).collect();

        let Population {
            individuals,
            elite_indices,
            rng,
            ..
        } = self;
        order.shuffle(rng);

        for pair in order.chunks_exact(2) {
            let (first, second) = (pair[0], pair[1]);
            if elite_indices.contains(&first) || elite_indices.contains(&second) {
                continue;
            }
            let (parent1, parent2) = pair_mut(individuals, first, second);
            let shared = parent1.inner.len().min(parent2.inner.len());
            for position in 0..shared.saturating_sub(1) {
                if rng.gen::<f64>() >= p {
                    continue;
                }
                std::mem::swap(&mut parent1.inner[position], &mut parent2.inner[position]);
                if parent1.inner.len() < parent2.inner.len() {
                    parent1.change_false_edges(rng);
                } else if parent2.inner.len() < parent1.inner.len() {
                    parent2.change_false_edges(rng);
                }
            }
        }
    }

    /// Applies the variable-size operator to every individual. Run this
    /// before any other mutation in the generation: it consumes the `used`
    /// flags of the last traversal, which later mutations invalidate.
    pub fn add_del_nodes(&mut self, min_f: &[f64], max_f: &[f64]) {
        let Population {
            individuals, rng, ..
        } = self;
        for network in individuals {
            network.add_del_nodes(min_f, max_f, rng);
        }
    }

    /// Applies edge mutation to every non-elite individual:
    /// `prob_inner_nodes` per inner-node edge, `prob_start_node` for the
    /// start node's edge.
    pub fn edge_mutation(&mut self, prob_inner_nodes: f64, prob_start_node: f64) {
        let Population {
            individuals,
            elite_indices,
            rng,
            ..
        } = self;
        for (i, network) in individuals.iter_mut().enumerate() {
            if elite_indices.contains(&i) {
                continue;
            }
            network.edge_mutation(prob_inner_nodes, prob_start_node, rng);
        }
    }

    /// Applies the selected boundary-mutation variant to the judgment nodes
    /// of every non-elite individual. `min_f`/`max_f` are consumed by the
    /// fractal variant only.
    pub fn boundary_mutation(
        &mut self,
        kind: BoundaryMutation,
        p: f64,
        min_f: &[f64],
        max_f: &[f64],
    ) {
        let Population {
            individuals,
            elite_indices,
            rng,
            ..
        } = self;
        for (i, network) in individuals.iter_mut().enumerate() {
            if elite_indices.contains(&i) {
                continue;
            }
            network.boundary_mutation(kind, p, min_f, max_f, rng);
        }
    }

    /// Returns the currently fittest individual.
    ///
    /// # Panics
    /// Panics if any fitness is NaN.
    pub fn champion(&self) -> &Network {
        &self.individuals[fittest_index(&self.individuals)]
    }

    /// Iterates over the individuals in population order.
    pub fn individuals(&self) -> impl Iterator<Item = &Network> {
        self.individuals.iter()
    }

    /// Iterates mutably over the individuals, for writing caller-computed
    /// fitness after a decisions-only traversal.
    pub fn individuals_mut(&mut self) -> impl Iterator<Item = &mut Network> {
        self.individuals.iter_mut()
    }

    /// Best fitness seen by the most recent selection (elites included).
    pub fn best_fitness(&self) -> f64 {
        self.best_fit
    }

    /// Mean fitness of the most recent selection's tournament winners.
    pub fn mean_fitness(&self) -> f64 {
        self.mean_fitness
    }

    /// Minimum fitness among the most recent selection's tournament
    /// winners.
    pub fn min_fitness(&self) -> f64 {
        self.min_fitness
    }

    /// Positions of the individuals copied verbatim by the most recent
    /// selection.
    pub fn elite_indices(&self) -> &[usize] {
        &self.elite_indices
    }
}

/// Index of the fittest network, first wins ties.
///
/// # Panics
/// Panics on an empty slice or NaN fitness.
fn fittest_index(networks: &[Network]) -> usize {
    let mut best = 0;
    for (i, network) in networks.iter().enumerate().skip(1) {
        match network.fitness().partial_cmp(&networks[best].fitness()) {
            Some(std::cmp::Ordering::Greater) => best = i,
            Some(_) => {}
            None => panic!("invalid fitness detected (NaN)"),
        }
    }
    best
}

/// Mutable references to two distinct individuals.
fn pair_mut(networks: &mut [Network], i: usize, j: usize) -> (&mut Network, &mut Network) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = networks.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = networks.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

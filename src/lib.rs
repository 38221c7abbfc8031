//! An evolutionary engine for Genetic Network Programming (GNP).
//!
//! GNP evolves a population of directed multigraphs. Each graph is built
//! from *judgment* nodes, which branch on a continuous feature by searching
//! an ordered sequence of interval boundaries, and *processing* nodes, which
//! emit a discrete decision and follow their single outgoing edge. A
//! distinguished *start* node provides the entry point. Because the
//! traversal position persists across samples, a single graph behaves as a
//! compact decision program for both classification batches and step-based
//! control problems.
//!
//! The engine supplies the full generational loop: fitness evaluation
//! (supervised accuracy, a step-based [`Environment`], or a decisions-only
//! traversal for caller-computed fitness), tournament selection with
//! elitism, positional crossover with structural repair, a usage-driven
//! add/delete operator, and edge and boundary mutations, including a
//! fractal boundary mode in which interval widths follow an L-system-like
//! recursive subdivision whose production rule is itself evolvable.
//!
//! All randomness flows from a single seeded [`ChaCha8Rng`] owned by the
//! [`Population`], so a constructor seed uniquely determines every
//! subsequent draw.
//!
//! [`ChaCha8Rng`]: rand_chacha::ChaCha8Rng
//!
//! # Example: evolving a threshold classifier
//! ```
//! use fracnetics::{BoundaryMutation, Population, PopulationConfig};
//!
//! let config = PopulationConfig {
//!     seed: 42,
//!     individuals: 20,
//!     judgment_nodes: 4,
//!     judgment_functions: 1,
//!     processing_nodes: 4,
//!     processing_functions: 2,
//!     fractal_judgment: false,
//! };
//! let mut population = Population::new(config).unwrap();
//!
//! // One feature in [0, 1]; class is 1 above 0.5.
//! let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 / 20.0]).collect();
//! let y: Vec<i64> = x.iter().map(|row| (row[0] > 0.5) as i64).collect();
//! let (min_f, max_f) = (vec![0.0], vec![1.0]);
//!
//! population.set_all_node_boundaries(&min_f, &max_f).unwrap();
//!
//! for _ in 0..10 {
//!     population.accuracy_fitness(&x, &y, 50, 0.0);
//!     population.tournament_selection(3, 1);
//!     population.add_del_nodes(&min_f, &max_f);
//!     population.crossover(0.1);
//!     population.boundary_mutation(BoundaryMutation::Uniform, 0.05, &min_f, &max_f);
//!     population.edge_mutation(0.05, 0.05);
//! }
//!
//! population.accuracy_fitness(&x, &y, 50, 0.0);
//! assert!(population.champion().fitness() >= 0.0);
//! ```

mod environments;
mod genomics;
mod networks;
mod populations;

pub use environments::*;
pub use genomics::*;
pub use networks::*;
pub use populations::*;

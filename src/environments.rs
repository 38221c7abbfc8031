//! The step-based environment seam for reinforcement fitness.
//!
//! The engine drives any environment through exactly two operations, `reset`
//! and `step`; truncation limits, action encoding, and rendering are the
//! environment's own business. Environment errors propagate unchanged
//! through the fitness adapters.

use serde::{Deserialize, Serialize};

/// A step-based control environment.
pub trait Environment {
    /// Opaque per-step diagnostic payload; the engine never inspects it.
    type Info;
    /// Failure type surfaced verbatim by the fitness adapters.
    type Error: std::error::Error;

    /// Starts a new episode, returning the initial observation. The engine
    /// passes the configured episode seed so every individual faces the
    /// same initial conditions.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Vec<f64>, Self::Info), Self::Error>;

    /// Advances the episode by one action.
    fn step(&mut self, action: i64) -> Result<Transition<Self::Info>, Self::Error>;
}

/// The result of a single environment step.
#[derive(Clone, Debug)]
pub struct Transition<I> {
    pub observation: Vec<f64>,
    pub reward: f64,
    pub done: bool,
    pub info: I,
}

/// Episode limits and penalties for the reinforcement fitness adapter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeConfig {
    /// Maximum consecutive judgment hops per decision before the individual
    /// is invalidated.
    pub d_max: usize,
    /// Step cap per episode.
    pub max_steps: usize,
    /// Maximum consecutive processing decisions without an intervening
    /// judgment; exceeding it invalidates the episode.
    pub max_consecutive_p: usize,
    /// Fitness recorded for invalidated episodes.
    pub worst_fitness: f64,
    /// Seed forwarded to [`Environment::reset`] on each episode.
    pub seed: Option<u64>,
}

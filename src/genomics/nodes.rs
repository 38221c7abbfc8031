use crate::genomics::fractal::{fractal_lengths, sort_and_distance};

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use std::fmt;

/// The role a node plays during traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Singleton entry point with a single outgoing edge; never revisited
    /// within a sample.
    Start,
    /// Branches on a continuous feature via boundary search; at least two
    /// outgoing edges.
    Judgment,
    /// Emits a discrete decision and unconditionally follows its single
    /// outgoing edge.
    Processing,
}

/// One node of a GNP graph.
///
/// Edges are indices into the owning network's inner node vector, not
/// references; `id` mirrors the node's own position in that vector. The
/// start node is the exception: it occupies no inner slot and its `id` is
/// kept equal to the inner node count.
///
/// Judgment nodes additionally carry `boundaries`, a strictly ascending
/// sequence of `edges.len() + 1` reals partitioning the feature range, and,
/// in fractal mode, the `(k, d)` subdivision shape plus the production rule
/// the boundaries were grown from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) id: usize,
    pub(crate) node_type: NodeType,
    pub(crate) function: usize,
    pub(crate) edges: Vec<usize>,
    pub(crate) boundaries: Vec<f64>,
    pub(crate) production_rule: Option<Vec<f64>>,
    pub(crate) k_d: Option<(usize, usize)>,
    pub(crate) used: bool,
}

impl Node {
    /// Creates a node with no edges or boundaries; callers follow up with
    /// [`set_edges`](Node::set_edges) and, for judgment nodes,
    /// [`set_boundaries`](Node::set_boundaries).
    pub fn new(id: usize, node_type: NodeType, function: usize) -> Node {
        Node {
            id,
            node_type,
            function,
            edges: Vec::new(),
            boundaries: Vec::new(),
            production_rule: None,
            k_d: None,
            used: false,
        }
    }

    /// Randomizes the node's outgoing edges over a network of `node_count`
    /// inner nodes, never creating a self-loop.
    ///
    /// Start and processing nodes receive exactly one successor. Judgment
    /// nodes receive `target_count` successors, or, when `target_count`
    /// is 0, a uniformly random count in `[2, node_count - 1]`, drawn
    /// without replacement from the candidate set.
    ///
    /// # Panics
    /// Panics if a judgment node cannot be given at least two distinct
    /// non-self successors.
    pub fn set_edges<R: Rng>(&mut self, node_count: usize, target_count: usize, rng: &mut R) {
        match self.node_type {
            NodeType::Judgment => {
                let mut candidates: Vec<usize> =
                    (0..node_count).filter(|&i| i != self.id).collect();
                candidates.shuffle(rng);
                let kept = if target_count == 0 {
                    rng.gen_range(2..=node_count - 1)
                } else {
                    target_count
                };
                assert!(
                    kept >= 2 && kept <= candidates.len(),
                    "judgment node {} cannot take {} successors out of {}",
                    self.id,
                    kept,
                    candidates.len()
                );
                candidates.truncate(kept);
                self.edges = candidates;
            }
            NodeType::Start | NodeType::Processing => {
                self.edges = vec![loop {
                    let r = rng.gen_range(0..node_count);
                    if r != self.id {
                        break r;
                    }
                }];
            }
        }
    }

    /// Rebuilds `boundaries` over `[min_f, max_f]`.
    ///
    /// Without `lengths` the range is split into `edges.len()` equal-width
    /// intervals; with `lengths`, interval `i` spans
    /// `(max_f - min_f) * lengths[i]` (the lengths must sum to 1). The first
    /// and last boundaries are exactly `min_f` and `max_f`.
    pub fn set_boundaries(&mut self, min_f: f64, max_f: f64, lengths: Option<&[f64]>) {
        let span = max_f - min_f;
        self.boundaries.clear();
        self.boundaries.push(min_f);
        match lengths {
            None => {
                let width = span / self.edges.len() as f64;
                for i in 1..self.edges.len() {
                    self.boundaries.push(min_f + width * i as f64);
                }
            }
            Some(lengths) => {
                debug_assert_eq!(lengths.len(), self.edges.len());
                debug_assert!((lengths.iter().sum::<f64>() - 1.0).abs() < 1e-6);
                let mut acc = min_f;
                for &len in &lengths[..lengths.len() - 1] {
                    acc += span * len;
                    self.boundaries.push(acc);
                }
            }
        }
        self.boundaries.push(max_f);
    }

    /// Returns the index of the edge whose interval contains `v`.
    ///
    /// Values at or below the first boundary select edge 0; values at or
    /// above the last select the last edge; otherwise the unique `i` with
    /// `boundaries[i] <= v < boundaries[i + 1]` is returned.
    ///
    /// # Examples
    /// ```
    /// use fracnetics::{Node, NodeType};
    ///
    /// let mut node = Node::new(0, NodeType::Judgment, 0);
    /// node.overwrite_edges(vec![3, 1, 4]);
    /// node.set_boundaries(0.0, 9.0, None);
    ///
    /// assert_eq!(node.boundaries(), &[0.0, 3.0, 6.0, 9.0]);
    /// assert_eq!(node.judge(4.5), 1);
    /// assert_eq!(node.judge(-1.0), 0);
    /// assert_eq!(node.judge(10.0), 2);
    /// ```
    pub fn judge(&self, v: f64) -> usize {
        debug_assert_eq!(self.boundaries.len(), self.edges.len() + 1);
        let upper = self.boundaries.partition_point(|&b| b <= v);
        upper.saturating_sub(1).min(self.edges.len() - 1)
    }

    /// Independently replaces each outgoing edge, with probability `p`, by a
    /// random inner index differing from both the node's id and the edge's
    /// current value. Preserves the edge count. Edges with no alternative
    /// target are left alone.
    pub fn edge_mutation<R: Rng>(&mut self, p: f64, node_count: usize, rng: &mut R) {
        for k in 0..self.edges.len() {
            if rng.gen::<f64>() >= p {
                continue;
            }
            let current = self.edges[k];
            let excluded =
                usize::from(self.id < node_count) + usize::from(current < node_count);
            if node_count <= excluded {
                continue;
            }
            self.edges[k] = loop {
                let r = rng.gen_range(0..node_count);
                if r != self.id && r != current {
                    break r;
                }
            };
        }
    }

    /// Rejection-samples a replacement target in `[0, node_count)` that is
    /// neither this node's id nor `current`. Used to repair edges that point
    /// at a removed or out-of-range node.
    ///
    /// # Panics
    /// Panics if no valid target exists.
    pub fn change_edge<R: Rng>(&self, node_count: usize, current: usize, rng: &mut R) -> usize {
        let excluded = usize::from(self.id < node_count)
            + usize::from(current < node_count && current != self.id);
        assert!(
            node_count > excluded,
            "node {} has no rewire target among {} nodes",
            self.id,
            node_count
        );
        loop {
            let r = rng.gen_range(0..node_count);
            if r != self.id && r != current {
                break r;
            }
        }
    }

    /// With probability `p` per inner boundary, replaces it by a uniform
    /// draw from the open interval between its two adjacent boundaries. The
    /// first and last boundaries never move.
    pub fn uniform_boundary_mutation<R: Rng>(&mut self, p: f64, rng: &mut R) {
        for i in 1..self.boundaries.len().saturating_sub(1) {
            if rng.gen::<f64>() >= p {
                continue;
            }
            self.boundaries[i] = open_uniform(self.boundaries[i - 1], self.boundaries[i + 1], rng);
        }
    }

    /// With probability `p` per inner boundary, resamples it from
    /// `N(mu, (sigma * mu)^2)` where `mu` is the current value, keeping the
    /// draw only if it lands strictly between the neighboring boundaries.
    ///
    /// The standard deviation scales with the boundary's magnitude, so the
    /// effective mutation strength collapses around zero-valued boundaries.
    pub fn normal_boundary_mutation<R: Rng>(&mut self, p: f64, sigma: f64, rng: &mut R) {
        for i in 1..self.boundaries.len().saturating_sub(1) {
            if rng.gen::<f64>() >= p {
                continue;
            }
            let mu = self.boundaries[i];
            let normal =
                Normal::new(mu, (sigma * mu).abs()).expect("standard deviation is finite");
            let draw = normal.sample(rng);
            if draw > self.boundaries[i - 1] && draw < self.boundaries[i + 1] {
                self.boundaries[i] = draw;
            }
        }
    }

    /// Mutates the interior cut points of the production rule (uniform draw
    /// between the neighboring cut points, probability `p` each) and, if any
    /// cut point moved, regrows `boundaries` from the updated rule over
    /// `[min_f, max_f]`. Non-fractal nodes are left untouched.
    pub fn fractal_boundary_mutation<R: Rng>(
        &mut self,
        p: f64,
        min_f: f64,
        max_f: f64,
        rng: &mut R,
    ) {
        let regenerated = {
            let rule = match self.production_rule.as_mut() {
                Some(rule) => rule,
                None => return,
            };
            let mut changed = false;
            for i in 1..rule.len() - 1 {
                if rng.gen::<f64>() >= p {
                    continue;
                }
                rule[i] = open_uniform(rule[i - 1], rule[i + 1], rng);
                changed = true;
            }
            changed.then(|| sort_and_distance(rule))
        };
        if let Some(parameter) = regenerated {
            let (_, depth) = self.k_d.expect("fractal node carries its (k, d) pair");
            let lengths = fractal_lengths(depth, &parameter);
            self.set_boundaries(min_f, max_f, Some(&lengths));
        }
    }

    /// Returns the node's position in the owning network's inner vector
    /// (or the inner node count, for the start node).
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the node's type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns the feature index (judgment) or decision label (processing).
    pub fn function(&self) -> usize {
        self.function
    }

    /// Returns the outgoing edges as inner-node indices.
    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    /// Returns the interval boundaries (empty for non-judgment nodes).
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Returns the fractal production rule, if this node has one.
    pub fn production_rule(&self) -> Option<&[f64]> {
        self.production_rule.as_deref()
    }

    /// Returns the fractal `(k, d)` subdivision shape, if any.
    pub fn k_d(&self) -> Option<(usize, usize)> {
        self.k_d
    }

    /// Whether the node was visited during the most recent traversal.
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Test scaffolding: overwrites the edge list directly.
    #[doc(hidden)]
    pub fn overwrite_edges(&mut self, edges: Vec<usize>) {
        self.edges = edges;
    }
}

/// Uniform draw from the open interval `(lo, hi)`.
fn open_uniform<R: Rng>(lo: f64, hi: f64, rng: &mut R) -> f64 {
    loop {
        let v = rng.gen_range(lo..hi);
        if v > lo {
            break v;
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{}, f: {}, edges: {:?}, boundaries: {:?}]",
            self.node_type, self.id, self.function, self.edges, self.boundaries,
        )
    }
}

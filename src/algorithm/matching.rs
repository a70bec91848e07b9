//! # Maximum bipartite matching
//!
//! Maximum cardinality matchings are computed with the algorithm of Hopcroft and Karp, which runs
//! in `O(E sqrt(V))`. Each phase layers the graph with a breadth-first search from all unmatched
//! left vertices, and then augments along a maximal set of vertex-disjoint shortest augmenting
//! paths found with depth-first searches that respect the layering.
use std::fmt;

use fifo_set::FIFOSet;
use log::trace;
use num_traits::Zero;

use crate::data::linear_algebra::matrix::Matrix;
use crate::data::linear_algebra::permutation::Permutation;
use crate::data::network::BipartiteGraph;
use crate::error::{Error, Result};

/// Distance of vertices not (or no longer) reachable in the current layering.
const INFINITY: usize = usize::MAX;

/// A set of edges of a bipartite graph, no two sharing a vertex.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Matching {
    /// For each left vertex, the right vertex it's matched to, if any.
    left: Vec<Option<usize>>,
}

impl Matching {
    /// Create a matching from the partner of each left vertex.
    ///
    /// # Errors
    ///
    /// `InvalidMatching` if a right vertex is out of range or appears more than once.
    pub fn new(left: Vec<Option<usize>>) -> Result<Self> {
        let len = left.len();
        let mut seen = vec![false; len];
        for (index, vertex) in left.iter().enumerate().filter_map(|(i, j)| j.map(|j| (i, j))) {
            if vertex >= len || seen[vertex] {
                return Err(Error::InvalidMatching { len, index, vertex });
            }
            seen[vertex] = true;
        }

        Ok(Self { left })
    }

    /// The right vertex matched to left vertex `i`, or `None` if `i` is unmatched.
    pub fn partner(&self, i: usize) -> Option<usize> {
        self.left[i]
    }

    /// Number of matched pairs.
    pub fn size(&self) -> usize {
        self.left.iter().flatten().count()
    }

    /// Number of left vertices.
    pub fn nr_vertices(&self) -> usize {
        self.left.len()
    }

    /// Whether every vertex is matched.
    pub fn is_perfect(&self) -> bool {
        self.left.iter().all(Option::is_some)
    }

    /// Matched `(left, right)` pairs in order of the left vertex.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.left.iter().enumerate().filter_map(|(i, j)| j.map(|j| (i, j)))
    }

    /// The partner of each left vertex.
    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.left
    }

    /// Read a perfect matching as a permutation, `None` if some vertex is unmatched.
    pub fn to_permutation(&self) -> Option<Permutation> {
        self.left.iter()
            .copied()
            .collect::<Option<Vec<_>>>()
            .map(Permutation::new_unchecked)
    }
}

impl fmt::Display for Matching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (k, (i, j)) in self.pairs().enumerate() {
            if k > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} -> {}", i, j)?;
        }
        f.write_str("}")
    }
}

impl BipartiteGraph {
    /// Compute a maximum cardinality matching.
    pub fn maximum_matching(&self) -> Matching {
        HopcroftKarp::new(self).solve()
    }
}

/// Compute a maximum matching of the bipartite graph given by the nonzero entries of a matrix.
///
/// Rows are left vertices, columns right vertices.
pub fn maximum_matching<T: Copy + Zero>(adjacency: &Matrix<T>) -> Matching {
    BipartiteGraph::new(adjacency).maximum_matching()
}

/// Working state of the Hopcroft-Karp algorithm.
struct HopcroftKarp<'a> {
    graph: &'a BipartiteGraph,
    /// Partner of each left vertex.
    left: Vec<Option<usize>>,
    /// Partner of each right vertex.
    right: Vec<Option<usize>>,
    /// Layer of each left vertex, followed by one entry for the "free" sentinel.
    ///
    /// The sentinel stands in for all unmatched right vertices: its distance is the length of the
    /// shortest augmenting path in the current phase.
    distance: Vec<usize>,
}

impl<'a> HopcroftKarp<'a> {
    fn new(graph: &'a BipartiteGraph) -> Self {
        let n = graph.nr_vertices();

        Self {
            graph,
            left: vec![None; n],
            right: vec![None; n],
            distance: vec![0; n + 1],
        }
    }

    /// Index of the sentinel in `distance`.
    fn free(&self) -> usize {
        self.graph.nr_vertices()
    }

    /// The left vertex matched to right vertex `j`, or the sentinel.
    fn through(&self, j: usize) -> usize {
        self.right[j].unwrap_or_else(|| self.free())
    }

    fn solve(mut self) -> Matching {
        let mut phase = 0;
        while self.layer() {
            for u in 0..self.graph.nr_vertices() {
                if self.left[u].is_none() {
                    self.augment(u);
                }
            }

            phase += 1;
            trace!(
                "phase {}: shortest augmenting path {}, matching size {}",
                phase, self.distance[self.free()], self.left.iter().flatten().count(),
            );
        }

        Matching { left: self.left }
    }

    /// Breadth-first layering from all unmatched left vertices.
    ///
    /// # Return value
    ///
    /// Whether an unmatched right vertex is reachable, that is, whether an augmenting path exists.
    fn layer(&mut self) -> bool {
        let free = self.free();

        for u in 0..self.graph.nr_vertices() {
            self.distance[u] = if self.left[u].is_none() { 0 } else { INFINITY };
        }
        self.distance[free] = INFINITY;

        let mut queue = (0..self.graph.nr_vertices())
            .filter(|&u| self.left[u].is_none())
            .collect::<FIFOSet<_>>();

        while let Some(u) = queue.pop() {
            if self.distance[u] < self.distance[free] {
                for &v in self.graph.neighbors(u) {
                    let next = self.through(v);
                    if self.distance[next] == INFINITY {
                        self.distance[next] = self.distance[u] + 1;
                        if next != free {
                            queue.push(next);
                        }
                    }
                }
            }
        }

        self.distance[free] != INFINITY
    }

    /// Depth-first search for an augmenting path from `u` along the layering.
    ///
    /// Augments the matching if a path is found. Otherwise, `u` is removed from the layering for
    /// the rest of the phase.
    fn augment(&mut self, u: usize) -> bool {
        if u == self.free() {
            return true;
        }
        debug_assert_ne!(self.distance[u], INFINITY);

        let graph = self.graph;
        for &v in graph.neighbors(u) {
            let next = self.through(v);
            if self.distance[next] == self.distance[u] + 1 && self.augment(next) {
                self.right[v] = Some(u);
                self.left[u] = Some(v);
                return true;
            }
        }

        self.distance[u] = INFINITY;
        false
    }
}

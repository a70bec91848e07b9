//! # Bipartite graphs
//!
//! Representing the support of a square matrix as a bipartite graph between its rows (the left
//! vertices) and its columns (the right vertices).
use std::fmt;

use num_traits::Zero;

use crate::data::linear_algebra::matrix::Matrix;

/// Bipartite graph with the same number of left and right vertices.
///
/// Left vertex `i` is connected to right vertex `j` iff entry `(i, j)` of the matrix it was built
/// from is nonzero.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BipartiteGraph {
    /// For each left vertex, the adjacent right vertices in increasing order.
    ///
    /// This is the row-major order of the nonzero entries, which determines which of several
    /// maximum matchings is found.
    adjacency: Vec<Vec<usize>>,
    nr_edges: usize,
}

impl BipartiteGraph {
    /// Create a graph with an edge for every nonzero matrix entry.
    pub fn new<T: Copy + Zero>(matrix: &Matrix<T>) -> Self {
        let adjacency = matrix.rows()
            .map(|row| {
                row.iter().enumerate()
                    .filter(|(_, v)| !v.is_zero())
                    .map(|(j, _)| j)
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let nr_edges = adjacency.iter().map(Vec::len).sum();

        Self { adjacency, nr_edges }
    }

    /// Create a graph from explicit adjacency lists.
    ///
    /// # Arguments
    ///
    /// * `adjacency`: For each left vertex, the right vertices it's connected to. All values should
    /// be smaller than `adjacency.len()`.
    pub fn from_adjacency(adjacency: Vec<Vec<usize>>) -> Self {
        debug_assert!(adjacency.iter().flatten().all(|&j| j < adjacency.len()));

        let nr_edges = adjacency.iter().map(Vec::len).sum();
        Self { adjacency, nr_edges }
    }

    /// Number of vertices on each side.
    pub fn nr_vertices(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges.
    pub fn nr_edges(&self) -> usize {
        self.nr_edges
    }

    /// Right vertices adjacent to left vertex `i`.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        debug_assert!(i < self.nr_vertices());

        &self.adjacency[i]
    }

    /// Whether left vertex `i` and right vertex `j` are connected.
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        self.adjacency[i].contains(&j)
    }
}

impl fmt::Display for BipartiteGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bipartite graph")?;
        writeln!(f, "Vertices: {} + {}\tEdges: {}", self.nr_vertices(), self.nr_vertices(), self.nr_edges)?;
        for (i, neighbors) in self.adjacency.iter().enumerate() {
            write!(f, "{} ->", i)?;
            for j in neighbors {
                write!(f, " {}", j)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

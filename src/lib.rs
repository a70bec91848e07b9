//! # Matching markets
//!
//! Algorithms for assigning agents to options based on their preferences:
//!
//! * the Birkhoff-von Neumann decomposition of a matrix with equal row and column sums into
//! permutation matrices, which relies on
//! * maximum bipartite matchings, computed with the Hopcroft-Karp algorithm;
//! * random serial dictatorship, and
//! * pairwise trading of the units that agents accumulate over repeated serial dictatorship rounds.
//!
//! The algorithms that are of interest step by step can be advanced one observable step at a time.
#![warn(missing_docs)]

pub mod algorithm;
pub mod config;
pub mod data;
pub mod error;

#[cfg(test)]
mod tests;

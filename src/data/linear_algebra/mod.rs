//! # Linear algebra primitives
//!
//! Dense square matrices and the permutations that index them.

pub mod matrix;
pub mod permutation;

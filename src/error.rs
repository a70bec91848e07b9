//! # Error reporting
//!
//! All fallible operations of this crate return the `Error` defined here. Infeasible trades and
//! unassigned agents are regular outcomes and are not represented as errors.
use thiserror::Error;

/// Result type alias using this crate's `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building inputs or running the algorithms.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// Two matrices of different sizes were combined.
    #[error("{operation}: size mismatch ({left} vs {right})")]
    SizeMismatch {
        /// Name of the operation that was attempted.
        operation: &'static str,
        /// Size of the left operand.
        left: usize,
        /// Size of the right operand.
        right: usize,
    },

    /// Rows given to build a square matrix don't form a square.
    #[error("row {row} has length {len}, expected {expected}")]
    NotSquare {
        /// Index of the first offending row.
        row: usize,
        /// Its length.
        len: usize,
        /// Number of rows, which every row length should equal.
        expected: usize,
    },

    /// A vector that should be a bijection on `0..len` is not.
    #[error("not a permutation of 0..{len}: value {value} at index {index}")]
    InvalidPermutation {
        /// Length of the vector.
        len: usize,
        /// Index of the first value that is out of range or repeated.
        index: usize,
        /// The value at that index.
        value: usize,
    },

    /// A right vertex is out of range or matched to more than one left vertex.
    #[error("left vertex {index} can't be matched to right vertex {vertex} of {len}")]
    InvalidMatching {
        /// Number of vertices on each side.
        len: usize,
        /// Left vertex of the first offending pair.
        index: usize,
        /// Its right vertex.
        vertex: usize,
    },

    /// Rankings and capacities don't describe the same set of options.
    #[error("ranking of agent {agent} covers {found} options, expected {expected}")]
    OptionCountMismatch {
        /// Agent whose ranking has the wrong length.
        agent: usize,
        /// Number of options in the ranking.
        found: usize,
        /// Number of options in the capacity vector.
        expected: usize,
    },

    /// A matrix to decompose does not have one common row and column sum.
    #[error("line sums are not all equal: {line} sums to {found}, expected {expected}")]
    UnequalLineSums {
        /// Human readable name of the offending row or column.
        line: String,
        /// Its sum.
        found: u64,
        /// The sum of the first row.
        expected: u64,
    },

    /// A row or column sum of a matrix to decompose doesn't fit the element type.
    #[error("{line} sum overflows")]
    LineSumOverflow {
        /// Human readable name of the offending row or column.
        line: String,
    },

    /// The support of the residual matrix admitted no perfect matching.
    #[error("iteration {iteration}: maximum matching has size {size}, expected {expected}")]
    NoPerfectMatching {
        /// Decomposition round in which this happened.
        iteration: usize,
        /// Size of the maximum matching that was found.
        size: usize,
        /// Matrix size.
        expected: usize,
    },
}

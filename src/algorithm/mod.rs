//! # Algorithms
//!
//! Randomized algorithms take their source of randomness as an argument, such that results can be
//! reproduced with a seeded generator.

pub mod birkhoff;
pub mod matching;
pub mod rsd;
pub mod trade;

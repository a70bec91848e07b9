//! # Storing of market data in memory
//!
//! This module provides the data structures that the algorithms operate on. Algorithms may
//! introduce their specific data structures in `algorithm::my_algorithm`.

pub mod linear_algebra;
pub mod market;
pub mod network;

//! # Scenarios that combine several parts of the crate.
//!
//! Each module follows a small market from its preferences to its final allocation.
pub mod trading;

//! # Demonstration settings
//!
//! Parameters of the demonstrations, with defaults. In each serial dictatorship setting, there are
//! as many agents as there is total capacity.
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Decomposing the summed rankings of a group of agents.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BirkhoffConfig {
    /// Size of the matrix.
    pub nr_options: usize,
    /// Number of rankings summed, the row and column sum of the matrix.
    pub nr_agents: usize,
}

impl Default for BirkhoffConfig {
    fn default() -> Self {
        Self { nr_options: 4, nr_agents: 15 }
    }
}

/// A single serial dictatorship round, followed event by event.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SerialDictatorshipConfig {
    /// Capacity of each option.
    pub capacities: Vec<u64>,
}

impl SerialDictatorshipConfig {
    /// One agent per unit of capacity.
    pub fn nr_agents(&self) -> usize {
        total(&self.capacities)
    }
}

impl Default for SerialDictatorshipConfig {
    fn default() -> Self {
        Self { capacities: vec![2, 5, 2, 1, 4] }
    }
}

/// Repeated rounds with fixed preferences, collecting the ranks agents receive.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StatisticsConfig {
    /// Capacity of each option.
    pub capacities: Vec<u64>,
    /// First choices are drawn among this many options.
    pub top_choices: usize,
    #[allow(missing_docs)]
    pub rounds: u64,
}

impl StatisticsConfig {
    /// One agent per unit of capacity.
    pub fn nr_agents(&self) -> usize {
        total(&self.capacities)
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self { capacities: vec![3, 2, 4, 5, 4], top_choices: 2, rounds: 1000 }
    }
}

/// Repeated rounds to accumulate units, followed by pairwise trading.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TradeConfig {
    /// Capacity of each option.
    pub capacities: Vec<u64>,
    /// Number of serial dictatorship rounds before trading starts.
    pub rounds: u64,
}

impl TradeConfig {
    /// One agent per unit of capacity.
    pub fn nr_agents(&self) -> usize {
        total(&self.capacities)
    }
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self { capacities: vec![2, 5, 3, 2, 1], rounds: 1000 }
    }
}

fn total(capacities: &[u64]) -> usize {
    capacities.iter().sum::<u64>() as usize
}

/// Random number generator for the demonstrations.
///
/// Reproducible if a seed is given, seeded from the thread local generator otherwise.
pub fn rng(seed: Option<u64>) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(rand::random))
}

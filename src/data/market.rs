//! # Market participants
//!
//! Agents rank a fixed set of options, numbered `0..nr_options`. Rank `0` is the most preferred
//! option.
use std::fmt;

use rand::Rng;

use crate::data::linear_algebra::permutation::Permutation;
use crate::error::{Error, Result};

/// A strict preference order over all options.
///
/// The forward direction of the underlying permutation maps a rank to an option, the backward
/// direction maps an option to its rank.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Ranking(Permutation);

impl Ranking {
    /// Create a ranking from options listed from most to least preferred.
    ///
    /// # Errors
    ///
    /// `InvalidPermutation` if the options are not exactly `0..order.len()`.
    pub fn new(order: Vec<usize>) -> Result<Self> {
        Permutation::new(order).map(Self)
    }

    /// Draw a ranking uniformly at random.
    pub fn random<R: Rng + ?Sized>(nr_options: usize, rng: &mut R) -> Self {
        Self(Permutation::random(nr_options, rng))
    }

    /// The option at position `rank`.
    pub fn option_at(&self, rank: usize) -> usize {
        self.0.forward(rank)
    }

    /// Position of `option` in this ranking.
    pub fn rank_of(&self, option: usize) -> usize {
        self.0.backward(option)
    }

    /// Whether `a` is strictly preferred over `b`.
    pub fn prefers(&self, a: usize, b: usize) -> bool {
        self.rank_of(a) < self.rank_of(b)
    }

    /// Number of options ranked.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no options.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Options from most to least preferred.
    pub fn options(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// The permutation mapping ranks to options.
    pub fn as_permutation(&self) -> &Permutation {
        &self.0
    }
}

impl From<Permutation> for Ranking {
    fn from(permutation: Permutation) -> Self {
        Self(permutation)
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rank, option) in self.options().iter().enumerate() {
            if rank > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}", option)?;
        }

        Ok(())
    }
}

/// The rankings of a group of agents over the same options.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PreferenceProfile {
    rankings: Vec<Ranking>,
    nr_options: usize,
}

impl PreferenceProfile {
    /// Create a profile from one list of options per agent, each from most to least preferred.
    ///
    /// # Errors
    ///
    /// `InvalidPermutation` if a list is not a ranking, and `OptionCountMismatch` if not all lists
    /// rank the same number of options.
    pub fn new(orders: Vec<Vec<usize>>) -> Result<Self> {
        let rankings = orders.into_iter()
            .map(Ranking::new)
            .collect::<Result<Vec<_>>>()?;

        Self::from_rankings(rankings)
    }

    /// Create a profile from rankings.
    ///
    /// # Errors
    ///
    /// `OptionCountMismatch` if not all rankings rank the same number of options.
    pub fn from_rankings(rankings: Vec<Ranking>) -> Result<Self> {
        let nr_options = rankings.first().map_or(0, Ranking::len);
        if let Some((agent, ranking)) = rankings.iter().enumerate().find(|(_, r)| r.len() != nr_options) {
            return Err(Error::OptionCountMismatch { agent, found: ranking.len(), expected: nr_options });
        }

        Ok(Self { rankings, nr_options })
    }

    /// Draw a ranking uniformly at random for every agent.
    pub fn random<R: Rng + ?Sized>(nr_agents: usize, nr_options: usize, rng: &mut R) -> Self {
        Self::generate(nr_agents, nr_options, nr_options, rng)
    }

    /// Draw rankings whose first choice is one of the first `top_choices` options.
    ///
    /// Rankings are drawn uniformly at random and redrawn until the first choice qualifies. This
    /// concentrates demand on a few popular options. A `top_choices` of zero, or at least
    /// `nr_options`, doesn't constrain anything.
    pub fn generate<R: Rng + ?Sized>(
        nr_agents: usize,
        nr_options: usize,
        top_choices: usize,
        rng: &mut R,
    ) -> Self {
        let constrained = top_choices > 0 && top_choices < nr_options;

        let rankings = (0..nr_agents)
            .map(|_| loop {
                let ranking = Ranking::random(nr_options, rng);
                if !constrained || ranking.option_at(0) < top_choices {
                    break ranking;
                }
            })
            .collect();

        Self { rankings, nr_options }
    }

    /// Number of agents.
    pub fn nr_agents(&self) -> usize {
        self.rankings.len()
    }

    /// Number of options, zero if there are no agents.
    pub fn nr_options(&self) -> usize {
        self.nr_options
    }

    /// The ranking of one agent.
    pub fn ranking(&self, agent: usize) -> &Ranking {
        &self.rankings[agent]
    }

    /// All rankings, indexed by agent.
    pub fn rankings(&self) -> &[Ranking] {
        &self.rankings
    }

    /// Check that a capacity vector describes the options of this profile.
    ///
    /// # Errors
    ///
    /// `OptionCountMismatch` naming the first agent, if the lengths differ.
    pub fn check_capacities(&self, capacities: &[u64]) -> Result<()> {
        if self.rankings.is_empty() || capacities.len() == self.nr_options {
            Ok(())
        } else {
            Err(Error::OptionCountMismatch { agent: 0, found: self.nr_options, expected: capacities.len() })
        }
    }
}

/// Utility of one unit of an option at each rank: `(M - rank)^2` for `M` options.
pub fn utility_weights(nr_options: usize) -> Vec<u64> {
    (0..nr_options)
        .map(|rank| ((nr_options - rank) as u64).pow(2))
        .collect()
}

/// An agent that accumulates units of options over repeated allocation rounds.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Agent {
    id: usize,
    ranking: Ranking,
    /// Number of rounds each option was assigned, indexed by option.
    counts: Vec<u64>,
}

impl Agent {
    /// Create an agent that holds nothing yet.
    pub fn new(id: usize, ranking: Ranking) -> Self {
        let counts = vec![0; ranking.len()];
        Self { id, ranking, counts }
    }

    /// Create an agent with a uniformly random ranking.
    pub fn random<R: Rng + ?Sized>(id: usize, nr_options: usize, rng: &mut R) -> Self {
        Self::new(id, Ranking::random(nr_options, rng))
    }

    /// Create an agent holding given counts.
    ///
    /// # Errors
    ///
    /// `OptionCountMismatch` if there is not exactly one count per ranked option.
    pub fn with_counts(id: usize, ranking: Ranking, counts: Vec<u64>) -> Result<Self> {
        if counts.len() != ranking.len() {
            return Err(Error::OptionCountMismatch { agent: id, found: ranking.len(), expected: counts.len() });
        }

        Ok(Self { id, ranking, counts })
    }

    #[allow(missing_docs)]
    pub fn id(&self) -> usize {
        self.id
    }

    #[allow(missing_docs)]
    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    /// Units held of each option.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Units held of one option.
    pub fn count(&self, option: usize) -> u64 {
        self.counts[option]
    }

    /// Total units held, the number of rounds in which this agent was assigned something.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Rank weighted sum of the units held, see `utility_weights`.
    pub fn utility(&self) -> u64 {
        let weights = utility_weights(self.counts.len());
        self.counts.iter().enumerate()
            .map(|(option, &count)| count * weights[self.ranking.rank_of(option)])
            .sum()
    }

    /// Utility relative to receiving the first choice in each of `rounds` rounds.
    pub fn normalized_utility(&self, rounds: u64) -> f64 {
        let maximum = rounds * (self.counts.len() as u64).pow(2);
        if maximum == 0 {
            0f64
        } else {
            self.utility() as f64 / maximum as f64
        }
    }

    /// Add one unit of `option`.
    pub fn record(&mut self, option: usize) {
        self.counts[option] += 1;
    }

    /// Hand over `quantity` units of `option`.
    pub fn give(&mut self, option: usize, quantity: u64) {
        debug_assert!(self.counts[option] >= quantity);

        self.counts[option] -= quantity;
    }

    /// Receive `quantity` units of `option`.
    pub fn receive(&mut self, option: usize, quantity: u64) {
        self.counts[option] += quantity;
    }
}

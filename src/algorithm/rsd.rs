//! # Random serial dictatorship
//!
//! Agents are put in a uniformly random order. Following that order, each agent takes its most
//! preferred option that still has capacity left. An agent for which no option has capacity left
//! stays unassigned.
//!
//! Single rounds can be followed event by event with `SerialDictatorship`. Repeated rounds build
//! up statistics: per agent either the distribution over the ranks it received
//! (`RankDistribution`), or the number of units of each option (`allocate_rounds`).
use log::{debug, trace};
use rand::Rng;

use crate::data::linear_algebra::permutation::Permutation;
use crate::data::market::{Agent, PreferenceProfile};
use crate::error::{Error, Result};

/// The option an agent received, and its position in that agent's ranking.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Placement {
    #[allow(missing_docs)]
    pub option: usize,
    /// Zero for the first choice.
    pub rank: usize,
}

/// Outcome of one allocation round.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Assignment {
    /// Indexed by agent, `None` for agents that received nothing.
    placements: Vec<Option<Placement>>,
}

impl Assignment {
    /// What an agent received, if anything.
    pub fn placement(&self, agent: usize) -> Option<Placement> {
        self.placements[agent]
    }

    /// All placements, indexed by agent.
    pub fn placements(&self) -> &[Option<Placement>] {
        &self.placements
    }

    /// Number of agents that received an option.
    pub fn nr_assigned(&self) -> usize {
        self.placements.iter().flatten().count()
    }

    /// Number of agents assigned to each option.
    pub fn assigned_per_option(&self, nr_options: usize) -> Vec<u64> {
        let mut assigned = vec![0; nr_options];
        for placement in self.placements.iter().flatten() {
            assigned[placement.option] += 1;
        }

        assigned
    }
}

/// A single observable action of the serial dictatorship.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Event {
    /// The agent looks at the option at position `rank` in its ranking.
    Inspect {
        #[allow(missing_docs)]
        agent: usize,
        #[allow(missing_docs)]
        rank: usize,
        #[allow(missing_docs)]
        option: usize,
        /// Whether the option has capacity left; if so, the next event assigns it.
        available: bool,
    },
    /// The agent takes the option, using up one unit of its capacity.
    Assign {
        #[allow(missing_docs)]
        agent: usize,
        #[allow(missing_docs)]
        placement: Placement,
    },
    /// No option has capacity left for this agent.
    Unassigned {
        #[allow(missing_docs)]
        agent: usize,
    },
}

/// One round of serial dictatorship in a fixed order, advanced one event at a time.
#[derive(Debug, Clone)]
pub struct SerialDictatorship<'a> {
    profile: &'a PreferenceProfile,
    /// Agents in the order in which they choose.
    order: Permutation,
    remaining: Vec<u64>,
    /// Index in `order` of the agent that is choosing.
    position: usize,
    /// Rank that the choosing agent will inspect next.
    rank: usize,
    /// Option found available by the last inspection, not yet assigned.
    pending: Option<Placement>,
    placements: Vec<Option<Placement>>,
}

impl<'a> SerialDictatorship<'a> {
    /// Prepare a round in which agents choose in a given order.
    ///
    /// # Arguments
    ///
    /// * `profile`: Rankings of the agents.
    /// * `capacities`: Number of agents each option can take.
    /// * `order`: Agents in the order in which they choose.
    ///
    /// # Errors
    ///
    /// `OptionCountMismatch` if the capacities don't match the options of the profile, and
    /// `InvalidPermutation` if the order is not an ordering of all agents.
    pub fn new(profile: &'a PreferenceProfile, capacities: &[u64], order: Vec<usize>) -> Result<Self> {
        profile.check_capacities(capacities)?;
        let order = Permutation::new(order)?;
        if order.len() != profile.nr_agents() {
            return Err(Error::InvalidPermutation {
                len: profile.nr_agents(),
                index: order.len().min(profile.nr_agents()),
                value: order.len(),
            });
        }

        Ok(Self {
            profile,
            order,
            remaining: capacities.to_vec(),
            position: 0,
            rank: 0,
            pending: None,
            placements: vec![None; profile.nr_agents()],
        })
    }

    /// Prepare a round with a uniformly random order.
    ///
    /// # Errors
    ///
    /// `OptionCountMismatch` if the capacities don't match the options of the profile.
    pub fn with_random_order<R: Rng + ?Sized>(
        profile: &'a PreferenceProfile,
        capacities: &[u64],
        rng: &mut R,
    ) -> Result<Self> {
        let order = Permutation::random(profile.nr_agents(), rng);
        Self::new(profile, capacities, order.as_slice().to_vec())
    }

    /// Agents in the order in which they choose.
    pub fn order(&self) -> &[usize] {
        self.order.as_slice()
    }

    /// Capacity left of each option.
    pub fn remaining_capacity(&self) -> &[u64] {
        &self.remaining
    }

    /// Whether every agent has had its turn.
    pub fn is_finished(&self) -> bool {
        self.position >= self.order.len()
    }

    /// Execute the next action.
    ///
    /// # Return value
    ///
    /// What happened, or `None` if every agent has had its turn.
    pub fn next_event(&mut self) -> Option<Event> {
        if self.is_finished() {
            return None;
        }
        let agent = self.order.forward(self.position);

        if let Some(placement) = self.pending.take() {
            debug_assert!(self.remaining[placement.option] > 0);
            self.remaining[placement.option] -= 1;
            self.placements[agent] = Some(placement);
            self.next_agent();

            return Some(Event::Assign { agent, placement });
        }

        if self.rank >= self.profile.nr_options() || self.remaining.iter().all(|&c| c == 0) {
            self.next_agent();
            return Some(Event::Unassigned { agent });
        }

        let rank = self.rank;
        let option = self.profile.ranking(agent).option_at(rank);
        let available = self.remaining[option] > 0;
        if available {
            self.pending = Some(Placement { option, rank });
        } else {
            self.rank += 1;
        }

        Some(Event::Inspect { agent, rank, option, available })
    }

    fn next_agent(&mut self) {
        self.position += 1;
        self.rank = 0;
    }

    /// Let all remaining agents choose.
    pub fn finish(mut self) -> Assignment {
        while self.next_event().is_some() {}

        Assignment { placements: self.placements }
    }
}

impl Iterator for SerialDictatorship<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

/// Run one round of random serial dictatorship.
///
/// # Errors
///
/// `OptionCountMismatch` if the capacities don't match the options of the profile.
pub fn rsd_round<R: Rng + ?Sized>(
    profile: &PreferenceProfile,
    capacities: &[u64],
    rng: &mut R,
) -> Result<Assignment> {
    let round = SerialDictatorship::with_random_order(profile, capacities, rng)?;
    trace!("serial order {}", round.order);

    let assignment = round.finish();
    debug!("{} of {} agents assigned", assignment.nr_assigned(), profile.nr_agents());

    Ok(assignment)
}

/// How often each agent received the option at each rank, over repeated rounds.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RankDistribution {
    /// Indexed by agent, then rank.
    counts: Vec<Vec<u64>>,
    unassigned: Vec<u64>,
    rounds: u64,
}

impl RankDistribution {
    /// Empty statistics.
    pub fn new(nr_agents: usize, nr_options: usize) -> Self {
        Self {
            counts: vec![vec![0; nr_options]; nr_agents],
            unassigned: vec![0; nr_agents],
            rounds: 0,
        }
    }

    /// Add the outcome of a round.
    pub fn record(&mut self, assignment: &Assignment) {
        debug_assert_eq!(assignment.placements().len(), self.counts.len());

        for (agent, placement) in assignment.placements().iter().enumerate() {
            match placement {
                Some(placement) => self.counts[agent][placement.rank] += 1,
                None => self.unassigned[agent] += 1,
            }
        }
        self.rounds += 1;
    }

    /// Number of rounds recorded.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Number of rounds in which `agent` received the option at position `rank`.
    pub fn count(&self, agent: usize, rank: usize) -> u64 {
        self.counts[agent][rank]
    }

    /// Number of rounds in which `agent` received nothing.
    pub fn unassigned(&self, agent: usize) -> u64 {
        self.unassigned[agent]
    }

    /// Fraction of the rounds in which `agent` received the option at position `rank`.
    pub fn share(&self, agent: usize, rank: usize) -> f64 {
        if self.rounds == 0 {
            0f64
        } else {
            self.counts[agent][rank] as f64 / self.rounds as f64
        }
    }

    /// Counts per rank of one agent.
    pub fn agent(&self, agent: usize) -> &[u64] {
        &self.counts[agent]
    }
}

/// Repeat rounds with fixed preferences, collecting which ranks agents receive.
///
/// # Errors
///
/// `OptionCountMismatch` if the capacities don't match the options of the profile.
pub fn simulate<R: Rng + ?Sized>(
    profile: &PreferenceProfile,
    capacities: &[u64],
    rounds: u64,
    rng: &mut R,
) -> Result<RankDistribution> {
    let mut distribution = RankDistribution::new(profile.nr_agents(), profile.nr_options());
    for _ in 0..rounds {
        distribution.record(&rsd_round(profile, capacities, rng)?);
    }

    Ok(distribution)
}

/// Repeat rounds over agents, adding the option each agent receives to its counts.
///
/// Agent `i` of the slice chooses as agent `i` of the round.
///
/// # Errors
///
/// `OptionCountMismatch` if the agents rank different numbers of options, or if the capacities
/// don't match.
pub fn allocate_rounds<R: Rng + ?Sized>(
    agents: &mut [Agent],
    capacities: &[u64],
    rounds: u64,
    rng: &mut R,
) -> Result<()> {
    let profile = PreferenceProfile::from_rankings(
        agents.iter().map(|agent| agent.ranking().clone()).collect(),
    )?;

    for _ in 0..rounds {
        let assignment = rsd_round(&profile, capacities, rng)?;
        for (agent, placement) in agents.iter_mut().zip(assignment.placements()) {
            if let Some(placement) = placement {
                agent.record(placement.option);
            }
        }
    }

    Ok(())
}

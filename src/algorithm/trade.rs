//! # Pairwise trading
//!
//! After many rounds of random serial dictatorship, every agent holds a number of units of each
//! option. Two agents can both gain by swapping units: agent `A` gives units of option `i` to `B`
//! in exchange for the same number of units of option `j`, where `A` prefers `j` over `i` and `B`
//! prefers `i` over `j`.
//!
//! The optimizer visits all pairs of agents in passes. For each pair it executes the trade with
//! the largest combined utility gain, if there is any. Passes are repeated until a pass completes
//! without trades. Every trade strictly increases the sum of the utilities, so this terminates;
//! the result is only locally optimal: no single pair can trade anymore.
use std::fmt;

use log::{debug, trace};

use crate::data::market::{Agent, utility_weights};
use crate::error::{Error, Result};

/// A swap of units between two agents.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Trade {
    /// Index of the first agent.
    pub agent_a: usize,
    /// Index of the second agent.
    pub agent_b: usize,
    /// The option that `agent_a` gives to `agent_b`.
    pub give: usize,
    /// The option that `agent_a` receives from `agent_b`.
    pub receive: usize,
    /// Number of units of each of the two options changing hands.
    pub quantity: u64,
    /// Sum of the utility gains of both agents.
    pub gain: u64,
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "agent {} gives {} x option {} to agent {} for option {} (gain {})",
            self.agent_a, self.quantity, self.give, self.agent_b, self.receive, self.gain,
        )
    }
}

/// A trade is reported twice: before and after the counts are updated.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TradeEvent {
    /// The best trade for a pair has been selected; nothing has changed yet.
    Proposed(Trade),
    /// The trade has been executed.
    Applied(Trade),
}

/// All trades between two agents that have a nonzero quantity, in row-major `(give, receive)`
/// order.
///
/// # Arguments
///
/// * `a`, `b`: Agents; they can only trade if they rank the same number of options.
/// * `agent_a`, `agent_b`: Indices to put in the returned trades.
pub fn feasible_trades<'a>(
    (agent_a, a): (usize, &'a Agent),
    (agent_b, b): (usize, &'a Agent),
) -> impl Iterator<Item = Trade> + 'a {
    let nr_options = if a.counts().len() == b.counts().len() { a.counts().len() } else { 0 };
    let weights = utility_weights(nr_options);
    // Quantities are capped such that nobody exceeds the total number of rounds.
    let total = a.total();

    (0..nr_options)
        .flat_map(move |i| (0..nr_options).map(move |j| (i, j)))
        .filter(move |&(i, j)| i != j && a.ranking().prefers(j, i) && b.ranking().prefers(i, j))
        .filter_map(move |(i, j)| {
            let quantity = a.count(i)
                .min(b.count(j))
                .min(total.saturating_sub(a.count(i)))
                .min(total.saturating_sub(b.count(j)));
            if quantity == 0 {
                return None;
            }

            let gain_a = weights[a.ranking().rank_of(j)] - weights[a.ranking().rank_of(i)];
            let gain_b = weights[b.ranking().rank_of(i)] - weights[b.ranking().rank_of(j)];

            Some(Trade { agent_a, agent_b, give: i, receive: j, quantity, gain: quantity * (gain_a + gain_b) })
        })
}

/// The feasible trade with the largest gain; the first one found in case of ties.
pub fn best_trade(a: (usize, &Agent), b: (usize, &Agent)) -> Option<Trade> {
    feasible_trades(a, b).fold(None, |best, trade| match best {
        Some(best) if best.gain >= trade.gain => Some(best),
        _ => Some(trade),
    })
}

/// Resumable pairwise trade optimization.
///
/// Each executed trade produces two events, `Proposed` and `Applied`, such that the agents can be
/// observed in between.
#[derive(Debug, Clone)]
pub struct TradeOptimizer {
    agents: Vec<Agent>,
    /// The pair `(a, b)`, `a < b`, to be considered next.
    a: usize,
    b: usize,
    pass: usize,
    trades_in_pass: usize,
    trades: Vec<Trade>,
    pending: Option<Trade>,
    finished: bool,
}

impl TradeOptimizer {
    /// Prepare to optimize over the given agents.
    ///
    /// # Errors
    ///
    /// `OptionCountMismatch` if not all agents rank the same number of options.
    pub fn new(agents: Vec<Agent>) -> Result<Self> {
        check_option_counts(&agents)?;

        Ok(Self {
            agents,
            a: 0,
            b: 1,
            pass: 0,
            trades_in_pass: 0,
            trades: Vec::new(),
            pending: None,
            finished: false,
        })
    }

    /// The agents in their current state.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Give back the agents.
    pub fn into_agents(self) -> Vec<Agent> {
        self.agents
    }

    /// Number of the current pass over all pairs, starting at zero.
    pub fn pass(&self) -> usize {
        self.pass
    }

    /// Trades applied so far.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Whether a pass completed without trades.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance to the next observable point.
    ///
    /// # Return value
    ///
    /// The next event, or `None` if no pair of agents can trade anymore.
    pub fn next_event(&mut self) -> Option<TradeEvent> {
        if self.finished {
            return None;
        }

        if let Some(trade) = self.pending.take() {
            self.apply(trade);
            self.next_pair();

            return Some(TradeEvent::Applied(trade));
        }

        loop {
            if self.a + 1 >= self.agents.len() {
                if self.trades_in_pass == 0 {
                    debug!("no trades in pass {}, {} trades in total", self.pass, self.trades.len());
                    self.finished = true;
                    return None;
                }

                debug!("pass {}: {} trades", self.pass, self.trades_in_pass);
                self.pass += 1;
                self.trades_in_pass = 0;
                self.a = 0;
                self.b = 1;
                continue;
            }

            let candidate = best_trade((self.a, &self.agents[self.a]), (self.b, &self.agents[self.b]));
            match candidate {
                Some(trade) => {
                    trace!("proposing {}", trade);
                    self.pending = Some(trade);
                    return Some(TradeEvent::Proposed(trade));
                },
                None => self.next_pair(),
            }
        }
    }

    fn apply(&mut self, trade: Trade) {
        let Trade { agent_a, agent_b, give, receive, quantity, .. } = trade;

        self.agents[agent_a].give(give, quantity);
        self.agents[agent_b].receive(give, quantity);
        self.agents[agent_b].give(receive, quantity);
        self.agents[agent_a].receive(receive, quantity);

        debug!("applied {}", trade);
        self.trades.push(trade);
        self.trades_in_pass += 1;
    }

    fn next_pair(&mut self) {
        self.b += 1;
        if self.b >= self.agents.len() {
            self.a += 1;
            self.b = self.a + 1;
        }
    }

    /// Execute all remaining trades.
    ///
    /// # Return value
    ///
    /// All trades applied by this optimizer, in order.
    pub fn run(&mut self) -> &[Trade] {
        while self.next_event().is_some() {}

        &self.trades
    }
}

impl Iterator for TradeOptimizer {
    type Item = TradeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

fn check_option_counts(agents: &[Agent]) -> Result<()> {
    let nr_options = agents.first().map_or(0, |agent| agent.counts().len());
    match agents.iter().enumerate().find(|(_, agent)| agent.counts().len() != nr_options) {
        Some((index, agent)) => Err(Error::OptionCountMismatch {
            agent: index,
            found: agent.counts().len(),
            expected: nr_options,
        }),
        None => Ok(()),
    }
}

/// Trade until no pair of agents can trade anymore.
///
/// # Return value
///
/// The executed trades, in order. Agents are referred to by their index in the slice.
///
/// # Errors
///
/// `OptionCountMismatch` if not all agents rank the same number of options, in which case the
/// agents are left unchanged.
pub fn optimize_trades(agents: &mut [Agent]) -> Result<Vec<Trade>> {
    let mut optimizer = TradeOptimizer::new(agents.to_vec())?;
    let trades = optimizer.run().to_vec();
    agents.clone_from_slice(optimizer.agents());

    Ok(trades)
}

//! Units accumulated over many rounds, then traded until no pair gains anymore.
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::algorithm::rsd::allocate_rounds;
use crate::algorithm::trade::{feasible_trades, optimize_trades, TradeEvent, TradeOptimizer};
use crate::config::TradeConfig;
use crate::data::market::Agent;

fn allocated(config: &TradeConfig, seed: u64) -> Vec<Agent> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut agents = (0..config.nr_agents())
        .map(|id| Agent::random(id, config.capacities.len(), &mut rng))
        .collect::<Vec<_>>();
    allocate_rounds(&mut agents, &config.capacities, config.rounds, &mut rng).unwrap();

    agents
}

fn option_totals(agents: &[Agent], nr_options: usize) -> Vec<u64> {
    (0..nr_options)
        .map(|option| agents.iter().map(|agent| agent.count(option)).sum())
        .collect()
}

#[test]
fn nobody_loses() {
    let config = TradeConfig { rounds: 200, ..TradeConfig::default() };
    let mut agents = allocated(&config, 11);
    let before = agents.clone();

    let trades = optimize_trades(&mut agents).unwrap();
    assert!(trades.iter().all(|trade| trade.quantity > 0 && trade.gain > 0));

    let nr_options = config.capacities.len();
    assert_eq!(option_totals(&agents, nr_options), option_totals(&before, nr_options));
    for (after, before) in agents.iter().zip(&before) {
        assert_eq!(after.id(), before.id());
        assert_eq!(after.total(), config.rounds);
        assert!(after.utility() >= before.utility());
    }

    let gained = agents.iter().map(Agent::utility).sum::<u64>()
        - before.iter().map(Agent::utility).sum::<u64>();
    assert_eq!(gained, trades.iter().map(|trade| trade.gain).sum::<u64>());

    for a in 0..agents.len() {
        for b in (a + 1)..agents.len() {
            assert_eq!(feasible_trades((a, &agents[a]), (b, &agents[b])).count(), 0);
        }
    }
}

#[test]
fn events_come_in_pairs() {
    let config = TradeConfig { rounds: 50, ..TradeConfig::default() };
    let agents = allocated(&config, 12);

    let events = TradeOptimizer::new(agents).unwrap().collect::<Vec<_>>();
    assert_eq!(events.len() % 2, 0);
    for pair in events.chunks(2) {
        match pair {
            [TradeEvent::Proposed(proposed), TradeEvent::Applied(applied)] => assert_eq!(proposed, applied),
            _ => panic!("unexpected events {:?}", pair),
        }
    }
}

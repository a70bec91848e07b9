//! # Properties
//!
//! Invariants of the algorithms, checked on generated inputs through the public interface only.
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use matching_markets::algorithm::birkhoff::{decompose, random_demand};
use matching_markets::algorithm::matching::maximum_matching;
use matching_markets::algorithm::rsd::{allocate_rounds, rsd_round};
use matching_markets::algorithm::trade::{feasible_trades, optimize_trades};
use matching_markets::data::linear_algebra::matrix::Matrix;
use matching_markets::data::linear_algebra::permutation::Permutation;
use matching_markets::data::market::{Agent, PreferenceProfile};

/// Size of a maximum matching by trying every assignment of the remaining rows.
fn brute_force_matching(adjacency: &[Vec<bool>], row: usize, used: &mut Vec<bool>) -> usize {
    if row == adjacency.len() {
        return 0;
    }

    let mut best = brute_force_matching(adjacency, row + 1, used);
    for column in 0..adjacency.len() {
        if adjacency[row][column] && !used[column] {
            used[column] = true;
            best = best.max(1 + brute_force_matching(adjacency, row + 1, used));
            used[column] = false;
        }
    }

    best
}

fn adjacency() -> impl Strategy<Value = Vec<Vec<bool>>> {
    (1usize..=6).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(any::<bool>(), n), n))
}

proptest! {
    #[test]
    fn decomposition_reconstructs(n in 1usize..=5, d in 0usize..12, seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let demand = random_demand(n, d, &mut rng);

        let decomposition = decompose(demand.clone()).unwrap();
        prop_assert_eq!(decomposition.reconstruct(), demand);
        prop_assert_eq!(decomposition.terms().iter().map(|term| term.multiplier).sum::<u64>(), d as u64);
        prop_assert!(decomposition.terms().iter().all(|term| term.multiplier > 0));
    }

    #[test]
    fn matching_is_maximum(adjacency in adjacency()) {
        let n = adjacency.len();
        let matrix = Matrix::from_rows(
            adjacency.iter().map(|row| row.iter().map(|&edge| u8::from(edge)).collect()).collect(),
        ).unwrap();

        let matching = maximum_matching(&matrix);
        prop_assert_eq!(matching.size(), brute_force_matching(&adjacency, 0, &mut vec![false; n]));

        let mut used = vec![false; n];
        for (i, j) in matching.pairs() {
            prop_assert!(adjacency[i][j]);
            prop_assert!(!used[j]);
            used[j] = true;
        }
    }

    #[test]
    fn permutation_matrix_round_trip(n in 1usize..=8, seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let permutation = Permutation::random(n, &mut rng);
        let matrix = Matrix::<u64>::from_permutation(&permutation);

        let read_back = (0..n).map(|i| matrix.row_argmax(i).unwrap()).collect::<Vec<_>>();
        prop_assert_eq!(read_back.as_slice(), permutation.as_slice());
        prop_assert_eq!(maximum_matching(&matrix).to_permutation(), Some(permutation));
    }

    #[test]
    fn serial_dictatorship_respects_capacities(
        nr_agents in 0usize..10,
        capacities in prop::collection::vec(0u64..3, 1..5),
        seed in any::<u64>(),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let profile = PreferenceProfile::random(nr_agents, capacities.len(), &mut rng);
        let assignment = rsd_round(&profile, &capacities, &mut rng).unwrap();

        let assigned = assignment.assigned_per_option(capacities.len());
        prop_assert!(assigned.iter().zip(&capacities).all(|(a, c)| a <= c));
        let total = capacities.iter().sum::<u64>() as usize;
        prop_assert_eq!(assignment.nr_assigned(), nr_agents.min(total));

        for (agent, placement) in assignment.placements().iter().enumerate() {
            if let Some(placement) = placement {
                prop_assert_eq!(profile.ranking(agent).option_at(placement.rank), placement.option);
            }
        }
    }

    #[test]
    fn trading_conserves_and_terminates(
        nr_agents in 2usize..6,
        capacities in prop::collection::vec(0u64..3, 2..5),
        rounds in 0u64..30,
        seed in any::<u64>(),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let nr_options = capacities.len();
        let mut agents = (0..nr_agents)
            .map(|id| Agent::random(id, nr_options, &mut rng))
            .collect::<Vec<_>>();
        allocate_rounds(&mut agents, &capacities, rounds, &mut rng).unwrap();
        let before = agents.clone();

        optimize_trades(&mut agents).unwrap();

        for option in 0..nr_options {
            prop_assert_eq!(
                agents.iter().map(|agent| agent.count(option)).sum::<u64>(),
                before.iter().map(|agent| agent.count(option)).sum::<u64>(),
            );
        }
        for (after, before) in agents.iter().zip(&before) {
            prop_assert_eq!(after.total(), before.total());
            prop_assert!(after.utility() >= before.utility());
        }
        for a in 0..nr_agents {
            for b in (a + 1)..nr_agents {
                prop_assert_eq!(feasible_trades((a, &agents[a]), (b, &agents[b])).count(), 0);
            }
        }
    }
}

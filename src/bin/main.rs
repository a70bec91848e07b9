use std::process::exit;

use clap::{Parser, Subcommand};
use enum_map::{enum_map, EnumMap};

use matching_markets::algorithm::birkhoff::{Decomposer, Phase, random_demand, Step};
use matching_markets::algorithm::rsd::{allocate_rounds, Event, SerialDictatorship, simulate};
use matching_markets::algorithm::trade::{TradeEvent, TradeOptimizer};
use matching_markets::config::{self, BirkhoffConfig, SerialDictatorshipConfig, StatisticsConfig, TradeConfig};
use matching_markets::data::market::{Agent, PreferenceProfile};
use matching_markets::error::Result;

/// Step through matching market algorithms.
#[derive(Parser)]
#[command(version, author = "Bram van den Heuvel <bram@vandenheuvel.online>")]
struct Opts {
    /// Seed for the random number generator
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand)]
enum Demo {
    /// Decompose the summed rankings of a group of agents into permutation matrices
    Birkhoff {
        #[arg(long, default_value_t = BirkhoffConfig::default().nr_options)]
        options: usize,
        #[arg(long, default_value_t = BirkhoffConfig::default().nr_agents)]
        agents: usize,
    },
    /// Follow a single serial dictatorship round
    Rsd {
        /// Capacity of each option, one agent is created per unit
        #[arg(long, value_delimiter = ',', default_values_t = SerialDictatorshipConfig::default().capacities)]
        capacities: Vec<u64>,
    },
    /// Collect the ranks agents receive over many rounds
    Statistics {
        #[arg(long, value_delimiter = ',', default_values_t = StatisticsConfig::default().capacities)]
        capacities: Vec<u64>,
        /// First choices are drawn among this many options
        #[arg(long, default_value_t = StatisticsConfig::default().top_choices)]
        top_choices: usize,
        #[arg(long, default_value_t = StatisticsConfig::default().rounds)]
        rounds: u64,
    },
    /// Accumulate units over many rounds, then trade pairwise
    Trade {
        #[arg(long, value_delimiter = ',', default_values_t = TradeConfig::default().capacities)]
        capacities: Vec<u64>,
        #[arg(long, default_value_t = TradeConfig::default().rounds)]
        rounds: u64,
    },
}

fn main() {
    env_logger::init();
    let opts: Opts = Opts::parse();

    let result = match opts.demo {
        Demo::Birkhoff { options, agents } => {
            birkhoff(&BirkhoffConfig { nr_options: options, nr_agents: agents }, opts.seed)
        },
        Demo::Rsd { capacities } => {
            serial_dictatorship(&SerialDictatorshipConfig { capacities }, opts.seed)
        },
        Demo::Statistics { capacities, top_choices, rounds } => {
            statistics(&StatisticsConfig { capacities, top_choices, rounds }, opts.seed)
        },
        Demo::Trade { capacities, rounds } => {
            trade(&TradeConfig { capacities, rounds }, opts.seed)
        },
    };

    if let Err(error) = result {
        eprintln!("{}", error);
        exit(1);
    }
}

fn birkhoff(config: &BirkhoffConfig, seed: Option<u64>) -> Result<()> {
    let titles: EnumMap<Phase, &str> = enum_map! {
        Phase::CheckResidual     => "Check whether anything is left",
        Phase::Positivity        => "Calculate positivity matrix",
        Phase::BipartiteGraph    => "Convert to a bipartite graph",
        Phase::MaximumMatching   => "Find a maximum matching",
        Phase::PermutationMatrix => "Convert the matching to a matrix",
        Phase::Multiplier        => "Determine multiplier and emit result",
        Phase::Subtract          => "Prepare for next step",
    };

    let mut rng = config::rng(seed);
    let demand = random_demand(config.nr_options, config.nr_agents, &mut rng);
    println!("Demand of {} agents over {} options:\n{}", config.nr_agents, config.nr_options, demand);

    let mut decomposer = Decomposer::new(demand)?;
    loop {
        let iteration = decomposer.iteration();
        let Some(step) = decomposer.next_step()? else { break };

        println!("Iteration #{}: {}", iteration, titles[step.phase()]);
        match step {
            Step::CheckResidual { residual, is_zero } => if is_zero {
                println!("Nothing left.");
            } else {
                print!("{}", residual);
            },
            Step::Positivity { support } => print!("{}", support),
            Step::BipartiteGraph { graph } => print!("{}", graph),
            Step::MaximumMatching { matching } => println!("{}", matching),
            Step::PermutationMatrix { matrix, .. } => print!("{}", matrix),
            Step::Multiplier { multiplier, .. } => println!("Multiplier: {}", multiplier),
            Step::Subtract { term, residual } => println!("Emitted {}, residual:\n{}", term, residual),
        }
    }

    println!("Decomposition:");
    for term in decomposer.terms() {
        println!("\t{}", term);
    }

    Ok(())
}

fn serial_dictatorship(config: &SerialDictatorshipConfig, seed: Option<u64>) -> Result<()> {
    let mut rng = config::rng(seed);
    let profile = PreferenceProfile::random(config.nr_agents(), config.capacities.len(), &mut rng);
    for (agent, ranking) in profile.rankings().iter().enumerate() {
        println!("Agent {}:\t{}", agent, ranking);
    }

    let mut round = SerialDictatorship::with_random_order(&profile, &config.capacities, &mut rng)?;
    println!("Serial order: {:?}", round.order());
    while let Some(event) = round.next_event() {
        match event {
            Event::Inspect { agent, rank, option, available } => println!(
                "Agent {} considers choice #{}, option {}: {}",
                agent, rank + 1, option, if available { "available" } else { "taken" },
            ),
            Event::Assign { agent, placement } => println!(
                "Agent {} takes option {}, remaining capacity {:?}",
                agent, placement.option, round.remaining_capacity(),
            ),
            Event::Unassigned { agent } => println!("Agent {} gets nothing", agent),
        }
    }

    Ok(())
}

fn statistics(config: &StatisticsConfig, seed: Option<u64>) -> Result<()> {
    let mut rng = config::rng(seed);
    let profile = PreferenceProfile::generate(
        config.nr_agents(), config.capacities.len(), config.top_choices, &mut rng,
    );
    let distribution = simulate(&profile, &config.capacities, config.rounds, &mut rng)?;

    println!("Rounds: {}", distribution.rounds());
    for (agent, ranking) in profile.rankings().iter().enumerate() {
        let shares = (0..profile.nr_options())
            .map(|rank| format!("{:.3}", distribution.share(agent, rank)))
            .collect::<Vec<_>>();
        println!("Agent {}:\t{}\t[{}]", agent, ranking, shares.join(", "));
    }

    Ok(())
}

fn trade(config: &TradeConfig, seed: Option<u64>) -> Result<()> {
    let mut rng = config::rng(seed);
    let nr_options = config.capacities.len();
    let mut agents = (0..config.nr_agents())
        .map(|id| Agent::random(id, nr_options, &mut rng))
        .collect::<Vec<_>>();
    allocate_rounds(&mut agents, &config.capacities, config.rounds, &mut rng)?;

    let report = |agents: &[Agent]| {
        for agent in agents {
            println!(
                "Agent {}:\t{}\tcounts {:?}\tutility {:.3}",
                agent.id(), agent.ranking(), agent.counts(), agent.normalized_utility(config.rounds),
            );
        }
    };

    println!("After {} rounds:", config.rounds);
    report(&agents);

    let mut optimizer = TradeOptimizer::new(agents)?;
    while let Some(event) = optimizer.next_event() {
        match event {
            TradeEvent::Proposed(trade) => println!("Pass {}: proposing {}", optimizer.pass(), trade),
            TradeEvent::Applied(_) => {},
        }
    }

    println!("After {} trades:", optimizer.trades().len());
    report(optimizer.agents());

    Ok(())
}

//! # Birkhoff-von Neumann decomposition
//!
//! A nonnegative integer matrix of which all row and column sums are equal to the same constant
//! `D` is a sum of `D` permutation matrices. This module extracts such a sum, grouping equal
//! permutation matrices by a multiplier.
//!
//! Each round takes a perfect matching in the support of the residual matrix (one exists by
//! Hall's theorem as long as the residual is nonzero), and subtracts the corresponding permutation
//! matrix as often as the smallest matched entry allows. The total of the residual drops by
//! `multiplier * n` every round, so there are at most `D` rounds.
//!
//! The rounds are exposed as a sequence of small steps, such that a caller can observe all
//! intermediate values.
use std::fmt;
use std::mem;

use enum_map::Enum;
use itertools::repeat_n;
use log::debug;
use rand::Rng;

use crate::algorithm::matching::Matching;
use crate::data::linear_algebra::matrix::Matrix;
use crate::data::linear_algebra::permutation::Permutation;
use crate::data::network::BipartiteGraph;
use crate::error::{Error, Result};

/// One permutation matrix of the decomposition and the number of times it's used.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Term {
    /// Strictly positive.
    pub multiplier: u64,
    /// Row `i` of the permutation matrix has its one in column `permutation.forward(i)`.
    pub permutation: Permutation,
}

impl Term {
    /// The permutation matrix multiplied by the multiplier.
    pub fn to_matrix(&self) -> Matrix<u64> {
        Matrix::from_permutation(&self.permutation).scale(self.multiplier)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.multiplier, self.permutation)
    }
}

/// The phases of a single decomposition round, in order.
#[derive(Enum, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    /// Test whether anything is left to decompose.
    CheckResidual,
    /// Compute the 0/1 pattern of the residual.
    Positivity,
    /// Read that pattern as a bipartite graph.
    BipartiteGraph,
    /// Find a maximum, and necessarily perfect, matching.
    MaximumMatching,
    /// Convert the matching to a permutation matrix.
    PermutationMatrix,
    /// Determine how often the permutation matrix can be subtracted.
    Multiplier,
    /// Emit the term and subtract it from the residual.
    Subtract,
}

/// Observation produced by advancing a `Decomposer` by one phase.
#[allow(missing_docs)]
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Step {
    CheckResidual { residual: Matrix<u64>, is_zero: bool },
    Positivity { support: Matrix<u64> },
    BipartiteGraph { graph: BipartiteGraph },
    MaximumMatching { matching: Matching },
    PermutationMatrix { permutation: Permutation, matrix: Matrix<u64> },
    /// `product` is the residual multiplied elementwise with the permutation matrix.
    Multiplier { product: Matrix<u64>, multiplier: u64 },
    Subtract { term: Term, residual: Matrix<u64> },
}

impl Step {
    /// The phase that produced this observation.
    pub fn phase(&self) -> Phase {
        match self {
            Step::CheckResidual { .. } => Phase::CheckResidual,
            Step::Positivity { .. } => Phase::Positivity,
            Step::BipartiteGraph { .. } => Phase::BipartiteGraph,
            Step::MaximumMatching { .. } => Phase::MaximumMatching,
            Step::PermutationMatrix { .. } => Phase::PermutationMatrix,
            Step::Multiplier { .. } => Phase::Multiplier,
            Step::Subtract { .. } => Phase::Subtract,
        }
    }
}

/// What the decomposer will do when advanced, with the values computed by the previous phase.
#[derive(Debug)]
enum State {
    CheckResidual,
    Positivity,
    BipartiteGraph { support: Matrix<u64> },
    MaximumMatching { graph: BipartiteGraph },
    PermutationMatrix { matching: Matching },
    Multiplier { permutation: Permutation, matrix: Matrix<u64> },
    Subtract { term: Term, matrix: Matrix<u64> },
    Finished,
    Failed,
}

/// Resumable Birkhoff-von Neumann decomposition.
///
/// Advance it with `next_step` or use it as an iterator.
#[derive(Debug)]
pub struct Decomposer {
    residual: Matrix<u64>,
    line_sum: u64,
    iteration: usize,
    state: State,
    terms: Vec<Term>,
}

impl Decomposer {
    /// Prepare the decomposition of a matrix.
    ///
    /// # Arguments
    ///
    /// * `matrix`: Square matrix whose row and column sums are all equal.
    ///
    /// # Errors
    ///
    /// `UnequalLineSums` if some row or column sum differs from the sum of the first row, and
    /// `LineSumOverflow` if a row or column sum doesn't fit in a `u64`.
    pub fn new(matrix: Matrix<u64>) -> Result<Self> {
        let rows = matrix.checked_row_sums().into_iter()
            .enumerate()
            .map(|(i, sum)| (format!("row {}", i), sum));
        let columns = matrix.checked_column_sums().into_iter()
            .enumerate()
            .map(|(j, sum)| (format!("column {}", j), sum));
        let sums = rows.chain(columns)
            .map(|(line, sum)| match sum {
                Some(sum) => Ok((line, sum)),
                None => Err(Error::LineSumOverflow { line }),
            })
            .collect::<Result<Vec<_>>>()?;

        let line_sum = sums.first().map_or(0, |&(_, sum)| sum);
        if let Some((line, found)) = sums.into_iter().find(|&(_, sum)| sum != line_sum) {
            return Err(Error::UnequalLineSums { line, found, expected: line_sum });
        }

        Ok(Self {
            residual: matrix,
            line_sum,
            iteration: 0,
            state: State::CheckResidual,
            terms: Vec::new(),
        })
    }

    /// Number of completed rounds.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// The common row and column sum of the input matrix.
    pub fn line_sum(&self) -> u64 {
        self.line_sum
    }

    /// What is left to decompose.
    pub fn residual(&self) -> &Matrix<u64> {
        &self.residual
    }

    /// Terms emitted so far.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// The phase that the next call to `next_step` executes, `None` when done.
    pub fn next_phase(&self) -> Option<Phase> {
        match self.state {
            State::CheckResidual => Some(Phase::CheckResidual),
            State::Positivity => Some(Phase::Positivity),
            State::BipartiteGraph { .. } => Some(Phase::BipartiteGraph),
            State::MaximumMatching { .. } => Some(Phase::MaximumMatching),
            State::PermutationMatrix { .. } => Some(Phase::PermutationMatrix),
            State::Multiplier { .. } => Some(Phase::Multiplier),
            State::Subtract { .. } => Some(Phase::Subtract),
            State::Finished | State::Failed => None,
        }
    }

    /// Whether the residual has been found to be zero.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    /// Execute one phase.
    ///
    /// # Return value
    ///
    /// An observation of the values computed in the phase, or `None` if the decomposition is
    /// complete.
    ///
    /// # Errors
    ///
    /// `NoPerfectMatching` if the support of the residual has no perfect matching. The decomposer
    /// doesn't make progress after that and returns `None` from then on.
    pub fn next_step(&mut self) -> Result<Option<Step>> {
        let step = match mem::replace(&mut self.state, State::Failed) {
            State::CheckResidual => {
                let is_zero = self.residual.is_zero();
                self.state = if is_zero { State::Finished } else { State::Positivity };
                Step::CheckResidual { residual: self.residual.clone(), is_zero }
            },
            State::Positivity => {
                let support = self.residual.positivity();
                self.state = State::BipartiteGraph { support: support.clone() };
                Step::Positivity { support }
            },
            State::BipartiteGraph { support } => {
                let graph = BipartiteGraph::new(&support);
                self.state = State::MaximumMatching { graph: graph.clone() };
                Step::BipartiteGraph { graph }
            },
            State::MaximumMatching { graph } => {
                let matching = graph.maximum_matching();
                if !matching.is_perfect() {
                    return Err(self.no_perfect_matching(&matching));
                }
                self.state = State::PermutationMatrix { matching: matching.clone() };
                Step::MaximumMatching { matching }
            },
            State::PermutationMatrix { matching } => {
                let permutation = matching.to_permutation()
                    .ok_or_else(|| self.no_perfect_matching(&matching))?;
                let matrix = Matrix::from_permutation(&permutation);
                self.state = State::Multiplier { permutation: permutation.clone(), matrix: matrix.clone() };
                Step::PermutationMatrix { permutation, matrix }
            },
            State::Multiplier { permutation, matrix } => {
                let product = self.residual.hadamard(&matrix)?;
                let multiplier = (0..permutation.len())
                    .map(|i| product.get(i, permutation.forward(i)))
                    .fold(u64::MAX, u64::min);
                debug_assert!(multiplier >= 1 && multiplier < u64::MAX);

                self.state = State::Subtract { term: Term { multiplier, permutation }, matrix };
                Step::Multiplier { product, multiplier }
            },
            State::Subtract { term, matrix } => {
                self.residual.subtract_assign_checked(&matrix.scale(term.multiplier))?;
                debug!("iteration {}: emitted {}", self.iteration, term);

                self.terms.push(term.clone());
                self.iteration += 1;
                self.state = State::CheckResidual;
                Step::Subtract { term, residual: self.residual.clone() }
            },
            State::Finished => {
                self.state = State::Finished;
                return Ok(None);
            },
            State::Failed => return Ok(None),
        };

        Ok(Some(step))
    }

    fn no_perfect_matching(&self, matching: &Matching) -> Error {
        Error::NoPerfectMatching {
            iteration: self.iteration,
            size: matching.size(),
            expected: self.residual.size(),
        }
    }

    /// Run all remaining phases.
    ///
    /// # Errors
    ///
    /// See `next_step`.
    pub fn run(mut self) -> Result<Decomposition> {
        while self.next_step()?.is_some() {}

        Ok(Decomposition {
            size: self.residual.size(),
            line_sum: self.line_sum,
            terms: self.terms,
        })
    }
}

impl Iterator for Decomposer {
    type Item = Result<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_step().transpose()
    }
}

/// Decompose a matrix with equal row and column sums into a weighted sum of permutation matrices.
///
/// # Errors
///
/// `UnequalLineSums` if the row and column sums are not all equal.
pub fn decompose(matrix: Matrix<u64>) -> Result<Decomposition> {
    Decomposer::new(matrix)?.run()
}

/// A completed decomposition.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Decomposition {
    size: usize,
    line_sum: u64,
    terms: Vec<Term>,
}

impl Decomposition {
    /// The terms, in the order in which they were extracted.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// The common row and column sum of the decomposed matrix, equal to the sum of the
    /// multipliers.
    pub fn line_sum(&self) -> u64 {
        self.line_sum
    }

    /// Sum the terms back into a matrix.
    pub fn reconstruct(&self) -> Matrix<u64> {
        let mut total = Matrix::zeros(self.size);
        for term in &self.terms {
            total.map_in_place(|i, j, v| if term.permutation.forward(i) == j { v + term.multiplier } else { v });
        }

        total
    }

    /// Convex weights of the permutations, which sum to one.
    ///
    /// These are the weights of the decomposition of the matrix divided by its line sum, which is
    /// doubly stochastic.
    pub fn weights(&self) -> impl Iterator<Item = (f64, &Permutation)> + '_ {
        self.terms.iter()
            .map(move |term| (term.multiplier as f64 / self.line_sum as f64, &term.permutation))
    }

    /// Every permutation repeated as often as its multiplier.
    ///
    /// If the matrix was built by summing the permutation matrices of the rankings of a group of
    /// agents, this is a group of rankings leading to the same matrix.
    pub fn rankings(&self) -> impl Iterator<Item = &Permutation> + '_ {
        self.terms.iter()
            .flat_map(|term| repeat_n(&term.permutation, term.multiplier as usize))
    }
}

/// Sum the permutation matrices of uniformly random rankings.
///
/// # Arguments
///
/// * `nr_options`: Size of the matrix.
/// * `nr_agents`: Number of rankings, which becomes the row and column sum.
/// * `rng`: Source of randomness.
pub fn random_demand<R: Rng + ?Sized>(nr_options: usize, nr_agents: usize, rng: &mut R) -> Matrix<u64> {
    let mut demand = Matrix::zeros(nr_options);
    for _ in 0..nr_agents {
        let ranking = Permutation::random(nr_options, rng);
        demand.map_in_place(|i, j, v| if ranking.forward(i) == j { v + 1 } else { v });
    }

    demand
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::algorithm::birkhoff::{decompose, Decomposer, Phase, random_demand, Step, Term};
    use crate::data::linear_algebra::matrix::Matrix;
    use crate::data::linear_algebra::permutation::Permutation;
    use crate::error::Error;

    fn m(rows: Vec<Vec<u64>>) -> Matrix<u64> {
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn two_by_two() {
        let decomposition = decompose(m(vec![vec![2, 1], vec![1, 2]])).unwrap();

        assert_eq!(decomposition.terms(), &[
            Term { multiplier: 2, permutation: Permutation::identity(2) },
            Term { multiplier: 1, permutation: Permutation::new(vec![1, 0]).unwrap() },
        ]);
        assert_eq!(decomposition.reconstruct(), m(vec![vec![2, 1], vec![1, 2]]));
        assert_eq!(decomposition.line_sum(), 3);
        assert_eq!(decomposition.rankings().count(), 3);
    }

    #[test]
    fn line_sum_overflow() {
        assert_eq!(
            decompose(m(vec![vec![u64::MAX, 1], vec![1, u64::MAX]])).err(),
            Some(Error::LineSumOverflow { line: "row 0".to_string() }),
        );
        assert_eq!(
            decompose(m(vec![vec![u64::MAX, 0], vec![1, 0]])).err(),
            Some(Error::LineSumOverflow { line: "column 0".to_string() }),
        );
    }

    #[test]
    fn zero_matrix() {
        let decomposition = decompose(Matrix::zeros(3)).unwrap();
        assert!(decomposition.terms().is_empty());
        assert_eq!(decomposition.reconstruct(), Matrix::zeros(3));

        let decomposition = decompose(Matrix::zeros(0)).unwrap();
        assert!(decomposition.terms().is_empty());
    }

    #[test]
    fn unequal_line_sums() {
        assert_eq!(
            Decomposer::new(m(vec![vec![1, 1], vec![0, 1]])).err(),
            Some(Error::UnequalLineSums { line: "row 1".to_string(), found: 1, expected: 2 }),
        );
        assert_eq!(
            Decomposer::new(m(vec![vec![2, 0], vec![2, 0]])).err(),
            Some(Error::UnequalLineSums { line: "column 0".to_string(), found: 4, expected: 2 }),
        );
    }

    #[test]
    fn phases_in_order() {
        let mut decomposer = Decomposer::new(m(vec![vec![1, 0], vec![0, 1]])).unwrap();
        let phases = decomposer.by_ref()
            .map(|step| step.unwrap().phase())
            .collect::<Vec<_>>();

        assert_eq!(phases, vec![
            Phase::CheckResidual,
            Phase::Positivity,
            Phase::BipartiteGraph,
            Phase::MaximumMatching,
            Phase::PermutationMatrix,
            Phase::Multiplier,
            Phase::Subtract,
            Phase::CheckResidual,
        ]);
        assert!(decomposer.is_finished());
        assert_eq!(decomposer.iteration(), 1);
        assert_eq!(decomposer.next_phase(), None);
        assert!(decomposer.next_step().unwrap().is_none());
    }

    #[test]
    fn multiplier_is_smallest_matched_entry() {
        let mut decomposer = Decomposer::new(m(vec![
            vec![3, 1, 0],
            vec![0, 3, 1],
            vec![1, 0, 3],
        ])).unwrap();

        let multiplier = decomposer.by_ref()
            .map(Result::unwrap)
            .find_map(|step| match step {
                Step::Multiplier { multiplier, .. } => Some(multiplier),
                _ => None,
            });
        // The first matching in row-major order is the diagonal.
        assert_eq!(multiplier, Some(3));
        assert_eq!(decomposer.next_phase(), Some(Phase::Subtract));

        match decomposer.next_step().unwrap() {
            Some(Step::Subtract { residual, .. }) => {
                assert_eq!(residual, m(vec![vec![0, 1, 0], vec![0, 0, 1], vec![1, 0, 0]]));
            },
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn random_demand_decomposes() {
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let demand = random_demand(4, 15, &mut rng);
        assert_eq!(demand.line_sum(), Some(15));

        let decomposition = decompose(demand.clone()).unwrap();
        assert_eq!(decomposition.reconstruct(), demand);
        assert_eq!(decomposition.terms().iter().map(|term| term.multiplier).sum::<u64>(), 15);

        let total_weight = decomposition.weights().map(|(weight, _)| weight).sum::<f64>();
        assert!((total_weight - 1f64).abs() < 1e-10);

        let mut rebuilt = Matrix::zeros(4);
        for ranking in decomposition.rankings() {
            rebuilt.add_assign_checked(&Matrix::from_permutation(ranking)).unwrap();
        }
        assert_eq!(rebuilt, demand);
    }

    #[test]
    fn term_matrix() {
        let term = Term { multiplier: 2, permutation: Permutation::new(vec![1, 0]).unwrap() };
        assert_eq!(term.to_matrix(), m(vec![vec![0, 2], vec![2, 0]]));
        assert_eq!(term.to_string(), "2 x (1, 0)");
    }
}

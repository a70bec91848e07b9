//! # Permutations
//!
//! Bijections on `0..n` with both directions stored explicitly. Used for the permutation matrices
//! extracted by the decomposition and for the rankings of agents.
use std::{fmt, mem};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};

/// Full permutation.
///
/// Both the entire forward and backward permutation is stored explicitly.
#[derive(Eq, PartialEq, Hash, Clone, Debug)]
pub struct Permutation {
    /// Index of the value is mapped to the value at the index.
    forward: Vec<usize>,
    /// Index of the value is mapped to the value at the index.
    backward: Vec<usize>,
}

impl Permutation {
    /// Create a new instance.
    ///
    /// Computes the inverse by sorting.
    ///
    /// # Arguments
    ///
    /// * `forward`: Image of each index, should contain every value in `0..forward.len()` once.
    ///
    /// # Errors
    ///
    /// `InvalidPermutation` if a value is out of range or appears more than once.
    pub fn new(forward: Vec<usize>) -> Result<Self> {
        let len = forward.len();
        let mut seen = vec![false; len];
        for (index, &value) in forward.iter().enumerate() {
            if value >= len || seen[value] {
                return Err(Error::InvalidPermutation { len, index, value });
            }
            seen[value] = true;
        }

        Ok(Self::new_unchecked(forward))
    }

    pub(crate) fn new_unchecked(forward: Vec<usize>) -> Self {
        let mut backward = forward.iter()
            .enumerate()
            .map(|(i, &j)| (j, i))
            .collect::<Vec<_>>();
        backward.sort_unstable_by_key(|&(j, _)| j);
        let backward = backward.into_iter().map(|(_, i)| i).collect::<Vec<_>>();
        debug_assert!(backward.iter().enumerate().all(|(j, &i)| forward[i] == j));

        Self {
            forward,
            backward,
        }
    }

    /// Create a new instance that maps an index onto itself.
    pub fn identity(n: usize) -> Self {
        Self {
            forward: (0..n).collect(),
            backward: (0..n).collect(),
        }
    }

    /// Draw a permutation uniformly at random.
    ///
    /// # Arguments
    ///
    /// * `n`: Number of elements.
    /// * `rng`: Source of randomness, shuffled with Fisher-Yates.
    pub fn random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let mut forward = (0..n).collect::<Vec<_>>();
        forward.shuffle(rng);

        Self::new_unchecked(forward)
    }

    /// Invert the permutation, making the forward the backward direction and vice-versa.
    ///
    /// Done cheaply by swapping the backing arrays.
    pub fn invert(&mut self) {
        mem::swap(&mut self.forward, &mut self.backward);
    }

    /// Apply the permutation to an index in the forward direction.
    pub fn forward(&self, i: usize) -> usize {
        debug_assert!(i < self.len());

        self.forward[i]
    }

    /// Apply the permutation to an index in the backward direction.
    pub fn backward(&self, i: usize) -> usize {
        debug_assert!(i < self.len());

        self.backward[i]
    }

    /// Size of the permutation.
    pub fn len(&self) -> usize {
        self.forward.len()
        // == self.backward.len()
    }

    /// Whether this is the permutation of the empty set.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// The forward direction as a slice.
    pub fn as_slice(&self) -> &[usize] {
        &self.forward
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        if !self.is_empty() {
            self.forward[0].fmt(f)?;
            for i in &self.forward[1..] {
                write!(f, ", {}", i)?;
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::data::linear_algebra::permutation::Permutation;
    use crate::error::Error;

    #[test]
    fn identity() {
        let permutation = Permutation::identity(4);
        assert_eq!(permutation.forward(1), 1);
        assert_eq!(permutation.backward(3), 3);
    }

    #[test]
    fn forward_backward() {
        let permutation = Permutation::new(vec![3, 1, 2, 0]).unwrap();
        assert_eq!(permutation.forward(1), 1);
        assert_eq!(permutation.forward(0), 3);
        assert_eq!(permutation.forward(3), 0);
        assert_eq!(permutation.backward(1), 1);
        assert_eq!(permutation.backward(0), 3);
        assert_eq!(permutation.backward(3), 0);

        let permutation = Permutation::new(vec![1, 2, 0]).unwrap();
        assert_eq!(permutation.backward(2), 1);
        assert_eq!(permutation.backward(0), 2);
    }

    #[test]
    fn invert() {
        let mut permutation = Permutation::new(vec![1, 2, 0]).unwrap();
        permutation.invert();
        assert_eq!(permutation.as_slice(), &[2, 0, 1]);
        for i in 0..3 {
            assert_eq!(permutation.backward(permutation.forward(i)), i);
        }
    }

    #[test]
    fn invalid() {
        assert_eq!(
            Permutation::new(vec![0, 2, 2]),
            Err(Error::InvalidPermutation { len: 3, index: 2, value: 2 }),
        );
        assert_eq!(
            Permutation::new(vec![3, 0, 1]),
            Err(Error::InvalidPermutation { len: 3, index: 0, value: 3 }),
        );
        assert!(Permutation::new(vec![]).is_ok());
    }

    #[test]
    fn random_is_bijection() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for n in 0..8 {
            let permutation = Permutation::random(n, &mut rng);
            let mut values = permutation.as_slice().to_vec();
            values.sort_unstable();
            assert_eq!(values, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn display() {
        assert_eq!(Permutation::new(vec![2, 0, 1]).unwrap().to_string(), "(2, 0, 1)");
        assert_eq!(Permutation::identity(0).to_string(), "()");
    }
}

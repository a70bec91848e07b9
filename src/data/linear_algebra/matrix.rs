//! # Square matrices
//!
//! A small dense matrix type. All matrices in this crate are square: demand matrices, their
//! positivity patterns, bipartite adjacency matrices and permutation matrices.
use std::fmt;
use std::ops::Index;

use itertools::iproduct;
use num_traits::{CheckedAdd, Num, One, Zero};

use crate::data::linear_algebra::permutation::Permutation;
use crate::error::{Error, Result};

/// Uses a `Vec<Vec<T>>` as underlying data structure. Dimensions are fixed at creation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Matrix<T> {
    data: Vec<Vec<T>>,
    size: usize,
}

impl<T: Copy + Zero> Matrix<T> {
    /// Create a dense square matrix of zeros of dimension `size` x `size`.
    pub fn zeros(size: usize) -> Self {
        Self {
            data: vec![vec![T::zero(); size]; size],
            size,
        }
    }

    /// Whether all values are zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().flatten().all(Zero::is_zero)
    }
}

impl<T: Copy> Matrix<T> {
    /// Create a `Matrix` from the provided rows.
    ///
    /// # Errors
    ///
    /// `NotSquare` if some row length differs from the number of rows.
    pub fn from_rows(data: Vec<Vec<T>>) -> Result<Self> {
        let size = data.len();
        if let Some((row, values)) = data.iter().enumerate().find(|(_, row)| row.len() != size) {
            return Err(Error::NotSquare { row, len: values.len(), expected: size });
        }

        Ok(Self { data, size })
    }

    /// Number of rows, equal to the number of columns.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the value at coordinate (`i`, `j`).
    pub fn get(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.size);
        debug_assert!(j < self.size);

        self.data[i][j]
    }

    /// Set the value at coordinate (`i`, `j`) to `value`.
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        debug_assert!(i < self.size);
        debug_assert!(j < self.size);

        self.data[i][j] = value;
    }

    /// Get all values in row `i` of this matrix.
    pub fn row(&self, i: usize) -> &[T] {
        debug_assert!(i < self.size);

        &self.data[i]
    }

    /// Iterate over the rows of this matrix.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.data.iter().map(Vec::as_slice)
    }

    /// Create a new matrix by applying `f(row, column, value)` to every cell.
    pub fn map<U, F>(&self, mut f: F) -> Matrix<U>
    where
        F: FnMut(usize, usize, T) -> U,
    {
        let data = (0..self.size)
            .map(|i| (0..self.size).map(|j| f(i, j, self.data[i][j])).collect())
            .collect();

        Matrix { data, size: self.size }
    }

    /// Apply `f(row, column, value)` to every cell, in place.
    pub fn map_in_place<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, usize, T) -> T,
    {
        for (i, j) in iproduct!(0..self.size, 0..self.size) {
            self.data[i][j] = f(i, j, self.data[i][j]);
        }
    }

    fn check_size<U>(&self, other: &Matrix<U>, operation: &'static str) -> Result<()> {
        if self.size == other.size {
            Ok(())
        } else {
            Err(Error::SizeMismatch { operation, left: self.size, right: other.size })
        }
    }

    fn zip_with<F>(&self, other: &Self, operation: &'static str, f: F) -> Result<Self>
    where
        F: Fn(T, T) -> T,
    {
        self.check_size(other, operation)?;

        Ok(self.map(|i, j, v| f(v, other.data[i][j])))
    }
}

impl<T: Copy + Num> Matrix<T> {
    /// Elementwise sum.
    ///
    /// # Errors
    ///
    /// `SizeMismatch` if the sizes differ.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Elementwise difference.
    ///
    /// # Errors
    ///
    /// `SizeMismatch` if the sizes differ.
    pub fn subtract(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "subtract", |a, b| a - b)
    }

    /// Elementwise (Hadamard) product.
    ///
    /// # Errors
    ///
    /// `SizeMismatch` if the sizes differ.
    pub fn hadamard(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    /// Add `other` to this matrix in place.
    ///
    /// # Errors
    ///
    /// `SizeMismatch` if the sizes differ, in which case `self` is left unchanged.
    pub fn add_assign_checked(&mut self, other: &Self) -> Result<()> {
        self.check_size(other, "add_assign")?;
        self.map_in_place(|i, j, v| v + other.data[i][j]);

        Ok(())
    }

    /// Subtract `other` from this matrix in place.
    ///
    /// # Errors
    ///
    /// `SizeMismatch` if the sizes differ, in which case `self` is left unchanged.
    pub fn subtract_assign_checked(&mut self, other: &Self) -> Result<()> {
        self.check_size(other, "subtract_assign")?;
        self.map_in_place(|i, j, v| v - other.data[i][j]);

        Ok(())
    }

    /// Multiply every value by `alpha`.
    pub fn scale(&self, alpha: T) -> Self {
        self.map(|_, _, v| alpha * v)
    }

    /// Build the permutation matrix that has a one in row `i` at column `permutation[i]`.
    pub fn from_permutation(permutation: &Permutation) -> Self {
        let mut result = Self::zeros(permutation.len());
        for (i, &j) in permutation.as_slice().iter().enumerate() {
            result.data[i][j] = T::one();
        }

        result
    }

    /// Sum of each row.
    pub fn row_sums(&self) -> Vec<T> {
        self.data.iter()
            .map(|row| row.iter().fold(T::zero(), |total, &v| total + v))
            .collect()
    }

    /// Sum of each column.
    pub fn column_sums(&self) -> Vec<T> {
        (0..self.size)
            .map(|j| self.data.iter().fold(T::zero(), |total, row| total + row[j]))
            .collect()
    }

    /// The common value of all row and column sums, if there is one.
    ///
    /// Returns `None` for the empty matrix.
    pub fn line_sum(&self) -> Option<T> {
        let rows = self.row_sums();
        let columns = self.column_sums();
        let first = *rows.first()?;

        rows.iter().chain(columns.iter())
            .all(|&sum| sum == first)
            .then_some(first)
    }
}

impl<T: Copy + Zero + CheckedAdd> Matrix<T> {
    /// Sum of each row, `None` for rows whose sum overflows.
    pub fn checked_row_sums(&self) -> Vec<Option<T>> {
        self.data.iter()
            .map(|row| row.iter().try_fold(T::zero(), |total, v| total.checked_add(v)))
            .collect()
    }

    /// Sum of each column, `None` for columns whose sum overflows.
    pub fn checked_column_sums(&self) -> Vec<Option<T>> {
        (0..self.size)
            .map(|j| self.data.iter().try_fold(T::zero(), |total, row| total.checked_add(&row[j])))
            .collect()
    }
}

impl<T: Copy + Zero + One + PartialOrd> Matrix<T> {
    /// Derive the 0/1 matrix that has a one exactly where this matrix is positive.
    pub fn positivity(&self) -> Self {
        self.map(|_, _, v| if v > T::zero() { T::one() } else { T::zero() })
    }
}

impl<T: Copy + PartialOrd> Matrix<T> {
    /// Column index of the first maximum value in row `i`.
    ///
    /// Reads a permutation back from its permutation matrix. `None` for the empty matrix.
    pub fn row_argmax(&self, i: usize) -> Option<usize> {
        debug_assert!(i < self.size);

        self.data[i].iter().enumerate()
            .fold(None, |best: Option<(usize, T)>, (j, &v)| match best {
                Some((_, max)) if max >= v => best,
                _ => Some((j, v)),
            })
            .map(|(j, _)| j)
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        &self.data[i][j]
    }
}

impl<T: fmt::Display> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.data.iter().flatten()
            .map(|v| v.to_string().len())
            .max()
            .unwrap_or(1);

        for row in &self.data {
            f.write_str("[")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{:>width$}", value, width = width)?;
            }
            writeln!(f, "]")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::data::linear_algebra::matrix::Matrix;
    use crate::data::linear_algebra::permutation::Permutation;
    use crate::error::Error;

    fn m(rows: Vec<Vec<i64>>) -> Matrix<i64> {
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn zeros() {
        let zeros = Matrix::<i64>::zeros(3);
        assert_eq!(zeros.size(), 3);
        assert!(zeros.is_zero());
        assert!(Matrix::<i64>::zeros(0).is_zero());
        assert!(!m(vec![vec![0, 0], vec![0, 1]]).is_zero());
    }

    #[test]
    fn not_square() {
        assert_eq!(
            Matrix::from_rows(vec![vec![1, 2], vec![3]]),
            Err(Error::NotSquare { row: 1, len: 1, expected: 2 }),
        );
    }

    #[test]
    fn arithmetic() {
        let a = m(vec![vec![1, 2], vec![3, 4]]);
        let b = m(vec![vec![4, 3], vec![2, 1]]);

        assert_eq!(a.add(&b).unwrap(), m(vec![vec![5, 5], vec![5, 5]]));
        assert_eq!(a.subtract(&b).unwrap(), m(vec![vec![-3, -1], vec![1, 3]]));
        assert_eq!(a.hadamard(&b).unwrap(), m(vec![vec![4, 6], vec![6, 4]]));
        assert_eq!(a.scale(3), m(vec![vec![3, 6], vec![9, 12]]));

        let mut c = a.clone();
        c.add_assign_checked(&b).unwrap();
        c.subtract_assign_checked(&b).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn size_mismatch() {
        let a = Matrix::<i64>::zeros(2);
        let b = Matrix::<i64>::zeros(3);

        assert_eq!(
            a.add(&b),
            Err(Error::SizeMismatch { operation: "add", left: 2, right: 3 }),
        );
        assert!(a.subtract(&b).is_err());
        assert!(a.hadamard(&b).is_err());

        let mut c = a.clone();
        assert!(c.subtract_assign_checked(&b).is_err());
        assert!(c.add_assign_checked(&b).is_err());
        assert_eq!(c, a);
    }

    #[test]
    fn map() {
        let a = m(vec![vec![1, 2], vec![3, 4]]);
        let indices = a.map(|i, j, _| (i * 10 + j) as i64);
        assert_eq!(indices, m(vec![vec![0, 1], vec![10, 11]]));

        let floats = a.map(|_, _, v| v as f64 / 2f64);
        assert_eq!(floats.get(1, 1), 2f64);

        let mut b = a.clone();
        b.map_in_place(|i, j, v| if i == j { 0 } else { v });
        assert_eq!(b, m(vec![vec![0, 2], vec![3, 0]]));
    }

    #[test]
    fn checked_sums() {
        let a = Matrix::from_rows(vec![vec![u64::MAX, 0], vec![1, 2]]).unwrap();
        assert_eq!(a.checked_row_sums(), vec![Some(u64::MAX), Some(3)]);
        assert_eq!(a.checked_column_sums(), vec![None, Some(2)]);
    }

    #[test]
    fn positivity() {
        let a = m(vec![vec![0, 5, -1], vec![2, 0, 0], vec![0, 0, 7]]);
        assert_eq!(a.positivity(), m(vec![vec![0, 1, 0], vec![1, 0, 0], vec![0, 0, 1]]));
    }

    #[test]
    fn from_permutation() {
        let permutation = Permutation::new(vec![2, 0, 1]).unwrap();
        let matrix = Matrix::<u64>::from_permutation(&permutation);
        assert_eq!(
            matrix,
            Matrix::from_rows(vec![vec![0, 0, 1], vec![1, 0, 0], vec![0, 1, 0]]).unwrap(),
        );
        assert_eq!(matrix.row_sums(), vec![1, 1, 1]);
        assert_eq!(matrix.column_sums(), vec![1, 1, 1]);

        let recovered = (0..3).map(|i| matrix.row_argmax(i).unwrap()).collect::<Vec<_>>();
        assert_eq!(recovered, permutation.as_slice());
    }

    #[test]
    fn line_sum() {
        assert_eq!(m(vec![vec![2, 1], vec![1, 2]]).line_sum(), Some(3));
        assert_eq!(m(vec![vec![2, 1], vec![2, 1]]).line_sum(), None);
        assert_eq!(Matrix::<i64>::zeros(0).line_sum(), None);
    }

    #[test]
    fn row_argmax_first_maximum() {
        let a = m(vec![vec![1, 3, 3], vec![0, 0, 0], vec![9, 1, 2]]);
        assert_eq!(a.row_argmax(0), Some(1));
        assert_eq!(a.row_argmax(1), Some(0));
        assert_eq!(a.row_argmax(2), Some(0));
    }

    #[test]
    fn display() {
        let a = m(vec![vec![1, 10], vec![0, 2]]);
        assert_eq!(a.to_string(), "[ 1 10]\n[ 0  2]\n");
    }
}

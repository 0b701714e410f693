//! Dense boolean-as-double matrices for reachability precomputation
//!
//! Entries are `0.0` or `1.0`. Products are taken over the boolean semiring
//! (any nonzero term yields `1.0`), so walk counts never overflow however
//! large the power.
//!
//! Row blocks of a product are computed in parallel with rayon; every row is
//! a pure function of its inputs, so the result does not depend on thread
//! scheduling.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use rayon::prelude::*;

use crate::algorithm::traits::NodeIndex;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Row-selection matrix: row `r` has a single one at column `selected[r]`
    pub fn indicator(selected: &[NodeIndex], cols: usize) -> Self {
        let mut matrix = Self::zeros(selected.len(), cols);
        for (row, &col) in selected.iter().enumerate() {
            matrix.set(row, col, 1.0);
        }
        matrix
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    #[inline]
    pub fn is_nonzero(&self, row: usize, col: usize) -> bool {
        self.get(row, col) != 0.0
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Columns with a nonzero entry in `row`
    pub fn nonzero_columns(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(row)
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0.0)
            .map(|(col, _)| col)
    }

    /// Boolean product `self · other`
    ///
    /// # Panics
    /// When the inner dimensions differ.
    pub fn boolean_product(&self, other: &Matrix) -> Matrix {
        assert_eq!(
            self.cols, other.rows,
            "matrix product dimension mismatch: {}x{} · {}x{}",
            self.rows, self.cols, other.rows, other.cols
        );

        let mut result = Matrix::zeros(self.rows, other.cols);
        if other.cols == 0 {
            return result;
        }

        result
            .data
            .par_chunks_mut(other.cols)
            .enumerate()
            .for_each(|(i, out_row)| {
                for (k, &lhs) in self.row(i).iter().enumerate() {
                    if lhs == 0.0 {
                        continue;
                    }
                    for (out, &rhs) in out_row.iter_mut().zip(other.row(k)) {
                        if rhs != 0.0 {
                            *out = 1.0;
                        }
                    }
                }
            });

        result
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|value| **value != 0.0).count()
    }
}

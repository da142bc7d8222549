//! Correlation matrices and Cholesky factorisation.
//!
//! Given independent standard normals `Z`, correlated draws are obtained as
//! `W = L * Z` where `L` is the lower-triangular Cholesky factor of the
//! correlation matrix `C = L * L^T`.
//!
//! A matrix that passes shape validation may still fail to be positive
//! definite; [`CorrelationMatrix::cholesky`] then returns `None` and the
//! caller decides how to recover (the sampler in [`crate::rng`] falls back
//! to uncorrelated draws with a warning).

use thiserror::Error;

/// Validation errors for correlation-matrix construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrelationError {
    /// Element count does not match the declared dimension.
    #[error("invalid matrix dimensions: expected {expected} elements, got {got}")]
    InvalidDimensions {
        /// Expected element count (`dim * dim`).
        expected: usize,
        /// Actual element count supplied.
        got: usize,
    },

    /// A diagonal element differs from 1.0.
    #[error("diagonal element at index {index} is {value}, expected 1.0")]
    InvalidDiagonal {
        /// Row/column index of the offending diagonal entry.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// The matrix is not symmetric.
    #[error("matrix is not symmetric at ({i}, {j})")]
    NotSymmetric {
        /// Row index.
        i: usize,
        /// Column index.
        j: usize,
    },

    /// An off-diagonal correlation lies outside [-1, 1].
    #[error("correlation at ({i}, {j}) is {value}, must be in [-1, 1]")]
    OutOfRange {
        /// Row index.
        i: usize,
        /// Column index.
        j: usize,
        /// The offending value.
        value: f64,
    },
}

const VALIDATION_EPSILON: f64 = 1e-10;

/// A validated k×k correlation matrix (row-major storage).
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix {
    data: Vec<f64>,
    dim: usize,
}

impl CorrelationMatrix {
    /// Validates and wraps a row-major correlation matrix.
    ///
    /// # Errors
    ///
    /// Rejects wrong element counts, non-unit diagonals, asymmetry and
    /// out-of-range correlations. Positive definiteness is *not* checked
    /// here - see [`CorrelationMatrix::cholesky`].
    pub fn new(data: &[f64], dim: usize) -> Result<Self, CorrelationError> {
        let expected = dim * dim;
        if data.len() != expected {
            return Err(CorrelationError::InvalidDimensions {
                expected,
                got: data.len(),
            });
        }

        for i in 0..dim {
            let diag = data[i * dim + i];
            if (diag - 1.0).abs() > VALIDATION_EPSILON {
                return Err(CorrelationError::InvalidDiagonal {
                    index: i,
                    value: diag,
                });
            }
        }

        for i in 0..dim {
            for j in (i + 1)..dim {
                let val_ij = data[i * dim + j];
                let val_ji = data[j * dim + i];
                if (val_ij - val_ji).abs() > VALIDATION_EPSILON {
                    return Err(CorrelationError::NotSymmetric { i, j });
                }
                if !(-1.0..=1.0).contains(&val_ij) {
                    return Err(CorrelationError::OutOfRange {
                        i,
                        j,
                        value: val_ij,
                    });
                }
            }
        }

        Ok(Self {
            data: data.to_vec(),
            dim,
        })
    }

    /// Identity correlation (uncorrelated draws) of the given dimension.
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![0.0; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = 1.0;
        }
        Self { data, dim }
    }

    /// Matrix dimension k.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element accessor (row, column).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Lower-triangular Cholesky factor, or `None` when the matrix is not
    /// positive definite.
    pub fn cholesky(&self) -> Option<CholeskyFactor> {
        let n = self.dim;
        let mut l = vec![0.0_f64; n * n];

        for i in 0..n {
            for j in 0..=i {
                let mut sum = self.get(i, j);
                for k in 0..j {
                    sum -= l[i * n + k] * l[j * n + k];
                }
                if i == j {
                    if sum <= VALIDATION_EPSILON {
                        return None;
                    }
                    l[i * n + j] = sum.sqrt();
                } else {
                    l[i * n + j] = sum / l[j * n + j];
                }
            }
        }

        Some(CholeskyFactor { data: l, dim: n })
    }
}

/// Lower-triangular Cholesky factor of a correlation matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor {
    data: Vec<f64>,
    dim: usize,
}

impl CholeskyFactor {
    /// Factor dimension k.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Transforms independent standard normals `z` into correlated draws
    /// `w = L * z`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `z.len() != dim`.
    pub fn transform(&self, z: &[f64]) -> Vec<f64> {
        debug_assert_eq!(z.len(), self.dim);
        let n = self.dim;
        let mut w = vec![0.0; n];
        for i in 0..n {
            let mut acc = 0.0;
            for (k, &zk) in z.iter().enumerate().take(i + 1) {
                acc += self.data[i * n + k] * zk;
            }
            w[i] = acc;
        }
        w
    }
}

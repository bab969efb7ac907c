//! Sparse symmetric systems for chart flattening.
//!
//! [`CsrMatrix`] holds the assembled system in compressed rows and
//! [`conjugate_gradient`] solves it with a Jacobi preconditioner.

use nalgebra::DVector;

use crate::error::{AtlasError, Result};

/// Pivots and curvatures smaller than this are treated as zero.
const TINY: f64 = 1e-300;

/// A sparse matrix in compressed sparse row layout.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `offsets[r]..offsets[r + 1]` spans the entries of row `r`.
    offsets: Vec<usize>,
    columns: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Assemble from `(row, col, value)` entries. Entries that hit the same
    /// cell are added together; their order does not matter.
    pub fn from_triplets(rows: usize, cols: usize, mut entries: Vec<(usize, usize, f64)>) -> Self {
        entries.sort_unstable_by_key(|&(r, c, _)| (r, c));

        let mut columns: Vec<usize> = Vec::with_capacity(entries.len());
        let mut values: Vec<f64> = Vec::with_capacity(entries.len());
        let mut row_len = vec![0usize; rows];
        let mut last = None;

        for (r, c, value) in entries {
            if last == Some((r, c)) {
                if let Some(v) = values.last_mut() {
                    *v += value;
                }
                continue;
            }
            columns.push(c);
            values.push(value);
            row_len[r] += 1;
            last = Some((r, c));
        }

        let mut offsets = Vec::with_capacity(rows + 1);
        offsets.push(0);
        for len in row_len {
            let end = offsets[offsets.len() - 1] + len;
            offsets.push(end);
        }

        Self {
            rows,
            cols,
            offsets,
            columns,
            values,
        }
    }

    /// Row count.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Column count.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Stored entries after merging.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    fn row(&self, r: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let span = self.offsets[r]..self.offsets[r + 1];
        self.columns[span.clone()].iter().copied().zip(self.values[span].iter().copied())
    }

    /// `A * x`.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        debug_assert_eq!(x.len(), self.cols);
        DVector::from_iterator(self.rows, (0..self.rows).map(|r| self.row(r).map(|(c, a)| a * x[c]).sum()))
    }

    /// Main diagonal, zero where no entry is stored.
    pub fn diagonal(&self) -> DVector<f64> {
        let n = self.rows.min(self.cols);
        DVector::from_iterator(n, (0..n).map(|r| self.row(r).find(|&(c, _)| c == r).map_or(0.0, |(_, a)| a)))
    }
}

/// Solve `A x = b` for symmetric positive definite `A`, starting from zero.
///
/// Stops once `|b - A x| / |b|` drops below `tolerance`. A zero right-hand
/// side returns the zero vector immediately.
///
/// # Errors
///
/// [`AtlasError::ConvergenceFailed`] when `max_iterations` pass without
/// reaching the tolerance, or when a search direction has no curvature.
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<DVector<f64>> {
    let n = b.len();
    debug_assert!(a.nrows() == n && a.ncols() == n);

    let mut x = DVector::zeros(n);
    let target = b.norm() * tolerance;
    if b.norm() < 1e-15 {
        return Ok(x);
    }

    let jacobi = a.diagonal().map(|d| if d.abs() > TINY { d.recip() } else { 1.0 });
    let precondition = |r: &DVector<f64>| r.component_mul(&jacobi);

    let mut residual = b.clone();
    let mut z = precondition(&residual);
    let mut direction = z.clone();
    let mut rho = residual.dot(&z);

    for _ in 0..max_iterations {
        let q = a.mul_vec(&direction);
        let curvature = direction.dot(&q);
        if !curvature.is_finite() || curvature.abs() < TINY {
            break;
        }

        let step = rho / curvature;
        x.axpy(step, &direction, 1.0);
        residual.axpy(-step, &q, 1.0);
        if residual.norm() < target {
            return Ok(x);
        }

        z = precondition(&residual);
        let next_rho = residual.dot(&z);
        direction = &z + (next_rho / rho) * &direction;
        rho = next_rho;
    }

    Err(AtlasError::ConvergenceFailed {
        iterations: max_iterations,
    })
}

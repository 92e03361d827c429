//! Minimal compressed-sparse-row matrix for building spin operators.
//!
//! Tensor-product spin operators on `n` nuclei live in a `2^n`-dimensional
//! space but have at most one nonzero entry per row, so storing them densely
//! wastes memory as `4^n`. `SpMat` supports only what the operator and
//! Hamiltonian builders need: Kronecker products, sums, scaling, products, and
//! conversion to a dense array for diagonalization.

use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use rustc_hash::FxHashMap as HashMap;
use crate::error::{ NmrError, NmrResult };

/// Entries with magnitude at or below this value are dropped when products and
/// sums are formed.
pub const DROP_TOL: f64 = 1e-15;

/// A complex sparse matrix in compressed-sparse-row form.
///
/// Column indices within each row are kept sorted and unique.
#[derive(Clone, Debug, PartialEq)]
pub struct SpMat {
    nrows: usize,
    ncols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<C64>,
}

impl SpMat {
    /// Create an all-zero matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            indptr: vec![0; nrows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Create an `n × n` identity matrix.
    pub fn eye(n: usize) -> Self {
        Self {
            nrows: n,
            ncols: n,
            indptr: (0..=n).collect(),
            indices: (0..n).collect(),
            data: vec![C64::from(1.0); n],
        }
    }

    /// Build a matrix from `(row, col, value)` triplets. Duplicate positions
    /// are summed.
    pub fn from_triplets<I>(nrows: usize, ncols: usize, triplets: I)
        -> NmrResult<Self>
    where I: IntoIterator<Item = (usize, usize, C64)>
    {
        let mut rows: Vec<Vec<(usize, C64)>> = vec![Vec::new(); nrows];
        for (i, j, a) in triplets {
            if i >= nrows || j >= ncols {
                return Err(NmrError::invalid(format!(
                    "triplet index ({}, {}) out of bounds for shape ({}, {})",
                    i, j, nrows, ncols,
                )));
            }
            rows[i].push((j, a));
        }
        Ok(Self::from_rows(nrows, ncols, rows))
    }

    /// Build a matrix from a dense array, keeping entries above [`DROP_TOL`].
    pub fn from_dense(a: &nd::Array2<C64>) -> Self {
        let (nrows, ncols) = a.dim();
        let rows: Vec<Vec<(usize, C64)>>
            = a.outer_iter()
            .map(|row| {
                row.iter().enumerate()
                    .filter(|(_, x)| x.norm() > DROP_TOL)
                    .map(|(j, x)| (j, *x))
                    .collect()
            })
            .collect();
        Self::from_rows(nrows, ncols, rows)
    }

    fn from_rows(nrows: usize, ncols: usize, rows: Vec<Vec<(usize, C64)>>)
        -> Self
    {
        let mut indptr: Vec<usize> = Vec::with_capacity(nrows + 1);
        let mut indices: Vec<usize> = Vec::new();
        let mut data: Vec<C64> = Vec::new();
        indptr.push(0);
        for mut row in rows.into_iter() {
            row.sort_by_key(|(j, _)| *j);
            let mut last: Option<usize> = None;
            for (j, a) in row.into_iter() {
                if last == Some(j) {
                    if let Some(acc) = data.last_mut() { *acc += a; }
                } else {
                    indices.push(j);
                    data.push(a);
                    last = Some(j);
                }
            }
            indptr.push(indices.len());
        }
        let mut out = Self { nrows, ncols, indptr, indices, data };
        out.prune();
        out
    }

    /// Remove stored entries with magnitude at or below [`DROP_TOL`].
    fn prune(&mut self) {
        if self.data.iter().all(|a| a.norm() > DROP_TOL) { return; }
        let mut indptr: Vec<usize> = Vec::with_capacity(self.nrows + 1);
        let mut indices: Vec<usize> = Vec::with_capacity(self.indices.len());
        let mut data: Vec<C64> = Vec::with_capacity(self.data.len());
        indptr.push(0);
        for i in 0..self.nrows {
            for k in self.indptr[i]..self.indptr[i + 1] {
                if self.data[k].norm() > DROP_TOL {
                    indices.push(self.indices[k]);
                    data.push(self.data[k]);
                }
            }
            indptr.push(indices.len());
        }
        self.indptr = indptr;
        self.indices = indices;
        self.data = data;
    }

    /// Return `(nrows, ncols)`.
    pub fn dim(&self) -> (usize, usize) { (self.nrows, self.ncols) }

    /// Number of stored (nonzero) entries.
    pub fn nnz(&self) -> usize { self.data.len() }

    /// Get a single element, returning zero for positions not stored.
    pub fn get(&self, i: usize, j: usize) -> C64 {
        if i >= self.nrows { return C64::zero(); }
        let lo = self.indptr[i];
        let hi = self.indptr[i + 1];
        match self.indices[lo..hi].binary_search(&j) {
            Ok(k) => self.data[lo + k],
            Err(_) => C64::zero(),
        }
    }

    /// Iterate over the stored entries of row `i` as `(col, value)` pairs.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, C64)> + '_ {
        let lo = self.indptr[i];
        let hi = self.indptr[i + 1];
        self.indices[lo..hi].iter().copied()
            .zip(self.data[lo..hi].iter().copied())
    }

    /// Iterate over all stored entries as `(row, col, value)` triplets.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, C64)> + '_ {
        (0..self.nrows)
            .flat_map(move |i| self.row(i).map(move |(j, a)| (i, j, a)))
    }

    /// Kronecker product `self ⊗ rhs`.
    pub fn kron(&self, rhs: &Self) -> Self {
        let nrows = self.nrows * rhs.nrows;
        let ncols = self.ncols * rhs.ncols;
        let mut indptr: Vec<usize> = Vec::with_capacity(nrows + 1);
        let mut indices: Vec<usize> = Vec::with_capacity(self.nnz() * rhs.nnz());
        let mut data: Vec<C64> = Vec::with_capacity(self.nnz() * rhs.nnz());
        indptr.push(0);
        // row-major ordering of (i, p) keeps column indices sorted within each
        // output row
        for i in 0..self.nrows {
            for p in 0..rhs.nrows {
                for (j, a) in self.row(i) {
                    for (q, b) in rhs.row(p) {
                        indices.push(j * rhs.ncols + q);
                        data.push(a * b);
                    }
                }
                indptr.push(indices.len());
            }
        }
        let mut out = Self { nrows, ncols, indptr, indices, data };
        out.prune();
        out
    }

    /// Multiply every entry by a complex scalar.
    pub fn scale(&self, c: C64) -> Self {
        let mut out = self.clone();
        out.data.iter_mut().for_each(|a| { *a *= c; });
        out.prune();
        out
    }

    /// Sum of two matrices of equal shape.
    pub fn add(&self, rhs: &Self) -> NmrResult<Self> {
        if self.dim() != rhs.dim() {
            return Err(NmrError::invalid(format!(
                "cannot add shapes {:?} and {:?}", self.dim(), rhs.dim())));
        }
        let rows: Vec<Vec<(usize, C64)>>
            = (0..self.nrows)
            .map(|i| self.row(i).chain(rhs.row(i)).collect())
            .collect();
        Ok(Self::from_rows(self.nrows, self.ncols, rows))
    }

    /// Matrix product `self · rhs`.
    pub fn dot(&self, rhs: &Self) -> NmrResult<Self> {
        if self.ncols != rhs.nrows {
            return Err(NmrError::invalid(format!(
                "cannot multiply shapes {:?} and {:?}", self.dim(), rhs.dim())));
        }
        let mut acc: HashMap<usize, C64> = HashMap::default();
        let mut rows: Vec<Vec<(usize, C64)>> = Vec::with_capacity(self.nrows);
        for i in 0..self.nrows {
            acc.clear();
            for (k, a) in self.row(i) {
                for (j, b) in rhs.row(k) {
                    *acc.entry(j).or_insert_with(C64::zero) += a * b;
                }
            }
            rows.push(acc.drain().collect());
        }
        Ok(Self::from_rows(self.nrows, rhs.ncols, rows))
    }

    /// Convert to a dense array.
    pub fn to_dense(&self) -> nd::Array2<C64> {
        let mut out: nd::Array2<C64> = nd::Array2::zeros((self.nrows, self.ncols));
        self.triplets().for_each(|(i, j, a)| { out[[i, j]] = a; });
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::linalg::kron;

    fn c(re: f64, im: f64) -> C64 { C64::new(re, im) }

    fn sample() -> nd::Array2<C64> {
        nd::array![
            [c(0.0, 0.0), c(0.5, 0.0), c(0.0, 0.0)],
            [c(0.0, -1.0), c(0.0, 0.0), c(2.0, 0.0)],
        ]
    }

    #[test]
    fn dense_roundtrip_drops_zeros() {
        let a = sample();
        let s = SpMat::from_dense(&a);
        assert_eq!(s.nnz(), 3);
        assert_eq!(s.to_dense(), a);
        assert_eq!(s.get(1, 2), c(2.0, 0.0));
        assert_eq!(s.get(0, 0), C64::zero());
    }

    #[test]
    fn kron_matches_dense() {
        let a = sample();
        let b: nd::Array2<C64>
            = nd::array![[c(1.0, 0.0), c(0.0, 1.0)], [c(0.0, 0.0), c(-1.0, 0.0)]];
        let s = SpMat::from_dense(&a).kron(&SpMat::from_dense(&b));
        assert_eq!(s.dim(), (4, 6));
        assert_eq!(s.to_dense(), kron(&a, &b));
    }

    #[test]
    fn dot_and_add_match_dense() {
        let a = sample();
        let at: nd::Array2<C64> = a.t().mapv(|x| x.conj());
        let s = SpMat::from_dense(&a);
        let st = SpMat::from_dense(&at);
        assert_eq!(s.dot(&st).unwrap().to_dense(), a.dot(&at));
        let sum = s.add(&s.scale(c(-1.0, 0.0))).unwrap();
        assert_eq!(sum.nnz(), 0);
        assert_eq!(s.add(&s).unwrap().to_dense(), &a * c(2.0, 0.0));
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let s = SpMat::from_dense(&sample());
        assert!(matches!(s.add(&SpMat::eye(2)), Err(NmrError::InvalidArgument(_))));
        assert!(matches!(s.dot(&s), Err(NmrError::InvalidArgument(_))));
        assert!(s.dot(&SpMat::eye(3)).is_ok());
        assert!(matches!(
            SpMat::from_triplets(2, 2, [(2, 0, c(1.0, 0.0))]),
            Err(NmrError::InvalidArgument(_))
        ));
        assert!(matches!(
            SpMat::from_triplets(2, 2, [(0, 5, c(1.0, 0.0))]),
            Err(NmrError::InvalidArgument(_))
        ));
    }

    #[test]
    fn duplicate_triplets_sum() {
        let s = SpMat::from_triplets(
            2, 2, [(0, 1, c(1.0, 0.0)), (0, 1, c(2.0, 0.0)), (1, 0, c(0.0, 0.0))])
            .unwrap();
        assert_eq!(s.nnz(), 1);
        assert_eq!(s.get(0, 1), c(3.0, 0.0));
        assert_eq!(SpMat::eye(3).to_dense(), nd::Array2::<C64>::eye(3));
    }
}

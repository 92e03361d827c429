//! Allowed single-quantum transitions between product basis states.
//!
//! Basis state indices `0..2^n` encode one α/β spin state per nucleus in their
//! binary digits. A transition is allowed when exactly one spin flips, i.e. the
//! two indices differ in exactly one bit.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{ error::NmrResult, sparse::SpMat };

/// Return `true` if the transition between basis states `a` and `b` flips
/// exactly one spin.
pub fn is_allowed(a: usize, b: usize) -> bool { (a ^ b).count_ones() == 1 }

/// Build the `m × m` symmetric 0/1 matrix of allowed transitions.
///
/// Only the upper triangle is tested; the lower triangle is mirrored from it.
pub fn transition_matrix(m: usize) -> nd::Array2<f64> {
    let mut T: nd::Array2<f64> = nd::Array2::zeros((m, m));
    for i in 0..m.saturating_sub(1) {
        for j in i + 1..m {
            if is_allowed(i, j) {
                T[[i, j]] = 1.0;
                T[[j, i]] = 1.0;
            }
        }
    }
    T
}

/// Sparse form of [`transition_matrix`] for `m = 2^nspins`.
///
/// Each basis state has exactly `nspins` allowed partners, found by flipping
/// each bit in turn, so no pairwise search is needed.
pub fn transition_matrix_sparse(nspins: usize) -> NmrResult<SpMat> {
    let m = 1_usize << nspins;
    let triplets
        = (0..m)
        .flat_map(|i| (0..nspins).map(move |b| (i, i ^ (1 << b), C64::from(1.0))));
    SpMat::from_triplets(m, m, triplets)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn two_spin_matrix() {
        let expected: nd::Array2<f64>
            = nd::array![
                [0.0, 1.0, 1.0, 0.0],
                [1.0, 0.0, 0.0, 1.0],
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 1.0, 0.0],
            ];
        assert_eq!(transition_matrix(4), expected);
    }

    #[test]
    fn allowed_rule() {
        assert!(is_allowed(0, 1));
        assert!(is_allowed(5, 7));
        assert!(!is_allowed(3, 3));
        assert!(!is_allowed(1, 2));
        assert!(!is_allowed(0, 7));
    }

    #[test]
    fn symmetric_with_n_per_row() {
        let n = 5;
        let T = transition_matrix(1 << n);
        assert_eq!(T, T.t());
        assert!(T.diag().iter().all(|t| *t == 0.0));
        assert!(T.rows().into_iter().all(|r| r.sum() == n as f64));
    }

    #[test]
    fn sparse_matches_dense() {
        for n in 1..=4 {
            let dense = transition_matrix(1 << n).mapv(C64::from);
            assert_eq!(transition_matrix_sparse(n).unwrap().to_dense(), dense);
        }
    }

    #[test]
    fn degenerate_sizes() {
        assert_eq!(transition_matrix(0).len(), 0);
        assert_eq!(transition_matrix(1), nd::array![[0.0]]);
    }
}

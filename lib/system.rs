//! Description of a coupled set of spin-1/2 nuclei.

use ndarray as nd;
use crate::error::{ NmrError, NmrResult };

/// Absolute tolerance used when checking that a coupling matrix is symmetric.
pub const SYMMETRY_TOL: f64 = 1e-9;

/// A validated spin system: `n` resonance frequencies in Hz and an `n × n`
/// symmetric matrix of scalar couplings in Hz.
///
/// The diagonal of the coupling matrix carries no meaning and is never read by
/// any simulation routine.
#[derive(Clone, Debug, PartialEq)]
pub struct SpinSystem {
    freqs: nd::Array1<f64>,
    couplings: nd::Array2<f64>,
}

impl SpinSystem {
    /// Create a new `SpinSystem`, checking that the frequency array and the
    /// coupling matrix agree in size, that all entries are finite, and that the
    /// couplings are symmetric.
    pub fn new(freqs: nd::Array1<f64>, couplings: nd::Array2<f64>)
        -> NmrResult<Self>
    {
        let n = freqs.len();
        if n == 0 {
            return Err(NmrError::invalid("a spin system needs at least one nucleus"));
        }
        if !couplings.is_square() {
            return Err(NmrError::invalid(format!(
                "coupling matrix must be square; got shape {:?}",
                couplings.shape(),
            )));
        }
        if couplings.nrows() != n {
            return Err(NmrError::invalid(format!(
                "{} frequencies but a {}x{} coupling matrix",
                n, couplings.nrows(), couplings.ncols(),
            )));
        }
        if let Some(k) = freqs.iter().position(|v| !v.is_finite()) {
            return Err(NmrError::invalid(format!("frequency {} is not finite", k)));
        }
        for ((i, k), J) in couplings.indexed_iter() {
            if i == k { continue; }
            if !J.is_finite() {
                return Err(NmrError::invalid(format!(
                    "coupling ({}, {}) is not finite", i, k)));
            }
            if i < k && (J - couplings[[k, i]]).abs() > SYMMETRY_TOL {
                return Err(NmrError::invalid(format!(
                    "coupling matrix is not symmetric: J[{i},{k}] = {} but J[{k},{i}] = {}",
                    J, couplings[[k, i]],
                )));
            }
        }
        Ok(Self { freqs, couplings })
    }

    /// Create a new `SpinSystem` from frequencies and a list of `(i, k, J)`
    /// couplings. Both `J[i, k]` and `J[k, i]` are set; listing a pair twice
    /// keeps the last value.
    pub fn from_pairs<I>(freqs: &[f64], pairs: I) -> NmrResult<Self>
    where I: IntoIterator<Item = (usize, usize, f64)>
    {
        let n = freqs.len();
        let mut couplings: nd::Array2<f64> = nd::Array2::zeros((n, n));
        for (i, k, J) in pairs {
            if i >= n || k >= n {
                return Err(NmrError::invalid(format!(
                    "coupling ({}, {}) refers to a nucleus outside 0..{}", i, k, n)));
            }
            if i == k {
                return Err(NmrError::invalid(format!(
                    "nucleus {} cannot couple to itself", i)));
            }
            couplings[[i, k]] = J;
            couplings[[k, i]] = J;
        }
        Self::new(nd::Array1::from(freqs.to_vec()), couplings)
    }

    /// Number of nuclei.
    pub fn nspins(&self) -> usize { self.freqs.len() }

    /// Dimension of the full spin Hilbert space, `2^n`.
    pub fn dim(&self) -> usize { 1 << self.freqs.len() }

    /// Resonance frequencies in Hz.
    pub fn freqs(&self) -> &nd::Array1<f64> { &self.freqs }

    /// Scalar coupling matrix in Hz.
    pub fn couplings(&self) -> &nd::Array2<f64> { &self.couplings }

    /// Coupling constant between nuclei `i` and `k`, or `None` if either index
    /// is out of range or `i == k`.
    pub fn coupling(&self, i: usize, k: usize) -> Option<f64> {
        if i == k { return None; }
        self.couplings.get([i, k]).copied()
    }

    /// Iterate over the nonzero off-diagonal couplings in row `i`, in column
    /// order.
    pub fn couplings_of(&self, i: usize) -> impl Iterator<Item = f64> + '_ {
        self.couplings.row(i).into_iter()
            .enumerate()
            .filter(move |(k, J)| *k != i && **J != 0.0)
            .map(|(_, J)| *J)
    }
}

//! Spin Hamiltonian for a coupled set of spin-1/2 nuclei.
//!
//! The Hamiltonian is built from the [spin operators][crate::operators] as
//! ```text
//! H = Σ_i v_i Lz[i] + Σ_{i ≠ k} (J_ik / 2) (Lx[i]·Lx[k] + Ly[i]·Ly[k] + Lz[i]·Lz[k])
//! ```
//! where the second sum runs over *ordered* pairs, so that each coupled pair
//! contributes `J_ik I_i·I_k` in total.

use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use rayon::iter::{ IntoParallelIterator, ParallelIterator };
use crate::{
    error::{ NmrError, NmrResult },
    instrument::{ Instrument, NoInstrument, Stage, timed },
    operators::{ OpMatrix, SpinOperators },
    sparse::SpMat,
    system::SpinSystem,
};

/// Fixed divisor applied to every coupling constant in the coupling term.
pub const COUPLING_DIVISOR: f64 = 2.0;

/// Largest spin count for which [`Representation::Auto`] uses dense operator
/// arithmetic.
pub const DENSE_MAX_SPINS: usize = 8;

/// Largest spin count accepted by anything that materializes a dense
/// `2^n × 2^n` Hamiltonian.
pub const MAX_SPINS: usize = 12;

/// Relative tolerance for imaginary residue and Hermiticity checks.
pub const HERMITIAN_TOL: f64 = 1e-10;

/// Storage used while assembling the Hamiltonian.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Representation {
    /// Dense `ndarray` arithmetic; fastest for a handful of spins.
    Dense,
    /// Compressed-sparse-row arithmetic.
    Sparse,
    /// Dense up to [`DENSE_MAX_SPINS`], sparse beyond.
    #[default]
    Auto,
}

impl Representation {
    /// Resolve `Auto` to a concrete representation for `nspins`.
    pub fn resolve(self, nspins: usize) -> Self {
        match self {
            Self::Auto if nspins <= DENSE_MAX_SPINS => Self::Dense,
            Self::Auto => Self::Sparse,
            other => other,
        }
    }
}

impl std::str::FromStr for Representation {
    type Err = NmrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dense" => Ok(Self::Dense),
            "sparse" => Ok(Self::Sparse),
            "auto" => Ok(Self::Auto),
            other => Err(NmrError::invalid(format!(
                "unknown representation '{}'; expected dense, sparse, or auto",
                other,
            ))),
        }
    }
}

/// A real-symmetric spin Hamiltonian in units of Hz.
///
/// Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Hamiltonian {
    nspins: usize,
    matrix: nd::Array2<f64>,
}

impl Hamiltonian {
    /// Wrap an existing matrix, checking that it is `2^nspins` square, finite,
    /// and symmetric.
    pub fn from_matrix(nspins: usize, matrix: nd::Array2<f64>)
        -> NmrResult<Self>
    {
        check_nspins(nspins)?;
        let m = 1_usize << nspins;
        if matrix.dim() != (m, m) {
            return Err(NmrError::invalid(format!(
                "expected a {m}x{m} matrix for {} spins; got shape {:?}",
                nspins, matrix.shape(),
            )));
        }
        check_real_symmetric(&matrix)?;
        Ok(Self { nspins, matrix })
    }

    /// Number of nuclei.
    pub fn nspins(&self) -> usize { self.nspins }

    /// Matrix dimension, `2^n`.
    pub fn dim(&self) -> usize { self.matrix.nrows() }

    /// The Hamiltonian matrix.
    pub fn matrix(&self) -> &nd::Array2<f64> { &self.matrix }

    /// Unwrap into the underlying matrix.
    pub fn into_matrix(self) -> nd::Array2<f64> { self.matrix }
}

/// Fail with [`NmrError::InvalidArgument`] if any entry of a square matrix is
/// NaN or infinite, or with [`NmrError::NumericalAnomaly`] if it is not
/// symmetric to within [`HERMITIAN_TOL`] relative to its largest entry.
pub(crate) fn check_real_symmetric(H: &nd::Array2<f64>) -> NmrResult<()> {
    if let Some(((i, j), h)) = H.indexed_iter().find(|(_, h)| !h.is_finite()) {
        return Err(NmrError::invalid(format!(
            "Hamiltonian entry ({}, {}) is not finite: {}", i, j, h)));
    }
    let scale = H.iter().map(|h| h.abs()).fold(1.0, f64::max);
    let asym
        = H.indexed_iter()
        .map(|((i, j), h)| (h - H[[j, i]]).abs())
        .fold(0.0, f64::max);
    if asym > HERMITIAN_TOL * scale {
        return Err(NmrError::anomaly(format!(
            "Hamiltonian is not symmetric (max asymmetry {:e})", asym)));
    }
    Ok(())
}

fn check_nspins(nspins: usize) -> NmrResult<()> {
    if nspins < 1 {
        return Err(NmrError::invalid("spin count must be at least 1"));
    }
    if nspins > MAX_SPINS {
        return Err(NmrError::ScaleLimit { nspins, max: MAX_SPINS });
    }
    Ok(())
}

/// Build the Hamiltonian for a spin system, choosing the representation
/// automatically.
pub fn hamiltonian(system: &SpinSystem) -> NmrResult<Hamiltonian> {
    hamiltonian_with(system, Representation::Auto, &NoInstrument)
}

/// Build the Hamiltonian for a spin system with an explicit representation and
/// instrumentation.
///
/// Fails with [`NmrError::ScaleLimit`] above [`MAX_SPINS`] and with
/// [`NmrError::NumericalAnomaly`] if the assembled matrix has non-negligible
/// imaginary parts or is not Hermitian.
pub fn hamiltonian_with(
    system: &SpinSystem,
    repr: Representation,
    instr: &dyn Instrument,
) -> NmrResult<Hamiltonian>
{
    let nspins = system.nspins();
    check_nspins(nspins)?;
    let repr = repr.resolve(nspins);
    instr.note(Stage::Operators, &format!("{} spins, {:?} representation", nspins, repr));
    let H: nd::Array2<C64>
        = match repr {
            Representation::Sparse
                => build_operator::<SpMat>(system, instr)?.to_dense(),
            _ => build_operator::<nd::Array2<C64>>(system, instr)?,
        };
    let matrix = into_real_symmetric(&H)?;
    Ok(Hamiltonian { nspins, matrix })
}

/// Assemble the complex Hamiltonian operator in representation `M`.
///
/// No size limit is applied here; the caller decides whether the result may be
/// densified.
pub fn build_operator<M>(system: &SpinSystem, instr: &dyn Instrument)
    -> NmrResult<M>
where M: OpMatrix
{
    let n = system.nspins();
    let ops: SpinOperators<M>
        = timed(instr, Stage::Operators, || SpinOperators::new(n))?;
    let mut H: M
        = timed(instr, Stage::Zeeman, || {
            system.freqs().iter().zip(ops.lz())
                .try_fold(M::zeros(ops.dim()), |acc, (v, lz)| acc.add_scaled(*v, lz))
        })?;
    H = timed(instr, Stage::Coupling, || add_couplings(H, &ops, system))?;
    Ok(H)
}

fn add_couplings<M>(H: M, ops: &SpinOperators<M>, system: &SpinSystem)
    -> NmrResult<M>
where M: OpMatrix
{
    let n = system.nspins();
    // operators on distinct nuclei commute, so each unordered pair's product
    // serves both orderings
    let pairs: Vec<(usize, usize)>
        = (0..n).tuple_combinations()
        .filter(|&(i, k)| {
            system.coupling(i, k).unwrap_or(0.0) != 0.0
                || system.coupling(k, i).unwrap_or(0.0) != 0.0
        })
        .collect();
    let products: Vec<M>
        = pairs.clone().into_par_iter()
        .map(|(i, k)| ops.dot_pair(i, k))
        .collect::<NmrResult<_>>()?;
    let index_of = |i: usize, k: usize| -> Option<usize> {
        let key = if i < k { (i, k) } else { (k, i) };
        pairs.binary_search(&key).ok()
    };
    // summation order is fixed at (i, k) row-major over ordered pairs
    (0..n).cartesian_product(0..n)
        .filter(|(i, k)| i != k)
        .try_fold(H, |acc, (i, k)| {
            match (index_of(i, k), system.coupling(i, k)) {
                (Some(p), Some(J)) if J != 0.0
                    => acc.add_scaled(J / COUPLING_DIVISOR, &products[p]),
                _ => Ok(acc),
            }
        })
}

/// Check that a complex Hamiltonian is Hermitian with negligible imaginary
/// parts and return its real part.
pub fn into_real_symmetric(H: &nd::Array2<C64>) -> NmrResult<nd::Array2<f64>> {
    if !H.is_square() {
        return Err(NmrError::invalid(format!(
            "Hamiltonian must be square; got shape {:?}", H.shape())));
    }
    let scale = H.iter().map(|h| h.norm()).fold(1.0, f64::max);
    let tol = HERMITIAN_TOL * scale;
    let herm
        = H.indexed_iter()
        .map(|((i, j), h)| (h - H[[j, i]].conj()).norm())
        .fold(0.0, f64::max);
    if herm > tol {
        return Err(NmrError::anomaly(format!(
            "Hamiltonian is not Hermitian (max deviation {:e})", herm)));
    }
    let imag = H.iter().map(|h| h.im.abs()).fold(0.0, f64::max);
    if imag > tol {
        return Err(NmrError::anomaly(format!(
            "Hamiltonian has imaginary residue {:e} above tolerance {:e}",
            imag, tol,
        )));
    }
    Ok(H.mapv(|h| h.re))
}

//! Second-order spectra from exact diagonalization of the spin Hamiltonian.
//!
//! The Hamiltonian is diagonalized densely: iterative sparse eigensolvers do not
//! reliably return the complete spectrum, and every eigenpair is needed to form
//! the transition intensities. Memory and time therefore grow exponentially in
//! the number of spins, and systems above [`MAX_SPINS`] are refused with
//! [`NmrError::ScaleLimit`].

use ndarray as nd;
use ndarray_linalg::{ Eigh, UPLO };
use crate::{
    error::{ NmrError, NmrResult },
    hamiltonian::{ Representation, check_real_symmetric, hamiltonian_with },
    instrument::{ Instrument, NoInstrument, Stage, timed },
    peaks::Peak,
    system::SpinSystem,
    transitions::transition_matrix_sparse,
};
pub use crate::hamiltonian::MAX_SPINS;

/// Default minimum transition intensity for a peak to be reported.
pub const MIN_INTENSITY: f64 = 0.01;

/// Settings for the quantum-mechanical path.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpectrumParams {
    /// Transitions with squared intensity at or below this value are dropped.
    pub cutoff: f64,
    /// Storage used to assemble the Hamiltonian.
    pub representation: Representation,
}

impl Default for SpectrumParams {
    fn default() -> Self {
        Self { cutoff: MIN_INTENSITY, representation: Representation::Auto }
    }
}

/// Extract the peak list of a real-symmetric Hamiltonian for `nspins` spin-1/2
/// nuclei.
///
/// Peaks come out in eigenstate-pair order `(i, j)`, `i < j`, with eigenstates
/// sorted by ascending energy; they are not sorted by frequency.
pub fn simsignals(H: &nd::Array2<f64>, nspins: usize) -> NmrResult<Vec<Peak>> {
    simsignals_with(H, nspins, MIN_INTENSITY, &NoInstrument)
}

/// [`simsignals`] with an explicit intensity cutoff and instrumentation.
pub fn simsignals_with(
    H: &nd::Array2<f64>,
    nspins: usize,
    cutoff: f64,
    instr: &dyn Instrument,
) -> NmrResult<Vec<Peak>>
{
    if nspins < 1 {
        return Err(NmrError::invalid("spin count must be at least 1"));
    }
    if nspins > MAX_SPINS {
        return Err(NmrError::ScaleLimit { nspins, max: MAX_SPINS });
    }
    let m = 1_usize << nspins;
    if H.dim() != (m, m) {
        return Err(NmrError::invalid(format!(
            "a {}-spin Hamiltonian must be {m}x{m}; got shape {:?}",
            nspins, H.shape(),
        )));
    }
    check_real_symmetric(H)?;
    if !cutoff.is_finite() || cutoff < 0.0 {
        return Err(NmrError::invalid(format!(
            "intensity cutoff must be finite and non-negative; got {}", cutoff)));
    }

    let (E, V): (nd::Array1<f64>, nd::Array2<f64>)
        = timed(instr, Stage::Eigensystem, || H.eigh(UPLO::Lower))
        .map_err(|err| NmrError::anomaly(format!("diagonalization failed: {}", err)))?;
    if E.iter().chain(V.iter()).any(|x| !x.is_finite()) {
        return Err(NmrError::anomaly("eigensystem contains non-finite values"));
    }

    // n nonzeros per row, so T·V is accumulated row by row from the sparse form
    let T = timed(instr, Stage::TransitionMatrix, || transition_matrix_sparse(nspins))?;
    let I: nd::Array2<f64>
        = timed(instr, Stage::Intensities, || {
            let mut TV: nd::Array2<f64> = nd::Array2::zeros((m, m));
            for (i, j, t) in T.triplets() {
                TV.row_mut(i).scaled_add(t.re, &V.row(j));
            }
            V.t().dot(&TV).mapv(|x| x * x)
        });

    let peaks: Vec<Peak>
        = timed(instr, Stage::Collect, || {
            let mut peaks: Vec<Peak> = Vec::new();
            for i in 0..m - 1 {
                for j in i + 1..m {
                    if I[[i, j]] > cutoff {
                        peaks.push(Peak::new((E[i] - E[j]).abs(), I[[i, j]]));
                    }
                }
            }
            peaks
        });
    instr.note(Stage::Collect, &format!("{} transitions above {}", peaks.len(), cutoff));
    Ok(peaks)
}

/// Build the Hamiltonian of `system` and extract its peak list with default
/// settings.
pub fn nspinspec(system: &SpinSystem) -> NmrResult<Vec<Peak>> {
    nspinspec_with(system, &SpectrumParams::default(), &NoInstrument)
}

/// [`nspinspec`] with explicit settings and instrumentation.
pub fn nspinspec_with(
    system: &SpinSystem,
    params: &SpectrumParams,
    instr: &dyn Instrument,
) -> NmrResult<Vec<Peak>>
{
    let H = hamiltonian_with(system, params.representation, instr)?;
    simsignals_with(H.matrix(), H.nspins(), params.cutoff, instr)
}

//! Peak lists: sorting, consolidation, and intensity normalization.
//!
//! No function here mutates its input unless its name says so; each
//! transformation returns a new list.

use crate::{
    error::{ NmrError, NmrResult },
    instrument::{ Instrument, NoInstrument, Stage, timed },
};

/// A single spectral line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Peak {
    /// Frequency in Hz.
    pub freq: f64,
    /// Relative intensity.
    pub intensity: f64,
}

impl Peak {
    /// Create a new `Peak`.
    pub fn new(freq: f64, intensity: f64) -> Self { Self { freq, intensity } }

    /// Return `self` as a `(frequency, intensity)` pair.
    pub fn pair(self) -> (f64, f64) { (self.freq, self.intensity) }
}

impl From<(f64, f64)> for Peak {
    fn from(vi: (f64, f64)) -> Self {
        let (freq, intensity) = vi;
        Self { freq, intensity }
    }
}

impl From<Peak> for (f64, f64) {
    fn from(peak: Peak) -> Self { peak.pair() }
}

/// Return a copy of `peaks` sorted by ascending frequency, ties broken by
/// ascending intensity.
pub fn sort_peaks(peaks: &[Peak]) -> Vec<Peak> {
    let mut sorted = peaks.to_vec();
    sorted.sort_by(|a, b| {
        a.freq.total_cmp(&b.freq).then(a.intensity.total_cmp(&b.intensity))
    });
    sorted
}

/// Merge peaks with equal frequencies by summing their intensities.
///
/// `sorted_peaks` must already be sorted by frequency (see [`sort_peaks`]); the
/// output keeps that order and has one peak per distinct frequency. Frequencies
/// are compared exactly, which is consistent with peak lists generated by
/// repeated halving splits where equal lines come out bit-identical.
pub fn reduce_peaks(sorted_peaks: &[Peak]) -> Vec<Peak> {
    reduce_peaks_with(sorted_peaks, &NoInstrument)
}

/// [`reduce_peaks`] with instrumentation.
pub fn reduce_peaks_with(sorted_peaks: &[Peak], instr: &dyn Instrument)
    -> Vec<Peak>
{
    timed(instr, Stage::Reduce, || {
        let mut res: Vec<Peak> = Vec::with_capacity(sorted_peaks.len());
        for peak in sorted_peaks.iter() {
            match res.last_mut() {
                Some(last) if last.freq == peak.freq => {
                    last.intensity += peak.intensity;
                },
                _ => { res.push(*peak); },
            }
        }
        res
    })
}

/// Sum of all intensities.
pub fn total_intensity(peaks: &[Peak]) -> f64 {
    peaks.iter().map(|p| p.intensity).sum()
}

/// Return a copy of `intensities` rescaled so that it sums to `n`.
///
/// Fails if the original sum is zero or not finite.
pub fn normalize(intensities: &[f64], n: f64) -> NmrResult<Vec<f64>> {
    let mut out = intensities.to_vec();
    normalize_in_place(&mut out, n)?;
    Ok(out)
}

/// Rescale `intensities` in place so that they sum to `n`.
///
/// Each element is divided by `sum / n`. On failure `intensities` is left
/// untouched.
pub fn normalize_in_place(intensities: &mut [f64], n: f64) -> NmrResult<()> {
    let sum: f64 = intensities.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return Err(NmrError::invalid(format!(
            "cannot normalize intensities with sum {}", sum)));
    }
    let factor = sum / n;
    intensities.iter_mut().for_each(|x| { *x /= factor; });
    Ok(())
}

/// Return a copy of `peaks` with intensities rescaled to sum to `n`.
pub fn normalize_peaks(peaks: &[Peak], n: f64) -> NmrResult<Vec<Peak>> {
    let intensities: Vec<f64> = peaks.iter().map(|p| p.intensity).collect();
    let scaled = normalize(&intensities, n)?;
    Ok(
        peaks.iter().zip(scaled)
            .map(|(p, i)| Peak::new(p.freq, i))
            .collect()
    )
}

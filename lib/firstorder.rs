//! First-order (weak coupling) multiplets built by repeated doublet splitting.
//!
//! These bypass the Hamiltonian entirely: every coupling to a single nucleus
//! splits each line into two half-intensity lines `J` apart.

use ndarray as nd;
use crate::{
    error::NmrResult,
    instrument::{ Instrument, NoInstrument, Stage, timed },
    peaks::{ Peak, reduce_peaks_with, sort_peaks },
    system::SpinSystem,
};

/// A coupling of constant `j` (Hz) to `nuclei` equivalent nuclei.
///
/// A triplet from a 7 Hz coupling to two equivalent nuclei is
/// `Coupling { j: 7.0, nuclei: 2 }`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coupling {
    pub j: f64,
    pub nuclei: usize,
}

impl Coupling {
    /// Create a new `Coupling`.
    pub fn new(j: f64, nuclei: usize) -> Self { Self { j, nuclei } }
}

impl From<(f64, usize)> for Coupling {
    fn from(jn: (f64, usize)) -> Self {
        let (j, nuclei) = jn;
        Self { j, nuclei }
    }
}

/// Split every peak `(v, I)` into `(v - J/2, I/2)` and `(v + J/2, I/2)`.
pub fn doublet(peaks: &[Peak], J: f64) -> Vec<Peak> {
    peaks.iter()
        .flat_map(|p| {
            [
                Peak::new(p.freq - J / 2.0, p.intensity / 2.0),
                Peak::new(p.freq + J / 2.0, p.intensity / 2.0),
            ]
        })
        .collect()
}

/// Split a single signal by every coupling, applying [`doublet`] once per
/// coupled nucleus.
///
/// The result is unsorted and may contain repeated frequencies. Couplings may
/// be given in any order; the multiset of output peaks is the same.
pub fn multiplet<I, C>(signal: Peak, couplings: I) -> Vec<Peak>
where
    I: IntoIterator<Item = C>,
    C: Into<Coupling>,
{
    couplings.into_iter()
        .map(|c| c.into())
        .fold(vec![signal], |acc, c: Coupling| {
            (0..c.nuclei).fold(acc, |peaks, _| doublet(&peaks, c.j))
        })
}

/// [`multiplet`] followed by sorting and [reduction][crate::peaks::reduce_peaks].
pub fn first_order<I, C>(signal: Peak, couplings: I) -> Vec<Peak>
where
    I: IntoIterator<Item = C>,
    C: Into<Coupling>,
{
    reduce_peaks_with(&sort_peaks(&multiplet(signal, couplings)), &NoInstrument)
}

/// First-order spectrum of a whole spin system, taking the same inputs as the
/// quantum-mechanical path.
///
/// Each nucleus `i` starts as a unit-intensity line at `v[i]` and is split once
/// by every nonzero off-diagonal entry of row `i` of the coupling matrix, in
/// column order. All multiplets are then pooled, sorted, and reduced.
pub fn first_order_spin_system(system: &SpinSystem) -> Vec<Peak> {
    first_order_spin_system_with(system, &NoInstrument)
}

/// [`first_order_spin_system`] with instrumentation.
pub fn first_order_spin_system_with(system: &SpinSystem, instr: &dyn Instrument)
    -> Vec<Peak>
{
    let pooled: Vec<Peak>
        = timed(instr, Stage::FirstOrder, || {
            system.freqs().iter().enumerate()
                .flat_map(|(i, v)| {
                    let couplings
                        = system.couplings_of(i).map(|J| Coupling::new(J, 1));
                    multiplet(Peak::new(*v, 1.0), couplings)
                })
                .collect()
        });
    reduce_peaks_with(&sort_peaks(&pooled), instr)
}

/// Validate raw `(v, J)` arrays and compute [`first_order_spin_system`].
pub fn first_order_from_arrays(
    freqs: &[f64],
    couplings: &nd::Array2<f64>,
) -> NmrResult<Vec<Peak>>
{
    let system
        = SpinSystem::new(nd::Array1::from(freqs.to_vec()), couplings.clone())?;
    Ok(first_order_spin_system(&system))
}

#[cfg(test)]
mod test {
    use itertools::Itertools;
    use crate::peaks::{ reduce_peaks, total_intensity };
    use super::*;

    fn plist(pairs: &[(f64, f64)]) -> Vec<Peak> {
        pairs.iter().copied().map(Peak::from).collect()
    }

    #[test]
    fn doublet_symmetric() {
        let d = sort_peaks(&doublet(&[Peak::new(100.0, 1.0)], 10.0));
        assert_eq!(d, plist(&[(95.0, 0.5), (105.0, 0.5)]));
        assert!(doublet(&[], 3.0).is_empty());
    }

    #[test]
    fn propanol_multiplets() {
        let J12 = Coupling::new(7.0, 2);
        let m1 = multiplet(Peak::new(1200.0, 2.0), [J12]);
        let m2 = multiplet(Peak::new(450.0, 2.0), [J12, Coupling::new(7.0, 3)]);
        let m3 = multiplet(Peak::new(300.0, 3.0), [J12]);
        assert_eq!(m1.len(), 4);
        assert_eq!(m2.len(), 32);
        assert_eq!(m3.len(), 4);
        let all: Vec<Peak> = m1.into_iter().chain(m2).chain(m3).collect();
        let expected = plist(&[
            (293.0, 0.75), (300.0, 1.5), (307.0, 0.75),
            (432.5, 0.0625), (439.5, 0.3125), (446.5, 0.625),
            (453.5, 0.625), (460.5, 0.3125), (467.5, 0.0625),
            (1193.0, 0.5), (1200.0, 1.0), (1207.0, 0.5),
        ]);
        assert_eq!(reduce_peaks(&sort_peaks(&all)), expected);
    }

    #[test]
    fn first_order_triplet() {
        let t = first_order(Peak::new(300.0, 1.0), [Coupling::new(7.0, 2)]);
        assert_eq!(t, plist(&[(293.0, 0.25), (300.0, 0.5), (307.0, 0.25)]));
        let untouched = first_order(Peak::new(300.0, 1.0), Vec::<Coupling>::new());
        assert_eq!(untouched, plist(&[(300.0, 1.0)]));
    }

    #[test]
    fn intensity_conserved_and_order_independent() {
        let signal = Peak::new(512.0, 3.0);
        let couplings: [(f64, usize); 3] = [(8.0, 2), (5.0, 3), (1.25, 1)];
        let reference = sort_peaks(&multiplet(signal, couplings));
        assert_eq!(reference.len(), 64);
        assert!((total_intensity(&reference) - 3.0).abs() < 1e-12);
        for perm in couplings.iter().copied().permutations(couplings.len()) {
            let other = sort_peaks(&multiplet(signal, perm));
            assert!(
                reference.iter().zip(&other)
                    .all(|(a, b)| {
                        (a.freq - b.freq).abs() < 1e-9
                            && (a.intensity - b.intensity).abs() < 1e-12
                    })
            );
        }
    }

    #[test]
    fn spin_system_rioux() {
        let system
            = SpinSystem::from_pairs(
                &[430.0, 265.0, 300.0],
                [(0, 1, 7.0), (0, 2, 15.0), (1, 2, 1.5)],
            )
            .unwrap();
        let expected = plist(&[
            (260.75, 0.25), (262.25, 0.25), (267.75, 0.25), (269.25, 0.25),
            (291.75, 0.25), (293.25, 0.25), (306.75, 0.25), (308.25, 0.25),
            (419.0, 0.25), (426.0, 0.25), (434.0, 0.25), (441.0, 0.25),
        ]);
        let spectrum = first_order_spin_system(&system);
        assert_eq!(spectrum.len(), expected.len());
        for (p, q) in spectrum.iter().zip(&expected) {
            assert!((p.freq - q.freq).abs() < 0.005);
            assert!((p.intensity - q.intensity).abs() < 0.005);
        }
    }

    #[test]
    fn from_arrays_validates() {
        let J = nd::array![[0.0, 7.0], [6.0, 0.0]];
        assert!(first_order_from_arrays(&[100.0, 200.0], &J).is_err());
        let J = nd::array![[5.0, 0.0], [0.0, 0.0]];
        let spectrum = first_order_from_arrays(&[100.0, 200.0], &J).unwrap();
        assert_eq!(spectrum, plist(&[(100.0, 1.0), (200.0, 1.0)]));
    }
}

//! TOML description of a spin system and how to simulate it.
//!
//! ```toml
//! frequencies = [430.0, 265.0, 300.0]
//!
//! [[couplings]]
//! between = [0, 1]
//! j = 7.0
//!
//! [simulation]
//! method = "qm"             # or "first-order"
//! representation = "auto"   # "dense" | "sparse"
//! cutoff = 0.01
//! normalize = 1.0           # optional target total intensity
//!
//! [lineshape]
//! linewidth = 0.5
//! points = 800
//! limits = [200.0, 500.0]   # optional
//! ```
//!
//! Only `frequencies` is required.

use std::{ path::Path, str::FromStr };
use ndarray as nd;
use serde::Deserialize;
use crate::{
    error::{ NmrError, NmrResult },
    firstorder::first_order_spin_system_with,
    hamiltonian::Representation,
    instrument::{ Instrument, NoInstrument },
    lineshape::{ Limits, lineshape },
    peaks::{ Peak, normalize_peaks, sort_peaks },
    spectrum::{ SpectrumParams, nspinspec_with },
    system::SpinSystem,
};

/// Default Lorentzian full width at half height (Hz).
pub const DEFAULT_LINEWIDTH: f64 = 1.0;

/// Default number of lineshape points.
pub const DEFAULT_POINTS: usize = 800;

/// How peaks are computed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Method {
    /// Exact diagonalization of the spin Hamiltonian.
    #[default]
    Qm,
    /// First-order multiplet splitting.
    FirstOrder,
}

impl FromStr for Method {
    type Err = NmrError;

    fn from_str(s: &str) -> NmrResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "qm" | "quantum" => Ok(Self::Qm),
            "first-order" | "first_order" | "firstorder" => Ok(Self::FirstOrder),
            other => Err(NmrError::Config(format!(
                "unknown method '{}'; expected qm or first-order", other))),
        }
    }
}

/// Lineshape rendering settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineshapeConfig {
    pub linewidth: f64,
    pub points: usize,
    pub limits: Option<Limits>,
}

impl Default for LineshapeConfig {
    fn default() -> Self {
        Self { linewidth: DEFAULT_LINEWIDTH, points: DEFAULT_POINTS, limits: None }
    }
}

/// A fully validated simulation description.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub system: SpinSystem,
    pub method: Method,
    pub params: SpectrumParams,
    pub normalize: Option<f64>,
    pub lineshape: LineshapeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    frequencies: Vec<f64>,
    #[serde(default)]
    couplings: Vec<RawCoupling>,
    #[serde(default)]
    simulation: RawSimulation,
    #[serde(default)]
    lineshape: RawLineshape,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCoupling {
    between: [usize; 2],
    j: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSimulation {
    method: Option<String>,
    representation: Option<String>,
    cutoff: Option<f64>,
    normalize: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLineshape {
    linewidth: Option<f64>,
    points: Option<usize>,
    limits: Option<Vec<f64>>,
}

impl SimConfig {
    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are rejected.
    pub fn from_toml_str(s: &str) -> NmrResult<Self> {
        let raw: RawConfig = toml::from_str(s)?;

        let n = raw.frequencies.len();
        let mut J: nd::Array2<f64> = nd::Array2::zeros((n, n));
        for RawCoupling { between: [i, k], j } in raw.couplings.into_iter() {
            if i >= n || k >= n {
                return Err(NmrError::Config(format!(
                    "coupling indices must be in 0..{}; got [{}, {}]", n, i, k)));
            }
            if i == k {
                return Err(NmrError::Config(
                    "'between' must name two distinct nuclei".into()));
            }
            J[[i, k]] = j;
            J[[k, i]] = j;
        }
        let system = SpinSystem::new(nd::Array1::from(raw.frequencies), J)?;

        let RawSimulation { method, representation, cutoff, normalize }
            = raw.simulation;
        let method
            = method.as_deref()
            .map(str::parse::<Method>)
            .transpose()?
            .unwrap_or_default();
        let mut params = SpectrumParams::default();
        if let Some(r) = representation.as_deref() {
            params.representation = r.parse()?;
        }
        if let Some(cutoff) = cutoff {
            if !cutoff.is_finite() || cutoff < 0.0 {
                return Err(NmrError::Config(format!(
                    "simulation.cutoff must be non-negative; got {}", cutoff)));
            }
            params.cutoff = cutoff;
        }
        if normalize.is_some_and(|x| !x.is_finite() || x <= 0.0) {
            return Err(NmrError::Config(
                "simulation.normalize must be positive".into()));
        }

        let RawLineshape { linewidth, points, limits } = raw.lineshape;
        let mut lineshape = LineshapeConfig::default();
        if let Some(w) = linewidth { lineshape.linewidth = w; }
        if let Some(p) = points { lineshape.points = p; }
        if let Some(ab) = limits {
            if ab.len() != 2 {
                return Err(NmrError::invalid("lineshape.limits must be two numbers"));
            }
            lineshape.limits = Some(Limits::new(ab[0], ab[1])?);
        }

        Ok(Self { system, method, params, normalize, lineshape })
    }

    /// Read and parse a TOML file.
    pub fn load<P>(path: P) -> NmrResult<Self>
    where P: AsRef<Path>
    {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Compute the peak list with the configured method, sorted by frequency
    /// and normalized if requested.
    pub fn run(&self) -> NmrResult<Vec<Peak>> { self.run_with(&NoInstrument) }

    /// [`Self::run`] with instrumentation.
    pub fn run_with(&self, instr: &dyn Instrument) -> NmrResult<Vec<Peak>> {
        let peaks
            = match self.method {
                Method::Qm
                    => sort_peaks(&nspinspec_with(&self.system, &self.params, instr)?),
                Method::FirstOrder
                    => first_order_spin_system_with(&self.system, instr),
            };
        match self.normalize {
            Some(n) => normalize_peaks(&peaks, n),
            None => Ok(peaks),
        }
    }

    /// Lineshape of `peaks` with the configured settings.
    ///
    /// An empty peak list gives empty `x` and `y` arrays.
    pub fn lineshape(&self, peaks: &[Peak])
        -> NmrResult<(nd::Array1<f64>, nd::Array1<f64>)>
    {
        if peaks.is_empty() {
            return Ok((nd::Array1::zeros(0), nd::Array1::zeros(0)));
        }
        let LineshapeConfig { linewidth, points, limits } = self.lineshape;
        lineshape(peaks, linewidth, points, limits)
    }
}

impl FromStr for SimConfig {
    type Err = NmrError;

    fn from_str(s: &str) -> NmrResult<Self> { Self::from_toml_str(s) }
}

#[cfg(test)]
mod test {
    use super::*;

    const RIOUX: &str = r#"
        frequencies = [430, 265, 300]

        [[couplings]]
        between = [0, 1]
        j = 7

        [[couplings]]
        between = [0, 2]
        j = 15.0

        [[couplings]]
        between = [2, 1]
        j = 1.5

        [simulation]
        method = "first-order"

        [lineshape]
        linewidth = 0.5
        points = 100
        limits = [500, 200]
    "#;

    #[test]
    fn parse_full() {
        let cfg = SimConfig::from_toml_str(RIOUX).unwrap();
        assert_eq!(cfg.system.nspins(), 3);
        assert_eq!(cfg.system.coupling(1, 2), Some(1.5));
        assert_eq!(cfg.system.coupling(2, 1), Some(1.5));
        assert_eq!(cfg.method, Method::FirstOrder);
        assert_eq!(cfg.params, SpectrumParams::default());
        assert_eq!(cfg.lineshape.points, 100);
        assert_eq!(cfg.lineshape.limits, Limits::new(200.0, 500.0).ok());
        let peaks = cfg.run().unwrap();
        assert_eq!(peaks.len(), 12);
        assert_eq!(peaks[0], Peak::new(260.75, 0.25));
        let (x, y) = cfg.lineshape(&peaks).unwrap();
        assert_eq!((x.len(), y.len()), (100, 100));
    }

    #[test]
    fn defaults_and_normalization() {
        let cfg
            = SimConfig::from_toml_str(
                "frequencies = [100.0, 150.0]\n\
                 [simulation]\n\
                 normalize = 2.0\n\
                 representation = \"sparse\"\n"
            )
            .unwrap();
        assert_eq!(cfg.method, Method::Qm);
        assert_eq!(cfg.params.representation, Representation::Sparse);
        assert_eq!(cfg.lineshape, LineshapeConfig::default());
        let peaks = cfg.run().unwrap();
        assert_eq!(peaks.len(), 4);
        let total: f64 = peaks.iter().map(|p| p.intensity).sum();
        assert!((total - 2.0).abs() < 1e-12);
        assert!((peaks[0].freq - 100.0).abs() < 1e-9);
        assert!((peaks[3].freq - 150.0).abs() < 1e-9);
    }

    #[test]
    fn empty_peak_list_gives_empty_lineshape() {
        let cfg
            = SimConfig::from_toml_str(
                "frequencies = [100.0]\n[simulation]\ncutoff = 5.0\n")
            .unwrap();
        let peaks = cfg.run().unwrap();
        assert!(peaks.is_empty());
        let (x, y) = cfg.lineshape(&peaks).unwrap();
        assert_eq!((x.len(), y.len()), (0, 0));
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(
            SimConfig::from_toml_str("frequencies = [1.0"),
            Err(NmrError::ConfigSyntax(_))
        ));
        assert!(matches!(
            SimConfig::from_toml_str("couplings = []"),
            Err(NmrError::ConfigSyntax(_))
        ));
        assert!(SimConfig::from_toml_str("frequencies = []").is_err());
        assert!(SimConfig::from_toml_str("frequencies = [\"a\"]").is_err());
        let bad_index
            = "frequencies = [1.0, 2.0]\n[[couplings]]\nbetween = [0, 2]\nj = 1.0\n";
        assert!(SimConfig::from_toml_str(bad_index).is_err());
        let self_coupling
            = "frequencies = [1.0, 2.0]\n[[couplings]]\nbetween = [1, 1]\nj = 1.0\n";
        assert!(SimConfig::from_toml_str(self_coupling).is_err());
        let bad_method = "frequencies = [1.0]\n[simulation]\nmethod = \"guess\"\n";
        assert!(SimConfig::from_toml_str(bad_method).is_err());
        let bad_limits = "frequencies = [1.0]\n[lineshape]\nlimits = [1.0]\n";
        assert!(matches!(
            SimConfig::from_toml_str(bad_limits),
            Err(NmrError::InvalidArgument(_))
        ));
        let short_pair
            = "frequencies = [1.0, 2.0]\n[[couplings]]\nbetween = [0]\nj = 1.0\n";
        assert!(SimConfig::from_toml_str(short_pair).is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let misspelled
            = "frequencies = [100.0, 110.0]\n\
               [simulation]\n\
               cutof = 0.5\n\
               methd = \"first-order\"\n";
        assert!(matches!(
            SimConfig::from_toml_str(misspelled),
            Err(NmrError::ConfigSyntax(_))
        ));
        let stray_top = "frequencies = [100.0]\nfrequency = [1.0]\n";
        assert!(matches!(
            SimConfig::from_toml_str(stray_top),
            Err(NmrError::ConfigSyntax(_))
        ));
        let stray_coupling
            = "frequencies = [1.0, 2.0]\n[[couplings]]\nbetween = [0, 1]\nJ = 1.0\n";
        assert!(SimConfig::from_toml_str(stray_coupling).is_err());
        let stray_lineshape = "frequencies = [1.0]\n[lineshape]\nwidth = 2.0\n";
        assert!(matches!(
            SimConfig::from_toml_str(stray_lineshape),
            Err(NmrError::ConfigSyntax(_))
        ));
    }
}

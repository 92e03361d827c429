//! Plot-ready data for peak lists: summed Lorentzian lineshapes and stick
//! spectra. Nothing here renders; output is a pair of `x`/`y` arrays.

use std::str::FromStr;
use ndarray as nd;
use crate::{
    error::{ NmrError, NmrResult },
    peaks::Peak,
};

/// Margin (Hz) added on each side of the outermost peaks when no limits are
/// given.
pub const DEFAULT_MARGIN: f64 = 50.0;

/// Height of the two baseline points appended to a stick spectrum.
pub const STICK_BASELINE: f64 = 0.001;

/// Frequency window `[lo, hi]` with `lo <= hi`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Limits {
    lo: f64,
    hi: f64,
}

impl Limits {
    /// Create a new `Limits`, swapping `a` and `b` if given in reverse.
    pub fn new(a: f64, b: f64) -> NmrResult<Self> {
        if !a.is_finite() || !b.is_finite() {
            return Err(NmrError::invalid(format!(
                "limits must be finite numbers; got ({}, {})", a, b)));
        }
        Ok(if a <= b { Self { lo: a, hi: b } } else { Self { lo: b, hi: a } })
    }

    /// Parse a pair of numbers separated by a comma and/or whitespace,
    /// optionally wrapped in parentheses or brackets, e.g. `"(200, 500)"`.
    pub fn parse(s: &str) -> NmrResult<Self> {
        let inner
            = s.trim()
            .trim_start_matches(['(', '['])
            .trim_end_matches([')', ']']);
        let parts: Vec<&str>
            = inner.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 2 {
            return Err(NmrError::invalid(format!(
                "limits must be two numbers; got {:?}", s)));
        }
        let a: f64 = parts[0].parse()
            .map_err(|_| NmrError::invalid(format!("bad limit {:?}", parts[0])))?;
        let b: f64 = parts[1].parse()
            .map_err(|_| NmrError::invalid(format!("bad limit {:?}", parts[1])))?;
        Self::new(a, b)
    }

    /// `[min_freq - 50, max_freq + 50]` over `peaks`.
    pub fn around(peaks: &[Peak]) -> NmrResult<Self> {
        if peaks.is_empty() {
            return Err(NmrError::invalid("cannot derive limits from an empty peak list"));
        }
        let (min, max)
            = peaks.iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
                (min.min(p.freq), max.max(p.freq))
            });
        Self::new(min - DEFAULT_MARGIN, max + DEFAULT_MARGIN)
    }

    pub fn lo(&self) -> f64 { self.lo }

    pub fn hi(&self) -> f64 { self.hi }
}

impl FromStr for Limits {
    type Err = NmrError;

    fn from_str(s: &str) -> NmrResult<Self> { Self::parse(s) }
}

/// Lorentzian line of intensity `I` centered on `v0` with full width `w` at
/// half height, evaluated at `x`.
pub fn lorentz(x: f64, v0: f64, I: f64, w: f64) -> f64 {
    let hw2 = (w / 2.0).powi(2);
    (0.5 / w) * I * hw2 / (hw2 + (x - v0).powi(2))
}

/// Sum one Lorentzian per peak over every point of `x`.
pub fn add_lorentzians(x: &nd::Array1<f64>, peaks: &[Peak], w: f64)
    -> nd::Array1<f64>
{
    x.mapv(|xk| {
        peaks.iter().map(|p| lorentz(xk, p.freq, p.intensity, w)).sum()
    })
}

/// Discretized lineshape of `peaks` over `points` evenly spaced frequencies.
///
/// Uses [`Limits::around`] when `limits` is `None`.
pub fn lineshape(
    peaks: &[Peak],
    w: f64,
    points: usize,
    limits: Option<Limits>,
) -> NmrResult<(nd::Array1<f64>, nd::Array1<f64>)>
{
    if !(w.is_finite() && w > 0.0) {
        return Err(NmrError::invalid(format!(
            "linewidth must be positive and finite; got {}", w)));
    }
    if points < 2 {
        return Err(NmrError::invalid(format!(
            "lineshape needs at least 2 points; got {}", points)));
    }
    if peaks.is_empty() {
        return Err(NmrError::invalid("cannot compute the lineshape of an empty peak list"));
    }
    let limits = match limits {
        Some(l) => l,
        None => Limits::around(peaks)?,
    };
    let x: nd::Array1<f64> = nd::Array1::linspace(limits.lo, limits.hi, points);
    let y = add_lorentzians(&x, peaks, w);
    Ok((x, y))
}

/// Stick spectrum: peak frequencies and intensities with two small baseline
/// points appended at the window edges.
pub fn stick(peaks: &[Peak], limits: Option<Limits>)
    -> NmrResult<(nd::Array1<f64>, nd::Array1<f64>)>
{
    let limits = match limits {
        Some(l) => l,
        None => Limits::around(peaks)?,
    };
    let x: nd::Array1<f64>
        = peaks.iter().map(|p| p.freq)
        .chain([limits.lo, limits.hi])
        .collect();
    let y: nd::Array1<f64>
        = peaks.iter().map(|p| p.intensity)
        .chain([STICK_BASELINE; 2])
        .collect();
    Ok((x, y))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn limits_reorder_and_parse() {
        let l = Limits::new(500.0, 200.0).unwrap();
        assert_eq!((l.lo(), l.hi()), (200.0, 500.0));
        assert_eq!(Limits::parse("(200, 500)").unwrap(), l);
        assert_eq!("[500 200]".parse::<Limits>().unwrap(), l);
        assert!(Limits::parse("200").is_err());
        assert!(Limits::parse("a, b").is_err());
        assert!(Limits::parse("1, 2, 3").is_err());
        assert!(Limits::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn limits_around_peaks() {
        let peaks = [Peak::new(300.0, 1.0), Peak::new(120.0, 1.0)];
        let l = Limits::around(&peaks).unwrap();
        assert_eq!((l.lo(), l.hi()), (70.0, 350.0));
        assert!(Limits::around(&[]).is_err());
    }

    #[test]
    fn lorentz_peak_height() {
        let w = 2.0;
        assert!((lorentz(100.0, 100.0, 1.0, w) - 0.25).abs() < 1e-15);
        assert!((lorentz(101.0, 100.0, 1.0, w) - 0.125).abs() < 1e-15);
        assert!((lorentz(99.0, 100.0, 1.0, w) - 0.125).abs() < 1e-15);
    }

    #[test]
    fn lineshape_sums_lines() {
        let peaks = [Peak::new(100.0, 1.0), Peak::new(110.0, 2.0)];
        let limits = Limits::new(90.0, 120.0).ok();
        let (x, y) = lineshape(&peaks, 1.0, 31, limits).unwrap();
        assert_eq!(x.len(), 31);
        assert_eq!((x[0], x[30]), (90.0, 120.0));
        let expect10 = lorentz(x[10], 100.0, 1.0, 1.0) + lorentz(x[10], 110.0, 2.0, 1.0);
        assert!((y[10] - expect10).abs() < 1e-15);
        assert!(y[20] > y[10]);
    }

    #[test]
    fn lineshape_rejects_bad_input() {
        let peaks = [Peak::new(100.0, 1.0)];
        assert!(lineshape(&peaks, 0.0, 10, None).is_err());
        assert!(lineshape(&peaks, 1.0, 1, None).is_err());
        assert!(lineshape(&[], 1.0, 10, None).is_err());
    }

    #[test]
    fn stick_baseline() {
        let peaks = [Peak::new(100.0, 0.5), Peak::new(150.0, 1.5)];
        let (x, y) = stick(&peaks, None).unwrap();
        assert_eq!(x.to_vec(), vec![100.0, 150.0, 50.0, 200.0]);
        assert_eq!(y.to_vec(), vec![0.5, 1.5, STICK_BASELINE, STICK_BASELINE]);
    }
}

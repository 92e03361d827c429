#![allow(non_snake_case)]

use std::path::PathBuf;
use anyhow::{ Context, bail };
use ndarray as nd;
use nmr_sim::{
    mkdir,
    write_npz,
    config::SimConfig,
    instrument::TracingInstrument,
    peaks::total_intensity,
};

const USAGE: &str = "usage: nmrspec <config.toml> [outdir]";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(config_path) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };
    let outdir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("output"));
    if args.next().is_some() {
        bail!(USAGE);
    }

    let config
        = SimConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    tracing::info!(
        nspins = config.system.nspins(),
        method = ?config.method,
        "simulating"
    );
    let peaks = config.run_with(&TracingInstrument)?;
    tracing::info!(
        npeaks = peaks.len(),
        total = total_intensity(&peaks),
        "done"
    );
    for p in peaks.iter() {
        println!("{:12.4} {:10.6}", p.freq, p.intensity);
    }

    if peaks.is_empty() {
        tracing::warn!("no peaks above the cutoff; writing an empty lineshape");
    }
    let (x, y) = config.lineshape(&peaks)?;
    let freq: nd::Array1<f64> = peaks.iter().map(|p| p.freq).collect();
    let intensity: nd::Array1<f64> = peaks.iter().map(|p| p.intensity).collect();
    mkdir!(outdir)?;
    write_npz!(
        outdir.join("spectrum.npz"),
        arrays: {
            "freq" => &freq,
            "intensity" => &intensity,
            "x" => &x,
            "y" => &y,
        }
    )?;
    tracing::info!(path = %outdir.join("spectrum.npz").display(), "wrote spectrum");
    Ok(())
}

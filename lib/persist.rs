//! Saving and loading Hamiltonians as `.npy` files keyed by spin count.

use std::path::{ Path, PathBuf };
use ndarray as nd;
use ndarray_npy::{ read_npy, write_npy };
use crate::{
    error::NmrResult,
    hamiltonian::Hamiltonian,
};

/// Path of the stored Hamiltonian for `nspins` spins under `dir`.
pub fn h_path<P>(dir: P, nspins: usize) -> PathBuf
where P: AsRef<Path>
{
    dir.as_ref().join(format!("h{}.npy", nspins))
}

/// Write `H` to `<dir>/h<nspins>.npy`, creating `dir` if needed.
pub fn h_save<P>(dir: P, nspins: usize, H: &nd::Array2<f64>) -> NmrResult<PathBuf>
where P: AsRef<Path>
{
    std::fs::create_dir_all(dir.as_ref())?;
    let path = h_path(dir, nspins);
    write_npy(&path, H)?;
    Ok(path)
}

/// Read `<dir>/h<nspins>.npy`, checking that it is a valid `nspins`-spin
/// Hamiltonian.
pub fn h_load<P>(dir: P, nspins: usize) -> NmrResult<Hamiltonian>
where P: AsRef<Path>
{
    let H: nd::Array2<f64> = read_npy(h_path(dir, nspins))?;
    Hamiltonian::from_matrix(nspins, H)
}

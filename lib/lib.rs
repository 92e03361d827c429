#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! Simulation of NMR spectra for coupled spin-1/2 systems, either exactly by
//! diagonalizing the spin Hamiltonian or approximately by first-order
//! multiplet splitting.

pub mod error;
pub mod utils;
pub mod instrument;
pub mod system;
pub mod sparse;
pub mod operators;
pub mod hamiltonian;
pub mod transitions;
pub mod peaks;
pub mod spectrum;
pub mod firstorder;
pub mod lineshape;
pub mod persist;
pub mod config;

pub use error::{ NmrError, NmrResult };
pub use peaks::Peak;
pub use system::SpinSystem;

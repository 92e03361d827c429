//! Cartesian spin operators for systems of spin-1/2 nuclei.
//!
//! For nucleus `k` of `n`, the operator `L_α[k]` is the `n`-fold Kronecker
//! product
//! ```text
//! 1 ⊗ ... ⊗ 1 ⊗ σ_α ⊗ 1 ⊗ ... ⊗ 1
//! ```
//! with `σ_α` in position `k`, where the `σ_α` are the Pauli matrices scaled
//! by 1/2.

use ndarray::{ self as nd, linalg::kron };
use num_complex::Complex64 as C64;
use crate::{
    error::{ NmrError, NmrResult },
    sparse::SpMat,
};

/* Matrix backends ************************************************************/

/// Operations needed to assemble spin operators and Hamiltonians, abstracted
/// over dense and sparse storage.
pub trait OpMatrix: Clone + Send + Sync {
    /// Build from a small dense array.
    fn from_array(a: &nd::Array2<C64>) -> Self;

    /// `n × n` identity.
    fn identity(n: usize) -> Self;

    /// `n × n` zero matrix.
    fn zeros(n: usize) -> Self;

    /// Kronecker product `self ⊗ rhs`.
    fn kron(&self, rhs: &Self) -> Self;

    /// Matrix product `self · rhs`.
    fn matmul(&self, rhs: &Self) -> NmrResult<Self>;

    /// `self + c * rhs`.
    fn add_scaled(&self, c: f64, rhs: &Self) -> NmrResult<Self>;

    /// Convert to a dense array.
    fn to_dense(&self) -> nd::Array2<C64>;

    /// Number of rows.
    fn nrows(&self) -> usize;
}

impl OpMatrix for nd::Array2<C64> {
    fn from_array(a: &nd::Array2<C64>) -> Self { a.clone() }

    fn identity(n: usize) -> Self { nd::Array2::eye(n) }

    fn zeros(n: usize) -> Self { nd::Array2::zeros((n, n)) }

    fn kron(&self, rhs: &Self) -> Self { kron(self, rhs) }

    fn matmul(&self, rhs: &Self) -> NmrResult<Self> {
        if self.ncols() != rhs.nrows() {
            return Err(NmrError::invalid(format!(
                "cannot multiply shapes {:?} and {:?}", self.dim(), rhs.dim())));
        }
        Ok(self.dot(rhs))
    }

    fn add_scaled(&self, c: f64, rhs: &Self) -> NmrResult<Self> {
        if self.dim() != rhs.dim() {
            return Err(NmrError::invalid(format!(
                "cannot add shapes {:?} and {:?}", self.dim(), rhs.dim())));
        }
        let mut out = self.clone();
        out.scaled_add(C64::from(c), rhs);
        Ok(out)
    }

    fn to_dense(&self) -> nd::Array2<C64> { self.clone() }

    fn nrows(&self) -> usize { self.shape()[0] }
}

impl OpMatrix for SpMat {
    fn from_array(a: &nd::Array2<C64>) -> Self { SpMat::from_dense(a) }

    fn identity(n: usize) -> Self { SpMat::eye(n) }

    fn zeros(n: usize) -> Self { SpMat::zeros(n, n) }

    fn kron(&self, rhs: &Self) -> Self { SpMat::kron(self, rhs) }

    fn matmul(&self, rhs: &Self) -> NmrResult<Self> { self.dot(rhs) }

    fn add_scaled(&self, c: f64, rhs: &Self) -> NmrResult<Self> {
        self.add(&rhs.scale(C64::from(c)))
    }

    fn to_dense(&self) -> nd::Array2<C64> { SpMat::to_dense(self) }

    fn nrows(&self) -> usize { self.dim().0 }
}

/* Single-spin matrices *******************************************************/

/// `σ_x / 2`.
pub fn sigma_x() -> nd::Array2<C64> {
    nd::array![
        [C64::new(0.0, 0.0), C64::new(0.5, 0.0)],
        [C64::new(0.5, 0.0), C64::new(0.0, 0.0)],
    ]
}

/// `σ_y / 2`.
pub fn sigma_y() -> nd::Array2<C64> {
    nd::array![
        [C64::new(0.0, 0.0), C64::new(0.0, -0.5)],
        [C64::new(0.0, 0.5), C64::new(0.0, 0.0)],
    ]
}

/// `σ_z / 2`.
pub fn sigma_z() -> nd::Array2<C64> {
    nd::array![
        [C64::new(0.5, 0.0), C64::new(0.0, 0.0)],
        [C64::new(0.0, 0.0), C64::new(-0.5, 0.0)],
    ]
}

/* Operator sets **************************************************************/

/// Cartesian components of a spin operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis { X, Y, Z }

impl Axis {
    /// Return the 2 × 2 single-spin matrix for this component.
    pub fn single(self) -> nd::Array2<C64> {
        match self {
            Self::X => sigma_x(),
            Self::Y => sigma_y(),
            Self::Z => sigma_z(),
        }
    }
}

/// Build the `2^nspins × 2^nspins` operator for component `axis` of nucleus
/// `k`, multiplying left to right by the single-spin matrix in position `k`
/// and the identity everywhere else.
pub fn spin_operator<M>(nspins: usize, k: usize, axis: Axis) -> NmrResult<M>
where M: OpMatrix
{
    if nspins < 1 {
        return Err(NmrError::invalid("spin count must be at least 1"));
    }
    if k >= nspins {
        return Err(NmrError::invalid(format!(
            "nucleus index {} out of range for {} spins", k, nspins)));
    }
    let sigma = M::from_array(&axis.single());
    let unit = M::identity(2);
    let mut op: Option<M> = None;
    for j in 0..nspins {
        let factor = if j == k { &sigma } else { &unit };
        op = Some(match op {
            Some(acc) => acc.kron(factor),
            None => factor.clone(),
        });
    }
    // nspins >= 1, so at least one factor was applied
    op.ok_or_else(|| NmrError::invalid("empty tensor product"))
}

/// The full set of Cartesian spin operators `Lx[k]`, `Ly[k]`, `Lz[k]` for every
/// nucleus `k` of an `n`-spin system.
///
/// Built once per Hamiltonian and never shared between systems.
#[derive(Clone, Debug)]
pub struct SpinOperators<M>
where M: OpMatrix
{
    pub(crate) lx: Vec<M>,
    pub(crate) ly: Vec<M>,
    pub(crate) lz: Vec<M>,
}

impl<M> SpinOperators<M>
where M: OpMatrix
{
    /// Create all `3 n` operators for an `n`-spin system.
    pub fn new(nspins: usize) -> NmrResult<Self> {
        if nspins < 1 {
            return Err(NmrError::invalid("spin count must be at least 1"));
        }
        let build = |axis: Axis| -> NmrResult<Vec<M>> {
            (0..nspins).map(|k| spin_operator(nspins, k, axis)).collect()
        };
        Ok(Self { lx: build(Axis::X)?, ly: build(Axis::Y)?, lz: build(Axis::Z)? })
    }

    /// Number of nuclei.
    pub fn nspins(&self) -> usize { self.lz.len() }

    /// Dimension of each operator, `2^n`.
    pub fn dim(&self) -> usize { self.lz[0].nrows() }

    /// `Lx` operators, one per nucleus.
    pub fn lx(&self) -> &[M] { &self.lx }

    /// `Ly` operators, one per nucleus.
    pub fn ly(&self) -> &[M] { &self.ly }

    /// `Lz` operators, one per nucleus.
    pub fn lz(&self) -> &[M] { &self.lz }

    /// Get the operator for one component of nucleus `k`.
    pub fn get(&self, axis: Axis, k: usize) -> Option<&M> {
        match axis {
            Axis::X => self.lx.get(k),
            Axis::Y => self.ly.get(k),
            Axis::Z => self.lz.get(k),
        }
    }

    /// The scalar product `Lx[i]·Lx[k] + Ly[i]·Ly[k] + Lz[i]·Lz[k]`.
    ///
    /// *Panics* if either index is out of range.
    pub fn dot_pair(&self, i: usize, k: usize) -> NmrResult<M> {
        self.lx[i].matmul(&self.lx[k])?
            .add_scaled(1.0, &self.ly[i].matmul(&self.ly[k])?)?
            .add_scaled(1.0, &self.lz[i].matmul(&self.lz[k])?)
    }
}

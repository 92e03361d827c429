//! Error taxonomy shared by all simulation stages.

use thiserror::Error;

/// Everything that can go wrong while building or analyzing a spin system.
#[derive(Debug, Error)]
pub enum NmrError {
    /// Malformed caller input: bad spin counts, mismatched shapes, asymmetric
    /// couplings, unusable plotting limits, and the like.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A computed quantity violates a structural property it must have, e.g. a
    /// Hamiltonian that is not Hermitian.
    #[error("numerical anomaly: {0}")]
    NumericalAnomaly(String),

    /// The requested system is too large for dense diagonalization.
    #[error("{nspins} spins exceeds the maximum of {max} for exact diagonalization")]
    ScaleLimit { nspins: usize, max: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error writing array: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    #[error("error reading array: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    #[error("error writing archive: {0}")]
    NpzWrite(#[from] ndarray_npy::WriteNpzError),

    #[error("error reading archive: {0}")]
    NpzRead(#[from] ndarray_npy::ReadNpzError),

    #[error("config error: {0}")]
    Config(String),

    #[error("config syntax error: {0}")]
    ConfigSyntax(#[from] toml::de::Error),
}

impl NmrError {
    pub(crate) fn invalid<S>(msg: S) -> Self
    where S: Into<String>
    {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn anomaly<S>(msg: S) -> Self
    where S: Into<String>
    {
        Self::NumericalAnomaly(msg.into())
    }
}

pub type NmrResult<T> = Result<T, NmrError>;

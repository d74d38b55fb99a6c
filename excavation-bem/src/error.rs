//! Error types for the BEM solver

use thiserror::Error;

/// Main error type for BEM operations
#[derive(Error, Debug)]
pub enum BEMError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Element list is empty - nothing to assemble")]
    EmptyElementList,

    #[error("Numerical singularity: {0}")]
    NumericalSingularity(String),

    #[error("Singular influence matrix: {0}")]
    SingularMatrix(String),

    #[error("Convergence failed after {iterations} iterations (relative residual {residual:.3e})")]
    ConvergenceFailed { iterations: usize, residual: f64 },

    #[error("Non-finite value encountered in {0}")]
    NonFinite(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Analysis cancelled before it started")]
    Cancelled,

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for BEM operations
pub type BEMResult<T> = Result<T, BEMError>;

use thiserror::Error;

/// A result type for kernel evaluation and matrix inversion
pub type Result<T> = std::result::Result<T, KernelError>;

/// An error when building a kernel, evaluating a Gram matrix or inverting a covariance matrix
#[derive(Error, Debug)]
pub enum KernelError {
    /// When a kernel hyperparameter is out of its domain
    #[error("Invalid parameter: {0}")]
    InvalidParameterError(String),
    /// When a configuration argument (ie inversion method name) is unknown
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),
    /// When an array does not have the expected shape
    #[error("Shape error: {0}")]
    ShapeError(String),
    /// When a covariance matrix has negative variance terms
    #[error("Invalid covariance matrix: {0}")]
    InvalidCovarianceError(String),
    /// When a matrix factor cannot be inverted
    #[error("Singular matrix: {0}")]
    SingularMatrixError(String),
    /// When a kernel evaluation does not give a finite value
    #[error("Non finite value: {0}")]
    NonFiniteError(String),
    /// When an exponential overflows and no stable fallback was requested
    #[error("Overflow error: {0}")]
    OverflowError(String),
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When an ndarray reshaping fails
    #[error(transparent)]
    NdarrayShapeError(#[from] ndarray::ShapeError),
    /// When min/max search fails (empty input or undefined order)
    #[error(transparent)]
    MinMaxError(#[from] ndarray_stats::errors::MinMaxError),
    /// When the worker thread pool cannot be started
    #[error("Thread pool error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
}

//! This library implements the numerical building blocks of [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process)
//! covariance computations:
//!
//! * a radial basis function (squared exponential) covariance kernel [`Rbf`],
//!   checked at construction through [`RbfParams`],
//! * a [`GramEvaluator`] computing Gram matrices row by row within a [`WorkerPool`],
//! * an [`Inverter`] implementing several matrix inversion methods (see [`InversionMethod`])
//!   all guarded by a conditioning check (see [`is_invertible`] and [`check_valid_cov`]),
//! * array plumbing used to feed kernels: dimension coercion ([`to_2d`], [`to_1d`]),
//!   one-hot encoding ([`onehot`], [`reverse_onehot`]) and activations ([`sigmoid`], [`softmax`]).
//!
//! ```no_run
//! use egobox_kernels::{GramEvaluator, InversionMethod, Inverter, Rbf, check_valid_cov};
//! use ndarray::array;
//!
//! let x = array![[0.0], [1.0], [2.0], [3.0]];
//! let evaluator = GramEvaluator::new(Rbf::new(1.0, 2.0).expect("valid RBF parameters"));
//! let cov = evaluator.covariance(&x).expect("Gram matrix");
//! check_valid_cov(&cov).expect("valid covariance");
//!
//! let inv = Inverter::new(InversionMethod::Cholesky)
//!     .invert(&cov)
//!     .expect("covariance inversion");
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod activations;
mod encoding;
mod errors;
mod gram;
mod inversion;
pub mod kernels;
pub mod linalg;
mod pool;
mod shapes;
mod stability;

pub use activations::*;
pub use encoding::*;
pub use errors::*;
pub use gram::*;
pub use inversion::*;
pub use kernels::{DistanceFunction, Rbf, RbfParams, RbfValidParams};
pub use pool::*;
pub use shapes::*;
pub use stability::*;

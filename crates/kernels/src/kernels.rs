//! A module for covariance kernels used to build Gram matrices.
//!
//! The following kernel is implemented:
//! * radial basis function (aka squared exponential).

use crate::errors::{KernelError, Result};
use crate::shapes::to_1d;
use linfa::{Float, ParamGuard};
use ndarray::{ArrayBase, Data, Dimension, Ix1};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trait for covariance functions `k(alpha, beta)` between two points
pub trait DistanceFunction<F: Float>: Clone + Send + Sync + fmt::Display {
    /// Covariance value between points `alpha` and `beta`.
    ///
    /// Points are expected to have the same number of components.
    fn distance(
        &self,
        alpha: &ArrayBase<impl Data<Elem = F>, Ix1>,
        beta: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<F>;

    /// Covariance value between points given with any shape flattenable to one dimension
    /// (see [`to_1d`]). Both points are coerced the same way.
    fn covariance<D1: Dimension, D2: Dimension>(
        &self,
        alpha: &ArrayBase<impl Data<Elem = F>, D1>,
        beta: &ArrayBase<impl Data<Elem = F>, D2>,
    ) -> Result<F> {
        self.distance(&to_1d(alpha)?, &to_1d(beta)?)
    }
}

/// A set of validated RBF kernel parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct RbfValidParams<F: Float> {
    /// Lengthscale of the kernel
    pub(crate) lengthscale: F,
    /// Variance of the kernel, ie the covariance of a point with itself
    pub(crate) variance: F,
}

impl<F: Float> Default for RbfValidParams<F> {
    fn default() -> RbfValidParams<F> {
        RbfValidParams {
            lengthscale: F::one(),
            variance: F::one(),
        }
    }
}

impl<F: Float> RbfValidParams<F> {
    /// Get lengthscale
    pub fn lengthscale(&self) -> F {
        self.lengthscale
    }

    /// Get variance
    pub fn variance(&self) -> F {
        self.variance
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified to build an [`Rbf`] kernel.
pub struct RbfParams<F: Float>(RbfValidParams<F>);

impl<F: Float> RbfParams<F> {
    /// A constructor for RBF parameters given `lengthscale` and `variance`
    pub fn new(lengthscale: F, variance: F) -> RbfParams<F> {
        Self(RbfValidParams {
            lengthscale,
            variance,
        })
    }

    /// Set lengthscale.
    pub fn lengthscale(mut self, lengthscale: F) -> Self {
        self.0.lengthscale = lengthscale;
        self
    }

    /// Set variance.
    pub fn variance(mut self, variance: F) -> Self {
        self.0.variance = variance;
        self
    }

    /// Check parameters and build the kernel
    pub fn build(self) -> Result<Rbf<F>> {
        Ok(Rbf::from(self.check()?))
    }
}

impl<F: Float> Default for RbfParams<F> {
    fn default() -> Self {
        Self(RbfValidParams::default())
    }
}

impl<F: Float> From<RbfValidParams<F>> for RbfParams<F> {
    fn from(valid: RbfValidParams<F>) -> Self {
        RbfParams(valid)
    }
}

impl<F: Float> ParamGuard for RbfParams<F> {
    type Checked = RbfValidParams<F>;
    type Error = KernelError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        // negated comparisons reject NaN as well
        if !(self.0.lengthscale > F::zero()) {
            return Err(KernelError::InvalidParameterError(format!(
                "Lengthscale parameter must be greater than zero, got {}",
                self.0.lengthscale
            )));
        }
        if !(self.0.variance > F::zero()) {
            return Err(KernelError::InvalidParameterError(format!(
                "Kernel variance parameter must be greater than zero, got {}",
                self.0.variance
            )));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// Radial basis function (squared exponential) kernel
///
/// ```text
/// k(alpha, beta) = variance * exp( - ||alpha - beta||^2 / (2 * lengthscale^2) )
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Rbf<F: Float> {
    params: RbfValidParams<F>,
}

impl<F: Float> Rbf<F> {
    /// RBF kernel parameters to be checked with [`RbfParams::build`]
    pub fn params(lengthscale: F, variance: F) -> RbfParams<F> {
        RbfParams::new(lengthscale, variance)
    }

    /// Build an RBF kernel, fails when `lengthscale` or `variance` is not strictly positive
    pub fn new(lengthscale: F, variance: F) -> Result<Self> {
        Self::params(lengthscale, variance).build()
    }

    /// Kernel lengthscale
    pub fn lengthscale(&self) -> F {
        self.params.lengthscale
    }

    /// Kernel variance
    pub fn variance(&self) -> F {
        self.params.variance
    }
}

impl<F: Float> From<RbfValidParams<F>> for Rbf<F> {
    fn from(params: RbfValidParams<F>) -> Self {
        Rbf { params }
    }
}

impl<F: Float> DistanceFunction<F> for Rbf<F> {
    fn distance(
        &self,
        alpha: &ArrayBase<impl Data<Elem = F>, Ix1>,
        beta: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<F> {
        if alpha.len() != beta.len() {
            return Err(KernelError::ShapeError(format!(
                "Points should have the same number of components, got {} and {}",
                alpha.len(),
                beta.len()
            )));
        }
        let d = (alpha - beta).mapv(|v| v * v).sum();
        let amp = F::cast(-0.5) / (self.params.lengthscale * self.params.lengthscale);
        let k = self.params.variance * F::exp(amp * d);
        if !k.is_finite() {
            return Err(KernelError::NonFiniteError(format!(
                "RBF kernel evaluation gives {k}"
            )));
        }
        Ok(k)
    }
}

impl<F: Float> fmt::Display for Rbf<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Rbf(lengthscale={}, variance={})",
            self.params.lengthscale, self.params.variance
        )
    }
}

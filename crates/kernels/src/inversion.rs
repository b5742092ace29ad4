//! Matrix inversion strategies.
//!
//! An [`Inverter`] is built once with one [`InversionMethod`] and then used to invert
//! square matrices, typically covariance matrices built with a
//! [`GramEvaluator`](crate::GramEvaluator). All methods check the conditioning of
//! the matrix beforehand and log a warning when the inversion may be inaccurate.
//! Decomposition failures (non positive definite matrix for Cholesky, singular
//! factors, ...) are returned as errors.
use crate::errors::{KernelError, Result};
use crate::linalg::{check_square, inverse, lu, lu_solve, triangular_inverse, LuDecomposition};
use crate::pool::WorkerPool;
use crate::stability::{is_invertible, InvertibilityStrength};
use linfa::Float;
use linfa_linalg::cholesky::Cholesky;
use linfa_linalg::svd::SVD;
use linfa_linalg::triangular::{SolveTriangular, UPLO};
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Singular values below this ratio of the greatest one are ignored by the pseudo inverse
pub const PINV_RCOND: f64 = 1e-15;

/// Matrix inversion algorithms
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(into = "String"),
    serde(try_from = "String")
)]
pub enum InversionMethod {
    /// General inverse (`inv`)
    #[default]
    Inverse,
    /// Moore-Penrose pseudo inverse computed from SVD (`pinv`)
    PseudoInverse,
    /// Solve `A.X = I` with LU factorization (`solve`)
    Solve,
    /// Inverse from Cholesky factor, symmetric positive definite matrices only (`cholesky`)
    Cholesky,
    /// Inverse from SVD factors `V.S^-1.U^T` (`svd`)
    Svd,
    /// Inverse from LU factors `U^-1.L^-1.P^-1` (`lu`)
    Lu,
    /// Same as [`InversionMethod::Lu`] with the three factors inverted concurrently (`mp_lu`)
    ParallelLu,
}

impl InversionMethod {
    /// All available methods
    pub const ALL: [InversionMethod; 7] = [
        InversionMethod::Inverse,
        InversionMethod::PseudoInverse,
        InversionMethod::Solve,
        InversionMethod::Cholesky,
        InversionMethod::Svd,
        InversionMethod::Lu,
        InversionMethod::ParallelLu,
    ];

    /// Short name of the method
    pub fn name(&self) -> &'static str {
        match self {
            InversionMethod::Inverse => "inv",
            InversionMethod::PseudoInverse => "pinv",
            InversionMethod::Solve => "solve",
            InversionMethod::Cholesky => "cholesky",
            InversionMethod::Svd => "svd",
            InversionMethod::Lu => "lu",
            InversionMethod::ParallelLu => "mp_lu",
        }
    }
}

impl fmt::Display for InversionMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for InversionMethod {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        InversionMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                KernelError::InvalidArgumentError(format!(
                    "Invalid inversion method '{s}', should be one of {}",
                    InversionMethod::ALL.map(|m| format!("'{m}'")).join(", ")
                ))
            })
    }
}

impl From<InversionMethod> for String {
    fn from(item: InversionMethod) -> String {
        item.name().to_string()
    }
}

impl TryFrom<String> for InversionMethod {
    type Error = KernelError;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// A matrix inverter using the method chosen at construction.
///
/// The worker pool is only started by the [`InversionMethod::ParallelLu`] method.
#[derive(Clone, Debug, Default)]
pub struct Inverter {
    method: InversionMethod,
    pool: WorkerPool,
}

impl Inverter {
    /// Constructor of an inverter using the given `method`
    pub fn new(method: InversionMethod) -> Self {
        Inverter {
            method,
            pool: WorkerPool::default(),
        }
    }

    /// Constructor from the method name, one of
    /// `inv`, `pinv`, `solve`, `cholesky`, `svd`, `lu`, `mp_lu`
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    /// Set the pool used by the parallel methods
    pub fn with_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = pool;
        self
    }

    /// Inversion method
    pub fn method(&self) -> InversionMethod {
        self.method
    }

    /// Stop the worker threads if any, they are restarted on demand
    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }

    /// Inverse of the square matrix `a`
    pub fn invert<F: Float>(&self, a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let n = check_square(a)?;
        if !is_invertible(a, InvertibilityStrength::Condition) {
            warn!("Matrix has high condition number, inverting it may result in errors");
        }
        debug!("Invert {}x{} matrix with {}", a.nrows(), a.ncols(), self.method);
        match self.method {
            InversionMethod::Inverse => inverse(a),
            InversionMethod::PseudoInverse => pinv(a),
            InversionMethod::Solve => lu_solve(a, &Array2::<F>::eye(n)),
            InversionMethod::Cholesky => cholesky_inverse(a),
            InversionMethod::Svd => svd_inverse(a),
            InversionMethod::Lu => lu_inverse(a),
            InversionMethod::ParallelLu => self.parallel_lu_inverse(a),
        }
    }

    fn parallel_lu_inverse<F: Float>(
        &self,
        a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Array2<F>> {
        let LuDecomposition { p, l, u } = lu(a)?;
        let (inv_u, (inv_l, inv_p)) = self.pool.install(|| {
            rayon::join(
                || triangular_inverse(&u, UPLO::Upper),
                || {
                    rayon::join(
                        || triangular_inverse(&l, UPLO::Lower),
                        || permutation_inverse(&p),
                    )
                },
            )
        })?;
        Ok(inv_u?.dot(&inv_l?).dot(&inv_p))
    }
}

/// Permutation matrices are orthogonal
fn permutation_inverse<F: Float>(p: &Array2<F>) -> Array2<F> {
    p.t().to_owned()
}

fn lu_inverse<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
    let LuDecomposition { p, l, u } = lu(a)?;
    let inv_u = triangular_inverse(&u, UPLO::Upper)?;
    let inv_l = triangular_inverse(&l, UPLO::Lower)?;
    let inv_p = permutation_inverse(&p);
    Ok(inv_u.dot(&inv_l).dot(&inv_p))
}

fn cholesky_inverse<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
    let l = a.cholesky()?;
    let inv_l = l.solve_triangular(&Array2::<F>::eye(a.nrows()), UPLO::Lower)?;
    Ok(inv_l.t().dot(&inv_l))
}

fn svd_factors<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<(Array2<F>, Array1<F>, Array2<F>)> {
    match a.svd(true, true)? {
        (Some(u), s, Some(vt)) => Ok((u, s, vt)),
        _ => Err(KernelError::InvalidValueError(
            "SVD factors were not computed".to_string(),
        )),
    }
}

fn svd_inverse<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
    let (u, s, vt) = svd_factors(a)?;
    if s.iter().any(|&v| v == F::zero()) {
        return Err(KernelError::SingularMatrixError(
            "null singular value".to_string(),
        ));
    }
    let v_sinv = vt.t().to_owned() / &s;
    Ok(v_sinv.dot(&u.t()))
}

fn pinv<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
    let (u, s, vt) = svd_factors(a)?;
    let smax = s.fold(F::zero(), |acc, &v| acc.max(v));
    let cutoff = F::cast(PINV_RCOND) * smax;
    let s_inv = s.mapv(|v| if v > cutoff { F::one() / v } else { F::zero() });
    let v_sinv = vt.t().to_owned() * &s_inv;
    Ok(v_sinv.dot(&u.t()))
}

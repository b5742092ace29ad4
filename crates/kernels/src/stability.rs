//! Numerical stability checks run before inverting covariance matrices.
use crate::errors::{KernelError, Result};
use crate::linalg::{lu, matrix_rank, rcond};
use linfa::Float;
use linfa_linalg::norm::Norm;
use log::{debug, warn};
use ndarray::{ArrayBase, Data, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strength of the test deciding whether a matrix is safely invertible
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(into = "String"),
    serde(try_from = "String")
)]
pub enum InvertibilityStrength {
    /// Determinant is not null relatively to the Hadamard bound `prod ||row_i||`,
    /// ie `ln|det| > ln(eps) + sum ln||row_i||`
    Cramer,
    /// Matrix is square and full rank
    Rank,
    /// Reciprocal condition number is greater than machine epsilon
    #[default]
    Condition,
}

impl fmt::Display for InvertibilityStrength {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            InvertibilityStrength::Cramer => "cramer",
            InvertibilityStrength::Rank => "rank",
            InvertibilityStrength::Condition => "condition",
        };
        write!(f, "{name}")
    }
}

impl FromStr for InvertibilityStrength {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cramer" => Ok(InvertibilityStrength::Cramer),
            "rank" => Ok(InvertibilityStrength::Rank),
            "condition" => Ok(InvertibilityStrength::Condition),
            _ => Err(KernelError::InvalidArgumentError(format!(
                "Bad invertibility strength '{s}', should be one of 'cramer', 'rank' or 'condition'"
            ))),
        }
    }
}

impl From<InvertibilityStrength> for String {
    fn from(item: InvertibilityStrength) -> String {
        item.to_string()
    }
}

impl TryFrom<String> for InvertibilityStrength {
    type Error = KernelError;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Returns whether the matrix `a` is safely invertible according to the given `strength`.
///
/// Non square or empty matrices are never invertible.
pub fn is_invertible<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    strength: InvertibilityStrength,
) -> bool {
    if a.nrows() != a.ncols() || a.is_empty() {
        return false;
    }
    let res = match strength {
        // compared in log space, det and bound over/underflow for large matrices
        InvertibilityStrength::Cramer => lu(a).map(|lu| match lu.ln_abs_det() {
            Some(ln_det) => {
                let ln_bound = a
                    .rows()
                    .into_iter()
                    .fold(F::zero(), |acc, row| acc + row.norm_l2().ln());
                ln_det > F::epsilon().ln() + ln_bound
            }
            None => false,
        }),
        InvertibilityStrength::Rank => matrix_rank(a).map(|rank| rank == a.nrows()),
        InvertibilityStrength::Condition => rcond(a).map(|rc| rc >= F::epsilon()),
    };
    res.unwrap_or_else(|err| {
        debug!("Invertibility check ({strength}) failed: {err}");
        false
    })
}

/// Safety checks of a covariance matrix.
///
/// A warning is logged when the matrix is ill-conditioned and its inversion may be
/// inaccurate. Negative variances on the diagonal are reported as a
/// [`KernelError::InvalidCovarianceError`].
pub fn check_valid_cov<F: Float>(cov: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
    if !is_invertible(cov, InvertibilityStrength::Condition) {
        warn!("Covariance matrix has high condition number, inverting it may result in errors");
    }
    let n_neg = cov.diag().iter().filter(|&&v| v < F::zero()).count();
    if n_neg > 0 {
        return Err(KernelError::InvalidCovarianceError(format!(
            "{n_neg} negative value(s) in diagonal of covariance matrix, \
             likely caused by kernel inversion instability, check kernel variance"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use paste::paste;
    use rand_xoshiro::Xoshiro256Plus;

    macro_rules! test_invertibility {
        ($strength:ident) => {
            paste! {
                #[test]
                fn [<test_is_invertible_ $strength:snake>]() {
                    let strength = InvertibilityStrength::$strength;
                    assert!(is_invertible(&Array2::<f64>::eye(3), strength));
                    assert!(is_invertible(&array![[4., 1.], [1., 3.]], strength));
                    assert!(!is_invertible(&array![[1., 2.], [2., 4.]], strength));
                    assert!(!is_invertible(&array![[1., 2., 3.], [4., 5., 6.]], strength));
                    assert!(!is_invertible(&Array2::<f64>::zeros((0, 0)), strength));
                }
            }
        };
    }

    test_invertibility!(Cramer);
    test_invertibility!(Rank);
    test_invertibility!(Condition);

    #[test]
    fn test_cramer_scale_invariance() {
        let tiny = array![[1e-10, 0.], [0., 1e-10]];
        assert!(is_invertible(&tiny, InvertibilityStrength::Cramer));

        // determinants out of the f64 range
        let n = 200;
        for scale in [1e-2, 1e2, 1e10] {
            let a = Array2::<f64>::eye(n) * scale;
            assert!(is_invertible(&a, InvertibilityStrength::Cramer));
            assert!(is_invertible(&a, InvertibilityStrength::Condition));
        }
    }

    #[test]
    fn test_cramer_large_matrices() {
        let n = 150;
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let a = Array2::random_using((n, n), Uniform::new(-1., 1.), &mut rng)
            + Array2::<f64>::eye(n) * n as f64;
        for scale in [1e-3, 1., 1e3] {
            assert!(is_invertible(&(&a * scale), InvertibilityStrength::Cramer));
        }

        let mut singular = a.clone();
        singular.column_mut(7).fill(0.);
        assert!(!is_invertible(&singular, InvertibilityStrength::Cramer));
        assert!(!is_invertible(
            &(singular * 1e10),
            InvertibilityStrength::Cramer
        ));
    }

    #[test]
    fn test_ill_conditioned() {
        let a = array![[1., 0.], [0., 1e-17]];
        assert!(!is_invertible(&a, InvertibilityStrength::Condition));
        assert!(is_invertible(&a, InvertibilityStrength::Cramer));
        // warning only
        assert!(check_valid_cov(&a).is_ok());
    }

    #[test]
    fn test_negative_variance() {
        let cov = array![[1., 0.1], [0.1, -0.5]];
        assert!(matches!(
            check_valid_cov(&cov),
            Err(KernelError::InvalidCovarianceError(_))
        ));
    }

    #[test]
    fn test_strength_names() {
        assert_eq!(
            InvertibilityStrength::Rank,
            "rank".parse::<InvertibilityStrength>().unwrap()
        );
        assert_eq!(InvertibilityStrength::default().to_string(), "condition");
        assert!(matches!(
            "det".parse::<InvertibilityStrength>(),
            Err(KernelError::InvalidArgumentError(_))
        ));
    }
}

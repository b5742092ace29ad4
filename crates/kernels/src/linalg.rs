//! Dense linear algebra helpers completing `linfa-linalg`: LU factorization and
//! general inverse (computed with `nalgebra` in double precision), triangular
//! inverse, and singular values based rank and condition estimates.
use crate::errors::{KernelError, Result};
use linfa::Float;
use linfa_linalg::svd::SVD;
use linfa_linalg::triangular::{SolveTriangular, UPLO};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};

/// LU factorization with partial pivoting `a = p.l.u`
#[derive(Debug, Clone)]
pub struct LuDecomposition<F: Float> {
    /// Permutation matrix
    pub p: Array2<F>,
    /// Lower triangular factor with unit diagonal
    pub l: Array2<F>,
    /// Upper triangular factor
    pub u: Array2<F>,
}

impl<F: Float> LuDecomposition<F> {
    /// Logarithm of the absolute value of the determinant of the factorized matrix,
    /// `None` when a pivot is null.
    pub fn ln_abs_det(&self) -> Option<F> {
        self.u.diag().iter().try_fold(F::zero(), |acc, &v| {
            if v == F::zero() {
                None
            } else {
                Some(acc + v.abs().ln())
            }
        })
    }
}

pub(crate) fn check_square<F>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<usize> {
    if a.nrows() != a.ncols() {
        return Err(KernelError::ShapeError(format!(
            "Expected a square matrix, got ({}, {})",
            a.nrows(),
            a.ncols()
        )));
    }
    if a.is_empty() {
        return Err(KernelError::ShapeError("Expected a non empty matrix".to_string()));
    }
    Ok(a.nrows())
}

fn to_dmatrix<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<DMatrix<f64>> {
    let values = a
        .iter()
        .map(|v| v.to_f64())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            KernelError::InvalidValueError("Matrix values not representable as f64".to_string())
        })?;
    Ok(DMatrix::from_row_slice(a.nrows(), a.ncols(), &values))
}

fn from_dmatrix<F: Float>(m: &DMatrix<f64>) -> Array2<F> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| F::cast(m[(i, j)]))
}

/// LU factorization with partial pivoting of the square matrix `a`.
///
/// Singular matrices are factorized as well: a null column leaves a zero pivot in `u`.
pub fn lu<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<LuDecomposition<F>> {
    let n = check_square(a)?;
    // nalgebra factorizes p^-1.a = l.u
    let (perm, l, u) = to_dmatrix(a)?.lu().unpack();
    let mut p = DMatrix::<f64>::identity(n, n);
    perm.inv_permute_rows(&mut p);
    Ok(LuDecomposition {
        p: from_dmatrix(&p),
        l: from_dmatrix(&l),
        u: from_dmatrix(&u),
    })
}

/// General inverse of the square matrix `a`.
///
/// A singular matrix is reported as a [`KernelError::SingularMatrixError`].
pub fn inverse<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
    check_square(a)?;
    to_dmatrix(a)?
        .try_inverse()
        .map(|inv| from_dmatrix(&inv))
        .ok_or_else(|| KernelError::SingularMatrixError("matrix is not invertible".to_string()))
}

/// Solution `x` of `a.x = b` by LU factorization of the square matrix `a`.
///
/// A null pivot is reported as a [`KernelError::SingularMatrixError`].
pub fn lu_solve<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    let n = check_square(a)?;
    if b.nrows() != n {
        return Err(KernelError::ShapeError(format!(
            "Right hand side should have {n} rows, got {}",
            b.nrows()
        )));
    }
    to_dmatrix(a)?
        .lu()
        .solve(&to_dmatrix(b)?)
        .map(|x| from_dmatrix(&x))
        .ok_or_else(|| {
            KernelError::SingularMatrixError("null pivot in LU factorization".to_string())
        })
}

/// Inverse of a triangular matrix by solving `t.x = I`.
///
/// A null diagonal term is reported as a [`KernelError::SingularMatrixError`].
pub fn triangular_inverse<F: Float>(
    t: &ArrayBase<impl Data<Elem = F>, Ix2>,
    uplo: UPLO,
) -> Result<Array2<F>> {
    let n = check_square(t)?;
    if let Some(i) = t.diag().iter().position(|&v| v == F::zero()) {
        return Err(KernelError::SingularMatrixError(format!(
            "null diagonal term at index {i} of triangular factor"
        )));
    }
    Ok(t.solve_triangular(&Array2::<F>::eye(n), uplo)?)
}

/// Singular values of `a`
pub fn singular_values<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
    let (_, s, _) = a.svd(false, false)?;
    Ok(s)
}

/// Greatest and lowest values of the given singular values
pub(crate) fn extremes<F: Float>(s: &Array1<F>) -> (F, F) {
    s.iter().fold((F::zero(), F::infinity()), |(smax, smin), &v| {
        (smax.max(v), smin.min(v))
    })
}

/// Reciprocal of the 2-norm condition number `smin / smax` of `a`.
///
/// A null matrix gives zero.
pub fn rcond<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<F> {
    let s = singular_values(a)?;
    let (smax, smin) = extremes(&s);
    if smax == F::zero() {
        Ok(F::zero())
    } else {
        Ok(smin / smax)
    }
}

/// Numerical rank of `a`: number of singular values greater than `smax * max(m, n) * eps`
pub fn matrix_rank<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<usize> {
    if a.is_empty() {
        return Ok(0);
    }
    let s = singular_values(a)?;
    let (smax, _) = extremes(&s);
    let tol = smax * F::cast(a.nrows().max(a.ncols())) * F::epsilon();
    Ok(s.iter().filter(|&&v| v > tol).count())
}

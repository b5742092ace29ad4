//! Activation functions applied elementwise (sigmoid) or row-wise (softmax).
use crate::errors::{KernelError, Result};
use linfa::Float;
use log::debug;
use ndarray::{Array, Array2, ArrayBase, Data, Dimension, Ix2, Zip};

/// Sigmoid transformation `1 / (1 + exp(-z))` of every term of `z`.
///
/// The overflow of `exp(-z)` is detected beforehand: when some `-z` exceeds
/// the log of the greatest representable value, the computation either fails with
/// [`KernelError::OverflowError`] or, when `stable_fallback` is set, switches to the
/// numerically stable formulation `exp(z) / (1 + exp(z))` for negative terms.
pub fn sigmoid<F: Float, D: Dimension>(
    z: &ArrayBase<impl Data<Elem = F>, D>,
    stable_fallback: bool,
) -> Result<Array<F, D>> {
    let limit = <F as num_traits::Float>::max_value().ln();
    if z.iter().any(|&v| -v > limit) {
        if !stable_fallback {
            return Err(KernelError::OverflowError(
                "overflow encountered in exp during sigmoid evaluation".to_string(),
            ));
        }
        debug!("Sigmoid overflow detected, use stable formulation");
        return Ok(z.mapv(stable_sigmoid));
    }
    Ok(z.mapv(|v| F::one() / (F::one() + (-v).exp())))
}

fn stable_sigmoid<F: Float>(v: F) -> F {
    if v >= F::zero() {
        F::one() / (F::one() + (-v).exp())
    } else {
        let e = v.exp();
        e / (F::one() + e)
    }
}

/// Softmax transformation of each row of `z`.
///
/// Row maximum is subtracted before exponentiation so that large inputs do not overflow.
pub fn softmax<F: Float>(z: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
    let mut res = z.to_owned();
    Zip::from(res.rows_mut()).for_each(|mut row| {
        let max = row.fold(F::neg_infinity(), |acc, &v| acc.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    });
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};

    #[test]
    fn test_sigmoid() {
        let z = array![-2., 0., 2.];
        let res = sigmoid(&z, false).unwrap();
        assert_abs_diff_eq!(
            array![0.11920292202211755, 0.5, 0.8807970779778823],
            res,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sigmoid_overflow() {
        let z = array![[-1000., 0.], [1000., 3.]];
        assert!(matches!(
            sigmoid(&z, false),
            Err(KernelError::OverflowError(_))
        ));
        let res = sigmoid(&z, true).unwrap();
        assert_abs_diff_eq!(
            array![[0., 0.5], [1., 0.9525741268224334]],
            res,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_softmax() {
        let z = array![[1., 2., 3.], [1000., 1000., 1000.]];
        let res = softmax(&z);
        assert_abs_diff_eq!(
            array![
                [0.09003057317038046, 0.24472847105479767, 0.6652409557748219],
                [1. / 3., 1. / 3., 1. / 3.]
            ],
            res,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(res.sum_axis(Axis(1)), array![1., 1.], epsilon = 1e-12);
    }
}

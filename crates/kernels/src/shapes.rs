//! Array dimension coercion used to feed kernel computations.
//!
//! Inputs coming from users may be given as vectors, row or column matrices,
//! or stacked matrices with a unit axis. These helpers bring them back to the
//! canonical 2-D `(n, d)` or 1-D `(n,)` forms expected by the kernels.

use crate::errors::{KernelError, Result};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Dimension, Ix2};

/// Coerce `arr` to a 2-D array.
///
/// * 1-D `(n,)` arrays are returned as a column `(n, 1)`,
/// * 2-D arrays are returned as is,
/// * 3-D arrays with a unit leading axis `(1, n, d)` or a unit trailing
///   axis `(n, d, 1)` get this axis removed.
///
/// Any other shape is rejected with a [`KernelError::ShapeError`].
pub fn to_2d<A, S, D>(arr: &ArrayBase<S, D>) -> Result<Array2<A>>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    let view = arr.view().into_dyn();
    let shape = view.shape().to_vec();
    match *shape.as_slice() {
        [n] => Ok(Array2::from_shape_vec((n, 1), view.iter().cloned().collect())?),
        [_, _] => Ok(view.into_dimensionality::<Ix2>()?.to_owned()),
        [1, _, _] => Ok(view
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()?
            .to_owned()),
        [_, _, 1] => Ok(view
            .index_axis(Axis(2), 0)
            .into_dimensionality::<Ix2>()?
            .to_owned()),
        _ => Err(KernelError::ShapeError(format!(
            "Cannot coerce array of shape {:?} to 2 dimensions",
            shape
        ))),
    }
}

/// Coerce `arr` to a 1-D array.
///
/// * 1-D arrays are returned as is,
/// * a row `(1, n)` or a column `(n, 1)` is flattened to `(n,)`.
///
/// Any other shape is rejected with a [`KernelError::ShapeError`] as it cannot be
/// flattened without ambiguity.
pub fn to_1d<A, S, D>(arr: &ArrayBase<S, D>) -> Result<Array1<A>>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    let view = arr.view().into_dyn();
    let shape = view.shape().to_vec();
    match *shape.as_slice() {
        [_] => Ok(view.iter().cloned().collect()),
        [1, _] => Ok(view.index_axis(Axis(0), 0).iter().cloned().collect()),
        [_, 1] => Ok(view.index_axis(Axis(1), 0).iter().cloned().collect()),
        _ => Err(KernelError::ShapeError(format!(
            "Cannot flatten array of shape {:?} to 1 dimension",
            shape
        ))),
    }
}

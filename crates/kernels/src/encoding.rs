//! One-hot encoding of class labels and its reverse transformation.
use crate::errors::{KernelError, Result};
use crate::shapes::to_1d;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Dimension, Ix2, Zip};
use ndarray_stats::QuantileExt;
use std::collections::BTreeSet;

/// One-hot encoding of the given `labels`, returned as a `(n_labels, num_classes)` matrix.
///
/// `labels` is first flattened with [`to_1d`]. When `num_classes` is not given, it is inferred
/// as the number of distinct labels. In `safe` mode an explicit `num_classes` has to match
/// that number. Labels have to be lower than `num_classes`.
pub fn onehot<F: Float, D: Dimension>(
    labels: &ArrayBase<impl Data<Elem = usize>, D>,
    num_classes: Option<usize>,
    safe: bool,
) -> Result<Array2<F>> {
    let labels = to_1d(labels)?;
    let n_unique = labels.iter().collect::<BTreeSet<_>>().len();
    let num_classes = num_classes.unwrap_or(n_unique);
    if safe && num_classes != n_unique {
        return Err(KernelError::InvalidValueError(format!(
            "Number of unique values ({n_unique}) does not match num_classes argument ({num_classes})"
        )));
    }
    if let Some(label) = labels.iter().find(|&&l| l >= num_classes) {
        return Err(KernelError::InvalidValueError(format!(
            "Label {label} out of range for {num_classes} classes"
        )));
    }

    let mut encoded = Array2::zeros((labels.len(), num_classes));
    Zip::from(encoded.rows_mut())
        .and(&labels)
        .for_each(|mut row, &label| row[label] = F::one());
    Ok(encoded)
}

/// Reverse of the one-hot transformation.
///
/// A single column is taken as a vector of labels already decoded, its values
/// have to be non negative integers. Otherwise the label of each row is the index of its
/// greatest value.
pub fn reverse_onehot<F: Float>(
    encoded: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array1<usize>> {
    if encoded.ncols() == 1 {
        return encoded
            .column(0)
            .iter()
            .map(|&v| match v.to_usize() {
                Some(label) if v.fract() == F::zero() => Ok(label),
                _ => Err(KernelError::InvalidValueError(format!(
                    "Label value {v} is not a class index"
                ))),
            })
            .collect();
    }
    encoded
        .rows()
        .into_iter()
        .map(|row| row.argmax().map_err(KernelError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_onehot() {
        let labels = array![0, 2, 1, 2];
        let res: Array2<f64> = onehot(&labels, None, true).unwrap();
        let expected = array![[1., 0., 0.], [0., 0., 1.], [0., 1., 0.], [0., 0., 1.]];
        assert_eq!(expected, res);
    }

    #[test]
    fn test_onehot_column_labels() {
        let labels = array![[1], [0]];
        let res: Array2<f64> = onehot(&labels, Some(3), false).unwrap();
        assert_eq!(array![[0., 1., 0.], [1., 0., 0.]], res);
    }

    #[test]
    fn test_onehot_safe_mismatch() {
        let labels = array![0, 1, 1];
        let res: Result<Array2<f64>> = onehot(&labels, Some(3), true);
        assert!(matches!(res, Err(KernelError::InvalidValueError(_))));
    }

    #[test]
    fn test_onehot_label_out_of_range() {
        let labels = array![0, 4];
        let res: Result<Array2<f64>> = onehot(&labels, Some(2), false);
        assert!(matches!(res, Err(KernelError::InvalidValueError(_))));
    }

    #[test]
    fn test_reverse_onehot() {
        let labels = array![2, 0, 1, 1];
        let encoded: Array2<f64> = onehot(&labels, None, true).unwrap();
        assert_eq!(labels, reverse_onehot(&encoded).unwrap());

        let probas = array![[0.1, 0.7, 0.2], [0.6, 0.3, 0.1]];
        assert_eq!(array![1, 0], reverse_onehot(&probas).unwrap());
    }

    #[test]
    fn test_reverse_onehot_column() {
        assert_eq!(
            array![3, 0, 1],
            reverse_onehot(&array![[3.], [0.], [1.]]).unwrap()
        );
        assert!(reverse_onehot(&array![[1.5], [0.]]).is_err());
    }
}

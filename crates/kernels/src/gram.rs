//! Gram (covariance) matrix evaluation.
//!
//! The Gram matrix `K[i, j] = k(xa_i, xb_j)` is computed row by row: each row is an
//! independent unit of work handled by [`row_worker`] and dispatched to a worker pool.
//! Rows come back tagged with their index so that they are scattered in place
//! whatever their completion order.
use crate::errors::{KernelError, Result};
use crate::kernels::DistanceFunction;
use crate::pool::WorkerPool;
use linfa::Float;
use log::debug;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
use rayon::prelude::*;
use std::marker::PhantomData;

/// Evaluate `dist(alpha, beta_j)` for every row `beta_j` of `beta`.
///
/// Returns the given row index `i` along with the values so that the caller can put
/// them back in the `i`-th row of the Gram matrix.
pub fn row_worker<F: Float, D: DistanceFunction<F>>(
    i: usize,
    alpha: &ArrayBase<impl Data<Elem = F>, Ix1>,
    beta: &ArrayBase<impl Data<Elem = F>, Ix2>,
    dist: &D,
) -> Result<(usize, Array1<F>)> {
    let mut output = Array1::zeros(beta.nrows());
    for (out, beta_j) in output.iter_mut().zip(beta.rows()) {
        *out = dist.distance(alpha, &beta_j)?;
    }
    Ok((i, output))
}

/// Gram matrix evaluator of a covariance function, rows being computed in parallel
/// within an owned [`WorkerPool`].
#[derive(Clone, Debug)]
pub struct GramEvaluator<F: Float, D: DistanceFunction<F>> {
    dist: D,
    pool: WorkerPool,
    phantom: PhantomData<F>,
}

impl<F: Float, D: DistanceFunction<F>> GramEvaluator<F, D> {
    /// Constructor with the given covariance function and a default pool
    pub fn new(dist: D) -> Self {
        GramEvaluator {
            dist,
            pool: WorkerPool::default(),
            phantom: PhantomData,
        }
    }

    /// Set the worker pool
    pub fn with_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = pool;
        self
    }

    /// Covariance function
    pub fn distance_function(&self) -> &D {
        &self.dist
    }

    /// Stop the worker threads, they are restarted on demand
    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }

    fn check_dims(
        xa: &ArrayBase<impl Data<Elem = F>, Ix2>,
        xb: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<()> {
        if xa.ncols() != xb.ncols() {
            return Err(KernelError::ShapeError(format!(
                "Points should have the same dimension, got {} and {}",
                xa.ncols(),
                xb.ncols()
            )));
        }
        Ok(())
    }

    /// Rows of the Gram matrix between points `xa` (na, nx) and `xb` (nb, nx)
    /// as `(row index, values)` pairs, one unit of work per row of `xa`.
    ///
    /// The first failing evaluation aborts the whole computation.
    pub fn rows(
        &self,
        xa: &ArrayBase<impl Data<Elem = F>, Ix2>,
        xb: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Vec<(usize, Array1<F>)>> {
        Self::check_dims(xa, xb)?;
        let (xa, xb) = (xa.view(), xb.view());
        debug!(
            "Dispatch {} rows of {} kernel evaluations with {}",
            xa.nrows(),
            xb.nrows(),
            self.dist
        );
        self.pool.install(|| {
            (0..xa.nrows())
                .into_par_iter()
                .map(|i| row_worker(i, &xa.row(i), &xb, &self.dist))
                .collect::<Result<Vec<_>>>()
        })?
    }

    /// Gram matrix (na, nb) between points `xa` (na, nx) and `xb` (nb, nx)
    pub fn gram(
        &self,
        xa: &ArrayBase<impl Data<Elem = F>, Ix2>,
        xb: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Array2<F>> {
        let mut gram = Array2::zeros((xa.nrows(), xb.nrows()));
        for (i, row) in self.rows(xa, xb)? {
            gram.row_mut(i).assign(&row);
        }
        Ok(gram)
    }

    /// Sequential computation of the Gram matrix between `xa` and `xb`
    pub fn gram_seq(
        &self,
        xa: &ArrayBase<impl Data<Elem = F>, Ix2>,
        xb: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Array2<F>> {
        Self::check_dims(xa, xb)?;
        let mut gram = Array2::zeros((xa.nrows(), xb.nrows()));
        for (i, alpha) in xa.rows().into_iter().enumerate() {
            let (_, row) = row_worker(i, &alpha, xb, &self.dist)?;
            gram.row_mut(i).assign(&row);
        }
        Ok(gram)
    }

    /// Covariance matrix (n, n) of the points `x` (n, nx)
    pub fn covariance(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        self.gram(x, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::Rbf;
    use crate::stability::check_valid_cov;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;
    use std::fmt;

    fn random_points(n: usize, nx: usize, seed: u64) -> Array2<f64> {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        Array::random_using((n, nx), Uniform::new(-2., 2.), &mut rng)
    }

    #[test]
    fn test_row_worker() {
        let rbf = Rbf::new(0.8, 1.5).unwrap();
        let alpha = array![0.5, -0.5, 1.];
        for m in [0, 1, 100] {
            let beta = random_points(m, 3, 42);
            let (i, output) = row_worker(7, &alpha, &beta, &rbf).unwrap();
            assert_eq!(i, 7);
            assert_eq!(output.len(), m);
            for (j, beta_j) in beta.rows().into_iter().enumerate() {
                assert_eq!(output[j], rbf.distance(&alpha, &beta_j).unwrap());
            }
        }
    }

    #[test]
    fn test_rows_indices() {
        let evaluator = GramEvaluator::new(Rbf::new(1., 1.).unwrap());
        let xa = random_points(20, 2, 1);
        let xb = random_points(5, 2, 2);
        let rows = evaluator.rows(&xa, &xb).unwrap();
        assert_eq!(rows.len(), 20);
        for (i, row) in rows {
            let (_, expected) =
                row_worker(i, &xa.row(i), &xb, evaluator.distance_function()).unwrap();
            assert_eq!(row, expected);
        }
    }

    #[test]
    fn test_gram_parallel_equals_sequential() {
        let mut evaluator = GramEvaluator::new(Rbf::new(0.5, 2.).unwrap());
        let xa = random_points(30, 4, 3);
        let xb = random_points(12, 4, 4);
        let par = evaluator.gram(&xa, &xb).unwrap();
        let seq = evaluator.gram_seq(&xa, &xb).unwrap();
        assert_eq!(par.dim(), (30, 12));
        assert_eq!(par, seq);
        evaluator.shutdown();
        assert_eq!(evaluator.gram(&xa, &xb).unwrap(), seq);
    }

    #[test]
    fn test_covariance_matrix() {
        let evaluator =
            GramEvaluator::new(Rbf::new(1., 3.).unwrap()).with_pool(WorkerPool::new(2));
        let x = random_points(10, 2, 5);
        let cov = evaluator.covariance(&x).unwrap();
        assert_abs_diff_eq!(cov, cov.t(), epsilon = 1e-15);
        assert_eq!(cov.diag(), Array1::from_elem(10, 3.));
        assert!(check_valid_cov(&cov).is_ok());
    }

    #[test]
    fn test_empty_points() {
        let evaluator = GramEvaluator::new(Rbf::new(1., 1.).unwrap());
        let xa = Array2::<f64>::zeros((0, 3));
        let xb = random_points(4, 3, 6);
        assert_eq!(evaluator.gram(&xa, &xb).unwrap().dim(), (0, 4));
        assert_eq!(evaluator.gram(&xb, &xa).unwrap().dim(), (4, 0));
    }

    #[test]
    fn test_dimension_mismatch() {
        let evaluator = GramEvaluator::new(Rbf::new(1., 1.).unwrap());
        let res = evaluator.gram(&random_points(3, 2, 7), &random_points(3, 3, 8));
        assert!(matches!(res, Err(KernelError::ShapeError(_))));
    }

    /// Fails on points with a negative first component
    #[derive(Clone)]
    struct Picky;

    impl fmt::Display for Picky {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "Picky")
        }
    }

    impl DistanceFunction<f64> for Picky {
        fn distance(
            &self,
            alpha: &ArrayBase<impl Data<Elem = f64>, Ix1>,
            beta: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        ) -> Result<f64> {
            if alpha[0] < 0. {
                return Err(KernelError::NonFiniteError("negative point".to_string()));
            }
            Ok(alpha.dot(beta))
        }
    }

    #[test]
    fn test_failing_row_aborts() {
        let evaluator = GramEvaluator::new(Picky);
        let xa = array![[1., 1.], [-1., 2.], [3., 0.]];
        let xb = array![[1., 0.], [0., 1.]];
        assert!(matches!(
            evaluator.gram(&xa, &xb),
            Err(KernelError::NonFiniteError(_))
        ));
        // other units of work are not affected
        let (i, row) = row_worker(2, &xa.row(2), &xb, &Picky).unwrap();
        assert_eq!((i, row), (2, array![3., 0.]));
    }
}

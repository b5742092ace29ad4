use egobox_kernels::{check_valid_cov, GramEvaluator, InversionMethod, Inverter, Rbf};
use env_logger::{Builder, Env};
use ndarray::{Array, Array2, Axis};

fn main() {
    let env = Env::new().filter_or("EGOBOX_LOG", "info");
    Builder::from_env(env).try_init().ok();

    let xt = Array::linspace(0., 4., 9).insert_axis(Axis(1));
    let evaluator = GramEvaluator::new(Rbf::new(1.0, 2.0).expect("valid RBF parameters"));
    let cov = evaluator.covariance(&xt).expect("Gram matrix");
    check_valid_cov(&cov).expect("valid covariance");

    for method in InversionMethod::ALL {
        let mut inverter = Inverter::new(method);
        match inverter.invert(&cov) {
            Ok(inv) => {
                let err = (inv.dot(&cov) - Array2::<f64>::eye(cov.nrows()))
                    .mapv(|v| v * v)
                    .sum()
                    .sqrt();
                println!("{method:>8}: |inv(K).K - I| = {err:.3e}");
            }
            Err(err) => println!("{method:>8}: {err}"),
        }
        inverter.shutdown();
    }
}

extern crate regmvmt;

use ndarray::array;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use regmvmt::{Fit, MultiViewDataset, RegMvmt, TaskLabels};

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let view_0 = array![[1., 0.], [0., 1.], [1., 1.], [1., -1.]];
    let view_1 = array![[2., 1.], [1., 0.], [0., 1.], [1., 1.]];
    let labels = vec![
        TaskLabels::from_zero_missing(array![1., 0., -1., 0.]),
        TaskLabels::from_zero_missing(array![0., 2., 0., -2.]),
    ];
    let dataset = MultiViewDataset::new(vec![view_0, view_1], labels).unwrap();

    let model = RegMvmt::params()
        .lambda_var(0.1)
        .mu(0.1)
        .gamma(0.1)
        .epsilon(0.01)
        .iterations(50)
        .verbose(true)
        .fit(&dataset)
        .unwrap();

    info!(status = ?model.status(), "fit finished");
    println!("Coefficients:\n{}", model.coefficients());
    for (view, omega) in model.similarity_map() {
        println!("Task similarities of view {}:\n{}", view, omega);
    }
}

use loglog_registers::{AnyEstimator, CardinalityEstimatorTrait, Variant};

fn main() {
    let variant: Variant = std::env::args()
        .nth(1)
        .as_deref()
        .unwrap_or("standard")
        .parse()
        .unwrap_or_else(|err| {
            eprintln!("{err}");
            std::process::exit(2);
        });

    let mut estimator = AnyEstimator::<12>::new(variant);
    for i in 0..10 {
        estimator.insert(&i);
    }
    println!("{variant} estimate after 10 items = {:.2}", estimator.estimate());

    for i in 0..100_000 {
        estimator.insert(&i);
    }
    println!(
        "{variant} estimate after 100000 items = {:.2} (standard error {:.4})",
        estimator.estimate(),
        estimator.standard_error()
    );
    println!("{:?}", estimator);
}

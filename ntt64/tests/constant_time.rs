//! Timing-leak checks. Wall-clock measurements are noisy on shared
//! machines, so these run only on request:
//!
//! ```text
//! cargo test --release -p ntt64 --test constant_time -- --ignored --nocapture
//! ```

use ntt64::{
    Dispatch, Layer,
    timing::{Operation, TimingConfig, TimingReport, analyze},
};

const OPERATIONS: [Operation; 3] = [Operation::Forward, Operation::Inverse, Operation::PointwiseMul];

fn check(ntt: &Dispatch) {
    let config: TimingConfig = TimingConfig::default();
    let mut failures: Vec<String> = Vec::new();

    for layer in Layer::ALL {
        for op in OPERATIONS {
            let report: TimingReport = analyze(ntt, op, layer, &config);
            println!(
                "{:>6} {:<12} {:<28} baseline {:>9.1} ns (cv {:>5.1}%)  max |t| {:.2}",
                report.backend,
                format!("{op:?}"),
                layer.to_string(),
                report.baseline.mean,
                report.baseline.coefficient_of_variation(),
                report.max_abs_t()
            );
            for p in report.patterns.iter() {
                println!("         {:<12} {:>9.1} ns  t = {:>6.2}", p.pattern.name(), p.stats.mean, p.t);
            }
            if !report.passed() {
                failures.push(format!("{} {op:?} {layer}: |t| = {:.2}", report.backend, report.max_abs_t()));
            }
        }
    }

    assert!(failures.is_empty(), "timing differences above threshold:\n{}", failures.join("\n"));
}

#[test]
#[ignore]
fn scalar_is_constant_time() {
    check(&Dispatch::scalar());
}

#[test]
#[ignore]
fn selected_backend_is_constant_time() {
    let ntt: Dispatch = Dispatch::detect();
    if ntt.name() == "scalar" {
        eprintln!("skipping: no vector backend on this cpu");
        return;
    }
    check(&ntt);
}

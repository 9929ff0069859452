//! Gradient of a small two-qubit energy
//!
//! Run with: cargo run -p qgrad_engine --example gradient_demo

use qgrad_core::prelude::*;
use qgrad_engine::prelude::*;

fn main() -> QgradResult<()> {
    let circuit = CircuitBuilder::new()
        .ry(0, "a")
        .cx(0, 1)
        .rx(1, "b")
        .cx_pow(0, 1, "t")
        .build()?;
    let observable = Hamiltonian::parse("0.5 Z0 Z1 + X1")?;
    let energy = Objective::from(ExpectationValue::new(circuit, observable));

    let values = assignment([("a", 0.3), ("b", -0.8), ("t", 0.25)]);
    let config = EngineConfig::exact();
    let exact = config.build_backend();
    let sampling = SamplingBackend::new(20_000).with_seed(7);

    println!("{}", config);
    println!("energy (exact):    {:+.6}", simulate(&energy, &values, &exact)?);
    println!("energy (sampling): {:+.6}", simulate(&energy, &values, &sampling)?);

    let exact_grads = gradient(&energy, ["a", "b", "t"], &values, &exact)?;
    let sampled_grads = gradient(&energy, ["a", "b", "t"], &values, &sampling)?;
    println!("{:>4} {:>12} {:>12}", "var", "exact", "sampling");
    for (variable, value) in &exact_grads {
        println!("{:>4} {:>+12.6} {:>+12.6}", variable.name(), value, sampled_grads[variable]);
    }

    let curvature = grad(&grad(&energy, "a")?, "a")?;
    println!("d²E/da² = {:+.6}", simulate(&curvature, &values, &exact)?);
    Ok(())
}

// =============================================================================
// LIGHTWIRE Simulator - Gradient Descent Demo
// =============================================================================
// Table of Contents:
//   1. Dispatcher bootstrap from configuration
//   2. GHZ preparation and measurement
//   3. Variational energy minimization with adjoint gradients
// =============================================================================
// Purpose: Walks through the whole engine: kernel selection, gate dispatch,
//          sampling, and vector-Jacobian products driving a small
//          variational loop on an Ising chain.
// =============================================================================

use adjoint_differentiation::prelude::*;
use ndarray::Array2;
use statevector_runtime::prelude::*;
use std::sync::Arc;

const NUMBER_OF_QUANTUM_BITS: usize = 4;
const LEARNING_RATE: f64 = 0.2;
const ITERATIONS: usize = 40;

fn variational_tape(angles: &[f64], hamiltonian: &Arc<HamiltonianObservable>) -> DifferentiationTape {
    let mut tape = DifferentiationTape::new(QuantumStateVector::new(NUMBER_OF_QUANTUM_BITS));
    for (wire, angle) in angles.iter().take(NUMBER_OF_QUANTUM_BITS).enumerate() {
        tape.push_operation(OperationRecord::parametric("RY", vec![wire], *angle));
    }
    for wire in 0..NUMBER_OF_QUANTUM_BITS - 1 {
        tape.push_operation(OperationRecord::fixed("CNOT", vec![wire, wire + 1]));
    }
    for (wire, angle) in angles.iter().skip(NUMBER_OF_QUANTUM_BITS).enumerate() {
        tape.push_operation(OperationRecord::parametric("RX", vec![wire], *angle));
    }
    tape.add_observable(Arc::clone(hamiltonian) as Arc<dyn ObservableOperatorInterface>);
    tape.train_all_parameters();
    tape
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("LIGHTWIRE Simulator - Gradient Descent Demonstration");
    println!();

    // =========================================================================
    // 1. Bootstrap
    // =========================================================================
    let configuration = RuntimeConfiguration::from_toml_str(
        r#"
        default_kernel_family = "LM"
        parallel_minimum_dimension = 16

        [kernel_overrides]
        Hadamard = "ParallelLM"
        "#,
    )?;
    let dispatcher = bootstrap(&configuration)?;
    println!("Dispatcher {} with kernels {:?}", dispatcher.dispatcher_id(), dispatcher.registered_kernels());
    println!("   Hadamard -> {}", dispatcher.selected_kernel_for_gate(GateOperation::Hadamard)?);
    println!("   Toffoli  -> {}", dispatcher.selected_kernel_for_gate(GateOperation::Toffoli)?);
    println!();

    // =========================================================================
    // 2. GHZ state
    // =========================================================================
    let mut ghz = QuantumStateVector::new(NUMBER_OF_QUANTUM_BITS);
    ghz.apply_operation(&dispatcher, "Hadamard", &[0], false, &[])?;
    for wire in 0..NUMBER_OF_QUANTUM_BITS - 1 {
        ghz.apply_operation(&dispatcher, "CNOT", &[wire, wire + 1], false, &[])?;
    }
    let samples = generate_samples(&ghz, 1000, 2024);
    let statistics = MeasurementStatistics::from_samples(&samples);
    println!("GHZ sampling over {} shots", statistics.total_shots);
    println!("   0000: {}", statistics.count_of("0000"));
    println!("   1111: {}", statistics.count_of("1111"));
    println!("   entropy: {:.4} bits", statistics.entropy);
    println!();

    // =========================================================================
    // 3. Variational loop
    // =========================================================================
    let hamiltonian = Arc::new(HamiltonianObservable::ising_zz(NUMBER_OF_QUANTUM_BITS, -1.0)?.with_term(
        0.5,
        Arc::new(NamedObservable::pauli_x(0)),
    ));
    let product = VectorJacobianProduct::new(AdjointJacobian::new(Arc::clone(&dispatcher)));
    let mut angles: Vec<f64> = (0..2 * NUMBER_OF_QUANTUM_BITS).map(|i| 0.1 + 0.15 * i as f64).collect();
    let mut gradient = Vec::new();
    let mut jacobian = Array2::zeros((0, 0));

    println!("Minimizing {} with adjoint gradients", hamiltonian.observable_name());
    for iteration in 0..ITERATIONS {
        let tape = variational_tape(&angles, &hamiltonian);
        product.vector_jacobian_product(&mut gradient, &mut jacobian, &[1.0], &tape, true)?;
        for (angle, slope) in angles.iter_mut().zip(&gradient) {
            *angle -= LEARNING_RATE * slope;
        }

        if iteration % 10 == 0 || iteration == ITERATIONS - 1 {
            let mut state = tape.initial_state().clone();
            for record in tape.operations() {
                state.apply_operation(&dispatcher, &record.operation_name, &record.wires, record.inverse, &record.parameters)?;
            }
            let energy = expectation_value(&state, hamiltonian.as_ref(), &dispatcher)?;
            println!("   iteration {:>3}: energy = {:+.6}", iteration, energy);
        }
    }

    let final_tape = Arc::new(variational_tape(&angles, &hamiltonian));
    let deferred = product.vector_jacobian_product_deferred(&[1.0], final_tape, true);
    let residual: f64 = deferred.evaluate()?.iter().map(|g| g * g).sum::<f64>().sqrt();
    println!("   final gradient norm: {:.3e}", residual);

    Ok(())
}

//! End-to-end checks through the dispatcher and the state container.

use num_complex::Complex64;
use statevector_runtime::prelude::*;
use std::f64::consts::FRAC_1_SQRT_2;
use std::sync::Arc;

fn dispatcher() -> Arc<DynamicDispatcher> {
    bootstrap(&RuntimeConfiguration::single_threaded()).unwrap()
}

fn assert_amplitudes(state: &QuantumStateVector, expected: &[Complex64]) {
    assert_eq!(state.dimension(), expected.len());
    for (index, (actual, wanted)) in state.amplitudes().iter().zip(expected).enumerate() {
        assert!((actual - wanted).norm() < 1e-12, "amplitude {}: {} != {}", index, actual, wanted);
    }
}

#[test]
fn test_ghz_state_on_every_kernel() {
    let dispatcher = dispatcher();
    for kernel in KernelFamily::ALL {
        let mut state = QuantumStateVector::new(3);
        state
            .apply_operation_with_kernel(&dispatcher, kernel, "Hadamard", &[0], false, &[])
            .unwrap();
        state
            .apply_operation_with_kernel(&dispatcher, kernel, "CNOT", &[0, 1], false, &[])
            .unwrap();
        state
            .apply_operation_with_kernel(&dispatcher, kernel, "CNOT", &[1, 2], false, &[])
            .unwrap();

        let mut expected = vec![Complex64::new(0.0, 0.0); 8];
        expected[0] = Complex64::new(FRAC_1_SQRT_2, 0.0);
        expected[7] = Complex64::new(FRAC_1_SQRT_2, 0.0);
        assert_amplitudes(&state, &expected);
    }
}

#[test]
fn test_self_adjoint_gates_square_to_identity() {
    let dispatcher = dispatcher();
    let mut state = QuantumStateVector::new(2);
    state.apply_operation(&dispatcher, "RY", &[0], false, &[0.3]).unwrap();
    state.apply_operation(&dispatcher, "RX", &[1], false, &[1.1]).unwrap();
    let reference = state.clone();

    for name in ["PauliX", "PauliY", "PauliZ", "Hadamard"] {
        for wire in 0..2 {
            let mut twice = reference.clone();
            twice.apply_operation(&dispatcher, name, &[wire], false, &[]).unwrap();
            twice.apply_operation(&dispatcher, name, &[wire], false, &[]).unwrap();
            assert_amplitudes(&twice, reference.amplitudes());

            let mut plain = reference.clone();
            let mut inverted = reference.clone();
            plain.apply_operation(&dispatcher, name, &[wire], false, &[]).unwrap();
            inverted.apply_operation(&dispatcher, name, &[wire], true, &[]).unwrap();
            assert_amplitudes(&plain, inverted.amplitudes());
        }
    }
}

#[test]
fn test_controlled_gate_truth_tables() {
    let dispatcher = dispatcher();
    let one = Complex64::new(1.0, 0.0);
    // (gate, wires, input basis index, output basis index)
    let cases: [(&str, Vec<usize>, usize, usize); 8] = [
        ("CNOT", vec![0, 1], 0b10, 0b11),
        ("CNOT", vec![0, 1], 0b01, 0b01),
        ("CNOT", vec![1, 0], 0b01, 0b11),
        ("SWAP", vec![0, 1], 0b10, 0b01),
        ("Toffoli", vec![0, 1, 2], 0b110, 0b111),
        ("Toffoli", vec![0, 1, 2], 0b100, 0b100),
        ("CSWAP", vec![0, 1, 2], 0b101, 0b110),
        ("CSWAP", vec![0, 1, 2], 0b001, 0b001),
    ];

    for (name, wires, input, output) in cases {
        let number_of_quantum_bits = wires.len();
        let mut state = QuantumStateVector::new(number_of_quantum_bits);
        state.set_basis_state(input).unwrap();
        state.apply_operation(&dispatcher, name, &wires, false, &[]).unwrap();
        assert_eq!(state.amplitude(output).unwrap(), one, "{} {:?} on {:b}", name, wires, input);
    }
}

#[test]
fn test_apply_matrix_selects_operation_by_wire_count() {
    let dispatcher = dispatcher();
    let pauli_x = vec![
        Complex64::new(0.0, 0.0),
        Complex64::new(1.0, 0.0),
        Complex64::new(1.0, 0.0),
        Complex64::new(0.0, 0.0),
    ];
    let mut state = QuantumStateVector::new(2);
    state.apply_matrix(&dispatcher, &pauli_x, &[1], false).unwrap();
    assert_eq!(state.amplitude(1).unwrap(), Complex64::new(1.0, 0.0));

    let toffoli = statevector_runtime::gate_matrices::gate_matrix(GateOperation::Toffoli, 3, &[], false).unwrap();
    let mut state = QuantumStateVector::new(3);
    state.set_basis_state(0b110).unwrap();
    for kernel in [KernelFamily::PermutationIndexed, KernelFamily::BitMaskLoop] {
        let mut working = state.clone();
        let number_of_quantum_bits = working.number_of_quantum_bits();
        dispatcher
            .apply_matrix(kernel, working.amplitudes_mut(), number_of_quantum_bits, &toffoli, &[0, 1, 2], false)
            .unwrap();
        assert_eq!(working.amplitude(0b111).unwrap(), Complex64::new(1.0, 0.0));
    }

    let error = dispatcher
        .apply_matrix(
            KernelFamily::ParallelBitMaskLoop,
            state.amplitudes_mut(),
            3,
            &toffoli,
            &[0, 1, 2],
            false,
        )
        .unwrap_err();
    assert!(error.to_string().contains("MultiQubitOp"));
}

#[test]
fn test_wire_errors_leave_state_untouched() {
    let dispatcher = dispatcher();
    let mut state = QuantumStateVector::new(2);
    state.apply_operation(&dispatcher, "Hadamard", &[0], false, &[]).unwrap();
    let before = state.clone();

    assert!(matches!(
        state.apply_operation(&dispatcher, "CNOT", &[0, 2], false, &[]),
        Err(KernelRuntimeError::Bounds(BoundsError::WireOutOfRange { wire: 2, .. }))
    ));
    assert!(matches!(
        state.apply_operation(&dispatcher, "CNOT", &[1, 1], false, &[]),
        Err(KernelRuntimeError::Bounds(BoundsError::DuplicateWire(1)))
    ));
    assert!(matches!(
        state.apply_operation(&dispatcher, "CNOT", &[0], false, &[]),
        Err(KernelRuntimeError::Shape(ShapeError::WireCountMismatch { .. }))
    ));
    assert!(matches!(
        state.apply_operation(&dispatcher, "Fredkin", &[0, 1], false, &[]),
        Err(KernelRuntimeError::Lookup(LookupError::UnknownGateName(_)))
    ));
    assert_eq!(state, before);
}

#[test]
fn test_measurement_statistics_serialize() {
    let dispatcher = dispatcher();
    let mut state = QuantumStateVector::new(2);
    state.apply_operation(&dispatcher, "PauliX", &[0], false, &[]).unwrap();
    let samples = generate_samples(&state, 32, 11);
    let statistics = MeasurementStatistics::from_samples(&samples);
    assert_eq!(statistics.count_of("10"), 32);

    let json = serde_json::to_string(&statistics).unwrap();
    let decoded: MeasurementStatistics = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded.count_of("10"), 32);
    assert_eq!(decoded.entropy, 0.0);
}

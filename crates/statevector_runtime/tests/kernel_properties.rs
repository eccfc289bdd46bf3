//! Property tests: every family agrees with the dense reference, gates undo
//! with their inverse, and wire-symmetric gates ignore wire order.

use num_complex::Complex64;
use proptest::prelude::*;
use statevector_runtime::prelude::*;
use std::sync::Arc;

const NUMBER_OF_QUANTUM_BITS: usize = 4;

fn dispatcher() -> Arc<DynamicDispatcher> {
    bootstrap(&RuntimeConfiguration::single_threaded().with_thread_count(2)).unwrap()
}

fn wires_for(gate: GateOperation, order: &[usize]) -> Vec<usize> {
    match gate.wire_arity() {
        WireArity::Fixed(count) => order[..count].to_vec(),
        WireArity::Variadic => order[..3].to_vec(),
    }
}

fn state_strategy() -> impl Strategy<Value = Vec<Complex64>> {
    proptest::collection::vec((-1.0f64..1.0, -1.0f64..1.0), 1 << NUMBER_OF_QUANTUM_BITS)
        .prop_map(|pairs| pairs.into_iter().map(|(re, im)| Complex64::new(re, im)).collect())
}

fn gate_strategy() -> impl Strategy<Value = GateOperation> {
    (0..GateOperation::ALL.len()).prop_map(|index| GateOperation::ALL[index])
}

fn assert_close(left: &[Complex64], right: &[Complex64]) -> Result<(), TestCaseError> {
    for (a, b) in left.iter().zip(right.iter()) {
        prop_assert!((a - b).norm() < 1e-9, "{} != {}", a, b);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_family_matches_permutation_indexed(
        state in state_strategy(),
        gate in gate_strategy(),
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
        angle in -3.2f64..3.2,
        inverse in any::<bool>(),
    ) {
        let dispatcher = dispatcher();
        let wires = wires_for(gate, &order);
        let parameters: Vec<f64> = (0..gate.parameter_count()).map(|i| angle * (i as f64 + 1.0)).collect();

        let mut expected = state.clone();
        dispatcher
            .apply_gate(KernelFamily::PermutationIndexed, &mut expected, NUMBER_OF_QUANTUM_BITS, gate, &wires, inverse, &parameters)
            .unwrap();

        for kernel in [KernelFamily::BitMaskLoop, KernelFamily::ParallelBitMaskLoop] {
            if !dispatcher.is_registered(gate, kernel) {
                continue;
            }
            let mut actual = state.clone();
            dispatcher
                .apply_gate(kernel, &mut actual, NUMBER_OF_QUANTUM_BITS, gate, &wires, inverse, &parameters)
                .unwrap();
            assert_close(&expected, &actual)?;
        }
    }

    #[test]
    fn gate_then_inverse_restores_state(
        state in state_strategy(),
        gate in gate_strategy(),
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
        angle in -3.2f64..3.2,
    ) {
        let dispatcher = dispatcher();
        let wires = wires_for(gate, &order);
        let parameters = vec![angle; gate.parameter_count()];
        let mut working = state.clone();
        dispatcher
            .apply_selected_gate(&mut working, NUMBER_OF_QUANTUM_BITS, gate, &wires, false, &parameters)
            .unwrap();
        dispatcher
            .apply_selected_gate(&mut working, NUMBER_OF_QUANTUM_BITS, gate, &wires, true, &parameters)
            .unwrap();
        assert_close(&state, &working)?;
    }

    #[test]
    fn wire_symmetric_gates_ignore_order(
        state in state_strategy(),
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
        angle in -3.2f64..3.2,
    ) {
        let dispatcher = dispatcher();
        for gate in GateOperation::ALL.into_iter().filter(|gate| gate.is_wire_symmetric()) {
            let wires = wires_for(gate, &order);
            let reversed: Vec<usize> = wires.iter().rev().copied().collect();
            let parameters = vec![angle; gate.parameter_count()];
            let mut forward = state.clone();
            let mut backward = state.clone();
            dispatcher
                .apply_selected_gate(&mut forward, NUMBER_OF_QUANTUM_BITS, gate, &wires, false, &parameters)
                .unwrap();
            dispatcher
                .apply_selected_gate(&mut backward, NUMBER_OF_QUANTUM_BITS, gate, &reversed, false, &parameters)
                .unwrap();
            assert_close(&forward, &backward)?;
        }
    }

    #[test]
    fn generators_agree_across_families(
        state in state_strategy(),
        index in 0..GeneratorOperation::ALL.len(),
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
    ) {
        let dispatcher = dispatcher();
        let generator = GeneratorOperation::ALL[index];
        let wires = wires_for(generator.gate(), &order);
        let mut expected = state.clone();
        let expected_factor = dispatcher
            .apply_generator(KernelFamily::PermutationIndexed, &mut expected, NUMBER_OF_QUANTUM_BITS, generator, &wires, false)
            .unwrap();
        for kernel in [KernelFamily::BitMaskLoop, KernelFamily::ParallelBitMaskLoop] {
            if !dispatcher.is_registered(generator, kernel) {
                continue;
            }
            let mut actual = state.clone();
            let factor = dispatcher
                .apply_generator(kernel, &mut actual, NUMBER_OF_QUANTUM_BITS, generator, &wires, false)
                .unwrap();
            prop_assert_eq!(factor, expected_factor);
            assert_close(&expected, &actual)?;
        }
    }
}

// =============================================================================
// LIGHTWIRE Simulator - Adjoint Jacobian
// =============================================================================
// Table of Contents:
//   1. JacobianEvaluator - Trait for Jacobian producers
//   2. Tape resolution
//   3. AdjointJacobian - Forward pass, bras, reverse walk
// =============================================================================
// Purpose: Jacobian of every observable's expectation value with respect to
//          every trainable parameter, in one forward and one backward sweep.
//          For a gate `U = exp(i s theta G)` the contribution of its parameter
//          to observable `o` is `-2 s Im <bra_o | G mu>`, where `mu` is the ket
//          just after the gate and `bra_o` is `O_o` propagated back to the
//          same point.
// =============================================================================

use crate::error::{DifferentiationError, DifferentiationResult};
use crate::operation_tape::DifferentiationTape;
use ndarray::Array2;
use rayon::prelude::*;
use statevector_runtime::dynamic_dispatcher::{default_dispatcher, DynamicDispatcher};
use statevector_runtime::error::KernelResult;
use statevector_runtime::kernel_catalog::{GateOperation, GeneratorOperation};
use statevector_runtime::state_backend::{inner_product, QuantumStateVector};
use std::sync::Arc;

// =============================================================================
// 1. JacobianEvaluator
// =============================================================================

pub trait JacobianEvaluator: Send + Sync {
    /// Overwrite `jacobian` with the `observables x trainable parameters`
    /// Jacobian of `tape`. The buffer is reshaped when its shape differs.
    fn evaluate_jacobian(
        &self,
        jacobian: &mut Array2<f64>,
        tape: &DifferentiationTape,
        apply_operations: bool,
    ) -> DifferentiationResult<()>;
}

/// Reshape to `rows x columns` if needed, then zero.
pub fn prepare_jacobian(jacobian: &mut Array2<f64>, rows: usize, columns: usize) {
    if jacobian.dim() == (rows, columns) {
        jacobian.fill(0.0);
    } else {
        *jacobian = Array2::zeros((rows, columns));
    }
}

// =============================================================================
// 2. Tape resolution
// =============================================================================

#[derive(Debug)]
struct ResolvedOperation<'a> {
    gate: GateOperation,
    generator: Option<GeneratorOperation>,
    wires: &'a [usize],
    inverse: bool,
    parameters: &'a [f64],
    first_parameter_index: usize,
}

/// Names and trainable indices are checked here so a bad tape fails before
/// any state is copied.
fn resolve_tape<'a>(
    tape: &'a DifferentiationTape,
    dispatcher: &DynamicDispatcher,
) -> DifferentiationResult<Vec<ResolvedOperation<'a>>> {
    tape.validate_trainable_parameters()?;
    let trainable = tape.trainable_parameters();

    let mut parameter_offset = 0;
    let mut resolved = Vec::with_capacity(tape.operations().len());
    for (position, record) in tape.operations().iter().enumerate() {
        let gate = dispatcher.resolve_gate_name(&record.operation_name)?;
        let parameter_range = parameter_offset..parameter_offset + record.parameters.len();
        let generator = gate.generator();

        let has_trainable = trainable.iter().any(|index| parameter_range.contains(index));
        if has_trainable && (generator.is_none() || record.parameters.len() != 1) {
            return Err(DifferentiationError::NotDifferentiable {
                operation: record.operation_name.clone(),
                position,
            });
        }

        resolved.push(ResolvedOperation {
            gate,
            generator,
            wires: &record.wires,
            inverse: record.inverse,
            parameters: &record.parameters,
            first_parameter_index: parameter_offset,
        });
        parameter_offset = parameter_range.end;
    }
    Ok(resolved)
}

// =============================================================================
// 3. AdjointJacobian
// =============================================================================

#[derive(Debug, Clone)]
pub struct AdjointJacobian {
    dispatcher: Arc<DynamicDispatcher>,
}

impl AdjointJacobian {
    pub fn new(dispatcher: Arc<DynamicDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Uses the process-wide dispatcher.
    pub fn with_default_dispatcher() -> DifferentiationResult<Self> {
        Ok(Self::new(default_dispatcher()?))
    }

    pub fn dispatcher(&self) -> &Arc<DynamicDispatcher> {
        &self.dispatcher
    }

    fn apply(&self, state: &mut QuantumStateVector, operation: &ResolvedOperation<'_>, inverse: bool) -> KernelResult<()> {
        let number_of_quantum_bits = state.number_of_quantum_bits();
        self.dispatcher.apply_selected_gate(
            state.amplitudes_mut(),
            number_of_quantum_bits,
            operation.gate,
            operation.wires,
            inverse,
            operation.parameters,
        )
    }

    /// One bra `O |ket>` per observable.
    fn observable_bras(&self, ket: &QuantumStateVector, tape: &DifferentiationTape) -> KernelResult<Vec<QuantumStateVector>> {
        tape.observables()
            .par_iter()
            .map(|observable| {
                let mut bra = ket.clone();
                observable.apply_in_place(&mut bra, &self.dispatcher).map(|_| bra)
            })
            .collect()
    }

    /// When `apply_operations` is false the tape's initial state is taken to
    /// already be the final state of the circuit.
    pub fn adjoint_jacobian(
        &self,
        jacobian: &mut Array2<f64>,
        tape: &DifferentiationTape,
        apply_operations: bool,
    ) -> DifferentiationResult<()> {
        let operations = resolve_tape(tape, &self.dispatcher)?;
        let trainable = tape.trainable_parameters();
        prepare_jacobian(jacobian, tape.number_of_observables(), trainable.len());
        if jacobian.is_empty() {
            return Ok(());
        }

        let mut ket = tape.initial_state().clone();
        if apply_operations {
            let span = tracing::debug_span!("adjoint_forward", tape_id = %tape.tape_id());
            let _guard = span.enter();
            for operation in &operations {
                self.apply(&mut ket, operation, operation.inverse)?;
            }
        }

        let mut bras = self.observable_bras(&ket, tape)?;
        let mut mu = QuantumStateVector::zero_state(ket.number_of_quantum_bits());

        let span = tracing::debug_span!("adjoint_backward", tape_id = %tape.tape_id());
        let _guard = span.enter();

        let mut remaining = trainable.len();
        for operation in operations.iter().rev() {
            if remaining == 0 {
                break;
            }

            mu.update_data(ket.amplitudes())?;
            self.apply(&mut ket, operation, !operation.inverse)?;

            let is_trainable = !operation.parameters.is_empty()
                && trainable[remaining - 1] == operation.first_parameter_index;
            if let Some(generator) = operation.generator.filter(|_| is_trainable) {
                let number_of_quantum_bits = mu.number_of_quantum_bits();
                let factor = self.dispatcher.apply_selected_generator(
                    mu.amplitudes_mut(),
                    number_of_quantum_bits,
                    generator,
                    operation.wires,
                    !operation.inverse,
                )?;
                let scaling = if operation.inverse { -factor } else { factor };
                let column = remaining - 1;
                for (row, bra) in bras.iter().enumerate() {
                    jacobian[[row, column]] = -2.0 * scaling * inner_product(bra.amplitudes(), mu.amplitudes()).im;
                }
                remaining -= 1;
            }

            bras.par_iter_mut()
                .try_for_each(|bra| self.apply(bra, operation, !operation.inverse))?;
        }

        tracing::debug!(
            "Adjoint Jacobian {}x{} computed for tape {}",
            jacobian.nrows(),
            jacobian.ncols(),
            tape.tape_id()
        );
        Ok(())
    }
}

impl JacobianEvaluator for AdjointJacobian {
    fn evaluate_jacobian(
        &self,
        jacobian: &mut Array2<f64>,
        tape: &DifferentiationTape,
        apply_operations: bool,
    ) -> DifferentiationResult<()> {
        self.adjoint_jacobian(jacobian, tape, apply_operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation_tape::OperationRecord;
    use statevector_runtime::configuration::RuntimeConfiguration;
    use statevector_runtime::dynamic_dispatcher::bootstrap;
    use statevector_runtime::observables::NamedObservable;

    fn evaluator() -> AdjointJacobian {
        AdjointJacobian::new(bootstrap(&RuntimeConfiguration::single_threaded()).unwrap())
    }

    #[test]
    fn test_single_rx_gradient() {
        let theta = 0.4;
        let tape = DifferentiationTape::new(QuantumStateVector::new(1))
            .with_operation(OperationRecord::parametric("RX", vec![0], theta))
            .with_observable(Arc::new(NamedObservable::pauli_z(0)))
            .with_trainable_parameters(vec![0])
            .unwrap();

        let mut jacobian = Array2::zeros((0, 0));
        evaluator().adjoint_jacobian(&mut jacobian, &tape, true).unwrap();
        assert_eq!(jacobian.dim(), (1, 1));
        assert!((jacobian[[0, 0]] + theta.sin()).abs() < 1e-10);
    }

    #[test]
    fn test_inverse_flips_gradient_sign() {
        let theta = 0.7;
        let tape = DifferentiationTape::new(QuantumStateVector::new(1))
            .with_operation(OperationRecord::parametric("RY", vec![0], theta).inverted())
            .with_observable(Arc::new(NamedObservable::pauli_x(0)))
            .with_trainable_parameters(vec![0])
            .unwrap();

        // <X> after RY(-theta) is -sin(theta).
        let mut jacobian = Array2::zeros((1, 1));
        evaluator().adjoint_jacobian(&mut jacobian, &tape, true).unwrap();
        assert!((jacobian[[0, 0]] + theta.cos()).abs() < 1e-10);
    }

    #[test]
    fn test_untrainable_parameters_are_skipped() {
        let tape = DifferentiationTape::new(QuantumStateVector::new(2))
            .with_operation(OperationRecord::parametric("RX", vec![0], 0.3))
            .with_operation(OperationRecord::parametric("RY", vec![1], 0.5))
            .with_observable(Arc::new(NamedObservable::pauli_z(0)))
            .with_observable(Arc::new(NamedObservable::pauli_z(1)))
            .with_trainable_parameters(vec![1])
            .unwrap();

        let mut jacobian = Array2::from_elem((3, 3), 9.0);
        evaluator().adjoint_jacobian(&mut jacobian, &tape, true).unwrap();
        assert_eq!(jacobian.dim(), (2, 1));
        assert!(jacobian[[0, 0]].abs() < 1e-10);
        assert!((jacobian[[1, 0]] + 0.5f64.sin()).abs() < 1e-10);
    }

    #[test]
    fn test_trainable_rot_is_rejected_before_work() {
        let tape = DifferentiationTape::new(QuantumStateVector::new(1))
            .with_operation(OperationRecord::parametric("RX", vec![0], 0.1))
            .with_operation(OperationRecord::new("Rot", vec![0], false, vec![0.1, 0.2, 0.3]))
            .with_observable(Arc::new(NamedObservable::pauli_z(0)))
            .with_trainable_parameters(vec![0, 2])
            .unwrap();

        let mut jacobian = Array2::zeros((1, 2));
        let result = evaluator().adjoint_jacobian(&mut jacobian, &tape, true);
        assert!(matches!(
            result,
            Err(DifferentiationError::NotDifferentiable { position: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_operation_is_a_runtime_error() {
        let tape = DifferentiationTape::new(QuantumStateVector::new(1))
            .with_operation(OperationRecord::fixed("QubitStateVector", vec![0]))
            .with_observable(Arc::new(NamedObservable::pauli_z(0)));
        let mut jacobian = Array2::zeros((1, 0));
        assert!(matches!(
            evaluator().adjoint_jacobian(&mut jacobian, &tape, true),
            Err(DifferentiationError::Runtime(_))
        ));
    }

    #[test]
    fn test_no_observables_gives_empty_jacobian() {
        let mut tape = DifferentiationTape::new(QuantumStateVector::new(1))
            .with_operation(OperationRecord::parametric("RZ", vec![0], 0.2));
        tape.train_all_parameters();
        let mut jacobian = Array2::from_elem((2, 2), 1.0);
        evaluator().adjoint_jacobian(&mut jacobian, &tape, true).unwrap();
        assert_eq!(jacobian.dim(), (0, 1));
    }
}

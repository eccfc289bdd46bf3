// =============================================================================
// LIGHTWIRE Simulator - Observables
// =============================================================================
// Table of Contents:
//   1. ObservableOperatorInterface - Trait for observables
//   2. NamedObservable - Single-wire named operator
//   3. HermitianObservable - Dense Hermitian matrix
//   4. TensorProductObservable - Product over disjoint wires
//   5. HamiltonianObservable - Real linear combination
// =============================================================================
// Purpose: An observable knows how to replace a state with `O |state>` using
//          the dispatcher. Expectation values, variances and the adjoint
//          method's bra states are all built from that single operation.
// =============================================================================

use crate::bit_utilities::{exp2, validate_wires};
use crate::dynamic_dispatcher::DynamicDispatcher;
use crate::error::{KernelResult, KernelRuntimeError, ShapeError};
use crate::gate_matrices::dagger;
use crate::kernel_catalog::{GateOperation, WireArity};
use crate::state_backend::QuantumStateVector;
use num_complex::Complex64;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// 1. ObservableOperatorInterface
// =============================================================================

pub trait ObservableOperatorInterface: Send + Sync + fmt::Debug {
    /// Replace `state` with `O |state>`. The result is not normalized.
    fn apply_in_place(&self, state: &mut QuantumStateVector, dispatcher: &DynamicDispatcher) -> KernelResult<()>;

    fn observable_name(&self) -> String;

    fn wires(&self) -> Vec<usize>;
}

// =============================================================================
// 2. NamedObservable
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedOperator {
    Identity,
    PauliX,
    PauliY,
    PauliZ,
    Hadamard,
}

impl NamedOperator {
    pub fn gate(self) -> GateOperation {
        match self {
            NamedOperator::Identity => GateOperation::Identity,
            NamedOperator::PauliX => GateOperation::PauliX,
            NamedOperator::PauliY => GateOperation::PauliY,
            NamedOperator::PauliZ => GateOperation::PauliZ,
            NamedOperator::Hadamard => GateOperation::Hadamard,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NamedObservable {
    operator: NamedOperator,
    wire: usize,
}

impl NamedObservable {
    pub fn new(operator: NamedOperator, wire: usize) -> Self {
        Self { operator, wire }
    }

    pub fn pauli_x(wire: usize) -> Self {
        Self::new(NamedOperator::PauliX, wire)
    }

    pub fn pauli_y(wire: usize) -> Self {
        Self::new(NamedOperator::PauliY, wire)
    }

    pub fn pauli_z(wire: usize) -> Self {
        Self::new(NamedOperator::PauliZ, wire)
    }

    pub fn operator(&self) -> NamedOperator {
        self.operator
    }
}

impl ObservableOperatorInterface for NamedObservable {
    fn apply_in_place(&self, state: &mut QuantumStateVector, dispatcher: &DynamicDispatcher) -> KernelResult<()> {
        let number_of_quantum_bits = state.number_of_quantum_bits();
        dispatcher.apply_selected_gate(
            state.amplitudes_mut(),
            number_of_quantum_bits,
            self.operator.gate(),
            &[self.wire],
            false,
            &[],
        )
    }

    fn observable_name(&self) -> String {
        format!("{}[{}]", self.operator.gate(), self.wire)
    }

    fn wires(&self) -> Vec<usize> {
        vec![self.wire]
    }
}

// =============================================================================
// 3. HermitianObservable
// =============================================================================

#[derive(Debug, Clone)]
pub struct HermitianObservable {
    matrix: Vec<Complex64>,
    wires: Vec<usize>,
}

impl HermitianObservable {
    /// `matrix` is row-major with side `2^wires.len()` and must equal its own
    /// conjugate transpose.
    pub fn new(matrix: Vec<Complex64>, wires: Vec<usize>) -> KernelResult<Self> {
        if wires.is_empty() {
            return Err(ShapeError::EmptyWires.into());
        }
        let dimension = exp2(wires.len());
        if matrix.len() != dimension * dimension {
            return Err(ShapeError::MatrixSizeMismatch {
                expected: dimension * dimension,
                actual: matrix.len(),
                wires: wires.len(),
            }
            .into());
        }
        let adjoint = dagger(&matrix, dimension);
        let is_hermitian = matrix
            .iter()
            .zip(adjoint.iter())
            .all(|(entry, adjoint_entry)| (entry - adjoint_entry).norm() < 1e-10);
        if !is_hermitian {
            return Err(KernelRuntimeError::InvalidArgument(
                "Observable matrix is not Hermitian".to_string(),
            ));
        }
        Ok(Self { matrix, wires })
    }

    pub fn matrix(&self) -> &[Complex64] {
        &self.matrix
    }
}

impl ObservableOperatorInterface for HermitianObservable {
    fn apply_in_place(&self, state: &mut QuantumStateVector, dispatcher: &DynamicDispatcher) -> KernelResult<()> {
        state.apply_matrix(dispatcher, &self.matrix, &self.wires, false)
    }

    fn observable_name(&self) -> String {
        format!("Hermitian{:?}", self.wires)
    }

    fn wires(&self) -> Vec<usize> {
        self.wires.clone()
    }
}

// =============================================================================
// 4. TensorProductObservable
// =============================================================================

#[derive(Debug, Clone)]
pub struct TensorProductObservable {
    factors: Vec<Arc<dyn ObservableOperatorInterface>>,
}

impl TensorProductObservable {
    /// Factors must act on pairwise disjoint wires.
    pub fn new(factors: Vec<Arc<dyn ObservableOperatorInterface>>) -> KernelResult<Self> {
        if factors.is_empty() {
            return Err(KernelRuntimeError::InvalidArgument(
                "A tensor product needs at least one factor".to_string(),
            ));
        }
        let mut seen = Vec::new();
        for factor in &factors {
            for wire in factor.wires() {
                if seen.contains(&wire) {
                    return Err(KernelRuntimeError::InvalidArgument(format!(
                        "Tensor product factors overlap on wire {}",
                        wire
                    )));
                }
                seen.push(wire);
            }
        }
        Ok(Self { factors })
    }

    pub fn factors(&self) -> &[Arc<dyn ObservableOperatorInterface>] {
        &self.factors
    }
}

impl ObservableOperatorInterface for TensorProductObservable {
    fn apply_in_place(&self, state: &mut QuantumStateVector, dispatcher: &DynamicDispatcher) -> KernelResult<()> {
        for factor in &self.factors {
            factor.apply_in_place(state, dispatcher)?;
        }
        Ok(())
    }

    fn observable_name(&self) -> String {
        self.factors
            .iter()
            .map(|factor| factor.observable_name())
            .collect::<Vec<_>>()
            .join(" @ ")
    }

    fn wires(&self) -> Vec<usize> {
        self.factors.iter().flat_map(|factor| factor.wires()).collect()
    }
}

// =============================================================================
// 5. HamiltonianObservable
// =============================================================================

#[derive(Debug, Clone)]
pub struct HamiltonianObservable {
    terms: Vec<(f64, Arc<dyn ObservableOperatorInterface>)>,
    name: String,
}

impl HamiltonianObservable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            terms: Vec::new(),
            name: name.into(),
        }
    }

    pub fn add_term(&mut self, coefficient: f64, observable: Arc<dyn ObservableOperatorInterface>) {
        self.terms.push((coefficient, observable));
    }

    pub fn with_term(mut self, coefficient: f64, observable: Arc<dyn ObservableOperatorInterface>) -> Self {
        self.add_term(coefficient, observable);
        self
    }

    pub fn terms(&self) -> &[(f64, Arc<dyn ObservableOperatorInterface>)] {
        &self.terms
    }

    /// `coupling * sum_i Z_i Z_{i+1}` over a chain of `number_of_qubits`.
    pub fn ising_zz(number_of_qubits: usize, coupling: f64) -> KernelResult<Self> {
        let mut hamiltonian = Self::new("ising_zz_hamiltonian");
        for i in 0..number_of_qubits.saturating_sub(1) {
            let pair = TensorProductObservable::new(vec![
                Arc::new(NamedObservable::pauli_z(i)),
                Arc::new(NamedObservable::pauli_z(i + 1)),
            ])?;
            hamiltonian.add_term(coupling, Arc::new(pair));
        }
        Ok(hamiltonian)
    }
}

impl ObservableOperatorInterface for HamiltonianObservable {
    fn apply_in_place(&self, state: &mut QuantumStateVector, dispatcher: &DynamicDispatcher) -> KernelResult<()> {
        let mut accumulated = vec![Complex64::new(0.0, 0.0); state.dimension()];
        for (coefficient, observable) in &self.terms {
            let mut term_state = state.clone();
            observable.apply_in_place(&mut term_state, dispatcher)?;
            for (total, amplitude) in accumulated.iter_mut().zip(term_state.amplitudes()) {
                *total += *amplitude * *coefficient;
            }
        }
        state.update_data(&accumulated)
    }

    fn observable_name(&self) -> String {
        self.name.clone()
    }

    fn wires(&self) -> Vec<usize> {
        let mut wires: Vec<usize> = self.terms.iter().flat_map(|(_, observable)| observable.wires()).collect();
        wires.sort_unstable();
        wires.dedup();
        wires
    }
}

/// Check that every wire of `observable` fits a `number_of_quantum_bits` state.
pub fn validate_observable_wires(
    observable: &dyn ObservableOperatorInterface,
    number_of_quantum_bits: usize,
) -> KernelResult<()> {
    let wires = observable.wires();
    if wires.is_empty() {
        return Ok(());
    }
    let mut unique = wires.clone();
    unique.sort_unstable();
    unique.dedup();
    validate_wires("Observable", WireArity::Variadic, number_of_quantum_bits, &unique)
}

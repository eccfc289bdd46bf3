// =============================================================================
// LIGHTWIRE Simulator - Operation Tape
// =============================================================================
// Table of Contents:
//   1. OperationRecord - One recorded gate application
//   2. DifferentiationTape - Operations, observables and trainable parameters
// =============================================================================
// Purpose: The tape is built by the caller and only read during
//          differentiation. Parameters are numbered globally in tape order,
//          so the first parameter of the third operation follows every
//          parameter of the first two.
// =============================================================================

use crate::error::{DifferentiationError, DifferentiationResult};
use statevector_runtime::observables::ObservableOperatorInterface;
use statevector_runtime::state_backend::QuantumStateVector;
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// 1. OperationRecord
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub operation_name: String,
    pub wires: Vec<usize>,
    pub inverse: bool,
    pub parameters: Vec<f64>,
}

impl OperationRecord {
    pub fn new(operation_name: impl Into<String>, wires: Vec<usize>, inverse: bool, parameters: Vec<f64>) -> Self {
        Self {
            operation_name: operation_name.into(),
            wires,
            inverse,
            parameters,
        }
    }

    /// A gate without parameters.
    pub fn fixed(operation_name: impl Into<String>, wires: Vec<usize>) -> Self {
        Self::new(operation_name, wires, false, Vec::new())
    }

    /// A single-parameter gate such as `RX` or `IsingZZ`.
    pub fn parametric(operation_name: impl Into<String>, wires: Vec<usize>, parameter: f64) -> Self {
        Self::new(operation_name, wires, false, vec![parameter])
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }
}

// =============================================================================
// 2. DifferentiationTape
// =============================================================================

#[derive(Debug, Clone)]
pub struct DifferentiationTape {
    tape_id: Uuid,
    initial_state: QuantumStateVector,
    operations: Vec<OperationRecord>,
    observables: Vec<Arc<dyn ObservableOperatorInterface>>,
    trainable_parameters: Vec<usize>,
}

impl DifferentiationTape {
    pub fn new(initial_state: QuantumStateVector) -> Self {
        Self {
            tape_id: Uuid::new_v4(),
            initial_state,
            operations: Vec::new(),
            observables: Vec::new(),
            trainable_parameters: Vec::new(),
        }
    }

    pub fn tape_id(&self) -> Uuid {
        self.tape_id
    }

    pub fn initial_state(&self) -> &QuantumStateVector {
        &self.initial_state
    }

    pub fn operations(&self) -> &[OperationRecord] {
        &self.operations
    }

    pub fn observables(&self) -> &[Arc<dyn ObservableOperatorInterface>] {
        &self.observables
    }

    pub fn trainable_parameters(&self) -> &[usize] {
        &self.trainable_parameters
    }

    pub fn number_of_observables(&self) -> usize {
        self.observables.len()
    }

    pub fn number_of_trainable_parameters(&self) -> usize {
        self.trainable_parameters.len()
    }

    /// Total parameter count over every recorded operation.
    pub fn number_of_parameters(&self) -> usize {
        self.operations.iter().map(|record| record.parameters.len()).sum()
    }

    pub fn push_operation(&mut self, record: OperationRecord) {
        self.operations.push(record);
    }

    pub fn with_operation(mut self, record: OperationRecord) -> Self {
        self.push_operation(record);
        self
    }

    pub fn add_observable(&mut self, observable: Arc<dyn ObservableOperatorInterface>) {
        self.observables.push(observable);
    }

    pub fn with_observable(mut self, observable: Arc<dyn ObservableOperatorInterface>) -> Self {
        self.add_observable(observable);
        self
    }

    /// Indices must be strictly increasing. Range is checked against the
    /// recorded operations by [`Self::validate_trainable_parameters`].
    pub fn set_trainable_parameters(&mut self, trainable_parameters: Vec<usize>) -> DifferentiationResult<()> {
        if let Some(window) = trainable_parameters.windows(2).find(|window| window[0] >= window[1]) {
            return Err(DifferentiationError::UnsortedTrainableParameters {
                previous: window[0],
                next: window[1],
            });
        }
        self.trainable_parameters = trainable_parameters;
        Ok(())
    }

    pub fn with_trainable_parameters(mut self, trainable_parameters: Vec<usize>) -> DifferentiationResult<Self> {
        self.set_trainable_parameters(trainable_parameters)?;
        Ok(self)
    }

    /// Marks every recorded parameter as trainable.
    pub fn train_all_parameters(&mut self) {
        self.trainable_parameters = (0..self.number_of_parameters()).collect();
    }

    pub fn validate_trainable_parameters(&self) -> DifferentiationResult<()> {
        let number_of_parameters = self.number_of_parameters();
        match self.trainable_parameters.last() {
            Some(&index) if index >= number_of_parameters => {
                Err(DifferentiationError::TrainableParameterOutOfRange {
                    index,
                    number_of_parameters,
                })
            }
            _ => Ok(()),
        }
    }
}

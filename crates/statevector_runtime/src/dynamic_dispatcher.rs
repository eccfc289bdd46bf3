// =============================================================================
// LIGHTWIRE Simulator - Dynamic Dispatcher
// =============================================================================
// Table of Contents:
//   1. Routine types
//   2. KernelSelection - Per-operation family chosen at bootstrap
//   3. DynamicDispatcher - Registry keyed by (operation, kernel family)
//   4. Name resolution
//   5. Registration
//   6. Kernel selection
//   7. Application entry points
//   8. Bootstrap and process default
// =============================================================================
// Purpose: Binds every (operation, kernel family) pair to a concrete routine
//          and resolves it at call time. The registry is an explicit owned
//          object built by `bootstrap` and shared as `Arc<DynamicDispatcher>`.
//          Entries are only ever added; a duplicate key replaces the previous
//          routine. Routines are cloned out of the lock before they run, so a
//          long kernel never blocks registration.
// =============================================================================

use crate::configuration::RuntimeConfiguration;
use crate::error::{KernelResult, KernelRuntimeError, LookupError, ShapeError};
use crate::kernel_catalog::{GateOperation, GeneratorOperation, KernelFamily, MatrixOperation, OperationIdentity};
use crate::kernels::{BitMaskLoopKernels, GateKernelFamily, ParallelBitMaskLoopKernels, PermutationIndexedKernels};
use num_complex::Complex64;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// 1. Routine types
// =============================================================================

/// `(data, number_of_quantum_bits, wires, inverse, parameters)`
pub type GateRoutine =
    Arc<dyn Fn(&mut [Complex64], usize, &[usize], bool, &[f64]) -> KernelResult<()> + Send + Sync>;

/// `(data, number_of_quantum_bits, wires, adjoint)`, returns the scaling factor.
pub type GeneratorRoutine =
    Arc<dyn Fn(&mut [Complex64], usize, &[usize], bool) -> KernelResult<f64> + Send + Sync>;

/// `(data, number_of_quantum_bits, matrix, wires, inverse)`
pub type MatrixRoutine =
    Arc<dyn Fn(&mut [Complex64], usize, &[Complex64], &[usize], bool) -> KernelResult<()> + Send + Sync>;

// =============================================================================
// 2. KernelSelection
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct KernelSelection {
    pub gates: HashMap<GateOperation, KernelFamily>,
    pub generators: HashMap<GeneratorOperation, KernelFamily>,
    pub matrices: HashMap<MatrixOperation, KernelFamily>,
}

// =============================================================================
// 3. DynamicDispatcher
// =============================================================================

pub struct DynamicDispatcher {
    dispatcher_id: Uuid,
    gate_names: HashMap<&'static str, GateOperation>,
    generator_names: HashMap<&'static str, GeneratorOperation>,
    matrix_names: HashMap<&'static str, MatrixOperation>,
    gate_routines: RwLock<HashMap<(GateOperation, KernelFamily), GateRoutine>>,
    generator_routines: RwLock<HashMap<(GeneratorOperation, KernelFamily), GeneratorRoutine>>,
    matrix_routines: RwLock<HashMap<(MatrixOperation, KernelFamily), MatrixRoutine>>,
    registration_order: RwLock<Vec<KernelFamily>>,
    kernel_selection: RwLock<KernelSelection>,
}

impl fmt::Debug for DynamicDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicDispatcher")
            .field("dispatcher_id", &self.dispatcher_id)
            .field("gate_routines", &self.gate_routines.read().len())
            .field("generator_routines", &self.generator_routines.read().len())
            .field("matrix_routines", &self.matrix_routines.read().len())
            .field("registration_order", &*self.registration_order.read())
            .finish()
    }
}

impl Default for DynamicDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicDispatcher {
    /// An empty registry. Name maps are filled from the catalog; no routines
    /// are registered until `register_*` or `bootstrap` runs.
    pub fn new() -> Self {
        Self {
            dispatcher_id: Uuid::new_v4(),
            gate_names: GateOperation::ALL.iter().map(|&gate| (gate.name(), gate)).collect(),
            generator_names: GeneratorOperation::ALL
                .iter()
                .map(|&generator| (generator.name(), generator))
                .collect(),
            matrix_names: MatrixOperation::ALL
                .iter()
                .map(|&matrix| (matrix.name(), matrix))
                .collect(),
            gate_routines: RwLock::new(HashMap::new()),
            generator_routines: RwLock::new(HashMap::new()),
            matrix_routines: RwLock::new(HashMap::new()),
            registration_order: RwLock::new(Vec::new()),
            kernel_selection: RwLock::new(KernelSelection::default()),
        }
    }

    pub fn dispatcher_id(&self) -> Uuid {
        self.dispatcher_id
    }

    // =========================================================================
    // 4. Name resolution
    // =========================================================================

    pub fn resolve_gate_name(&self, name: &str) -> KernelResult<GateOperation> {
        self.gate_names
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::UnknownGateName(name.to_string()).into())
    }

    pub fn resolve_generator_name(&self, name: &str) -> KernelResult<GeneratorOperation> {
        self.generator_names
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::UnknownGeneratorName(name.to_string()).into())
    }

    pub fn resolve_matrix_name(&self, name: &str) -> KernelResult<MatrixOperation> {
        self.matrix_names
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::UnknownMatrixName(name.to_string()).into())
    }

    /// Exact, case-sensitive lookup across all three categories.
    pub fn resolve_name(&self, name: &str) -> KernelResult<OperationIdentity> {
        if let Some(&gate) = self.gate_names.get(name) {
            return Ok(gate.into());
        }
        if let Some(&generator) = self.generator_names.get(name) {
            return Ok(generator.into());
        }
        if let Some(&matrix) = self.matrix_names.get(name) {
            return Ok(matrix.into());
        }
        Err(LookupError::UnknownGateName(name.to_string()).into())
    }

    // =========================================================================
    // 5. Registration
    // =========================================================================

    pub fn register_gate_routine(&self, operation: GateOperation, kernel: KernelFamily, routine: GateRoutine) {
        if self.gate_routines.write().insert((operation, kernel), routine).is_some() {
            tracing::warn!("Replaced gate routine for {} on kernel {}", operation, kernel);
        }
        self.note_kernel(kernel);
    }

    pub fn register_generator_routine(
        &self,
        operation: GeneratorOperation,
        kernel: KernelFamily,
        routine: GeneratorRoutine,
    ) {
        if self.generator_routines.write().insert((operation, kernel), routine).is_some() {
            tracing::warn!("Replaced generator routine for {} on kernel {}", operation, kernel);
        }
        self.note_kernel(kernel);
    }

    pub fn register_matrix_routine(&self, operation: MatrixOperation, kernel: KernelFamily, routine: MatrixRoutine) {
        if self.matrix_routines.write().insert((operation, kernel), routine).is_some() {
            tracing::warn!("Replaced matrix routine for {} on kernel {}", operation, kernel);
        }
        self.note_kernel(kernel);
    }

    fn note_kernel(&self, kernel: KernelFamily) {
        let mut order = self.registration_order.write();
        if !order.contains(&kernel) {
            order.push(kernel);
        }
    }

    /// Registers one routine per operation the family declares.
    pub fn register_kernel_family(&self, family: Arc<dyn GateKernelFamily>) {
        let kernel = family.kernel_family();

        for &operation in family.implemented_gates() {
            let family = Arc::clone(&family);
            self.register_gate_routine(
                operation,
                kernel,
                Arc::new(
                    move |data: &mut [Complex64],
                          number_of_quantum_bits: usize,
                          wires: &[usize],
                          inverse: bool,
                          parameters: &[f64]| {
                        family.apply_gate(operation, data, number_of_quantum_bits, wires, inverse, parameters)
                    },
                ),
            );
        }

        for &operation in family.implemented_generators() {
            let family = Arc::clone(&family);
            self.register_generator_routine(
                operation,
                kernel,
                Arc::new(
                    move |data: &mut [Complex64], number_of_quantum_bits: usize, wires: &[usize], adjoint: bool| {
                        family.apply_generator(operation, data, number_of_quantum_bits, wires, adjoint)
                    },
                ),
            );
        }

        for &operation in family.implemented_matrices() {
            let family = Arc::clone(&family);
            self.register_matrix_routine(
                operation,
                kernel,
                Arc::new(
                    move |data: &mut [Complex64],
                          number_of_quantum_bits: usize,
                          matrix: &[Complex64],
                          wires: &[usize],
                          inverse: bool| {
                        family.apply_matrix(operation, data, number_of_quantum_bits, matrix, wires, inverse)
                    },
                ),
            );
        }

        tracing::info!(
            "Dispatcher {} registered kernel family {}: {} gates, {} generators, {} matrix operations",
            self.dispatcher_id,
            kernel,
            family.implemented_gates().len(),
            family.implemented_generators().len(),
            family.implemented_matrices().len()
        );
    }

    pub fn is_registered(&self, identity: impl Into<OperationIdentity>, kernel: KernelFamily) -> bool {
        match identity.into() {
            OperationIdentity::Gate(gate) => self.gate_routines.read().contains_key(&(gate, kernel)),
            OperationIdentity::Generator(generator) => {
                self.generator_routines.read().contains_key(&(generator, kernel))
            }
            OperationIdentity::Matrix(matrix) => self.matrix_routines.read().contains_key(&(matrix, kernel)),
        }
    }

    /// Gates registered for `kernel`, in catalog order.
    pub fn registered_gates_for_kernel(&self, kernel: KernelFamily) -> Vec<GateOperation> {
        let routines = self.gate_routines.read();
        GateOperation::ALL
            .iter()
            .copied()
            .filter(|&gate| routines.contains_key(&(gate, kernel)))
            .collect()
    }

    pub fn registered_kernels(&self) -> Vec<KernelFamily> {
        self.registration_order.read().clone()
    }

    // =========================================================================
    // 6. Kernel selection
    // =========================================================================

    /// Rebuilds the selection table from `configuration` and the routines
    /// registered so far. Overrides must name a family that implements the
    /// gate; otherwise the default family is used when it implements the
    /// operation, falling back to the first registered family that does.
    pub fn select_kernels(&self, configuration: &RuntimeConfiguration) -> KernelResult<()> {
        let overrides: HashMap<GateOperation, KernelFamily> =
            configuration.resolved_overrides()?.into_iter().collect();
        let default_kernel = configuration.default_kernel_family;
        let order = self.registration_order.read().clone();
        let mut selection = KernelSelection::default();

        {
            let gate_routines = self.gate_routines.read();
            for gate in GateOperation::ALL {
                let implements = |kernel: KernelFamily| gate_routines.contains_key(&(gate, kernel));
                let chosen = match overrides.get(&gate) {
                    Some(&kernel) if implements(kernel) => Some(kernel),
                    Some(&kernel) => {
                        return Err(KernelRuntimeError::Configuration(format!(
                            "Kernel override {} for gate {} is not registered",
                            kernel, gate
                        )))
                    }
                    None if implements(default_kernel) => Some(default_kernel),
                    None => order.iter().copied().find(|&kernel| implements(kernel)),
                };
                if let Some(kernel) = chosen {
                    selection.gates.insert(gate, kernel);
                }
            }
        }

        {
            let generator_routines = self.generator_routines.read();
            for generator in GeneratorOperation::ALL {
                let implements = |kernel: KernelFamily| generator_routines.contains_key(&(generator, kernel));
                let preferred = selection
                    .gates
                    .get(&generator.gate())
                    .copied()
                    .filter(|&kernel| implements(kernel));
                let chosen = preferred
                    .or_else(|| Some(default_kernel).filter(|&kernel| implements(kernel)))
                    .or_else(|| order.iter().copied().find(|&kernel| implements(kernel)));
                if let Some(kernel) = chosen {
                    selection.generators.insert(generator, kernel);
                }
            }
        }

        {
            let matrix_routines = self.matrix_routines.read();
            for matrix in MatrixOperation::ALL {
                let implements = |kernel: KernelFamily| matrix_routines.contains_key(&(matrix, kernel));
                let chosen = Some(default_kernel)
                    .filter(|&kernel| implements(kernel))
                    .or_else(|| order.iter().copied().find(|&kernel| implements(kernel)));
                if let Some(kernel) = chosen {
                    selection.matrices.insert(matrix, kernel);
                }
            }
        }

        for (gate, kernel) in &selection.gates {
            if *kernel != default_kernel {
                tracing::debug!("Gate {} routed to kernel {} instead of {}", gate, kernel, default_kernel);
            }
        }
        tracing::info!(
            "Dispatcher {} kernel selection ready: default {}, {} gates, {} generators, {} matrix operations",
            self.dispatcher_id,
            default_kernel,
            selection.gates.len(),
            selection.generators.len(),
            selection.matrices.len()
        );

        *self.kernel_selection.write() = selection;
        Ok(())
    }

    pub fn kernel_selection(&self) -> KernelSelection {
        self.kernel_selection.read().clone()
    }

    pub fn selected_kernel_for_gate(&self, operation: GateOperation) -> KernelResult<KernelFamily> {
        self.kernel_selection
            .read()
            .gates
            .get(&operation)
            .copied()
            .ok_or_else(|| LookupError::NoKernelSelected(operation.name()).into())
    }

    pub fn selected_kernel_for_generator(&self, operation: GeneratorOperation) -> KernelResult<KernelFamily> {
        self.kernel_selection
            .read()
            .generators
            .get(&operation)
            .copied()
            .ok_or_else(|| LookupError::NoKernelSelected(operation.name()).into())
    }

    pub fn selected_kernel_for_matrix(&self, operation: MatrixOperation) -> KernelResult<KernelFamily> {
        self.kernel_selection
            .read()
            .matrices
            .get(&operation)
            .copied()
            .ok_or_else(|| LookupError::NoKernelSelected(operation.name()).into())
    }

    // =========================================================================
    // 7. Application entry points
    // =========================================================================

    fn gate_routine(&self, operation: GateOperation, kernel: KernelFamily) -> KernelResult<GateRoutine> {
        self.gate_routines
            .read()
            .get(&(operation, kernel))
            .cloned()
            .ok_or_else(|| {
                LookupError::GateNotRegistered {
                    operation: operation.name(),
                    kernel,
                }
                .into()
            })
    }

    fn generator_routine(&self, operation: GeneratorOperation, kernel: KernelFamily) -> KernelResult<GeneratorRoutine> {
        self.generator_routines
            .read()
            .get(&(operation, kernel))
            .cloned()
            .ok_or_else(|| {
                LookupError::GeneratorNotRegistered {
                    operation: operation.name(),
                    kernel,
                }
                .into()
            })
    }

    fn matrix_routine(&self, operation: MatrixOperation, kernel: KernelFamily) -> KernelResult<MatrixRoutine> {
        self.matrix_routines
            .read()
            .get(&(operation, kernel))
            .cloned()
            .ok_or_else(|| {
                LookupError::MatrixNotRegistered {
                    operation: operation.name(),
                    kernel,
                }
                .into()
            })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn apply_gate(
        &self,
        kernel: KernelFamily,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        operation: GateOperation,
        wires: &[usize],
        inverse: bool,
        parameters: &[f64],
    ) -> KernelResult<()> {
        let routine = self.gate_routine(operation, kernel)?;
        tracing::debug!("Applying {} on wires {:?} with kernel {}", operation, wires, kernel);
        routine(data, number_of_quantum_bits, wires, inverse, parameters)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn apply_gate_by_name(
        &self,
        kernel: KernelFamily,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        operation_name: &str,
        wires: &[usize],
        inverse: bool,
        parameters: &[f64],
    ) -> KernelResult<()> {
        let operation = self.resolve_gate_name(operation_name)?;
        self.apply_gate(kernel, data, number_of_quantum_bits, operation, wires, inverse, parameters)
    }

    /// Applies `operation` with the kernel chosen for it at bootstrap.
    pub fn apply_selected_gate(
        &self,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        operation: GateOperation,
        wires: &[usize],
        inverse: bool,
        parameters: &[f64],
    ) -> KernelResult<()> {
        let kernel = self.selected_kernel_for_gate(operation)?;
        self.apply_gate(kernel, data, number_of_quantum_bits, operation, wires, inverse, parameters)
    }

    /// Applies a batch in order using the selection table. The four lists
    /// must have equal length and every name must resolve before the first
    /// gate runs; a failure part way through leaves earlier gates applied.
    pub fn apply_operations<S: AsRef<str>>(
        &self,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        operation_names: &[S],
        wires: &[Vec<usize>],
        inverses: &[bool],
        parameters: &[Vec<f64>],
    ) -> KernelResult<()> {
        let operations = self.prepare_batch(operation_names, wires, inverses, parameters)?;
        for (index, operation) in operations.into_iter().enumerate() {
            self.apply_selected_gate(
                data,
                number_of_quantum_bits,
                operation,
                &wires[index],
                inverses[index],
                &parameters[index],
            )?;
        }
        Ok(())
    }

    /// Same as `apply_operations` with one family for every gate.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_operations_with_kernel<S: AsRef<str>>(
        &self,
        kernel: KernelFamily,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        operation_names: &[S],
        wires: &[Vec<usize>],
        inverses: &[bool],
        parameters: &[Vec<f64>],
    ) -> KernelResult<()> {
        let operations = self.prepare_batch(operation_names, wires, inverses, parameters)?;
        for (index, operation) in operations.into_iter().enumerate() {
            self.apply_gate(
                kernel,
                data,
                number_of_quantum_bits,
                operation,
                &wires[index],
                inverses[index],
                &parameters[index],
            )?;
        }
        Ok(())
    }

    fn prepare_batch<S: AsRef<str>>(
        &self,
        operation_names: &[S],
        wires: &[Vec<usize>],
        inverses: &[bool],
        parameters: &[Vec<f64>],
    ) -> KernelResult<Vec<GateOperation>> {
        let count = operation_names.len();
        if wires.len() != count || inverses.len() != count || parameters.len() != count {
            return Err(ShapeError::BatchLengthMismatch {
                operations: count,
                wires: wires.len(),
                inverses: inverses.len(),
                parameters: parameters.len(),
            }
            .into());
        }
        operation_names
            .iter()
            .map(|name| self.resolve_gate_name(name.as_ref()))
            .collect()
    }

    /// `matrix` is row-major with side `2^wires.len()`; its length is checked
    /// before the state is touched.
    pub fn apply_matrix(
        &self,
        kernel: KernelFamily,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        matrix: &[Complex64],
        wires: &[usize],
        inverse: bool,
    ) -> KernelResult<()> {
        let operation = Self::matrix_operation_for(matrix, wires)?;
        let routine = self.matrix_routine(operation, kernel)?;
        tracing::debug!("Applying {} on wires {:?} with kernel {}", operation, wires, kernel);
        routine(data, number_of_quantum_bits, matrix, wires, inverse)
    }

    pub fn apply_selected_matrix(
        &self,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        matrix: &[Complex64],
        wires: &[usize],
        inverse: bool,
    ) -> KernelResult<()> {
        let operation = Self::matrix_operation_for(matrix, wires)?;
        let kernel = self.selected_kernel_for_matrix(operation)?;
        self.apply_matrix(kernel, data, number_of_quantum_bits, matrix, wires, inverse)
    }

    fn matrix_operation_for(matrix: &[Complex64], wires: &[usize]) -> KernelResult<MatrixOperation> {
        if wires.is_empty() {
            return Err(ShapeError::EmptyWires.into());
        }
        let expected = u32::try_from(2 * wires.len())
            .ok()
            .and_then(|exponent| 1usize.checked_shl(exponent));
        if expected != Some(matrix.len()) {
            return Err(ShapeError::MatrixSizeMismatch {
                expected: expected.unwrap_or(usize::MAX),
                actual: matrix.len(),
                wires: wires.len(),
            }
            .into());
        }
        Ok(MatrixOperation::for_wire_count(wires.len()))
    }

    pub fn apply_generator(
        &self,
        kernel: KernelFamily,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        operation: GeneratorOperation,
        wires: &[usize],
        adjoint: bool,
    ) -> KernelResult<f64> {
        let routine = self.generator_routine(operation, kernel)?;
        tracing::debug!("Applying {} on wires {:?} with kernel {}", operation, wires, kernel);
        routine(data, number_of_quantum_bits, wires, adjoint)
    }

    pub fn apply_generator_by_name(
        &self,
        kernel: KernelFamily,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        operation_name: &str,
        wires: &[usize],
        adjoint: bool,
    ) -> KernelResult<f64> {
        let operation = self.resolve_generator_name(operation_name)?;
        self.apply_generator(kernel, data, number_of_quantum_bits, operation, wires, adjoint)
    }

    pub fn apply_selected_generator(
        &self,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        operation: GeneratorOperation,
        wires: &[usize],
        adjoint: bool,
    ) -> KernelResult<f64> {
        let kernel = self.selected_kernel_for_generator(operation)?;
        self.apply_generator(kernel, data, number_of_quantum_bits, operation, wires, adjoint)
    }
}

// =============================================================================
// 8. Bootstrap and process default
// =============================================================================

/// Registers every built-in family (PI, LM, ParallelLM in that order) and
/// builds the kernel selection table from `configuration`.
pub fn bootstrap(configuration: &RuntimeConfiguration) -> KernelResult<Arc<DynamicDispatcher>> {
    configuration.validate()?;

    let dispatcher = DynamicDispatcher::new();
    dispatcher.register_kernel_family(Arc::new(PermutationIndexedKernels::new()));
    dispatcher.register_kernel_family(Arc::new(BitMaskLoopKernels::new()));
    dispatcher.register_kernel_family(Arc::new(ParallelBitMaskLoopKernels::from_configuration(
        configuration,
    )?));
    dispatcher.select_kernels(configuration)?;

    tracing::info!(
        "Dispatcher {} bootstrapped with kernels {:?}",
        dispatcher.dispatcher_id(),
        dispatcher.registered_kernels()
    );
    Ok(Arc::new(dispatcher))
}

lazy_static::lazy_static! {
    static ref DEFAULT_DISPATCHER: Result<Arc<DynamicDispatcher>, String> =
        bootstrap(&RuntimeConfiguration::default()).map_err(|error| error.to_string());
}

/// Process-wide dispatcher built once from `RuntimeConfiguration::default()`.
pub fn default_dispatcher() -> KernelResult<Arc<DynamicDispatcher>> {
    DEFAULT_DISPATCHER
        .as_ref()
        .map(Arc::clone)
        .map_err(|message| KernelRuntimeError::Configuration(message.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn dispatcher() -> Arc<DynamicDispatcher> {
        bootstrap(&RuntimeConfiguration::single_threaded()).unwrap()
    }

    fn zero_state(number_of_quantum_bits: usize) -> Vec<Complex64> {
        let mut state = vec![Complex64::new(0.0, 0.0); 1 << number_of_quantum_bits];
        state[0] = Complex64::new(1.0, 0.0);
        state
    }

    #[test]
    fn test_every_name_resolves_to_its_identity() {
        let dispatcher = dispatcher();
        for gate in GateOperation::ALL {
            assert_eq!(dispatcher.resolve_name(gate.name()).unwrap(), OperationIdentity::Gate(gate));
        }
        for generator in GeneratorOperation::ALL {
            assert_eq!(
                dispatcher.resolve_name(generator.name()).unwrap(),
                OperationIdentity::Generator(generator)
            );
        }
        for matrix in MatrixOperation::ALL {
            assert_eq!(
                dispatcher.resolve_name(matrix.name()).unwrap(),
                OperationIdentity::Matrix(matrix)
            );
        }
        assert!(dispatcher.resolve_name("hadamard").is_err());
        assert!(dispatcher.resolve_name("XYZ").is_err());
    }

    #[test]
    fn test_unregistered_pair_names_operation_and_kernel() {
        let dispatcher = dispatcher();
        let mut state = zero_state(3);
        let error = dispatcher
            .apply_gate(
                KernelFamily::ParallelBitMaskLoop,
                &mut state,
                3,
                GateOperation::Toffoli,
                &[0, 1, 2],
                false,
                &[],
            )
            .unwrap_err();
        let message = error.to_string();
        assert!(message.contains("Toffoli"));
        assert!(message.contains("ParallelLM"));
        assert!(!dispatcher.is_registered(GateOperation::Toffoli, KernelFamily::ParallelBitMaskLoop));
        assert!(dispatcher.is_registered(GateOperation::Toffoli, KernelFamily::BitMaskLoop));
    }

    #[test]
    fn test_batch_length_mismatch_leaves_state_untouched() {
        let dispatcher = dispatcher();
        let mut state = zero_state(2);
        let before = state.clone();
        let result = dispatcher.apply_operations(
            &mut state,
            2,
            &["Hadamard", "CNOT"],
            &[vec![0], vec![0, 1]],
            &[false],
            &[vec![], vec![]],
        );
        assert!(matches!(
            result,
            Err(KernelRuntimeError::Shape(ShapeError::BatchLengthMismatch { .. }))
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_apply_operations_builds_bell_state() {
        let dispatcher = dispatcher();
        let mut state = zero_state(2);
        dispatcher
            .apply_operations(
                &mut state,
                2,
                &["Hadamard", "CNOT"],
                &[vec![0], vec![0, 1]],
                &[false, false],
                &[vec![], vec![]],
            )
            .unwrap();
        assert!((state[0].re - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((state[3].re - FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_size_mismatch_is_checked_first() {
        let dispatcher = dispatcher();
        let mut state = zero_state(2);
        let before = state.clone();
        let matrix = vec![Complex64::new(1.0, 0.0); 8];
        let result = dispatcher.apply_matrix(KernelFamily::BitMaskLoop, &mut state, 2, &matrix, &[0, 1], false);
        assert!(matches!(
            result,
            Err(KernelRuntimeError::Shape(ShapeError::MatrixSizeMismatch { expected: 16, actual: 8, wires: 2 }))
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_generator_returns_scaling_factor_by_name() {
        let dispatcher = dispatcher();
        let mut state = zero_state(1);
        let factor = dispatcher
            .apply_generator_by_name(KernelFamily::BitMaskLoop, &mut state, 1, "GeneratorPhaseShift", &[0], false)
            .unwrap();
        assert_eq!(factor, 1.0);
        let factor = dispatcher
            .apply_generator_by_name(KernelFamily::PermutationIndexed, &mut state, 1, "GeneratorRY", &[0], false)
            .unwrap();
        assert_eq!(factor, -0.5);
    }

    #[test]
    fn test_selection_falls_back_when_default_lacks_gate() {
        let configuration = RuntimeConfiguration::single_threaded()
            .with_default_kernel_family(KernelFamily::ParallelBitMaskLoop)
            .with_kernel_override(GateOperation::CRot, KernelFamily::BitMaskLoop);
        let dispatcher = bootstrap(&configuration).unwrap();
        assert_eq!(
            dispatcher.selected_kernel_for_gate(GateOperation::Hadamard).unwrap(),
            KernelFamily::ParallelBitMaskLoop
        );
        // First registered family implementing Toffoli
        assert_eq!(
            dispatcher.selected_kernel_for_gate(GateOperation::Toffoli).unwrap(),
            KernelFamily::PermutationIndexed
        );
        assert_eq!(
            dispatcher.selected_kernel_for_gate(GateOperation::CRot).unwrap(),
            KernelFamily::BitMaskLoop
        );
        assert_eq!(
            dispatcher.selected_kernel_for_generator(GeneratorOperation::IsingZZ).unwrap(),
            KernelFamily::PermutationIndexed
        );
    }

    #[test]
    fn test_override_to_missing_family_fails_bootstrap() {
        let configuration = RuntimeConfiguration::single_threaded()
            .with_kernel_override(GateOperation::Toffoli, KernelFamily::ParallelBitMaskLoop);
        assert!(matches!(bootstrap(&configuration), Err(KernelRuntimeError::Configuration(_))));
    }

    #[test]
    fn test_late_registration_replaces_routine() {
        let dispatcher = DynamicDispatcher::new();
        let failing: GateRoutine = Arc::new(|_: &mut [Complex64], _: usize, _: &[usize], _: bool, _: &[f64]| {
            Err(KernelRuntimeError::InvalidArgument("first".to_string()))
        });
        let succeeding: GateRoutine =
            Arc::new(|_: &mut [Complex64], _: usize, _: &[usize], _: bool, _: &[f64]| Ok(()));
        dispatcher.register_gate_routine(GateOperation::PauliX, KernelFamily::BitMaskLoop, failing);
        dispatcher.register_gate_routine(GateOperation::PauliX, KernelFamily::BitMaskLoop, succeeding);
        let mut state = zero_state(1);
        assert!(dispatcher
            .apply_gate(KernelFamily::BitMaskLoop, &mut state, 1, GateOperation::PauliX, &[0], false, &[])
            .is_ok());
        assert_eq!(dispatcher.registered_gates_for_kernel(KernelFamily::BitMaskLoop), vec![GateOperation::PauliX]);
    }

    #[test]
    fn test_default_dispatcher_is_shared() {
        let first = default_dispatcher().unwrap();
        let second = default_dispatcher().unwrap();
        assert_eq!(first.dispatcher_id(), second.dispatcher_id());
    }
}

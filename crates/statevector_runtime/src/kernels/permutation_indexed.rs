// =============================================================================
// LIGHTWIRE Simulator - Permutation-Indexed Kernels ("PI")
// =============================================================================
// Purpose: For every call, build the internal offset table (the 2^k indices
//          addressed by the wires) and the external index table (every index
//          with zeros on those wires), then gather, multiply by the dense gate
//          matrix, and scatter back. Variadic diagonal operations multiply by
//          their diagonal instead. Implements every catalog operation and is
//          the reference family the specialized families are tested against.
// =============================================================================

use super::{apply_dense_matrix_with_tables, apply_diagonal_with_tables, GateKernelFamily};
use crate::bit_utilities::{exp2, external_indices, internal_offsets, validate_state_buffer, validate_wires};
use crate::error::{KernelResult, ShapeError};
use crate::gate_matrices::{dagger, gate_diagonal, gate_matrix, generator_diagonal, generator_matrix};
use crate::kernel_catalog::{GateOperation, GeneratorOperation, KernelFamily, MatrixOperation};
use num_complex::Complex64;

#[derive(Debug, Clone, Copy, Default)]
pub struct PermutationIndexedKernels;

impl PermutationIndexedKernels {
    pub fn new() -> Self {
        Self
    }

    fn apply_tables(
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        matrix: &[Complex64],
        wires: &[usize],
    ) {
        let internal = internal_offsets(number_of_quantum_bits, wires);
        let external = external_indices(number_of_quantum_bits, wires);
        apply_dense_matrix_with_tables(data, matrix, &internal, &external);
    }

    fn apply_diagonal(
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        diagonal: &[Complex64],
        wires: &[usize],
    ) {
        let internal = internal_offsets(number_of_quantum_bits, wires);
        let external = external_indices(number_of_quantum_bits, wires);
        apply_diagonal_with_tables(data, diagonal, &internal, &external);
    }
}

impl GateKernelFamily for PermutationIndexedKernels {
    fn kernel_family(&self) -> KernelFamily {
        KernelFamily::PermutationIndexed
    }

    fn implemented_gates(&self) -> &'static [GateOperation] {
        &GateOperation::ALL
    }

    fn implemented_generators(&self) -> &'static [GeneratorOperation] {
        &GeneratorOperation::ALL
    }

    fn implemented_matrices(&self) -> &'static [MatrixOperation] {
        &MatrixOperation::ALL
    }

    fn apply_gate(
        &self,
        operation: GateOperation,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        wires: &[usize],
        inverse: bool,
        parameters: &[f64],
    ) -> KernelResult<()> {
        validate_state_buffer(data.len(), number_of_quantum_bits)?;
        validate_wires(operation.name(), operation.wire_arity(), number_of_quantum_bits, wires)?;
        if let Some(diagonal) = gate_diagonal(operation, wires.len(), parameters, inverse)? {
            Self::apply_diagonal(data, number_of_quantum_bits, &diagonal, wires);
            return Ok(());
        }
        let matrix = gate_matrix(operation, wires.len(), parameters, inverse)?;
        Self::apply_tables(data, number_of_quantum_bits, &matrix, wires);
        Ok(())
    }

    fn apply_generator(
        &self,
        operation: GeneratorOperation,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        wires: &[usize],
        _adjoint: bool,
    ) -> KernelResult<f64> {
        validate_state_buffer(data.len(), number_of_quantum_bits)?;
        validate_wires(operation.name(), operation.wire_arity(), number_of_quantum_bits, wires)?;
        match generator_diagonal(operation, wires.len()) {
            Some(diagonal) => Self::apply_diagonal(data, number_of_quantum_bits, &diagonal, wires),
            None => {
                let matrix = generator_matrix(operation, wires.len());
                Self::apply_tables(data, number_of_quantum_bits, &matrix, wires);
            }
        }
        Ok(operation.scaling_factor())
    }

    fn apply_matrix(
        &self,
        operation: MatrixOperation,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        matrix: &[Complex64],
        wires: &[usize],
        inverse: bool,
    ) -> KernelResult<()> {
        validate_state_buffer(data.len(), number_of_quantum_bits)?;
        validate_wires(operation.name(), operation.wire_arity(), number_of_quantum_bits, wires)?;
        let dimension = exp2(wires.len());
        if matrix.len() != dimension * dimension {
            return Err(ShapeError::MatrixSizeMismatch {
                expected: dimension * dimension,
                actual: matrix.len(),
                wires: wires.len(),
            }
            .into());
        }
        if inverse {
            let adjoint_matrix = dagger(matrix, dimension);
            Self::apply_tables(data, number_of_quantum_bits, &adjoint_matrix, wires);
        } else {
            Self::apply_tables(data, number_of_quantum_bits, matrix, wires);
        }
        Ok(())
    }
}

// =============================================================================
// LIGHTWIRE Simulator - Bit-Mask Loop Kernels ("LM")
// =============================================================================
// Table of Contents:
//   1. Index iterators (pairs, quads, octets)
//   2. Small dense matrix loops
//   3. GateKernelFamily implementation
// =============================================================================
// Purpose: Iterate over the compressed index space (n - k bits), insert zero
//          bits at the wire positions to reach the base amplitude, and apply a
//          loop specialized for each gate. No index tables are allocated for
//          one, two and three wire gates.
// =============================================================================

use super::{apply_dense_matrix_with_tables, GateKernelFamily};
use crate::bit_utilities::{
    bit_position, exp2, external_indices, insert_zero_bit, insert_zero_bits, internal_offsets,
    sorted_bit_positions, sorted_pair, validate_parameters, validate_state_buffer, validate_wires,
    wire_mask,
};
use crate::error::{KernelResult, ShapeError};
use crate::gate_matrices::{dagger, gate_matrix};
use crate::kernel_catalog::{GateOperation, GeneratorOperation, KernelFamily, MatrixOperation};
use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const IMAG: Complex64 = Complex64::new(0.0, 1.0);

// =============================================================================
// 1. Index iterators
// =============================================================================

/// `(index with wire bit 0, index with wire bit 1)` for every pair.
fn single_qubit_pairs(number_of_quantum_bits: usize, wire: usize) -> impl Iterator<Item = (usize, usize)> {
    let position = bit_position(number_of_quantum_bits, wire);
    let mask = 1usize << position;
    (0..exp2(number_of_quantum_bits - 1)).map(move |compressed| {
        let index_0 = insert_zero_bit(compressed, position);
        (index_0, index_0 | mask)
    })
}

/// Indices `[00, 01, 10, 11]` where the first wire is the high row bit.
fn two_qubit_quads(number_of_quantum_bits: usize, wires: &[usize]) -> impl Iterator<Item = [usize; 4]> {
    let first = bit_position(number_of_quantum_bits, wires[0]);
    let second = bit_position(number_of_quantum_bits, wires[1]);
    let positions = sorted_pair(first, second);
    let (first_mask, second_mask) = (1usize << first, 1usize << second);
    (0..exp2(number_of_quantum_bits - 2)).map(move |compressed| {
        let index_00 = insert_zero_bits(compressed, &positions);
        [
            index_00,
            index_00 | second_mask,
            index_00 | first_mask,
            index_00 | first_mask | second_mask,
        ]
    })
}

/// Swap the amplitudes at rows `left` and `right` of a three wire gate.
fn swap_three_qubit_rows(
    data: &mut [Complex64],
    number_of_quantum_bits: usize,
    wires: &[usize],
    left: usize,
    right: usize,
) {
    let offsets = internal_offsets(number_of_quantum_bits, wires);
    let positions = sorted_bit_positions(number_of_quantum_bits, wires);
    for compressed in 0..exp2(number_of_quantum_bits - 3) {
        let base = insert_zero_bits(compressed, &positions);
        data.swap(base + offsets[left], base + offsets[right]);
    }
}

fn parity_mask(number_of_quantum_bits: usize, wires: &[usize]) -> usize {
    wires
        .iter()
        .fold(0usize, |mask, &wire| mask | wire_mask(number_of_quantum_bits, wire))
}

// =============================================================================
// 2. Small dense matrix loops
// =============================================================================

fn apply_single_qubit_matrix(
    data: &mut [Complex64],
    number_of_quantum_bits: usize,
    wire: usize,
    matrix: &[Complex64],
) {
    for (index_0, index_1) in single_qubit_pairs(number_of_quantum_bits, wire) {
        let (amplitude_0, amplitude_1) = (data[index_0], data[index_1]);
        data[index_0] = matrix[0] * amplitude_0 + matrix[1] * amplitude_1;
        data[index_1] = matrix[2] * amplitude_0 + matrix[3] * amplitude_1;
    }
}

/// Apply a 2x2 block to the target when the control wire is set.
fn apply_controlled_single_qubit_matrix(
    data: &mut [Complex64],
    number_of_quantum_bits: usize,
    wires: &[usize],
    block: [Complex64; 4],
) {
    for [_, _, index_10, index_11] in two_qubit_quads(number_of_quantum_bits, wires) {
        let (amplitude_0, amplitude_1) = (data[index_10], data[index_11]);
        data[index_10] = block[0] * amplitude_0 + block[1] * amplitude_1;
        data[index_11] = block[2] * amplitude_0 + block[3] * amplitude_1;
    }
}

fn apply_two_qubit_matrix(
    data: &mut [Complex64],
    number_of_quantum_bits: usize,
    wires: &[usize],
    matrix: &[Complex64],
) {
    for indices in two_qubit_quads(number_of_quantum_bits, wires) {
        let amplitudes = indices.map(|index| data[index]);
        for (row, &index) in indices.iter().enumerate() {
            data[index] = matrix[row * 4..row * 4 + 4]
                .iter()
                .zip(amplitudes.iter())
                .map(|(entry, amplitude)| entry * amplitude)
                .sum();
        }
    }
}

/// Bottom-right 2x2 block of a controlled 4x4 gate matrix.
fn target_block(matrix: &[Complex64]) -> [Complex64; 4] {
    [matrix[10], matrix[11], matrix[14], matrix[15]]
}

// =============================================================================
// 3. GateKernelFamily implementation
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct BitMaskLoopKernels;

impl BitMaskLoopKernels {
    pub fn new() -> Self {
        Self
    }
}

impl GateKernelFamily for BitMaskLoopKernels {
    fn kernel_family(&self) -> KernelFamily {
        KernelFamily::BitMaskLoop
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
        validate_parameters(operation.name(), operation.parameter_count(), parameters)?;

        let sign = if inverse { -1.0 } else { 1.0 };
        let n = number_of_quantum_bits;

        match operation {
            GateOperation::Identity => {}
            GateOperation::PauliX => {
                for (index_0, index_1) in single_qubit_pairs(n, wires[0]) {
                    data.swap(index_0, index_1);
                }
            }
            GateOperation::PauliY => {
                for (index_0, index_1) in single_qubit_pairs(n, wires[0]) {
                    let (amplitude_0, amplitude_1) = (data[index_0], data[index_1]);
                    data[index_0] = -IMAG * amplitude_1;
                    data[index_1] = IMAG * amplitude_0;
                }
            }
            GateOperation::PauliZ => {
                for (_, index_1) in single_qubit_pairs(n, wires[0]) {
                    data[index_1] = -data[index_1];
                }
            }
            GateOperation::Hadamard => {
                for (index_0, index_1) in single_qubit_pairs(n, wires[0]) {
                    let (amplitude_0, amplitude_1) = (data[index_0], data[index_1]);
                    data[index_0] = (amplitude_0 + amplitude_1) * FRAC_1_SQRT_2;
                    data[index_1] = (amplitude_0 - amplitude_1) * FRAC_1_SQRT_2;
                }
            }
            GateOperation::S | GateOperation::T | GateOperation::PhaseShift => {
                let angle = match operation {
                    GateOperation::S => 2.0 * FRAC_PI_4,
                    GateOperation::T => FRAC_PI_4,
                    _ => parameters[0],
                };
                let phase = Complex64::from_polar(1.0, sign * angle);
                for (_, index_1) in single_qubit_pairs(n, wires[0]) {
                    data[index_1] *= phase;
                }
            }
            GateOperation::RZ => {
                let shift_0 = Complex64::from_polar(1.0, -sign * parameters[0] / 2.0);
                let shift_1 = shift_0.conj();
                for (index_0, index_1) in single_qubit_pairs(n, wires[0]) {
                    data[index_0] *= shift_0;
                    data[index_1] *= shift_1;
                }
            }
            GateOperation::RX | GateOperation::RY | GateOperation::Rot => {
                let matrix = gate_matrix(operation, 1, parameters, inverse)?;
                apply_single_qubit_matrix(data, n, wires[0], &matrix);
            }
            GateOperation::CNOT => {
                for [_, _, index_10, index_11] in two_qubit_quads(n, wires) {
                    data.swap(index_10, index_11);
                }
            }
            GateOperation::CY => {
                for [_, _, index_10, index_11] in two_qubit_quads(n, wires) {
                    let (amplitude_0, amplitude_1) = (data[index_10], data[index_11]);
                    data[index_10] = -IMAG * amplitude_1;
                    data[index_11] = IMAG * amplitude_0;
                }
            }
            GateOperation::CZ => {
                for [_, _, _, index_11] in two_qubit_quads(n, wires) {
                    data[index_11] = -data[index_11];
                }
            }
            GateOperation::SWAP => {
                for [_, index_01, index_10, _] in two_qubit_quads(n, wires) {
                    data.swap(index_01, index_10);
                }
            }
            GateOperation::ControlledPhaseShift => {
                let phase = Complex64::from_polar(1.0, sign * parameters[0]);
                for [_, _, _, index_11] in two_qubit_quads(n, wires) {
                    data[index_11] *= phase;
                }
            }
            GateOperation::CRX | GateOperation::CRY | GateOperation::CRZ | GateOperation::CRot => {
                let matrix = gate_matrix(operation, 2, parameters, inverse)?;
                apply_controlled_single_qubit_matrix(data, n, wires, target_block(&matrix));
            }
            GateOperation::IsingXX | GateOperation::IsingYY => {
                let matrix = gate_matrix(operation, 2, parameters, inverse)?;
                apply_two_qubit_matrix(data, n, wires, &matrix);
            }
            GateOperation::IsingZZ => {
                let even = Complex64::from_polar(1.0, -sign * parameters[0] / 2.0);
                let odd = even.conj();
                for [index_00, index_01, index_10, index_11] in two_qubit_quads(n, wires) {
                    data[index_00] *= even;
                    data[index_01] *= odd;
                    data[index_10] *= odd;
                    data[index_11] *= even;
                }
            }
            GateOperation::CSWAP => swap_three_qubit_rows(data, n, wires, 0b101, 0b110),
            GateOperation::Toffoli => swap_three_qubit_rows(data, n, wires, 0b110, 0b111),
            GateOperation::MultiRZ => {
                let mask = parity_mask(n, wires);
                let even = Complex64::from_polar(1.0, -sign * parameters[0] / 2.0);
                let odd = even.conj();
                for (index, amplitude) in data.iter_mut().enumerate() {
                    *amplitude *= if (index & mask).count_ones() % 2 == 0 { even } else { odd };
                }
            }
        }
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
        let n = number_of_quantum_bits;

        match operation {
            GeneratorOperation::PhaseShift => {
                for (index_0, _) in single_qubit_pairs(n, wires[0]) {
                    data[index_0] = ZERO;
                }
            }
            GeneratorOperation::RX => {
                for (index_0, index_1) in single_qubit_pairs(n, wires[0]) {
                    data.swap(index_0, index_1);
                }
            }
            GeneratorOperation::RY => {
                for (index_0, index_1) in single_qubit_pairs(n, wires[0]) {
                    let (amplitude_0, amplitude_1) = (data[index_0], data[index_1]);
                    data[index_0] = -IMAG * amplitude_1;
                    data[index_1] = IMAG * amplitude_0;
                }
            }
            GeneratorOperation::RZ => {
                for (_, index_1) in single_qubit_pairs(n, wires[0]) {
                    data[index_1] = -data[index_1];
                }
            }
            GeneratorOperation::ControlledPhaseShift => {
                for [index_00, index_01, index_10, _] in two_qubit_quads(n, wires) {
                    data[index_00] = ZERO;
                    data[index_01] = ZERO;
                    data[index_10] = ZERO;
                }
            }
            GeneratorOperation::CRX | GeneratorOperation::CRY | GeneratorOperation::CRZ => {
                for [index_00, index_01, index_10, index_11] in two_qubit_quads(n, wires) {
                    data[index_00] = ZERO;
                    data[index_01] = ZERO;
                    let (amplitude_0, amplitude_1) = (data[index_10], data[index_11]);
                    let (result_0, result_1) = match operation {
                        GeneratorOperation::CRX => (amplitude_1, amplitude_0),
                        GeneratorOperation::CRY => (-IMAG * amplitude_1, IMAG * amplitude_0),
                        _ => (amplitude_0, -amplitude_1),
                    };
                    data[index_10] = result_0;
                    data[index_11] = result_1;
                }
            }
            GeneratorOperation::IsingXX => {
                for [index_00, index_01, index_10, index_11] in two_qubit_quads(n, wires) {
                    data.swap(index_00, index_11);
                    data.swap(index_01, index_10);
                }
            }
            GeneratorOperation::IsingYY => {
                for [index_00, index_01, index_10, index_11] in two_qubit_quads(n, wires) {
                    let (amplitude_00, amplitude_11) = (data[index_00], data[index_11]);
                    data[index_00] = -amplitude_11;
                    data[index_11] = -amplitude_00;
                    data.swap(index_01, index_10);
                }
            }
            GeneratorOperation::IsingZZ => {
                for [_, index_01, index_10, _] in two_qubit_quads(n, wires) {
                    data[index_01] = -data[index_01];
                    data[index_10] = -data[index_10];
                }
            }
            GeneratorOperation::MultiRZ => {
                let mask = parity_mask(n, wires);
                for (index, amplitude) in data.iter_mut().enumerate() {
                    if (index & mask).count_ones() % 2 == 1 {
                        *amplitude = -*amplitude;
                    }
                }
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

        let adjoint_matrix;
        let matrix = if inverse {
            adjoint_matrix = dagger(matrix, dimension);
            adjoint_matrix.as_slice()
        } else {
            matrix
        };

        match operation {
            MatrixOperation::SingleQubitOp => {
                apply_single_qubit_matrix(data, number_of_quantum_bits, wires[0], matrix)
            }
            MatrixOperation::TwoQubitOp => apply_two_qubit_matrix(data, number_of_quantum_bits, wires, matrix),
            MatrixOperation::MultiQubitOp => {
                let internal = internal_offsets(number_of_quantum_bits, wires);
                let external = external_indices(number_of_quantum_bits, wires);
                apply_dense_matrix_with_tables(data, matrix, &internal, &external);
            }
        }
        Ok(())
    }
}

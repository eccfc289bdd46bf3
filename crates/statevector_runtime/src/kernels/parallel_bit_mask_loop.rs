// =============================================================================
// LIGHTWIRE Simulator - Parallel Bit-Mask Loop Kernels ("ParallelLM")
// =============================================================================
// Table of Contents:
//   1. Implemented operation lists
//   2. ParallelBitMaskLoopKernels - Thread pool and size threshold
//   3. Chunked loop drivers
//   4. GateKernelFamily implementation
// =============================================================================
// Purpose: Rayon data-parallel loops over disjoint amplitude blocks. A wire at
//          bit position p splits the buffer into aligned blocks of 2^(p+1)
//          amplitudes whose low half has the bit clear and whose high half has
//          it set, so blocks can be mutated independently. States smaller than
//          the configured dimension run the same loops sequentially.
//
//          Only a subset of the catalog is implemented. Anything else must be
//          routed to another family through the kernel selection table.
// =============================================================================

use super::GateKernelFamily;
use crate::bit_utilities::{
    bit_position, exp2, sorted_pair, validate_parameters, validate_state_buffer, validate_wires, wire_mask,
};
use crate::configuration::RuntimeConfiguration;
use crate::error::{ErrorContext, KernelResult, LookupError, ShapeError};
use crate::gate_matrices::{dagger, gate_matrix};
use crate::kernel_catalog::{GateOperation, GeneratorOperation, KernelFamily, MatrixOperation};
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};
use std::sync::Arc;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const IMAG: Complex64 = Complex64::new(0.0, 1.0);

// =============================================================================
// 1. Implemented operation lists
// =============================================================================

static PARALLEL_GATES: [GateOperation; 16] = [
    GateOperation::PauliX,
    GateOperation::PauliY,
    GateOperation::PauliZ,
    GateOperation::Hadamard,
    GateOperation::S,
    GateOperation::T,
    GateOperation::PhaseShift,
    GateOperation::RX,
    GateOperation::RY,
    GateOperation::RZ,
    GateOperation::Rot,
    GateOperation::CNOT,
    GateOperation::CZ,
    GateOperation::SWAP,
    GateOperation::IsingZZ,
    GateOperation::MultiRZ,
];

static PARALLEL_GENERATORS: [GeneratorOperation; 4] = [
    GeneratorOperation::PhaseShift,
    GeneratorOperation::RX,
    GeneratorOperation::RY,
    GeneratorOperation::RZ,
];

static PARALLEL_MATRICES: [MatrixOperation; 2] = [MatrixOperation::SingleQubitOp, MatrixOperation::TwoQubitOp];

// =============================================================================
// 2. ParallelBitMaskLoopKernels
// =============================================================================

#[derive(Debug, Clone)]
pub struct ParallelBitMaskLoopKernels {
    minimum_parallel_dimension: usize,
    thread_pool: Arc<rayon::ThreadPool>,
}

impl ParallelBitMaskLoopKernels {
    pub fn new(minimum_parallel_dimension: usize, thread_count: usize) -> KernelResult<Self> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|index| format!("lightwire-kernel-{}", index))
            .build()
            .context("Failed to build kernel thread pool")?;

        tracing::debug!(
            "Parallel kernel pool ready: {} threads, threshold {} amplitudes",
            thread_count,
            minimum_parallel_dimension
        );

        Ok(Self {
            minimum_parallel_dimension,
            thread_pool: Arc::new(thread_pool),
        })
    }

    pub fn from_configuration(configuration: &RuntimeConfiguration) -> KernelResult<Self> {
        Self::new(configuration.parallel_minimum_dimension, configuration.thread_count)
    }

    pub fn minimum_parallel_dimension(&self) -> usize {
        self.minimum_parallel_dimension
    }

    pub fn thread_count(&self) -> usize {
        self.thread_pool.current_num_threads()
    }

    fn runs_in_parallel(&self, data: &[Complex64]) -> bool {
        data.len() >= self.minimum_parallel_dimension
    }

    // =========================================================================
    // 3. Chunked loop drivers
    // =========================================================================

    /// Calls `kernel(amplitude_0, amplitude_1)` for every pair split by `wire`.
    fn for_each_pair<F>(&self, data: &mut [Complex64], number_of_quantum_bits: usize, wire: usize, kernel: F)
    where
        F: Fn(&mut Complex64, &mut Complex64) + Send + Sync,
    {
        let stride = exp2(bit_position(number_of_quantum_bits, wire));
        let block = |chunk: &mut [Complex64]| {
            let (clear, set) = chunk.split_at_mut(stride);
            for (amplitude_0, amplitude_1) in clear.iter_mut().zip(set.iter_mut()) {
                kernel(amplitude_0, amplitude_1);
            }
        };
        if self.runs_in_parallel(data) {
            self.thread_pool
                .install(|| data.par_chunks_mut(2 * stride).for_each(block));
        } else {
            data.chunks_mut(2 * stride).for_each(block);
        }
    }

    /// Calls `kernel([a00, a01, a10, a11])` with the first wire as the high
    /// row bit, matching the gate matrix row order.
    fn for_each_quad<F>(&self, data: &mut [Complex64], number_of_quantum_bits: usize, wires: &[usize], kernel: F)
    where
        F: Fn([&mut Complex64; 4]) + Send + Sync,
    {
        let first = bit_position(number_of_quantum_bits, wires[0]);
        let second = bit_position(number_of_quantum_bits, wires[1]);
        let [low, high] = sorted_pair(first, second);
        let first_is_high = first == high;
        let (low_stride, high_stride) = (exp2(low), exp2(high));

        let block = |chunk: &mut [Complex64]| {
            let (high_clear, high_set) = chunk.split_at_mut(high_stride);
            let pairs = high_clear
                .chunks_mut(2 * low_stride)
                .zip(high_set.chunks_mut(2 * low_stride));
            for (clear_block, set_block) in pairs {
                let (clear_0, clear_1) = clear_block.split_at_mut(low_stride);
                let (set_0, set_1) = set_block.split_at_mut(low_stride);
                let rows = clear_0
                    .iter_mut()
                    .zip(clear_1.iter_mut())
                    .zip(set_0.iter_mut().zip(set_1.iter_mut()));
                // Names are (high bit, low bit)
                for ((a_00, a_01), (a_10, a_11)) in rows {
                    if first_is_high {
                        kernel([a_00, a_01, a_10, a_11]);
                    } else {
                        kernel([a_00, a_10, a_01, a_11]);
                    }
                }
            }
        };
        if self.runs_in_parallel(data) {
            self.thread_pool
                .install(|| data.par_chunks_mut(2 * high_stride).for_each(block));
        } else {
            data.chunks_mut(2 * high_stride).for_each(block);
        }
    }

    /// Calls `kernel(index, amplitude)` for every amplitude.
    fn for_each_indexed<F>(&self, data: &mut [Complex64], kernel: F)
    where
        F: Fn(usize, &mut Complex64) + Send + Sync,
    {
        if self.runs_in_parallel(data) {
            self.thread_pool.install(|| {
                data.par_iter_mut()
                    .enumerate()
                    .for_each(|(index, amplitude)| kernel(index, amplitude))
            });
        } else {
            data.iter_mut()
                .enumerate()
                .for_each(|(index, amplitude)| kernel(index, amplitude));
        }
    }

    fn apply_single_qubit_matrix(
        &self,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        wire: usize,
        matrix: &[Complex64],
    ) {
        let m = [matrix[0], matrix[1], matrix[2], matrix[3]];
        self.for_each_pair(data, number_of_quantum_bits, wire, move |a_0, a_1| {
            let (v_0, v_1) = (*a_0, *a_1);
            *a_0 = m[0] * v_0 + m[1] * v_1;
            *a_1 = m[2] * v_0 + m[3] * v_1;
        });
    }

    fn apply_two_qubit_matrix(
        &self,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        wires: &[usize],
        matrix: &[Complex64],
    ) {
        self.for_each_quad(data, number_of_quantum_bits, wires, |amplitudes| {
            let values = [*amplitudes[0], *amplitudes[1], *amplitudes[2], *amplitudes[3]];
            for (row, amplitude) in amplitudes.into_iter().enumerate() {
                *amplitude = matrix[row * 4..row * 4 + 4]
                    .iter()
                    .zip(values.iter())
                    .map(|(entry, value)| entry * value)
                    .sum();
            }
        });
    }
}

// =============================================================================
// 4. GateKernelFamily implementation
// =============================================================================

impl GateKernelFamily for ParallelBitMaskLoopKernels {
    fn kernel_family(&self) -> KernelFamily {
        KernelFamily::ParallelBitMaskLoop
    }

    fn implemented_gates(&self) -> &'static [GateOperation] {
        &PARALLEL_GATES
    }

    fn implemented_generators(&self) -> &'static [GeneratorOperation] {
        &PARALLEL_GENERATORS
    }

    fn implemented_matrices(&self) -> &'static [MatrixOperation] {
        &PARALLEL_MATRICES
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
        if !PARALLEL_GATES.contains(&operation) {
            return Err(LookupError::GateNotRegistered {
                operation: operation.name(),
                kernel: self.kernel_family(),
            }
            .into());
        }
        validate_state_buffer(data.len(), number_of_quantum_bits)?;
        validate_wires(operation.name(), operation.wire_arity(), number_of_quantum_bits, wires)?;
        validate_parameters(operation.name(), operation.parameter_count(), parameters)?;

        let sign = if inverse { -1.0 } else { 1.0 };
        let n = number_of_quantum_bits;

        match operation {
            GateOperation::PauliX => self.for_each_pair(data, n, wires[0], |a_0, a_1| std::mem::swap(a_0, a_1)),
            GateOperation::PauliY => self.for_each_pair(data, n, wires[0], |a_0, a_1| {
                let (v_0, v_1) = (*a_0, *a_1);
                *a_0 = -IMAG * v_1;
                *a_1 = IMAG * v_0;
            }),
            GateOperation::PauliZ => self.for_each_pair(data, n, wires[0], |_, a_1| *a_1 = -*a_1),
            GateOperation::Hadamard => self.for_each_pair(data, n, wires[0], |a_0, a_1| {
                let (v_0, v_1) = (*a_0, *a_1);
                *a_0 = (v_0 + v_1) * FRAC_1_SQRT_2;
                *a_1 = (v_0 - v_1) * FRAC_1_SQRT_2;
            }),
            GateOperation::S | GateOperation::T | GateOperation::PhaseShift => {
                let angle = match operation {
                    GateOperation::S => 2.0 * FRAC_PI_4,
                    GateOperation::T => FRAC_PI_4,
                    _ => parameters[0],
                };
                let phase = Complex64::from_polar(1.0, sign * angle);
                self.for_each_pair(data, n, wires[0], move |_, a_1| *a_1 *= phase);
            }
            GateOperation::RZ => {
                let shift_0 = Complex64::from_polar(1.0, -sign * parameters[0] / 2.0);
                let shift_1 = shift_0.conj();
                self.for_each_pair(data, n, wires[0], move |a_0, a_1| {
                    *a_0 *= shift_0;
                    *a_1 *= shift_1;
                });
            }
            GateOperation::RX | GateOperation::RY | GateOperation::Rot => {
                let matrix = gate_matrix(operation, 1, parameters, inverse)?;
                self.apply_single_qubit_matrix(data, n, wires[0], &matrix);
            }
            GateOperation::CNOT => self.for_each_quad(data, n, wires, |[_, _, a_10, a_11]| std::mem::swap(a_10, a_11)),
            GateOperation::CZ => self.for_each_quad(data, n, wires, |[_, _, _, a_11]| *a_11 = -*a_11),
            GateOperation::SWAP => self.for_each_quad(data, n, wires, |[_, a_01, a_10, _]| std::mem::swap(a_01, a_10)),
            GateOperation::IsingZZ => {
                let even = Complex64::from_polar(1.0, -sign * parameters[0] / 2.0);
                let odd = even.conj();
                self.for_each_quad(data, n, wires, move |[a_00, a_01, a_10, a_11]| {
                    *a_00 *= even;
                    *a_01 *= odd;
                    *a_10 *= odd;
                    *a_11 *= even;
                });
            }
            GateOperation::MultiRZ => {
                let mask = wires
                    .iter()
                    .fold(0usize, |mask, &wire| mask | wire_mask(n, wire));
                let even = Complex64::from_polar(1.0, -sign * parameters[0] / 2.0);
                let odd = even.conj();
                self.for_each_indexed(data, move |index, amplitude| {
                    *amplitude *= if (index & mask).count_ones() % 2 == 0 { even } else { odd };
                });
            }
            _ => {
                return Err(LookupError::GateNotRegistered {
                    operation: operation.name(),
                    kernel: self.kernel_family(),
                }
                .into())
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
        if !PARALLEL_GENERATORS.contains(&operation) {
            return Err(LookupError::GeneratorNotRegistered {
                operation: operation.name(),
                kernel: self.kernel_family(),
            }
            .into());
        }
        validate_state_buffer(data.len(), number_of_quantum_bits)?;
        validate_wires(operation.name(), operation.wire_arity(), number_of_quantum_bits, wires)?;
        let n = number_of_quantum_bits;

        match operation {
            GeneratorOperation::PhaseShift => self.for_each_pair(data, n, wires[0], |a_0, _| *a_0 = ZERO),
            GeneratorOperation::RX => self.for_each_pair(data, n, wires[0], |a_0, a_1| std::mem::swap(a_0, a_1)),
            GeneratorOperation::RY => self.for_each_pair(data, n, wires[0], |a_0, a_1| {
                let (v_0, v_1) = (*a_0, *a_1);
                *a_0 = -IMAG * v_1;
                *a_1 = IMAG * v_0;
            }),
            GeneratorOperation::RZ => self.for_each_pair(data, n, wires[0], |_, a_1| *a_1 = -*a_1),
            _ => {
                return Err(LookupError::GeneratorNotRegistered {
                    operation: operation.name(),
                    kernel: self.kernel_family(),
                }
                .into())
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
        if !PARALLEL_MATRICES.contains(&operation) {
            return Err(LookupError::MatrixNotRegistered {
                operation: operation.name(),
                kernel: self.kernel_family(),
            }
            .into());
        }
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

        if operation == MatrixOperation::SingleQubitOp {
            self.apply_single_qubit_matrix(data, number_of_quantum_bits, wires[0], matrix);
        } else {
            self.apply_two_qubit_matrix(data, number_of_quantum_bits, wires, matrix);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel_catalog::WireArity;
    use crate::kernels::PermutationIndexedKernels;

    fn sample_state(number_of_quantum_bits: usize) -> Vec<Complex64> {
        (0..exp2(number_of_quantum_bits))
            .map(|index| Complex64::new((index as f64 * 1.3).cos(), (index as f64 + 0.5).sin()))
            .collect()
    }

    fn assert_close(left: &[Complex64], right: &[Complex64]) {
        for (a, b) in left.iter().zip(right.iter()) {
            assert!((a - b).norm() < 1e-10, "{} != {}", a, b);
        }
    }

    #[test]
    fn test_parallel_and_sequential_paths_agree_with_reference() {
        let reference = PermutationIndexedKernels::new();
        // Threshold 1 forces the rayon path, usize::MAX the sequential one
        for threshold in [1, usize::MAX] {
            let kernels = ParallelBitMaskLoopKernels::new(threshold, 2).unwrap();
            for &gate in kernels.implemented_gates() {
                let wires: Vec<usize> = match gate.wire_arity() {
                    WireArity::Fixed(1) => vec![3],
                    WireArity::Fixed(_) => vec![3, 1],
                    WireArity::Variadic => vec![4, 0, 2],
                };
                let parameters = vec![0.61; gate.parameter_count()];
                for inverse in [false, true] {
                    let mut expected = sample_state(5);
                    let mut actual = expected.clone();
                    reference
                        .apply_gate(gate, &mut expected, 5, &wires, inverse, &parameters)
                        .unwrap();
                    kernels
                        .apply_gate(gate, &mut actual, 5, &wires, inverse, &parameters)
                        .unwrap();
                    assert_close(&expected, &actual);
                }
            }
        }
    }

    #[test]
    fn test_unimplemented_gate_is_reported() {
        let kernels = ParallelBitMaskLoopKernels::new(1, 1).unwrap();
        let mut state = sample_state(3);
        let result = kernels.apply_gate(GateOperation::Toffoli, &mut state, 3, &[0, 1, 2], false, &[]);
        assert!(matches!(
            result,
            Err(crate::error::KernelRuntimeError::Lookup(LookupError::GateNotRegistered { .. }))
        ));
    }

    #[test]
    fn test_two_qubit_matrix_on_reversed_wires() {
        let reference = PermutationIndexedKernels::new();
        let kernels = ParallelBitMaskLoopKernels::new(1, 2).unwrap();
        let matrix = gate_matrix(GateOperation::CRY, 2, &[1.2], false).unwrap();
        for wires in [[0usize, 3], [3, 0]] {
            let mut expected = sample_state(4);
            let mut actual = expected.clone();
            reference
                .apply_matrix(MatrixOperation::TwoQubitOp, &mut expected, 4, &matrix, &wires, false)
                .unwrap();
            kernels
                .apply_matrix(MatrixOperation::TwoQubitOp, &mut actual, 4, &matrix, &wires, false)
                .unwrap();
            assert_close(&expected, &actual);
        }
    }
}

// =============================================================================
// LIGHTWIRE Simulator - Kernel Families
// =============================================================================
// Table of Contents:
//   1. GateKernelFamily - Contract every kernel family implements
//   2. Family modules
// =============================================================================
// Purpose: A kernel family is one interchangeable strategy for applying gates,
//          generators and dense matrices to a caller-owned amplitude buffer.
//          Families only declare what they implement; the dispatcher turns
//          those declarations into registry entries, so adding a family never
//          touches another family's code.
// =============================================================================

pub mod bit_mask_loop;
pub mod parallel_bit_mask_loop;
pub mod permutation_indexed;

pub use bit_mask_loop::BitMaskLoopKernels;
pub use parallel_bit_mask_loop::ParallelBitMaskLoopKernels;
pub use permutation_indexed::PermutationIndexedKernels;

use crate::error::KernelResult;
use crate::kernel_catalog::{GateOperation, GeneratorOperation, KernelFamily, MatrixOperation};
use num_complex::Complex64;

// =============================================================================
// 1. GateKernelFamily
// =============================================================================

pub trait GateKernelFamily: Send + Sync + std::fmt::Debug {
    fn kernel_family(&self) -> KernelFamily;

    fn implemented_gates(&self) -> &'static [GateOperation];
    fn implemented_generators(&self) -> &'static [GeneratorOperation];
    fn implemented_matrices(&self) -> &'static [MatrixOperation];

    /// Mutates `data` in place. Validates wires, parameters and buffer length
    /// before the first write.
    fn apply_gate(
        &self,
        operation: GateOperation,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        wires: &[usize],
        inverse: bool,
        parameters: &[f64],
    ) -> KernelResult<()>;

    /// Replaces `data` with `G |data>` and returns the generator's scaling
    /// factor. Generators are Hermitian, so `adjoint` does not change `G`.
    fn apply_generator(
        &self,
        operation: GeneratorOperation,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        wires: &[usize],
        adjoint: bool,
    ) -> KernelResult<f64>;

    /// `matrix` is row-major with side `2^wires.len()`.
    fn apply_matrix(
        &self,
        operation: MatrixOperation,
        data: &mut [Complex64],
        number_of_quantum_bits: usize,
        matrix: &[Complex64],
        wires: &[usize],
        inverse: bool,
    ) -> KernelResult<()>;
}

/// Gathers the addressed amplitudes for every external index and multiplies
/// them by `matrix`. Shared by the permutation-indexed family and by the
/// many-wire fallback of the loop families.
pub(crate) fn apply_dense_matrix_with_tables(
    data: &mut [Complex64],
    matrix: &[Complex64],
    internal: &[usize],
    external: &[usize],
) {
    let dimension = internal.len();
    let mut gathered = vec![Complex64::new(0.0, 0.0); dimension];
    for &base in external {
        for (slot, &offset) in internal.iter().enumerate() {
            gathered[slot] = data[base + offset];
        }
        for (row, &offset) in internal.iter().enumerate() {
            let row_entries = &matrix[row * dimension..(row + 1) * dimension];
            data[base + offset] = row_entries
                .iter()
                .zip(gathered.iter())
                .map(|(entry, amplitude)| entry * amplitude)
                .sum();
        }
    }
}

/// Multiplies the addressed amplitudes of every external index by `diagonal`.
pub(crate) fn apply_diagonal_with_tables(
    data: &mut [Complex64],
    diagonal: &[Complex64],
    internal: &[usize],
    external: &[usize],
) {
    for &base in external {
        for (&offset, factor) in internal.iter().zip(diagonal.iter()) {
            data[base + offset] *= *factor;
        }
    }
}

// =============================================================================
// LIGHTWIRE Simulator - State Backend
// =============================================================================
// Table of Contents:
//   1. QuantumStateVector - Owned 2^n amplitude buffer
//   2. Construction
//   3. Raw access and bulk writes
//   4. Gate application through a dispatcher
//   5. Derived quantities (norm, inner product, probabilities)
// =============================================================================
// Purpose: The dense state container. Wire `w` is amplitude-index bit
//          `n - 1 - w`. The buffer length is exactly 2^n for the lifetime of
//          the container and every write path validates its input before the
//          first amplitude changes.
// =============================================================================

use crate::bit_utilities::{is_perfect_power_of_two, log2_perfect_power, state_dimension};
use crate::dynamic_dispatcher::DynamicDispatcher;
use crate::error::{BoundsError, KernelResult, ShapeError};
use crate::kernel_catalog::KernelFamily;
use num_complex::Complex64;

// =============================================================================
// 1. QuantumStateVector
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct QuantumStateVector {
    amplitudes: Vec<Complex64>,
    number_of_quantum_bits: usize,
}

// =============================================================================
// 2. Construction
// =============================================================================

impl QuantumStateVector {
    /// `|0...0>` on `number_of_quantum_bits` wires.
    ///
    /// # Panics
    ///
    /// When `2^number_of_quantum_bits` does not fit in `usize`, like
    /// `Vec::with_capacity` on overflow. [`Self::try_zero_state`] reports it
    /// as a `ShapeError` instead.
    pub fn zero_state(number_of_quantum_bits: usize) -> Self {
        match Self::try_zero_state(number_of_quantum_bits) {
            Ok(state) => state,
            Err(error) => panic!("{}", error),
        }
    }

    pub fn try_zero_state(number_of_quantum_bits: usize) -> KernelResult<Self> {
        let dimension = state_dimension(number_of_quantum_bits)?;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); dimension];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        tracing::info!("Allocated {}-qubit state vector ({} amplitudes)", number_of_quantum_bits, dimension);
        Ok(Self {
            amplitudes,
            number_of_quantum_bits,
        })
    }

    pub fn new(number_of_quantum_bits: usize) -> Self {
        Self::zero_state(number_of_quantum_bits)
    }

    pub fn try_new(number_of_quantum_bits: usize) -> KernelResult<Self> {
        Self::try_zero_state(number_of_quantum_bits)
    }

    /// `|1...1>` on `number_of_quantum_bits` wires.
    pub fn one_state(number_of_quantum_bits: usize) -> Self {
        let mut state = Self::zero_state(number_of_quantum_bits);
        state.amplitudes[0] = Complex64::new(0.0, 0.0);
        let last = state.amplitudes.len() - 1;
        state.amplitudes[last] = Complex64::new(1.0, 0.0);
        state
    }

    /// Takes ownership of `amplitudes`. The length must be a power of two.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> KernelResult<Self> {
        let dimension = amplitudes.len();
        if !is_perfect_power_of_two(dimension) {
            return Err(ShapeError::NotPowerOfTwo(dimension).into());
        }
        let number_of_quantum_bits = log2_perfect_power(dimension);
        tracing::info!("Adopted {}-qubit state vector ({} amplitudes)", number_of_quantum_bits, dimension);
        Ok(Self {
            amplitudes,
            number_of_quantum_bits,
        })
    }

    pub fn from_slice(amplitudes: &[Complex64]) -> KernelResult<Self> {
        Self::from_amplitudes(amplitudes.to_vec())
    }

    pub fn number_of_quantum_bits(&self) -> usize {
        self.number_of_quantum_bits
    }

    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    // =========================================================================
    // 3. Raw access and bulk writes
    // =========================================================================

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn amplitudes_mut(&mut self) -> &mut [Complex64] {
        &mut self.amplitudes
    }

    pub fn amplitude(&self, index: usize) -> KernelResult<Complex64> {
        self.amplitudes.get(index).copied().ok_or_else(|| {
            BoundsError::AmplitudeIndexOutOfRange {
                index,
                length: self.amplitudes.len(),
            }
            .into()
        })
    }

    pub fn into_amplitudes(self) -> Vec<Complex64> {
        self.amplitudes
    }

    fn check_index(&self, index: usize) -> KernelResult<()> {
        if index >= self.amplitudes.len() {
            return Err(BoundsError::AmplitudeIndexOutOfRange {
                index,
                length: self.amplitudes.len(),
            }
            .into());
        }
        Ok(())
    }

    /// Zero everything, then put amplitude 1 at `index`.
    pub fn set_basis_state(&mut self, index: usize) -> KernelResult<()> {
        self.check_index(index)?;
        self.amplitudes.fill(Complex64::new(0.0, 0.0));
        self.amplitudes[index] = Complex64::new(1.0, 0.0);
        tracing::debug!("State set to basis index {}", index);
        Ok(())
    }

    /// Write `values[k]` at `indices[k]`, leaving every other amplitude as it
    /// was. All indices are checked first; a bad index leaves the state
    /// unchanged.
    pub fn set_state_vector(&mut self, indices: &[usize], values: &[Complex64]) -> KernelResult<()> {
        if indices.len() != values.len() {
            return Err(ShapeError::IndexValueLengthMismatch {
                indices: indices.len(),
                values: values.len(),
            }
            .into());
        }
        for &index in indices {
            self.check_index(index)?;
        }
        for (&index, &value) in indices.iter().zip(values.iter()) {
            self.amplitudes[index] = value;
        }
        tracing::debug!("State set from {} sparse amplitudes", indices.len());
        Ok(())
    }

    pub fn reset_state_vector(&mut self) {
        self.amplitudes.fill(Complex64::new(0.0, 0.0));
        self.amplitudes[0] = Complex64::new(1.0, 0.0);
        tracing::debug!("State reset to |0...0>");
    }

    /// Overwrite the whole buffer from `data` of identical length.
    pub fn update_data(&mut self, data: &[Complex64]) -> KernelResult<()> {
        if data.len() != self.amplitudes.len() {
            return Err(ShapeError::DataLengthMismatch {
                expected: self.amplitudes.len(),
                actual: data.len(),
            }
            .into());
        }
        self.amplitudes.copy_from_slice(data);
        tracing::debug!("State updated from {} amplitudes", data.len());
        Ok(())
    }

    // =========================================================================
    // 4. Gate application through a dispatcher
    // =========================================================================

    /// Applies a named gate with the kernel selected for it at bootstrap.
    pub fn apply_operation(
        &mut self,
        dispatcher: &DynamicDispatcher,
        operation_name: &str,
        wires: &[usize],
        inverse: bool,
        parameters: &[f64],
    ) -> KernelResult<()> {
        let operation = dispatcher.resolve_gate_name(operation_name)?;
        dispatcher.apply_selected_gate(
            &mut self.amplitudes,
            self.number_of_quantum_bits,
            operation,
            wires,
            inverse,
            parameters,
        )
    }

    pub fn apply_operation_with_kernel(
        &mut self,
        dispatcher: &DynamicDispatcher,
        kernel: KernelFamily,
        operation_name: &str,
        wires: &[usize],
        inverse: bool,
        parameters: &[f64],
    ) -> KernelResult<()> {
        dispatcher.apply_gate_by_name(
            kernel,
            &mut self.amplitudes,
            self.number_of_quantum_bits,
            operation_name,
            wires,
            inverse,
            parameters,
        )
    }

    pub fn apply_operations<S: AsRef<str>>(
        &mut self,
        dispatcher: &DynamicDispatcher,
        operation_names: &[S],
        wires: &[Vec<usize>],
        inverses: &[bool],
        parameters: &[Vec<f64>],
    ) -> KernelResult<()> {
        dispatcher.apply_operations(
            &mut self.amplitudes,
            self.number_of_quantum_bits,
            operation_names,
            wires,
            inverses,
            parameters,
        )
    }

    pub fn apply_matrix(
        &mut self,
        dispatcher: &DynamicDispatcher,
        matrix: &[Complex64],
        wires: &[usize],
        inverse: bool,
    ) -> KernelResult<()> {
        dispatcher.apply_selected_matrix(&mut self.amplitudes, self.number_of_quantum_bits, matrix, wires, inverse)
    }

    /// Replaces the state with `G |state>` and returns the scaling factor.
    pub fn apply_generator(
        &mut self,
        dispatcher: &DynamicDispatcher,
        generator_name: &str,
        wires: &[usize],
        adjoint: bool,
    ) -> KernelResult<f64> {
        let operation = dispatcher.resolve_generator_name(generator_name)?;
        dispatcher.apply_selected_generator(&mut self.amplitudes, self.number_of_quantum_bits, operation, wires, adjoint)
    }

    // =========================================================================
    // 5. Derived quantities
    // =========================================================================

    pub fn norm(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt()
    }

    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 1e-15 {
            for amp in &mut self.amplitudes {
                *amp /= norm;
            }
        }
    }

    pub fn probability_distribution(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// `<self|other>`, conjugating `self`.
    pub fn inner_product(&self, other: &Self) -> KernelResult<Complex64> {
        if self.dimension() != other.dimension() {
            return Err(ShapeError::DataLengthMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            }
            .into());
        }
        Ok(inner_product(&self.amplitudes, &other.amplitudes))
    }

    /// Big-endian bits of `index`, wire 0 first.
    pub fn index_to_bitstring(&self, index: usize) -> Vec<u8> {
        (0..self.number_of_quantum_bits)
            .rev()
            .map(|bit| ((index >> bit) & 1) as u8)
            .collect()
    }
}

/// `sum(conj(left[i]) * right[i])` over equal-length slices.
pub fn inner_product(left: &[Complex64], right: &[Complex64]) -> Complex64 {
    left.iter().zip(right.iter()).map(|(a, b)| a.conj() * b).sum()
}

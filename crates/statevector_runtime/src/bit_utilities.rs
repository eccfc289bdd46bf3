// =============================================================================
// LIGHTWIRE Simulator - Bit Utilities
// =============================================================================
// Table of Contents:
//   1. Power-of-two helpers
//   2. Wire <-> bit position convention
//   3. Bit insertion for compressed index loops
//   4. Index tables for the permutation-indexed kernels
//   5. Wire and buffer validation shared by every kernel family
// =============================================================================
// Purpose: The single bit convention used by all kernel families. Wire `w` of
//          an `n`-qubit state is amplitude-index bit `n - 1 - w`, so wire 0 is
//          the most significant bit. Inside a k-wire gate matrix the first
//          listed wire is likewise the most significant bit of the row index.
// =============================================================================

use crate::error::{BoundsError, KernelResult, ShapeError};
use crate::kernel_catalog::WireArity;

// =============================================================================
// 1. Power-of-two helpers
// =============================================================================

/// `2^exponent` for exponents already bounded by a validated qubit count.
#[inline]
pub fn exp2(exponent: usize) -> usize {
    1usize << exponent
}

/// `2^exponent`, or `None` when it does not fit in `usize`.
#[inline]
pub fn checked_exp2(exponent: usize) -> Option<usize> {
    u32::try_from(exponent).ok().and_then(|shift| 1usize.checked_shl(shift))
}

/// Amplitude count of a `number_of_quantum_bits` state.
pub fn state_dimension(number_of_quantum_bits: usize) -> KernelResult<usize> {
    checked_exp2(number_of_quantum_bits)
        .ok_or_else(|| ShapeError::QubitCountTooLarge(number_of_quantum_bits).into())
}

#[inline]
pub fn is_perfect_power_of_two(value: usize) -> bool {
    value.is_power_of_two()
}

/// Only meaningful when `value` is a power of two.
#[inline]
pub fn log2_perfect_power(value: usize) -> usize {
    value.trailing_zeros() as usize
}

#[inline]
pub fn fill_trailing_ones(count: usize) -> usize {
    if count == 0 {
        0
    } else {
        usize::MAX >> (usize::BITS as usize - count)
    }
}

// =============================================================================
// 2. Wire <-> bit position convention
// =============================================================================

#[inline]
pub fn bit_position(number_of_quantum_bits: usize, wire: usize) -> usize {
    number_of_quantum_bits - 1 - wire
}

#[inline]
pub fn wire_mask(number_of_quantum_bits: usize, wire: usize) -> usize {
    1usize << bit_position(number_of_quantum_bits, wire)
}

// =============================================================================
// 3. Bit insertion for compressed index loops
// =============================================================================

/// Insert a zero bit at `position`, shifting the higher bits up by one.
#[inline]
pub fn insert_zero_bit(index: usize, position: usize) -> usize {
    let low = index & fill_trailing_ones(position);
    ((index >> position) << (position + 1)) | low
}

/// `positions` must be sorted ascending and distinct.
#[inline]
pub fn insert_zero_bits(mut index: usize, positions: &[usize]) -> usize {
    for &position in positions {
        index = insert_zero_bit(index, position);
    }
    index
}

/// Sort two bit positions ascending.
#[inline]
pub fn sorted_pair(first: usize, second: usize) -> [usize; 2] {
    if first < second {
        [first, second]
    } else {
        [second, first]
    }
}

pub fn sorted_bit_positions(number_of_quantum_bits: usize, wires: &[usize]) -> Vec<usize> {
    let mut positions: Vec<usize> = wires
        .iter()
        .map(|&wire| bit_position(number_of_quantum_bits, wire))
        .collect();
    positions.sort_unstable();
    positions
}

// =============================================================================
// 4. Index tables for the permutation-indexed kernels
// =============================================================================

/// Offsets of the `2^k` amplitudes addressed by `wires`, ordered so that entry
/// `j` corresponds to row `j` of the gate matrix.
pub fn internal_offsets(number_of_quantum_bits: usize, wires: &[usize]) -> Vec<usize> {
    let k = wires.len();
    (0..exp2(k))
        .map(|row| {
            wires.iter().enumerate().fold(0usize, |offset, (slot, &wire)| {
                let bit = (row >> (k - 1 - slot)) & 1;
                offset | (bit << bit_position(number_of_quantum_bits, wire))
            })
        })
        .collect()
}

/// Every amplitude index whose bits at the addressed wires are all zero.
pub fn external_indices(number_of_quantum_bits: usize, wires: &[usize]) -> Vec<usize> {
    let positions = sorted_bit_positions(number_of_quantum_bits, wires);
    (0..exp2(number_of_quantum_bits - wires.len()))
        .map(|compressed| insert_zero_bits(compressed, &positions))
        .collect()
}

// =============================================================================
// 5. Wire and buffer validation
// =============================================================================

pub fn validate_state_buffer(data_length: usize, number_of_quantum_bits: usize) -> KernelResult<()> {
    let expected = state_dimension(number_of_quantum_bits)?;
    if data_length != expected {
        return Err(ShapeError::DataLengthMismatch {
            expected,
            actual: data_length,
        }
        .into());
    }
    Ok(())
}

pub fn validate_wires(
    operation: &'static str,
    arity: WireArity,
    number_of_quantum_bits: usize,
    wires: &[usize],
) -> KernelResult<()> {
    if wires.is_empty() {
        return Err(ShapeError::EmptyWires.into());
    }
    if let WireArity::Fixed(expected) = arity {
        if wires.len() != expected {
            return Err(ShapeError::WireCountMismatch {
                operation,
                expected,
                actual: wires.len(),
            }
            .into());
        }
    }
    for (slot, &wire) in wires.iter().enumerate() {
        if wire >= number_of_quantum_bits {
            return Err(BoundsError::WireOutOfRange {
                wire,
                number_of_quantum_bits,
            }
            .into());
        }
        if wires[..slot].contains(&wire) {
            return Err(BoundsError::DuplicateWire(wire).into());
        }
    }
    Ok(())
}

pub fn validate_parameters(
    operation: &'static str,
    expected: usize,
    parameters: &[f64],
) -> KernelResult<()> {
    if parameters.len() != expected {
        return Err(ShapeError::ParameterCountMismatch {
            operation,
            expected,
            actual: parameters.len(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// LIGHTWIRE Simulator - Dense Gate Matrices
// =============================================================================
// Table of Contents:
//   1. Matrix helpers (dagger, identity)
//   2. Gate matrices and diagonals
//   3. Generator matrices and diagonals
// =============================================================================
// Purpose: Row-major dense matrices for every catalog gate and generator. The
//          permutation-indexed kernels multiply by these directly and every
//          other family is tested against them.
// =============================================================================

use crate::bit_utilities::{exp2, validate_parameters};
use crate::error::KernelResult;
use crate::kernel_catalog::{GateOperation, GeneratorOperation};
use num_complex::Complex64;
use std::f64::consts::FRAC_1_SQRT_2;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const IMAG: Complex64 = Complex64::new(0.0, 1.0);

// =============================================================================
// 1. Matrix helpers
// =============================================================================

/// Conjugate transpose of a row-major `dimension x dimension` matrix.
pub fn dagger(matrix: &[Complex64], dimension: usize) -> Vec<Complex64> {
    let mut result = vec![ZERO; dimension * dimension];
    for row in 0..dimension {
        for column in 0..dimension {
            result[column * dimension + row] = matrix[row * dimension + column].conj();
        }
    }
    result
}

pub fn identity_matrix(dimension: usize) -> Vec<Complex64> {
    let mut result = vec![ZERO; dimension * dimension];
    for diagonal in 0..dimension {
        result[diagonal * dimension + diagonal] = ONE;
    }
    result
}

fn diagonal_matrix(diagonal: &[Complex64]) -> Vec<Complex64> {
    let dimension = diagonal.len();
    let mut result = vec![ZERO; dimension * dimension];
    for (index, value) in diagonal.iter().enumerate() {
        result[index * dimension + index] = *value;
    }
    result
}

/// Embed a 2x2 matrix as the target block of a singly controlled 4x4 gate.
fn controlled_matrix(target: [Complex64; 4]) -> Vec<Complex64> {
    let mut result = identity_matrix(4);
    result[2 * 4 + 2] = target[0];
    result[2 * 4 + 3] = target[1];
    result[3 * 4 + 2] = target[2];
    result[3 * 4 + 3] = target[3];
    result
}

fn rotation_x(theta: f64) -> [Complex64; 4] {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let js = Complex64::new(0.0, -(theta / 2.0).sin());
    [c, js, js, c]
}

fn rotation_y(theta: f64) -> [Complex64; 4] {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [c, -s, s, c]
}

fn rotation_z(theta: f64) -> [Complex64; 4] {
    [
        Complex64::from_polar(1.0, -theta / 2.0),
        ZERO,
        ZERO,
        Complex64::from_polar(1.0, theta / 2.0),
    ]
}

/// `Rot(phi, theta, omega) = RZ(omega) RY(theta) RZ(phi)`.
pub fn general_rotation(phi: f64, theta: f64, omega: f64) -> [Complex64; 4] {
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();
    [
        Complex64::from_polar(c, -(phi + omega) / 2.0),
        -Complex64::from_polar(s, (phi - omega) / 2.0),
        Complex64::from_polar(s, -(phi - omega) / 2.0),
        Complex64::from_polar(c, (phi + omega) / 2.0),
    ]
}

// =============================================================================
// 2. Gate matrices
// =============================================================================

/// Dense matrix of `operation` acting on `number_of_wires` wires. Only
/// `MultiRZ` uses `number_of_wires`; every other gate has a fixed size.
pub fn gate_matrix(
    operation: GateOperation,
    number_of_wires: usize,
    parameters: &[f64],
    inverse: bool,
) -> KernelResult<Vec<Complex64>> {
    validate_parameters(operation.name(), operation.parameter_count(), parameters)?;

    let matrix = match operation {
        GateOperation::Identity => identity_matrix(2),
        GateOperation::PauliX => vec![ZERO, ONE, ONE, ZERO],
        GateOperation::PauliY => vec![ZERO, -IMAG, IMAG, ZERO],
        GateOperation::PauliZ => vec![ONE, ZERO, ZERO, -ONE],
        GateOperation::Hadamard => {
            let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
            vec![h, h, h, -h]
        }
        GateOperation::S => vec![ONE, ZERO, ZERO, IMAG],
        GateOperation::T => diagonal_matrix(&[ONE, Complex64::from_polar(1.0, std::f64::consts::FRAC_PI_4)]),
        GateOperation::PhaseShift => diagonal_matrix(&[ONE, Complex64::from_polar(1.0, parameters[0])]),
        GateOperation::RX => rotation_x(parameters[0]).to_vec(),
        GateOperation::RY => rotation_y(parameters[0]).to_vec(),
        GateOperation::RZ => rotation_z(parameters[0]).to_vec(),
        GateOperation::Rot => general_rotation(parameters[0], parameters[1], parameters[2]).to_vec(),
        GateOperation::CNOT => controlled_matrix([ZERO, ONE, ONE, ZERO]),
        GateOperation::CY => controlled_matrix([ZERO, -IMAG, IMAG, ZERO]),
        GateOperation::CZ => diagonal_matrix(&[ONE, ONE, ONE, -ONE]),
        GateOperation::SWAP => {
            let mut matrix = vec![ZERO; 16];
            matrix[0] = ONE;
            matrix[4 + 2] = ONE;
            matrix[2 * 4 + 1] = ONE;
            matrix[15] = ONE;
            matrix
        }
        GateOperation::ControlledPhaseShift => {
            diagonal_matrix(&[ONE, ONE, ONE, Complex64::from_polar(1.0, parameters[0])])
        }
        GateOperation::CRX => controlled_matrix(rotation_x(parameters[0])),
        GateOperation::CRY => controlled_matrix(rotation_y(parameters[0])),
        GateOperation::CRZ => controlled_matrix(rotation_z(parameters[0])),
        GateOperation::CRot => {
            controlled_matrix(general_rotation(parameters[0], parameters[1], parameters[2]))
        }
        GateOperation::IsingXX => {
            let c = Complex64::new((parameters[0] / 2.0).cos(), 0.0);
            let js = Complex64::new(0.0, -(parameters[0] / 2.0).sin());
            vec![
                c, ZERO, ZERO, js, //
                ZERO, c, js, ZERO, //
                ZERO, js, c, ZERO, //
                js, ZERO, ZERO, c,
            ]
        }
        GateOperation::IsingYY => {
            let c = Complex64::new((parameters[0] / 2.0).cos(), 0.0);
            let js = Complex64::new(0.0, (parameters[0] / 2.0).sin());
            vec![
                c, ZERO, ZERO, js, //
                ZERO, c, -js, ZERO, //
                ZERO, -js, c, ZERO, //
                js, ZERO, ZERO, c,
            ]
        }
        GateOperation::IsingZZ => {
            let even = Complex64::from_polar(1.0, -parameters[0] / 2.0);
            let odd = Complex64::from_polar(1.0, parameters[0] / 2.0);
            diagonal_matrix(&[even, odd, odd, even])
        }
        GateOperation::CSWAP => {
            let mut matrix = identity_matrix(8);
            matrix[5 * 8 + 5] = ZERO;
            matrix[6 * 8 + 6] = ZERO;
            matrix[5 * 8 + 6] = ONE;
            matrix[6 * 8 + 5] = ONE;
            matrix
        }
        GateOperation::Toffoli => {
            let mut matrix = identity_matrix(8);
            matrix[6 * 8 + 6] = ZERO;
            matrix[7 * 8 + 7] = ZERO;
            matrix[6 * 8 + 7] = ONE;
            matrix[7 * 8 + 6] = ONE;
            matrix
        }
        GateOperation::MultiRZ => diagonal_matrix(&multi_rz_diagonal(number_of_wires, parameters[0])),
    };

    if inverse {
        let dimension = (matrix.len() as f64).sqrt() as usize;
        Ok(dagger(&matrix, dimension))
    } else {
        Ok(matrix)
    }
}

fn multi_rz_diagonal(number_of_wires: usize, angle: f64) -> Vec<Complex64> {
    let even = Complex64::from_polar(1.0, -angle / 2.0);
    let odd = even.conj();
    (0..exp2(number_of_wires))
        .map(|index: usize| if index.count_ones() % 2 == 0 { even } else { odd })
        .collect()
}

/// Diagonal of a variadic diagonal gate, `None` for every other gate. Kernels
/// use this for `MultiRZ` so the cost stays at `2^k` entries instead of `4^k`.
pub fn gate_diagonal(
    operation: GateOperation,
    number_of_wires: usize,
    parameters: &[f64],
    inverse: bool,
) -> KernelResult<Option<Vec<Complex64>>> {
    validate_parameters(operation.name(), operation.parameter_count(), parameters)?;
    match operation {
        GateOperation::MultiRZ => {
            let angle = if inverse { -parameters[0] } else { parameters[0] };
            Ok(Some(multi_rz_diagonal(number_of_wires, angle)))
        }
        _ => Ok(None),
    }
}

// =============================================================================
// 3. Generator matrices
// =============================================================================

/// Dense Hermitian generator `G` with `U(theta) = exp(i * s * theta * G)`.
pub fn generator_matrix(operation: GeneratorOperation, number_of_wires: usize) -> Vec<Complex64> {
    let pauli_x = [ZERO, ONE, ONE, ZERO];
    let pauli_y = [ZERO, -IMAG, IMAG, ZERO];
    let pauli_z = [ONE, ZERO, ZERO, -ONE];
    let projector = |target: [Complex64; 4]| {
        let mut matrix = vec![ZERO; 16];
        matrix[2 * 4 + 2] = target[0];
        matrix[2 * 4 + 3] = target[1];
        matrix[3 * 4 + 2] = target[2];
        matrix[3 * 4 + 3] = target[3];
        matrix
    };
    let kronecker = |left: [Complex64; 4], right: [Complex64; 4]| {
        let mut matrix = vec![ZERO; 16];
        for row in 0..4 {
            for column in 0..4 {
                matrix[row * 4 + column] =
                    left[(row >> 1) * 2 + (column >> 1)] * right[(row & 1) * 2 + (column & 1)];
            }
        }
        matrix
    };

    match operation {
        GeneratorOperation::PhaseShift => vec![ZERO, ZERO, ZERO, ONE],
        GeneratorOperation::RX => pauli_x.to_vec(),
        GeneratorOperation::RY => pauli_y.to_vec(),
        GeneratorOperation::RZ => pauli_z.to_vec(),
        GeneratorOperation::ControlledPhaseShift => diagonal_matrix(&[ZERO, ZERO, ZERO, ONE]),
        GeneratorOperation::CRX => projector(pauli_x),
        GeneratorOperation::CRY => projector(pauli_y),
        GeneratorOperation::CRZ => projector(pauli_z),
        GeneratorOperation::IsingXX => kronecker(pauli_x, pauli_x),
        GeneratorOperation::IsingYY => kronecker(pauli_y, pauli_y),
        GeneratorOperation::IsingZZ => kronecker(pauli_z, pauli_z),
        GeneratorOperation::MultiRZ => diagonal_matrix(&parity_diagonal(number_of_wires)),
    }
}

fn parity_diagonal(number_of_wires: usize) -> Vec<Complex64> {
    (0..exp2(number_of_wires))
        .map(|index: usize| if index.count_ones() % 2 == 0 { ONE } else { -ONE })
        .collect()
}

/// Diagonal counterpart of [`gate_diagonal`] for generators.
pub fn generator_diagonal(operation: GeneratorOperation, number_of_wires: usize) -> Option<Vec<Complex64>> {
    match operation {
        GeneratorOperation::MultiRZ => Some(parity_diagonal(number_of_wires)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiply(left: &[Complex64], right: &[Complex64], dimension: usize) -> Vec<Complex64> {
        let mut result = vec![ZERO; dimension * dimension];
        for row in 0..dimension {
            for column in 0..dimension {
                for inner in 0..dimension {
                    result[row * dimension + column] +=
                        left[row * dimension + inner] * right[inner * dimension + column];
                }
            }
        }
        result
    }

    fn assert_is_identity(matrix: &[Complex64], dimension: usize) {
        let identity = identity_matrix(dimension);
        for (actual, expected) in matrix.iter().zip(identity.iter()) {
            assert!((actual - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn test_every_gate_matrix_is_unitary() {
        for gate in GateOperation::ALL {
            let parameters = vec![0.37; gate.parameter_count()];
            let wires = match gate.wire_arity() {
                crate::kernel_catalog::WireArity::Fixed(count) => count,
                crate::kernel_catalog::WireArity::Variadic => 3,
            };
            let dimension = exp2(wires);
            let matrix = gate_matrix(gate, wires, &parameters, false).unwrap();
            let inverse = gate_matrix(gate, wires, &parameters, true).unwrap();
            assert_eq!(matrix.len(), dimension * dimension, "{}", gate);
            assert_is_identity(&multiply(&matrix, &inverse, dimension), dimension);
        }
    }

    #[test]
    fn test_rot_matches_rz_ry_rz_product() {
        let (phi, theta, omega) = (0.3, -1.1, 2.4);
        let rot = general_rotation(phi, theta, omega).to_vec();
        let rz_phi = rotation_z(phi).to_vec();
        let ry = rotation_y(theta).to_vec();
        let rz_omega = rotation_z(omega).to_vec();
        let product = multiply(&rz_omega, &multiply(&ry, &rz_phi, 2), 2);
        for (a, b) in rot.iter().zip(product.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_parameter_count_is_checked() {
        assert!(gate_matrix(GateOperation::RX, 1, &[], false).is_err());
        assert!(gate_matrix(GateOperation::PauliX, 1, &[0.1], false).is_err());
        assert!(gate_diagonal(GateOperation::MultiRZ, 3, &[], false).is_err());
    }

    #[test]
    fn test_multi_rz_diagonal_matches_dense_matrix() {
        for inverse in [false, true] {
            let dense = gate_matrix(GateOperation::MultiRZ, 3, &[0.9], inverse).unwrap();
            let diagonal = gate_diagonal(GateOperation::MultiRZ, 3, &[0.9], inverse).unwrap().unwrap();
            for (index, value) in diagonal.iter().enumerate() {
                assert!((dense[index * 8 + index] - value).norm() < 1e-12);
            }
        }
        assert!(gate_diagonal(GateOperation::RZ, 1, &[0.9], false).unwrap().is_none());

        let generator = generator_diagonal(GeneratorOperation::MultiRZ, 2).unwrap();
        assert_eq!(generator, vec![ONE, -ONE, -ONE, ONE]);
        assert!(generator_diagonal(GeneratorOperation::IsingZZ, 2).is_none());
    }
}

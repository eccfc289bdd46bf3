// =============================================================================
// LIGHTWIRE Simulator - Differentiation Error Types
// =============================================================================
// Table of Contents:
//   1. DifferentiationError - Main error enum
//   2. Result alias
// =============================================================================

use statevector_runtime::error::KernelRuntimeError;
use thiserror::Error;

// =============================================================================
// 1. DifferentiationError - Main error enum
// =============================================================================

#[derive(Debug, Error)]
pub enum DifferentiationError {
    #[error("Runtime error: {0}")]
    Runtime(#[from] KernelRuntimeError),

    #[error("Invalid size for the gradient-output vector: expected {expected}, got {actual}")]
    CotangentLengthMismatch { expected: usize, actual: usize },

    #[error("Operation {operation} at tape position {position} has a trainable parameter but no generator")]
    NotDifferentiable { operation: String, position: usize },

    #[error("Trainable parameter {index} is out of range for a tape with {number_of_parameters} parameters")]
    TrainableParameterOutOfRange {
        index: usize,
        number_of_parameters: usize,
    },

    #[error("Trainable parameter indices must be strictly increasing, found {previous} before {next}")]
    UnsortedTrainableParameters { previous: usize, next: usize },

    #[error("Jacobian buffer holds {actual} entries, but {rows} x {columns} were expected")]
    JacobianShapeMismatch {
        rows: usize,
        columns: usize,
        actual: usize,
    },
}

// =============================================================================
// 2. Result alias
// =============================================================================

pub type DifferentiationResult<T> = Result<T, DifferentiationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use statevector_runtime::error::ShapeError;

    #[test]
    fn test_runtime_error_conversion() {
        let runtime_error: KernelRuntimeError = ShapeError::NotPowerOfTwo(3).into();
        let error: DifferentiationError = runtime_error.into();
        assert!(matches!(error, DifferentiationError::Runtime(_)));
    }

    #[test]
    fn test_cotangent_message() {
        let error = DifferentiationError::CotangentLengthMismatch { expected: 2, actual: 3 };
        assert!(error.to_string().contains("gradient-output"));
    }
}

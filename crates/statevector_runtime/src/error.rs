// =============================================================================
// LIGHTWIRE Simulator - Runtime Error Types
// =============================================================================
// Table of Contents:
//   1. KernelRuntimeError - Main error enum
//   2. LookupError - Unknown names and unregistered kernels
//   3. ShapeError - List, matrix and buffer size mismatches
//   4. BoundsError - Wire and amplitude index violations
//   5. Result alias and ErrorContext extension trait
// =============================================================================
// Purpose: One explicit error type for every fallible runtime operation. Shape
//          and bounds checks happen before the state buffer is touched, so a
//          rejected call never leaves a half-written state behind.
// =============================================================================

use crate::kernel_catalog::KernelFamily;
use thiserror::Error;

// =============================================================================
// 1. KernelRuntimeError - Main error enum
// =============================================================================

#[derive(Debug, Error)]
pub enum KernelRuntimeError {
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

// =============================================================================
// 2. LookupError - Unknown names and unregistered kernels
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Unknown gate operation name \"{0}\"")]
    UnknownGateName(String),

    #[error("Unknown generator operation name \"{0}\"")]
    UnknownGeneratorName(String),

    #[error("Unknown matrix operation name \"{0}\"")]
    UnknownMatrixName(String),

    #[error("Unknown kernel family name \"{0}\"")]
    UnknownKernelName(String),

    #[error("The gate {operation} is not registered for kernel {kernel}")]
    GateNotRegistered {
        operation: &'static str,
        kernel: KernelFamily,
    },

    #[error("The generator {operation} is not registered for kernel {kernel}")]
    GeneratorNotRegistered {
        operation: &'static str,
        kernel: KernelFamily,
    },

    #[error("The matrix operation {operation} is not registered for kernel {kernel}")]
    MatrixNotRegistered {
        operation: &'static str,
        kernel: KernelFamily,
    },

    #[error("No kernel family is selected for gate {0}")]
    NoKernelSelected(&'static str),

    #[error("Gate {0} has no generator")]
    NoGenerator(&'static str),
}

// =============================================================================
// 3. ShapeError - List, matrix and buffer size mismatches
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error(
        "Invalid arguments: number of operations ({operations}), wires ({wires}), \
         inverses ({inverses}) and parameters ({parameters}) must all be equal"
    )]
    BatchLengthMismatch {
        operations: usize,
        wires: usize,
        inverses: usize,
        parameters: usize,
    },

    #[error("The size of matrix ({actual}) does not match {wires} wires (expected {expected})")]
    MatrixSizeMismatch {
        expected: usize,
        actual: usize,
        wires: usize,
    },

    #[error("{operation} acts on {expected} wires, but {actual} were provided")]
    WireCountMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{operation} takes {expected} parameters, but {actual} were provided")]
    ParameterCountMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Data length mismatch: expected {expected}, got {actual}")]
    DataLengthMismatch { expected: usize, actual: usize },

    #[error("The size of provided data ({0}) must be a power of 2")]
    NotPowerOfTwo(usize),

    #[error("A {0}-qubit state vector does not fit in addressable memory")]
    QubitCountTooLarge(usize),

    #[error("Number of indices ({indices}) and values ({values}) must match")]
    IndexValueLengthMismatch { indices: usize, values: usize },

    #[error("An operation must act on at least one wire")]
    EmptyWires,
}

// =============================================================================
// 4. BoundsError - Wire and amplitude index violations
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoundsError {
    #[error("Wire {wire} is out of range for a {number_of_quantum_bits}-qubit state")]
    WireOutOfRange {
        wire: usize,
        number_of_quantum_bits: usize,
    },

    #[error("Duplicate wire {0} in operation wires")]
    DuplicateWire(usize),

    #[error("Amplitude index {index} is out of range for length {length}")]
    AmplitudeIndexOutOfRange { index: usize, length: usize },
}

// =============================================================================
// 5. Result alias and ErrorContext extension trait
// =============================================================================

pub type KernelResult<T> = Result<T, KernelRuntimeError>;

pub trait ErrorContext<T> {
    fn context(self, msg: impl Into<String>) -> KernelResult<T>;
    fn with_context<F>(self, f: F) -> KernelResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: std::error::Error> ErrorContext<T> for Result<T, E> {
    fn context(self, msg: impl Into<String>) -> KernelResult<T> {
        self.map_err(|e| KernelRuntimeError::Configuration(format!("{}: {}", msg.into(), e)))
    }

    fn with_context<F>(self, f: F) -> KernelResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| KernelRuntimeError::Configuration(format!("{}: {}", f(), e)))
    }
}

// =============================================================================
// LIGHTWIRE Simulator - Kernel Catalog
// =============================================================================
// Table of Contents:
//   1. KernelFamily - Interchangeable numeric implementation strategies
//   2. WireArity - Fixed or variadic wire counts
//   3. GateOperation - Gate identities
//   4. GeneratorOperation - Derivative generators of parametric gates
//   5. MatrixOperation - Dense matrix application identities
//   6. OperationIdentity - Tagged union over the three categories
// =============================================================================
// Purpose: Static catalog data. Every identity has exactly one canonical name
//          and the name <-> identity mapping is a bijection per category.
//          Consumers fail on lookup; the catalog itself never fails.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// 1. KernelFamily
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KernelFamily {
    /// Precomputed internal/external index tables, gather and multiply.
    #[serde(rename = "PI")]
    PermutationIndexed,
    /// Compressed-index loops with bit insertion, specialized per gate.
    #[serde(rename = "LM")]
    BitMaskLoop,
    /// Rayon data-parallel variant of the bit-mask loops.
    #[serde(rename = "ParallelLM")]
    ParallelBitMaskLoop,
}

impl KernelFamily {
    pub const ALL: [KernelFamily; 3] = [
        KernelFamily::PermutationIndexed,
        KernelFamily::BitMaskLoop,
        KernelFamily::ParallelBitMaskLoop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KernelFamily::PermutationIndexed => "PI",
            KernelFamily::BitMaskLoop => "LM",
            KernelFamily::ParallelBitMaskLoop => "ParallelLM",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kernel| kernel.name() == name)
    }
}

impl fmt::Display for KernelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// 2. WireArity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireArity {
    Fixed(usize),
    Variadic,
}

impl WireArity {
    pub fn accepts(self, number_of_wires: usize) -> bool {
        match self {
            WireArity::Fixed(expected) => expected == number_of_wires,
            WireArity::Variadic => number_of_wires > 0,
        }
    }
}

// =============================================================================
// 3. GateOperation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GateOperation {
    Identity,
    PauliX,
    PauliY,
    PauliZ,
    Hadamard,
    S,
    T,
    PhaseShift,
    RX,
    RY,
    RZ,
    Rot,
    CNOT,
    CY,
    CZ,
    SWAP,
    ControlledPhaseShift,
    CRX,
    CRY,
    CRZ,
    CRot,
    IsingXX,
    IsingYY,
    IsingZZ,
    CSWAP,
    Toffoli,
    MultiRZ,
}

impl GateOperation {
    pub const ALL: [GateOperation; 27] = [
        GateOperation::Identity,
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
        GateOperation::CY,
        GateOperation::CZ,
        GateOperation::SWAP,
        GateOperation::ControlledPhaseShift,
        GateOperation::CRX,
        GateOperation::CRY,
        GateOperation::CRZ,
        GateOperation::CRot,
        GateOperation::IsingXX,
        GateOperation::IsingYY,
        GateOperation::IsingZZ,
        GateOperation::CSWAP,
        GateOperation::Toffoli,
        GateOperation::MultiRZ,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GateOperation::Identity => "Identity",
            GateOperation::PauliX => "PauliX",
            GateOperation::PauliY => "PauliY",
            GateOperation::PauliZ => "PauliZ",
            GateOperation::Hadamard => "Hadamard",
            GateOperation::S => "S",
            GateOperation::T => "T",
            GateOperation::PhaseShift => "PhaseShift",
            GateOperation::RX => "RX",
            GateOperation::RY => "RY",
            GateOperation::RZ => "RZ",
            GateOperation::Rot => "Rot",
            GateOperation::CNOT => "CNOT",
            GateOperation::CY => "CY",
            GateOperation::CZ => "CZ",
            GateOperation::SWAP => "SWAP",
            GateOperation::ControlledPhaseShift => "ControlledPhaseShift",
            GateOperation::CRX => "CRX",
            GateOperation::CRY => "CRY",
            GateOperation::CRZ => "CRZ",
            GateOperation::CRot => "CRot",
            GateOperation::IsingXX => "IsingXX",
            GateOperation::IsingYY => "IsingYY",
            GateOperation::IsingZZ => "IsingZZ",
            GateOperation::CSWAP => "CSWAP",
            GateOperation::Toffoli => "Toffoli",
            GateOperation::MultiRZ => "MultiRZ",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|gate| gate.name() == name)
    }

    pub fn wire_arity(self) -> WireArity {
        match self {
            GateOperation::Identity
            | GateOperation::PauliX
            | GateOperation::PauliY
            | GateOperation::PauliZ
            | GateOperation::Hadamard
            | GateOperation::S
            | GateOperation::T
            | GateOperation::PhaseShift
            | GateOperation::RX
            | GateOperation::RY
            | GateOperation::RZ
            | GateOperation::Rot => WireArity::Fixed(1),
            GateOperation::CNOT
            | GateOperation::CY
            | GateOperation::CZ
            | GateOperation::SWAP
            | GateOperation::ControlledPhaseShift
            | GateOperation::CRX
            | GateOperation::CRY
            | GateOperation::CRZ
            | GateOperation::CRot
            | GateOperation::IsingXX
            | GateOperation::IsingYY
            | GateOperation::IsingZZ => WireArity::Fixed(2),
            GateOperation::CSWAP | GateOperation::Toffoli => WireArity::Fixed(3),
            GateOperation::MultiRZ => WireArity::Variadic,
        }
    }

    pub fn parameter_count(self) -> usize {
        match self {
            GateOperation::Rot | GateOperation::CRot => 3,
            GateOperation::PhaseShift
            | GateOperation::RX
            | GateOperation::RY
            | GateOperation::RZ
            | GateOperation::ControlledPhaseShift
            | GateOperation::CRX
            | GateOperation::CRY
            | GateOperation::CRZ
            | GateOperation::IsingXX
            | GateOperation::IsingYY
            | GateOperation::IsingZZ
            | GateOperation::MultiRZ => 1,
            _ => 0,
        }
    }

    pub fn is_parametric(self) -> bool {
        self.parameter_count() > 0
    }

    /// Hermitian and unitary, so the inverse flag has no effect.
    pub fn is_self_adjoint(self) -> bool {
        matches!(
            self,
            GateOperation::Identity
                | GateOperation::PauliX
                | GateOperation::PauliY
                | GateOperation::PauliZ
                | GateOperation::Hadamard
                | GateOperation::CNOT
                | GateOperation::CY
                | GateOperation::CZ
                | GateOperation::SWAP
                | GateOperation::CSWAP
                | GateOperation::Toffoli
        )
    }

    /// Gates whose action does not depend on the order of the wire list.
    pub fn is_wire_symmetric(self) -> bool {
        matches!(
            self,
            GateOperation::CZ
                | GateOperation::SWAP
                | GateOperation::ControlledPhaseShift
                | GateOperation::IsingXX
                | GateOperation::IsingYY
                | GateOperation::IsingZZ
                | GateOperation::MultiRZ
        )
    }

    pub fn generator(self) -> Option<GeneratorOperation> {
        GeneratorOperation::ALL
            .iter()
            .copied()
            .find(|generator| generator.gate() == self)
    }
}

impl fmt::Display for GateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// 4. GeneratorOperation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeneratorOperation {
    PhaseShift,
    RX,
    RY,
    RZ,
    ControlledPhaseShift,
    CRX,
    CRY,
    CRZ,
    IsingXX,
    IsingYY,
    IsingZZ,
    MultiRZ,
}

impl GeneratorOperation {
    pub const ALL: [GeneratorOperation; 12] = [
        GeneratorOperation::PhaseShift,
        GeneratorOperation::RX,
        GeneratorOperation::RY,
        GeneratorOperation::RZ,
        GeneratorOperation::ControlledPhaseShift,
        GeneratorOperation::CRX,
        GeneratorOperation::CRY,
        GeneratorOperation::CRZ,
        GeneratorOperation::IsingXX,
        GeneratorOperation::IsingYY,
        GeneratorOperation::IsingZZ,
        GeneratorOperation::MultiRZ,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GeneratorOperation::PhaseShift => "GeneratorPhaseShift",
            GeneratorOperation::RX => "GeneratorRX",
            GeneratorOperation::RY => "GeneratorRY",
            GeneratorOperation::RZ => "GeneratorRZ",
            GeneratorOperation::ControlledPhaseShift => "GeneratorControlledPhaseShift",
            GeneratorOperation::CRX => "GeneratorCRX",
            GeneratorOperation::CRY => "GeneratorCRY",
            GeneratorOperation::CRZ => "GeneratorCRZ",
            GeneratorOperation::IsingXX => "GeneratorIsingXX",
            GeneratorOperation::IsingYY => "GeneratorIsingYY",
            GeneratorOperation::IsingZZ => "GeneratorIsingZZ",
            GeneratorOperation::MultiRZ => "GeneratorMultiRZ",
        }
    }

    /// The parametric gate this operator generates.
    pub fn gate(self) -> GateOperation {
        match self {
            GeneratorOperation::PhaseShift => GateOperation::PhaseShift,
            GeneratorOperation::RX => GateOperation::RX,
            GeneratorOperation::RY => GateOperation::RY,
            GeneratorOperation::RZ => GateOperation::RZ,
            GeneratorOperation::ControlledPhaseShift => GateOperation::ControlledPhaseShift,
            GeneratorOperation::CRX => GateOperation::CRX,
            GeneratorOperation::CRY => GateOperation::CRY,
            GeneratorOperation::CRZ => GateOperation::CRZ,
            GeneratorOperation::IsingXX => GateOperation::IsingXX,
            GeneratorOperation::IsingYY => GateOperation::IsingYY,
            GeneratorOperation::IsingZZ => GateOperation::IsingZZ,
            GeneratorOperation::MultiRZ => GateOperation::MultiRZ,
        }
    }

    pub fn wire_arity(self) -> WireArity {
        self.gate().wire_arity()
    }

    /// Factor `s` in `U(theta) = exp(i * s * theta * G)`.
    pub fn scaling_factor(self) -> f64 {
        match self {
            GeneratorOperation::PhaseShift | GeneratorOperation::ControlledPhaseShift => 1.0,
            _ => -0.5,
        }
    }
}

impl fmt::Display for GeneratorOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// 5. MatrixOperation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatrixOperation {
    SingleQubitOp,
    TwoQubitOp,
    MultiQubitOp,
}

impl MatrixOperation {
    pub const ALL: [MatrixOperation; 3] = [
        MatrixOperation::SingleQubitOp,
        MatrixOperation::TwoQubitOp,
        MatrixOperation::MultiQubitOp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MatrixOperation::SingleQubitOp => "SingleQubitOp",
            MatrixOperation::TwoQubitOp => "TwoQubitOp",
            MatrixOperation::MultiQubitOp => "MultiQubitOp",
        }
    }

    pub fn wire_arity(self) -> WireArity {
        match self {
            MatrixOperation::SingleQubitOp => WireArity::Fixed(1),
            MatrixOperation::TwoQubitOp => WireArity::Fixed(2),
            MatrixOperation::MultiQubitOp => WireArity::Variadic,
        }
    }

    /// Chosen purely from the number of wires.
    pub fn for_wire_count(number_of_wires: usize) -> Self {
        match number_of_wires {
            1 => MatrixOperation::SingleQubitOp,
            2 => MatrixOperation::TwoQubitOp,
            _ => MatrixOperation::MultiQubitOp,
        }
    }
}

impl fmt::Display for MatrixOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// 6. OperationIdentity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationIdentity {
    Gate(GateOperation),
    Generator(GeneratorOperation),
    Matrix(MatrixOperation),
}

impl OperationIdentity {
    pub fn name(self) -> &'static str {
        match self {
            OperationIdentity::Gate(gate) => gate.name(),
            OperationIdentity::Generator(generator) => generator.name(),
            OperationIdentity::Matrix(matrix) => matrix.name(),
        }
    }

    pub fn wire_arity(self) -> WireArity {
        match self {
            OperationIdentity::Gate(gate) => gate.wire_arity(),
            OperationIdentity::Generator(generator) => generator.wire_arity(),
            OperationIdentity::Matrix(matrix) => matrix.wire_arity(),
        }
    }

    pub fn is_parametric(self) -> bool {
        match self {
            OperationIdentity::Gate(gate) => gate.is_parametric(),
            OperationIdentity::Generator(_) | OperationIdentity::Matrix(_) => false,
        }
    }
}

impl From<GateOperation> for OperationIdentity {
    fn from(gate: GateOperation) -> Self {
        OperationIdentity::Gate(gate)
    }
}

impl From<GeneratorOperation> for OperationIdentity {
    fn from(generator: GeneratorOperation) -> Self {
        OperationIdentity::Generator(generator)
    }
}

impl From<MatrixOperation> for OperationIdentity {
    fn from(matrix: MatrixOperation) -> Self {
        OperationIdentity::Matrix(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_gate_names_are_unique() {
        let names: HashSet<_> = GateOperation::ALL.iter().map(|gate| gate.name()).collect();
        assert_eq!(names.len(), GateOperation::ALL.len());
    }

    #[test]
    fn test_generator_names_are_unique_and_prefixed() {
        let names: HashSet<_> = GeneratorOperation::ALL
            .iter()
            .map(|generator| generator.name())
            .collect();
        assert_eq!(names.len(), GeneratorOperation::ALL.len());
        assert!(names.iter().all(|name| name.starts_with("Generator")));
    }

    #[test]
    fn test_every_generator_links_back_to_its_gate() {
        for generator in GeneratorOperation::ALL {
            assert_eq!(generator.gate().generator(), Some(generator));
            assert_eq!(generator.gate().parameter_count(), 1);
        }
        assert_eq!(GateOperation::Rot.generator(), None);
        assert_eq!(GateOperation::Hadamard.generator(), None);
    }

    #[test]
    fn test_kernel_family_name_round_trip() {
        for kernel in KernelFamily::ALL {
            assert_eq!(KernelFamily::from_name(kernel.name()), Some(kernel));
        }
        assert_eq!(KernelFamily::from_name("lm"), None);
    }

    #[test]
    fn test_matrix_operation_selection_by_wire_count() {
        assert_eq!(MatrixOperation::for_wire_count(1), MatrixOperation::SingleQubitOp);
        assert_eq!(MatrixOperation::for_wire_count(2), MatrixOperation::TwoQubitOp);
        assert_eq!(MatrixOperation::for_wire_count(3), MatrixOperation::MultiQubitOp);
        assert_eq!(MatrixOperation::for_wire_count(7), MatrixOperation::MultiQubitOp);
    }

    #[test]
    fn test_wire_arity() {
        assert!(GateOperation::CNOT.wire_arity().accepts(2));
        assert!(!GateOperation::CNOT.wire_arity().accepts(3));
        assert!(GateOperation::MultiRZ.wire_arity().accepts(5));
        assert!(!GateOperation::MultiRZ.wire_arity().accepts(0));
    }
}

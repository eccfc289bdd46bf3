// =============================================================================
// LIGHTWIRE Simulator - State Vector Runtime
// =============================================================================
// Table of Contents:
//   1. Module Declarations
//   2. Prelude Module
// =============================================================================
// Purpose: Gate dispatch and execution engine for dense state vectors. The
//          kernel catalog names every operation, kernel families implement
//          them, the dynamic dispatcher binds (operation, family) pairs to
//          routines, and the state backend owns the amplitude buffer they
//          mutate. Observables and measurements sit on top.
// =============================================================================

pub mod bit_utilities;
pub mod configuration;
pub mod dynamic_dispatcher;
pub mod error;
pub mod gate_matrices;
pub mod kernel_catalog;
pub mod kernels;
pub mod measurement;
pub mod observables;
pub mod state_backend;

pub mod prelude {
    pub use crate::configuration::*;
    pub use crate::dynamic_dispatcher::*;
    pub use crate::error::*;
    pub use crate::kernel_catalog::*;
    pub use crate::kernels::{
        BitMaskLoopKernels, GateKernelFamily, ParallelBitMaskLoopKernels, PermutationIndexedKernels,
    };
    pub use crate::measurement::*;
    pub use crate::observables::*;
    pub use crate::state_backend::*;
}

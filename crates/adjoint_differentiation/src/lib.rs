// =============================================================================
// LIGHTWIRE Simulator - Adjoint Differentiation
// =============================================================================
// Table of Contents:
//   1. Module Declarations
//   2. Prelude Module
// =============================================================================
// Purpose: Gradients of expectation values with respect to gate parameters.
//          A tape records operations, observables and trainable parameters;
//          the adjoint method replays it forward once and backward once, and
//          the vector-Jacobian product contracts the result with a cotangent.
// =============================================================================

pub mod adjoint_jacobian;
pub mod error;
pub mod operation_tape;
pub mod vector_jacobian_product;

pub mod prelude {
    pub use crate::adjoint_jacobian::*;
    pub use crate::error::*;
    pub use crate::operation_tape::*;
    pub use crate::vector_jacobian_product::*;
}

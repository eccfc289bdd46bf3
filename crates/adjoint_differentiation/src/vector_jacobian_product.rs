// =============================================================================
// LIGHTWIRE Simulator - Vector-Jacobian Product
// =============================================================================
// Table of Contents:
//   1. Contraction helpers
//   2. VectorJacobianProduct - Eager product over a tape
//   3. DeferredVectorJacobianProduct - Owned lazy product
// =============================================================================
// Purpose: Contracts a cotangent `dy` (one entry per observable) with the
//          Jacobian. An empty cotangent or a tape without trainable
//          parameters yields an empty result, and an all-zero cotangent
//          yields zeros without evaluating the Jacobian at all.
// =============================================================================

use crate::adjoint_jacobian::{prepare_jacobian, AdjointJacobian, JacobianEvaluator};
use crate::error::{DifferentiationError, DifferentiationResult};
use crate::operation_tape::DifferentiationTape;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// 1. Contraction helpers
// =============================================================================

/// Row-major copy of `jacobian`.
pub fn row_major(jacobian: &Array2<f64>) -> Vec<f64> {
    jacobian.iter().copied().collect()
}

/// `vjp = dy . jacobian`. An empty Jacobian or cotangent clears `vjp`.
pub fn compute_vjp(vjp: &mut Vec<f64>, jacobian: &Array2<f64>, dy: &[f64]) -> DifferentiationResult<()> {
    contract(vjp, jacobian.view(), dy)
}

/// Same as [`compute_vjp`] over a row-major `rows x columns` buffer.
pub fn compute_vjp_flat(
    vjp: &mut Vec<f64>,
    jacobian: &[f64],
    dy: &[f64],
    rows: usize,
    columns: usize,
) -> DifferentiationResult<()> {
    if jacobian.is_empty() || dy.is_empty() {
        vjp.clear();
        return Ok(());
    }
    let view = ArrayView2::from_shape((rows, columns), jacobian).map_err(|_| {
        DifferentiationError::JacobianShapeMismatch {
            rows,
            columns,
            actual: jacobian.len(),
        }
    })?;
    contract(vjp, view, dy)
}

fn contract(vjp: &mut Vec<f64>, jacobian: ArrayView2<'_, f64>, dy: &[f64]) -> DifferentiationResult<()> {
    if jacobian.is_empty() || dy.is_empty() {
        vjp.clear();
        return Ok(());
    }
    if dy.len() != jacobian.nrows() {
        return Err(DifferentiationError::CotangentLengthMismatch {
            expected: jacobian.nrows(),
            actual: dy.len(),
        });
    }
    let product = ArrayView1::from(dy).dot(&jacobian);
    vjp.clear();
    vjp.extend(product.iter().copied());
    Ok(())
}

// =============================================================================
// 2. VectorJacobianProduct
// =============================================================================

#[derive(Debug, Clone)]
pub struct VectorJacobianProduct<E = AdjointJacobian> {
    evaluator: E,
}

impl<E: JacobianEvaluator> VectorJacobianProduct<E> {
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Overwrites `vjp` with `dy . J(tape)`. `jacobian` is scratch space that
    /// holds the Jacobian afterwards unless a short-circuit applied.
    pub fn vector_jacobian_product(
        &self,
        vjp: &mut Vec<f64>,
        jacobian: &mut Array2<f64>,
        dy: &[f64],
        tape: &DifferentiationTape,
        apply_operations: bool,
    ) -> DifferentiationResult<()> {
        let number_of_parameters = tape.number_of_trainable_parameters();
        if number_of_parameters == 0 || dy.is_empty() {
            vjp.clear();
            return Ok(());
        }

        if dy.iter().all(|&entry| entry == 0.0) {
            vjp.clear();
            vjp.resize(number_of_parameters, 0.0);
            return Ok(());
        }

        if dy.len() != tape.number_of_observables() {
            return Err(DifferentiationError::CotangentLengthMismatch {
                expected: tape.number_of_observables(),
                actual: dy.len(),
            });
        }

        prepare_jacobian(jacobian, tape.number_of_observables(), number_of_parameters);
        self.evaluator.evaluate_jacobian(jacobian, tape, apply_operations)?;
        compute_vjp(vjp, jacobian, dy)
    }
}

impl<E: JacobianEvaluator + Clone + 'static> VectorJacobianProduct<E> {
    /// Packages the product as an owned computation. Nothing is evaluated
    /// until [`DeferredVectorJacobianProduct::evaluate`] is called.
    pub fn vector_jacobian_product_deferred(
        &self,
        dy: &[f64],
        tape: Arc<DifferentiationTape>,
        apply_operations: bool,
    ) -> DeferredVectorJacobianProduct {
        let product = self.clone();
        let dy = dy.to_vec();
        let number_of_trainable_parameters = tape.number_of_trainable_parameters();
        DeferredVectorJacobianProduct {
            number_of_trainable_parameters,
            computation: Box::new(move || {
                let mut vjp = Vec::with_capacity(number_of_trainable_parameters);
                let mut jacobian = Array2::zeros((0, 0));
                product.vector_jacobian_product(&mut vjp, &mut jacobian, &dy, &tape, apply_operations)?;
                Ok(vjp)
            }),
        }
    }
}

// =============================================================================
// 3. DeferredVectorJacobianProduct
// =============================================================================

type DeferredComputation = Box<dyn FnOnce() -> DifferentiationResult<Vec<f64>> + Send>;

pub struct DeferredVectorJacobianProduct {
    number_of_trainable_parameters: usize,
    computation: DeferredComputation,
}

impl DeferredVectorJacobianProduct {
    pub fn number_of_trainable_parameters(&self) -> usize {
        self.number_of_trainable_parameters
    }

    pub fn evaluate(self) -> DifferentiationResult<Vec<f64>> {
        (self.computation)()
    }
}

impl fmt::Debug for DeferredVectorJacobianProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredVectorJacobianProduct")
            .field("number_of_trainable_parameters", &self.number_of_trainable_parameters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation_tape::OperationRecord;
    use ndarray::array;
    use statevector_runtime::configuration::RuntimeConfiguration;
    use statevector_runtime::dynamic_dispatcher::bootstrap;
    use statevector_runtime::observables::NamedObservable;
    use statevector_runtime::state_backend::QuantumStateVector;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    struct CountingEvaluator {
        inner: AdjointJacobian,
        calls: Arc<AtomicUsize>,
    }

    impl JacobianEvaluator for CountingEvaluator {
        fn evaluate_jacobian(
            &self,
            jacobian: &mut Array2<f64>,
            tape: &DifferentiationTape,
            apply_operations: bool,
        ) -> DifferentiationResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.evaluate_jacobian(jacobian, tape, apply_operations)
        }
    }

    fn counting_product() -> (VectorJacobianProduct<CountingEvaluator>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = AdjointJacobian::new(bootstrap(&RuntimeConfiguration::single_threaded()).unwrap());
        let evaluator = CountingEvaluator {
            inner,
            calls: Arc::clone(&calls),
        };
        (VectorJacobianProduct::new(evaluator), calls)
    }

    fn two_observable_tape() -> DifferentiationTape {
        let mut tape = DifferentiationTape::new(QuantumStateVector::new(2))
            .with_operation(OperationRecord::parametric("RX", vec![0], 0.3))
            .with_operation(OperationRecord::parametric("RY", vec![1], -0.8))
            .with_operation(OperationRecord::fixed("CNOT", vec![0, 1]))
            .with_observable(Arc::new(NamedObservable::pauli_z(0)))
            .with_observable(Arc::new(NamedObservable::pauli_z(1)));
        tape.train_all_parameters();
        tape
    }

    #[test]
    fn test_compute_vjp_contracts_rows() {
        let jacobian = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let mut vjp = vec![7.0; 10];
        compute_vjp(&mut vjp, &jacobian, &[1.0, -1.0]).unwrap();
        assert_eq!(vjp, vec![-3.0, -3.0, -3.0]);

        compute_vjp(&mut vjp, &jacobian, &[]).unwrap();
        assert!(vjp.is_empty());

        assert!(matches!(
            compute_vjp(&mut vjp, &jacobian, &[1.0, 2.0, 3.0]),
            Err(DifferentiationError::CotangentLengthMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_compute_vjp_flat_checks_shape() {
        let flat = row_major(&array![[1.0, 0.0], [0.0, 2.0]]);
        let mut vjp = Vec::new();
        compute_vjp_flat(&mut vjp, &flat, &[3.0, 4.0], 2, 2).unwrap();
        assert_eq!(vjp, vec![3.0, 8.0]);
        assert!(matches!(
            compute_vjp_flat(&mut vjp, &flat, &[3.0, 4.0], 2, 3),
            Err(DifferentiationError::JacobianShapeMismatch { actual: 4, .. })
        ));
    }

    #[test]
    fn test_zero_cotangent_skips_jacobian() {
        let (product, calls) = counting_product();
        let tape = two_observable_tape();
        let mut vjp = vec![5.0];
        let mut jacobian = Array2::zeros((0, 0));
        product
            .vector_jacobian_product(&mut vjp, &mut jacobian, &[0.0, 0.0], &tape, true)
            .unwrap();
        assert_eq!(vjp, vec![0.0, 0.0]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_inputs_give_empty_result() {
        let (product, calls) = counting_product();
        let mut vjp = vec![1.0, 2.0];
        let mut jacobian = Array2::zeros((0, 0));

        let tape = two_observable_tape();
        product.vector_jacobian_product(&mut vjp, &mut jacobian, &[], &tape, true).unwrap();
        assert!(vjp.is_empty());

        let frozen = tape.clone().with_trainable_parameters(Vec::new()).unwrap();
        vjp.push(1.0);
        product
            .vector_jacobian_product(&mut vjp, &mut jacobian, &[1.0, 1.0], &frozen, true)
            .unwrap();
        assert!(vjp.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cotangent_length_checked_before_evaluation() {
        let (product, calls) = counting_product();
        let mut vjp = Vec::new();
        let mut jacobian = Array2::zeros((0, 0));
        let result =
            product.vector_jacobian_product(&mut vjp, &mut jacobian, &[1.0], &two_observable_tape(), true);
        assert!(matches!(
            result,
            Err(DifferentiationError::CotangentLengthMismatch { expected: 2, actual: 1 })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_vjp_matches_contracted_jacobian() {
        let (product, calls) = counting_product();
        let tape = two_observable_tape();
        let dy = [0.5, -2.0];

        let mut vjp = Vec::new();
        let mut jacobian = Array2::zeros((0, 0));
        product.vector_jacobian_product(&mut vjp, &mut jacobian, &dy, &tape, true).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(jacobian.dim(), (2, 2));

        let mut expected = Vec::new();
        compute_vjp(&mut expected, &jacobian, &dy).unwrap();
        assert_eq!(vjp, expected);
    }

    #[test]
    fn test_deferred_product_is_lazy_and_owned() {
        let (product, calls) = counting_product();
        let tape = Arc::new(two_observable_tape());
        let dy = vec![1.0, 1.0];

        let deferred = product.vector_jacobian_product_deferred(&dy, Arc::clone(&tape), true);
        drop(dy);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(deferred.number_of_trainable_parameters(), 2);

        let handle = std::thread::spawn(move || deferred.evaluate());
        let vjp = handle.join().unwrap().unwrap();
        assert_eq!(vjp.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let zero = product.vector_jacobian_product_deferred(&[0.0, 0.0], Arc::clone(&tape), true);
        assert_eq!(zero.evaluate().unwrap(), vec![0.0, 0.0]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

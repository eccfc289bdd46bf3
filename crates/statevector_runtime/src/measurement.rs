// =============================================================================
// LIGHTWIRE Simulator - Measurement Module
// =============================================================================
// Table of Contents:
//   1. Expectation values and variances
//   2. Marginal probabilities
//   3. Sampling
//   4. MeasurementStatistics - Aggregated statistics
// =============================================================================
// Purpose: Read-only measurements on a state vector. Observables are applied
//          to a scratch copy, so the measured state is never modified.
//          Bitstrings are big-endian in the order the wires are given.
// =============================================================================

use crate::bit_utilities::{bit_position, exp2, validate_wires};
use crate::dynamic_dispatcher::DynamicDispatcher;
use crate::error::KernelResult;
use crate::kernel_catalog::WireArity;
use crate::observables::{validate_observable_wires, ObservableOperatorInterface};
use crate::state_backend::{inner_product, QuantumStateVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// 1. Expectation values and variances
// =============================================================================

/// `Re <state| O |state>`.
pub fn expectation_value(
    state: &QuantumStateVector,
    observable: &dyn ObservableOperatorInterface,
    dispatcher: &DynamicDispatcher,
) -> KernelResult<f64> {
    validate_observable_wires(observable, state.number_of_quantum_bits())?;
    let mut transformed = state.clone();
    observable.apply_in_place(&mut transformed, dispatcher)?;
    Ok(inner_product(state.amplitudes(), transformed.amplitudes()).re)
}

/// `<O^2> - <O>^2`, using `<O^2> = ||O |state>||^2` for Hermitian `O`.
pub fn variance(
    state: &QuantumStateVector,
    observable: &dyn ObservableOperatorInterface,
    dispatcher: &DynamicDispatcher,
) -> KernelResult<f64> {
    validate_observable_wires(observable, state.number_of_quantum_bits())?;
    let mut transformed = state.clone();
    observable.apply_in_place(&mut transformed, dispatcher)?;
    let mean = inner_product(state.amplitudes(), transformed.amplitudes()).re;
    let square: f64 = transformed.amplitudes().iter().map(|a| a.norm_sqr()).sum();
    Ok(square - mean * mean)
}

// =============================================================================
// 2. Marginal probabilities
// =============================================================================

/// Probabilities of every outcome on `wires`, indexed big-endian in the given
/// wire order. An empty wire list returns the full distribution.
pub fn probabilities(state: &QuantumStateVector, wires: &[usize]) -> KernelResult<Vec<f64>> {
    if wires.is_empty() {
        return Ok(state.probability_distribution());
    }
    let number_of_quantum_bits = state.number_of_quantum_bits();
    validate_wires("Probability", WireArity::Variadic, number_of_quantum_bits, wires)?;

    let positions: Vec<usize> = wires
        .iter()
        .map(|&wire| bit_position(number_of_quantum_bits, wire))
        .collect();
    let mut marginal = vec![0.0; exp2(wires.len())];
    for (index, amplitude) in state.amplitudes().iter().enumerate() {
        let outcome = positions
            .iter()
            .fold(0usize, |outcome, &position| (outcome << 1) | ((index >> position) & 1));
        marginal[outcome] += amplitude.norm_sqr();
    }
    Ok(marginal)
}

// =============================================================================
// 3. Sampling
// =============================================================================

/// Draw `shots` computational-basis samples with a seeded generator. Each
/// sample is the bit vector of all wires, wire 0 first.
pub fn generate_samples(state: &QuantumStateVector, shots: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cumulative = Vec::with_capacity(state.dimension());
    let mut running = 0.0;
    for probability in state.probability_distribution() {
        running += probability;
        cumulative.push(running);
    }
    let total = running;
    let last = state.dimension() - 1;

    (0..shots)
        .map(|_| {
            let random_value: f64 = rng.gen_range(0.0..1.0) * total;
            let index = cumulative
                .partition_point(|&bound| bound <= random_value)
                .min(last);
            state.index_to_bitstring(index)
        })
        .collect()
}

// =============================================================================
// 4. MeasurementStatistics
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementStatistics {
    pub total_shots: usize,
    pub bitstring_counts: HashMap<String, usize>,
    pub probabilities: HashMap<String, f64>,
    pub entropy: f64,
}

pub fn bitstring_as_string(bitstring: &[u8]) -> String {
    bitstring
        .iter()
        .map(|b| if *b == 0 { '0' } else { '1' })
        .collect()
}

impl MeasurementStatistics {
    pub fn from_samples(samples: &[Vec<u8>]) -> Self {
        let total_shots = samples.len();
        let mut bitstring_counts: HashMap<String, usize> = HashMap::new();

        for sample in samples {
            *bitstring_counts.entry(bitstring_as_string(sample)).or_insert(0) += 1;
        }

        let probabilities: HashMap<String, f64> = bitstring_counts
            .iter()
            .map(|(k, &v)| (k.clone(), v as f64 / total_shots as f64))
            .collect();

        let entropy = Self::compute_entropy(&probabilities);

        Self {
            total_shots,
            bitstring_counts,
            probabilities,
            entropy,
        }
    }

    fn compute_entropy(probabilities: &HashMap<String, f64>) -> f64 {
        probabilities
            .values()
            .filter(|&&p| p > 0.0)
            .map(|&p| -p * p.log2())
            .sum()
    }

    /// Ties resolve to the lexicographically smallest bitstring.
    pub fn most_probable_bitstring(&self) -> Option<(&String, f64)> {
        self.probabilities
            .iter()
            .max_by(|a, b| {
                a.1.partial_cmp(b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.0.cmp(a.0))
            })
            .map(|(k, &v)| (k, v))
    }

    pub fn probability_of(&self, bitstring: &str) -> f64 {
        *self.probabilities.get(bitstring).unwrap_or(&0.0)
    }

    pub fn count_of(&self, bitstring: &str) -> usize {
        *self.bitstring_counts.get(bitstring).unwrap_or(&0)
    }
}

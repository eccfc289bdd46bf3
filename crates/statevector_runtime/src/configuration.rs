// =============================================================================
// LIGHTWIRE Simulator - Runtime Configuration
// =============================================================================
// Table of Contents:
//   1. RuntimeConfiguration - Kernel selection and threading knobs
//   2. Presets
//   3. Loading and validation
// =============================================================================
// Purpose: Everything the dispatcher bootstrap needs to decide which kernel
//          family serves each gate and how the parallel family is sized.
//          Loadable from TOML; every field has a default.
// =============================================================================

use crate::error::{ErrorContext, KernelResult, KernelRuntimeError, LookupError};
use crate::kernel_catalog::{GateOperation, KernelFamily};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// =============================================================================
// 1. RuntimeConfiguration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfiguration {
    /// Family used for every gate it implements unless overridden.
    pub default_kernel_family: KernelFamily,
    /// Smallest state length (in amplitudes) the parallel family splits
    /// across threads.
    pub parallel_minimum_dimension: usize,
    pub thread_count: usize,
    /// Gate name to kernel family, e.g. `Toffoli = "PI"`.
    pub kernel_overrides: BTreeMap<String, KernelFamily>,
}

impl Default for RuntimeConfiguration {
    fn default() -> Self {
        Self {
            default_kernel_family: KernelFamily::BitMaskLoop,
            parallel_minimum_dimension: 1 << 14,
            thread_count: num_cpus::get(),
            kernel_overrides: BTreeMap::new(),
        }
    }
}

// =============================================================================
// 2. Presets
// =============================================================================

impl RuntimeConfiguration {
    pub fn high_performance() -> Self {
        Self {
            default_kernel_family: KernelFamily::ParallelBitMaskLoop,
            parallel_minimum_dimension: 1 << 10,
            thread_count: num_cpus::get(),
            kernel_overrides: BTreeMap::new(),
        }
    }

    pub fn single_threaded() -> Self {
        Self {
            default_kernel_family: KernelFamily::BitMaskLoop,
            parallel_minimum_dimension: u32::MAX as usize,
            thread_count: 1,
            kernel_overrides: BTreeMap::new(),
        }
    }

    pub fn with_default_kernel_family(mut self, kernel: KernelFamily) -> Self {
        self.default_kernel_family = kernel;
        self
    }

    pub fn with_kernel_override(mut self, gate: GateOperation, kernel: KernelFamily) -> Self {
        self.kernel_overrides.insert(gate.name().to_string(), kernel);
        self
    }

    pub fn with_thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    // =========================================================================
    // 3. Loading and validation
    // =========================================================================

    pub fn from_toml_str(text: &str) -> KernelResult<Self> {
        let configuration: Self = toml::from_str(text).context("Failed to parse runtime configuration")?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn from_file(path: impl AsRef<Path>) -> KernelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> KernelResult<String> {
        toml::to_string_pretty(self).context("Failed to serialize runtime configuration")
    }

    pub fn validate(&self) -> KernelResult<()> {
        if self.thread_count == 0 {
            return Err(KernelRuntimeError::Configuration(
                "thread_count must be greater than zero".to_string(),
            ));
        }
        if self.parallel_minimum_dimension == 0 {
            return Err(KernelRuntimeError::Configuration(
                "parallel_minimum_dimension must be greater than zero".to_string(),
            ));
        }
        self.resolved_overrides().map(|_| ())
    }

    /// Overrides with gate names resolved against the catalog.
    pub fn resolved_overrides(&self) -> KernelResult<Vec<(GateOperation, KernelFamily)>> {
        self.kernel_overrides
            .iter()
            .map(|(name, &kernel)| {
                GateOperation::from_name(name)
                    .map(|gate| (gate, kernel))
                    .ok_or_else(|| KernelRuntimeError::from(LookupError::UnknownGateName(name.clone())))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration_is_valid() {
        let configuration = RuntimeConfiguration::default();
        assert!(configuration.validate().is_ok());
        assert!(configuration.thread_count > 0);
        assert_eq!(configuration.default_kernel_family, KernelFamily::BitMaskLoop);
    }

    #[test]
    fn test_parse_from_toml() {
        let text = r#"
            default_kernel_family = "ParallelLM"
            thread_count = 2

            [kernel_overrides]
            Toffoli = "PI"
            CRot = "LM"
        "#;
        let configuration = RuntimeConfiguration::from_toml_str(text).unwrap();
        assert_eq!(configuration.default_kernel_family, KernelFamily::ParallelBitMaskLoop);
        assert_eq!(configuration.thread_count, 2);
        assert_eq!(
            configuration.parallel_minimum_dimension,
            RuntimeConfiguration::default().parallel_minimum_dimension
        );
        let overrides = configuration.resolved_overrides().unwrap();
        assert!(overrides.contains(&(GateOperation::Toffoli, KernelFamily::PermutationIndexed)));
        assert!(overrides.contains(&(GateOperation::CRot, KernelFamily::BitMaskLoop)));
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        let unknown_gate = "[kernel_overrides]\nFredkin = \"PI\"\n";
        assert!(matches!(
            RuntimeConfiguration::from_toml_str(unknown_gate),
            Err(KernelRuntimeError::Lookup(LookupError::UnknownGateName(name))) if name == "Fredkin"
        ));

        let unknown_kernel = "default_kernel_family = \"AVX\"\n";
        assert!(matches!(
            RuntimeConfiguration::from_toml_str(unknown_kernel),
            Err(KernelRuntimeError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let configuration = RuntimeConfiguration::single_threaded().with_thread_count(0);
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn test_presets_survive_toml() {
        for configuration in [
            RuntimeConfiguration::default(),
            RuntimeConfiguration::single_threaded(),
        ] {
            let text = configuration.to_toml_string().unwrap();
            assert_eq!(RuntimeConfiguration::from_toml_str(&text).unwrap(), configuration);
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let configuration = RuntimeConfiguration::high_performance()
            .with_kernel_override(GateOperation::Toffoli, KernelFamily::PermutationIndexed);
        let text = configuration.to_toml_string().unwrap();
        let parsed = RuntimeConfiguration::from_toml_str(&text).unwrap();
        assert_eq!(parsed, configuration);
    }
}

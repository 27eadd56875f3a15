//! Configuration for the deobfuscation engine.
//!
//! This module provides the configuration type that selects which passes the
//! pipeline runs and how often the unflattener repeats.

/// Configuration for the deobfuscation engine.
///
/// Every pass can be switched off individually. A disabled pass is skipped entirely;
/// the remaining passes still run in their fixed order.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Decode the string table and inline its entries (default: true).
    pub enable_string_decoding: bool,

    /// Rewrite `obj["name"]` to `obj.name` for legal identifier names while decoding
    /// strings (default: true).
    pub enable_member_normalization: bool,

    /// Inline dictionary constants and function templates (default: true).
    pub enable_dictionary_inlining: bool,

    /// Reassemble dispatcher loops into straight-line code (default: true).
    pub enable_unflattening: bool,

    /// Number of unflattening rounds (default: 2).
    ///
    /// One round unflattens the outermost dispatcher of each statement list; nested
    /// dispatchers surface in the next round.
    pub unflatten_rounds: usize,

    /// Rebuild `while(true)` plus `break` loops with their natural exit test
    /// (default: false).
    pub enable_loop_reconstruction: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_string_decoding: true,
            enable_member_normalization: true,
            enable_dictionary_inlining: true,
            enable_unflattening: true,
            unflatten_rounds: 2,
            enable_loop_reconstruction: false,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that only decodes strings.
    ///
    /// Control flow and dictionaries are left as they are, which keeps the output
    /// closest to the input structure.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            enable_dictionary_inlining: false,
            enable_unflattening: false,
            enable_loop_reconstruction: false,
            ..Self::default()
        }
    }

    /// Creates a configuration with every pass enabled.
    ///
    /// Adds loop reconstruction and two extra unflattening rounds for deeply nested
    /// dispatchers.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            unflatten_rounds: 4,
            enable_loop_reconstruction: true,
            ..Self::default()
        }
    }

    /// Sets the number of unflattening rounds.
    #[must_use]
    pub fn with_unflatten_rounds(mut self, rounds: usize) -> Self {
        self.unflatten_rounds = rounds;
        self
    }

    /// Enables or disables computed-to-dot member normalization.
    #[must_use]
    pub fn with_member_normalization(mut self, enable: bool) -> Self {
        self.enable_member_normalization = enable;
        self
    }

    /// Enables or disables specific passes.
    ///
    /// # Arguments
    ///
    /// * `strings` - Enable string table decoding.
    /// * `dictionaries` - Enable dictionary inlining.
    /// * `unflattening` - Enable control-flow unflattening.
    /// * `loops` - Enable loop reconstruction.
    #[must_use]
    #[allow(clippy::fn_params_excessive_bools)]
    pub fn with_passes(
        mut self,
        strings: bool,
        dictionaries: bool,
        unflattening: bool,
        loops: bool,
    ) -> Self {
        self.enable_string_decoding = strings;
        self.enable_dictionary_inlining = dictionaries;
        self.enable_unflattening = unflattening;
        self.enable_loop_reconstruction = loops;
        self
    }

    /// Checks if every pass is enabled.
    #[must_use]
    pub fn all_passes_enabled(&self) -> bool {
        self.enable_string_decoding
            && self.enable_dictionary_inlining
            && self.enable_unflattening
            && self.unflatten_rounds > 0
            && self.enable_loop_reconstruction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.enable_string_decoding);
        assert!(config.enable_member_normalization);
        assert!(config.enable_dictionary_inlining);
        assert!(config.enable_unflattening);
        assert_eq!(config.unflatten_rounds, 2);
        assert!(!config.enable_loop_reconstruction); // best-effort, opt-in
        assert!(!config.all_passes_enabled());
    }

    #[test]
    fn test_minimal_config() {
        let config = EngineConfig::minimal();
        assert!(config.enable_string_decoding);
        assert!(!config.enable_dictionary_inlining);
        assert!(!config.enable_unflattening);
    }

    #[test]
    fn test_aggressive_config() {
        let config = EngineConfig::aggressive();
        assert!(config.all_passes_enabled());
        assert_eq!(config.unflatten_rounds, 4);
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new()
            .with_passes(false, true, true, true)
            .with_unflatten_rounds(1)
            .with_member_normalization(false);

        assert!(!config.enable_string_decoding);
        assert!(config.enable_loop_reconstruction);
        assert_eq!(config.unflatten_rounds, 1);
        assert!(!config.enable_member_normalization);
    }
}

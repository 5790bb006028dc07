//! Engine configuration

/// How declared default values (parameter and property defaults) are
/// surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultValueMode {
    /// Defaults keep their declared type: `100` stays an int.
    #[default]
    Preserve,

    /// Scalar defaults are surfaced as their string form: `100` becomes
    /// `"100"`. Matches older host runtimes.
    Stringify,
}

/// Configuration shared by a registry and every runtime built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum native call nesting before the call is aborted
    pub max_call_depth: usize,

    /// Representation of declared defaults
    pub default_value_mode: DefaultValueMode,

    /// Whether handler results are checked against declared return types
    pub check_return_types: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 1000,
            default_value_mode: DefaultValueMode::Preserve,
            check_return_types: true,
        }
    }
}

impl EngineConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with a custom call depth limit.
    pub fn with_max_call_depth(max_depth: usize) -> Self {
        Self {
            max_call_depth: max_depth,
            ..Default::default()
        }
    }

    /// Set the default value mode.
    pub fn default_values(mut self, mode: DefaultValueMode) -> Self {
        self.default_value_mode = mode;
        self
    }

    /// Enable or disable return type checks.
    pub fn return_type_checks(mut self, enabled: bool) -> Self {
        self.check_return_types = enabled;
        self
    }
}

//! Analysis configuration.
//!
//! [`AnalysisConfig`] controls how control flow graphs are built from a method's
//! instruction stream. Everything derived from a CFG (dominators, control
//! dependence, SSA) inherits the choice.

/// Options for building a method's control flow graph.
///
/// # Examples
///
/// ```rust
/// use dexscope::analysis::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert!(!config.include_uncaught_exceptions);
/// assert!(config.prune_unreachable);
///
/// let raw = AnalysisConfig::raw();
/// assert!(raw.include_uncaught_exceptions);
/// assert!(!raw.prune_unreachable);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Connect every instruction whose opcode can throw to the exit node with an
    /// exceptional edge, whether or not a handler covers it
    pub include_uncaught_exceptions: bool,
    /// Rebuild the graph without the nodes that cannot be reached from the entry
    /// node (recommended: always true)
    pub prune_unreachable: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_uncaught_exceptions: false,
            prune_unreachable: true,
        }
    }
}

impl AnalysisConfig {
    /// Default configuration plus edges for uncaught exceptions.
    #[must_use]
    pub fn with_uncaught_exceptions() -> Self {
        Self {
            include_uncaught_exceptions: true,
            ..Self::default()
        }
    }

    /// Keeps unreachable code in the graph and models uncaught exceptions.
    ///
    /// Mostly useful for inspecting what the builder produced before pruning.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            include_uncaught_exceptions: true,
            prune_unreachable: false,
        }
    }

    /// Suffix appended to the name of graphs built with this configuration.
    #[must_use]
    pub fn name_suffix(&self) -> &'static str {
        if self.include_uncaught_exceptions {
            " with uncaught exceptions"
        } else {
            ""
        }
    }
}

//! Per-method analysis context with cached derived graphs.
//!
//! [`MethodAnalysis`] owns a method's decoded instructions and builds the
//! control flow graph, control dependence graph and SSA form on first request.
//! Every artifact exists in two variants, with and without the exceptional
//! edges of uncaught exceptions, cached independently. Cached artifacts stay
//! until [`MethodAnalysis::invalidate`] is called.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use crate::{
    analysis::{
        ssa::{SsaBuilder, SsaForm},
        AnalysisConfig, ControlDependenceGraph, ControlFlowGraph, Dominators,
    },
    code::AnalyzedInstruction,
    Result,
};

/// Index of a cache slot: 0 without uncaught-exception edges, 1 with.
fn slot(include_exc: bool) -> usize {
    usize::from(include_exc)
}

/// Returns the cached value, building and storing it on first use.
///
/// A failed build leaves the cell empty, so the next call retries.
fn cached<T>(cell: &OnceLock<T>, init: impl FnOnce() -> Result<T>) -> Result<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = init()?;
    Ok(cell.get_or_init(|| value))
}

/// Analysis context of one method.
///
/// # Examples
///
/// ```rust
/// use dexscope::analysis::MethodAnalysis;
///
/// # use dexscope::code::{AnalyzedInstruction, Opcode};
/// # let instructions = vec![
/// #     AnalyzedInstruction::builder(0, Opcode::IF_EQZ).source(0).successors([1, 2]).build()?,
/// #     AnalyzedInstruction::builder(1, Opcode::CONST_4).destination(1).successor(3).build()?,
/// #     AnalyzedInstruction::builder(2, Opcode::CONST_4).destination(1).successor(3).build()?,
/// #     AnalyzedInstruction::builder(3, Opcode::RETURN).source(1).build()?,
/// # ];
/// let method = MethodAnalysis::new("Lcom/example/A;->f()V", instructions);
/// let cfg = method.cfg(false)?;
/// let ssa = method.ssa(false)?;
/// println!("{cfg}: {} phis", ssa.phi_count());
/// # Ok::<(), dexscope::Error>(())
/// ```
pub struct MethodAnalysis {
    name: String,
    instructions: Arc<[AnalyzedInstruction]>,
    cfgs: [OnceLock<ControlFlowGraph>; 2],
    cdgs: [OnceLock<ControlDependenceGraph>; 2],
    ssa: [OnceLock<SsaForm>; 2],
}

impl MethodAnalysis {
    /// Creates the context of the method `name`.
    pub fn new(name: impl Into<String>, instructions: impl Into<Arc<[AnalyzedInstruction]>>) -> Self {
        MethodAnalysis {
            name: name.into(),
            instructions: instructions.into(),
            cfgs: Default::default(),
            cdgs: Default::default(),
            ssa: Default::default(),
        }
    }

    /// The method's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decoded instructions.
    #[must_use]
    pub fn instructions(&self) -> &[AnalyzedInstruction] {
        &self.instructions
    }

    /// Number of instructions.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// The control flow graph, with uncaught-exception edges when `include_exc` is set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] if the instructions do not form a
    /// valid method body.
    pub fn cfg(&self, include_exc: bool) -> Result<&ControlFlowGraph> {
        cached(&self.cfgs[slot(include_exc)], || {
            let config = if include_exc {
                AnalysisConfig::with_uncaught_exceptions()
            } else {
                AnalysisConfig::default()
            };
            ControlFlowGraph::build_with_config(self.instructions.clone(), &self.name, &config)
        })
    }

    /// Forward dominators of the control flow graph, rooted at its entry.
    ///
    /// # Errors
    ///
    /// Fails if the control flow graph cannot be built.
    pub fn dominators(&self, include_exc: bool) -> Result<&Dominators> {
        Ok(self.cfg(include_exc)?.dominators())
    }

    /// Post-dominators of the control flow graph, rooted at its exit.
    ///
    /// # Errors
    ///
    /// Fails if the control flow graph cannot be built.
    pub fn post_dominators(&self, include_exc: bool) -> Result<&Dominators> {
        Ok(self.cfg(include_exc)?.post_dominators())
    }

    /// The control dependence graph.
    ///
    /// # Errors
    ///
    /// Fails if the control flow graph cannot be built.
    pub fn cdg(&self, include_exc: bool) -> Result<&ControlDependenceGraph> {
        cached(&self.cdgs[slot(include_exc)], || {
            ControlDependenceGraph::build(self.cfg(include_exc)?)
        })
    }

    /// The SSA form.
    ///
    /// # Errors
    ///
    /// Fails if the control flow graph cannot be built or renaming meets a
    /// malformed register.
    pub fn ssa(&self, include_exc: bool) -> Result<&SsaForm> {
        cached(&self.ssa[slot(include_exc)], || {
            let cfg = self.cfg(include_exc)?;
            SsaBuilder::build(cfg, cfg.dominators())
        })
    }

    /// Returns `true` if the control flow graph variant is cached.
    #[must_use]
    pub fn is_cached(&self, include_exc: bool) -> bool {
        self.cfgs[slot(include_exc)].get().is_some()
    }

    /// Drops every cached artifact; the next query rebuilds it.
    pub fn invalidate(&mut self) {
        for cell in &mut self.cfgs {
            cell.take();
        }
        for cell in &mut self.cdgs {
            cell.take();
        }
        for cell in &mut self.ssa {
            cell.take();
        }
    }
}

impl fmt::Debug for MethodAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodAnalysis")
            .field("name", &self.name)
            .field("instructions", &self.instructions.len())
            .field("cached", &[self.is_cached(false), self.is_cached(true)])
            .finish()
    }
}

impl fmt::Display for MethodAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} instructions)", self.name, self.instructions.len())
    }
}

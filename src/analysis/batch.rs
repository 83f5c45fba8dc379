//! Whole-program driver running the analysis pipeline over many methods.
//!
//! Methods are analyzed in parallel with rayon. A method whose analysis fails
//! is logged and skipped; the failure is kept in the [`BatchReport`] and never
//! stops the other methods.

use std::fmt;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{analysis::MethodAnalysis, Error, Result};

/// Sizes of the artifacts built for one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSummary {
    /// Name of the method
    pub name: String,
    /// Number of decoded instructions
    pub instructions: usize,
    /// Nodes of the pruned control flow graph, entry and exit included
    pub cfg_nodes: usize,
    /// Edges of the pruned control flow graph
    pub cfg_edges: usize,
    /// Nodes dropped as unreachable
    pub unreachable: usize,
    /// Edges of the control dependence graph
    pub cdg_edges: usize,
    /// Blocks of the SSA block tree
    pub ssa_blocks: usize,
    /// Phi functions inserted
    pub phis: usize,
}

impl MethodSummary {
    fn collect(method: &MethodAnalysis, include_exc: bool) -> Result<Self> {
        let cfg = method.cfg(include_exc)?;
        let cdg = method.cdg(include_exc)?;
        let ssa = method.ssa(include_exc)?;

        Ok(MethodSummary {
            name: method.name().to_string(),
            instructions: method.instruction_count(),
            cfg_nodes: cfg.node_count(),
            cfg_edges: cfg.edge_count(),
            unreachable: cfg.unreachable_count(),
            cdg_edges: cdg.edge_count(),
            ssa_blocks: ssa.blocks().block_count(),
            phis: ssa.phi_count(),
        })
    }
}

impl fmt::Display for MethodSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} insns, CFG({}, {}), {} unreachable, {} CD edges, {} blocks, {} phis",
            self.name,
            self.instructions,
            self.cfg_nodes,
            self.cfg_edges,
            self.unreachable,
            self.cdg_edges,
            self.ssa_blocks,
            self.phis
        )
    }
}

/// Outcome of [`analyze_methods`], in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Methods analyzed successfully
    pub summaries: Vec<MethodSummary>,
    /// Methods skipped, with the error that stopped them
    pub failures: Vec<(String, Error)>,
}

impl BatchReport {
    /// Number of methods analyzed successfully.
    #[must_use]
    pub fn analyzed(&self) -> usize {
        self.summaries.len()
    }

    /// Number of methods skipped.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` if no method failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Phi functions inserted across all analyzed methods.
    #[must_use]
    pub fn total_phis(&self) -> usize {
        self.summaries.iter().map(|s| s.phis).sum()
    }

    /// The summary of the method called `name`.
    #[must_use]
    pub fn summary(&self, name: &str) -> Option<&MethodSummary> {
        self.summaries.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} methods analyzed, {} skipped",
            self.analyzed(),
            self.failed()
        )
    }
}

/// Builds the CFG, CDG and SSA form of every method in parallel.
///
/// Artifacts are cached on each [`MethodAnalysis`], so later queries reuse them.
#[must_use]
pub fn analyze_methods(methods: &[MethodAnalysis], include_exc: bool) -> BatchReport {
    let results: Vec<(&str, Result<MethodSummary>)> = methods
        .par_iter()
        .map(|method| (method.name(), MethodSummary::collect(method, include_exc)))
        .collect();

    let mut report = BatchReport::default();
    for (name, result) in results {
        match result {
            Ok(summary) => report.summaries.push(summary),
            Err(error) => {
                warn!(method = name, %error, "skipping method");
                report.failures.push((name.to_string(), error));
            }
        }
    }

    debug!(
        analyzed = report.analyzed(),
        skipped = report.failed(),
        "batch analysis finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        code::Opcode,
        test::{diamond_method, insn, loop_method, straight_line_method},
    };

    #[test]
    fn test_failures_are_skipped() {
        let broken = vec![insn(0, Opcode::GOTO).successor(3).build().unwrap()];
        let methods = vec![
            MethodAnalysis::new("diamond", diamond_method()),
            MethodAnalysis::new("broken", broken),
            MethodAnalysis::new("loop", loop_method()),
        ];

        let report = analyze_methods(&methods, false);
        assert_eq!(report.analyzed(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.failures[0].0, "broken");
        assert_eq!(report.summaries[0].name, "diamond");
        assert_eq!(report.summaries[1].name, "loop");
        assert_eq!(report.total_phis(), 2);
        assert_eq!(report.to_string(), "2 methods analyzed, 1 skipped");
    }

    #[test]
    fn test_summary_sizes() {
        let methods = vec![MethodAnalysis::new("line", straight_line_method(3))];
        let report = analyze_methods(&methods, false);
        let summary = report.summary("line").unwrap();

        assert_eq!(summary.instructions, 3);
        assert_eq!(summary.cfg_nodes, 5);
        assert_eq!(summary.cfg_edges, 5);
        assert_eq!(summary.unreachable, 0);
        assert_eq!(summary.phis, 0);
        assert_eq!(summary.ssa_blocks, 3);
        assert!(methods[0].is_cached(false));
    }
}

//! SSA construction algorithm (Cytron et al.).
//!
//! This module implements the classic construction from:
//!
//! > Cytron et al., "Efficiently Computing Static Single Assignment Form and the
//! > Control Dependence Graph", ACM TOPLAS 1991
//!
//! # Algorithm Overview
//!
//! 1. **Discovery**: collect every register an instruction reads or writes
//! 2. **Blocks**: group the SSA graph into straight-line blocks ([`SsaBlockTree`])
//! 3. **Phi Placement**: for each register, insert phis at the iterated
//!    dominance frontier of the blocks that define it
//! 4. **Renaming**: walk the dominator tree of blocks with one version counter
//!    and one stack of live versions per register
//!
//! # Usage
//!
//! ```rust
//! use dexscope::analysis::{ssa::SsaBuilder, ControlFlowGraph};
//!
//! # use dexscope::code::{AnalyzedInstruction, Opcode};
//! # let instructions = vec![
//! #     AnalyzedInstruction::builder(0, Opcode::IF_EQZ).source(0).successors([1, 2]).build()?,
//! #     AnalyzedInstruction::builder(1, Opcode::CONST_4).destination(1).successor(3).build()?,
//! #     AnalyzedInstruction::builder(2, Opcode::CONST_4).destination(1).successor(3).build()?,
//! #     AnalyzedInstruction::builder(3, Opcode::RETURN).source(1).build()?,
//! # ];
//! let cfg = ControlFlowGraph::build(instructions, "m", false)?;
//! let ssa = SsaBuilder::build(&cfg, cfg.dominators())?;
//!
//! for phi in ssa.graph().phis() {
//!     println!("{phi}");
//! }
//! # Ok::<(), dexscope::Error>(())
//! ```

use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::{trace, trace_span};

use crate::{
    analysis::{
        ssa::{BlockId, PhiFunction, SsaBlockTree, SsaGraph},
        ControlFlowGraph, Dominators,
    },
    code::Register,
    utils::graph::NodeId,
    Error::{GraphError, SsaError},
    Result,
};

/// A method in SSA form: the statement graph and its blocks.
#[derive(Debug)]
pub struct SsaForm {
    graph: SsaGraph,
    blocks: SsaBlockTree,
    variables: BTreeSet<Register>,
}

impl SsaForm {
    /// The statement-level graph, phis included.
    #[must_use]
    pub fn graph(&self) -> &SsaGraph {
        &self.graph
    }

    /// The block tree the phis were placed on.
    #[must_use]
    pub fn blocks(&self) -> &SsaBlockTree {
        &self.blocks
    }

    /// Every register read or written by the method.
    #[must_use]
    pub fn variables(&self) -> &BTreeSet<Register> {
        &self.variables
    }

    /// Number of phi functions inserted.
    #[must_use]
    pub fn phi_count(&self) -> usize {
        self.graph.phis().len()
    }

    /// The phi functions at the head of `block`, in block order.
    pub fn phis_in(&self, block: BlockId) -> impl Iterator<Item = &PhiFunction> + '_ {
        self.blocks
            .block(block)
            .map(|b| b.nodes())
            .unwrap_or_default()
            .iter()
            .filter_map(|&node| self.graph.phi_at(node))
    }

    /// Splits the form into its graph and block tree.
    #[must_use]
    pub fn into_parts(self) -> (SsaGraph, SsaBlockTree) {
        (self.graph, self.blocks)
    }
}

/// Per-register version counters and stacks of live versions.
#[derive(Debug, Default)]
struct VersionStacks {
    counters: HashMap<Register, u32>,
    stacks: HashMap<Register, Vec<u32>>,
}

impl VersionStacks {
    /// One counter at 0 and one stack holding the entry version per register.
    fn new(variables: &BTreeSet<Register>) -> Self {
        VersionStacks {
            counters: variables.iter().map(|&r| (r, 0)).collect(),
            stacks: variables.iter().map(|&r| (r, vec![0])).collect(),
        }
    }

    /// The version of `register` visible at the current point of the walk.
    fn top(&self, register: Register) -> Result<u32> {
        match self.stacks.get(&register).and_then(|stack| stack.last()) {
            Some(&version) => Ok(version),
            None => Err(malformed_error!(
                "no live version of v{} during renaming",
                register
            )),
        }
    }

    /// Allocates the next version of `register` and makes it visible.
    fn push(&mut self, register: Register) -> Result<u32> {
        let (Some(counter), Some(stack)) = (
            self.counters.get_mut(&register),
            self.stacks.get_mut(&register),
        ) else {
            return Err(malformed_error!(
                "v{} was not discovered as a variable",
                register
            ));
        };
        *counter += 1;
        stack.push(*counter);
        Ok(*counter)
    }

    fn pop(&mut self, register: Register) {
        if let Some(stack) = self.stacks.get_mut(&register) {
            stack.pop();
        }
    }
}

#[derive(Clone, Copy)]
enum Step {
    Enter(BlockId),
    Leave(BlockId),
}

/// Builder for the SSA form of a control flow graph.
///
/// Each call to [`build`](Self::build) owns all of its intermediate state,
/// including the block memo, so independent methods can be converted
/// concurrently.
#[derive(Debug)]
pub struct SsaBuilder<'a> {
    /// Forward dominators of the source graph
    dominators: &'a Dominators,
    /// The graph being rewritten
    graph: SsaGraph,
    /// Blocks of `graph`, updated as phis are inserted
    blocks: SsaBlockTree,
    /// Registers read or written anywhere in the method
    variables: BTreeSet<Register>,
    /// Renaming state
    versions: VersionStacks,
}

impl<'a> SsaBuilder<'a> {
    /// Converts `cfg` to SSA form.
    ///
    /// `dominators` must be the forward dominators of `cfg`, rooted at its
    /// entry node (as returned by [`ControlFlowGraph::dominators`]).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] if `dominators` was not computed for
    /// `cfg` from its entry node, [`crate::Error::SsaError`] if `cfg` still
    /// holds nodes unreachable from its entry (built without pruning), and
    /// [`crate::Error::Malformed`] if renaming finds a register without a live
    /// version.
    pub fn build(cfg: &ControlFlowGraph, dominators: &'a Dominators) -> Result<SsaForm> {
        let _span = trace_span!("ssa_build", method = %cfg.name()).entered();

        if dominators.start() != cfg.entry() {
            return Err(GraphError(format!(
                "dominators of {} start at {} instead of the entry node",
                cfg.name(),
                dominators.start()
            )));
        }
        if dominators.tree().node_count() != cfg.node_count() {
            return Err(GraphError(format!(
                "dominators cover {} nodes, {} has {}",
                dominators.tree().node_count(),
                cfg.name(),
                cfg.node_count()
            )));
        }

        // Dead statements would never be renamed.
        if let Some((dead, _)) = cfg.nodes().find(|&(id, _)| !dominators.is_reachable(id)) {
            return Err(SsaError(format!(
                "{} has node {} unreachable from the entry; build it with pruning enabled",
                cfg.name(),
                dead
            )));
        }

        let graph = SsaGraph::from_cfg(cfg)?;
        let blocks = SsaBlockTree::build(graph.graph(), dominators.start())?;
        let variables = Self::discover_variables(cfg);

        let mut builder = SsaBuilder {
            dominators,
            graph,
            blocks,
            versions: VersionStacks::new(&variables),
            variables,
        };

        builder.place_phis()?;
        builder.rename()?;

        trace!(
            method = %cfg.name(),
            variables = builder.variables.len(),
            phis = builder.graph.phis().len(),
            blocks = builder.blocks.block_count(),
            "built SSA form"
        );

        Ok(SsaForm {
            graph: builder.graph,
            blocks: builder.blocks,
            variables: builder.variables,
        })
    }

    /// Collects every register that appears as a destination or a source.
    fn discover_variables(cfg: &ControlFlowGraph) -> BTreeSet<Register> {
        let mut variables = BTreeSet::new();
        for (id, _) in cfg.nodes() {
            if let Some(instruction) = cfg.instruction(id) {
                variables.extend(instruction.destination());
                variables.extend(instruction.sources().iter().copied());
            }
        }
        variables
    }

    /// Inserts phi functions at the iterated dominance frontiers of the
    /// definition sites of every register.
    fn place_phis(&mut self) -> Result<()> {
        let _span = trace_span!("ssa_place").entered();
        let block_count = self.blocks.block_count();

        let mut defines: Vec<BTreeSet<Register>> = vec![BTreeSet::new(); block_count];
        let mut frontiers: Vec<BTreeSet<NodeId>> = vec![BTreeSet::new(); block_count];
        for (id, block) in self.blocks.blocks() {
            for &node in block.nodes() {
                if let Some(destination) = self.graph.statement(node).and_then(|s| s.destination()) {
                    defines[id.index()].insert(destination.register());
                }
                frontiers[id.index()].extend(self.dominators.frontier(node).iter().copied());
            }
        }

        let exit = self.graph.exit();
        let mut has_phi: Vec<BTreeSet<Register>> = vec![BTreeSet::new(); block_count];
        let variables: Vec<Register> = self.variables.iter().copied().collect();

        for register in variables {
            let mut worklist: VecDeque<BlockId> = (0..block_count)
                .filter(|&b| defines[b].contains(&register))
                .map(BlockId::new)
                .collect();

            while let Some(block) = worklist.pop_front() {
                for &y in &frontiers[block.index()] {
                    if y == exit {
                        continue;
                    }
                    let Some(target) = self.blocks.block_containing(y) else {
                        return Err(malformed_error!(
                            "dominance frontier node {} is not part of any block",
                            y
                        ));
                    };
                    if !has_phi[target.index()].insert(register) {
                        continue;
                    }

                    let arity = self.blocks.in_degree(target);
                    let Some(first) = self.blocks.block(target).map(|b| b.first()) else {
                        continue;
                    };
                    let phi = self
                        .graph
                        .insert_phi_before(PhiFunction::new(register, arity), first)?;
                    self.blocks.insert_first(target, phi);
                    trace!(register, block = %target, arity, "inserted phi");

                    if !defines[target.index()].contains(&register) {
                        worklist.push_back(target);
                    }
                }
            }
        }

        Ok(())
    }

    /// Renames every definition and use along a pre-order walk of the
    /// dominator tree of blocks.
    fn rename(&mut self) -> Result<()> {
        let _span = trace_span!("ssa_rename").entered();
        let children = self.dominator_children()?;

        let mut stack = vec![Step::Enter(self.blocks.root())];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(block) => {
                    self.rename_block(block)?;
                    stack.push(Step::Leave(block));
                    for &child in children[block.index()].iter().rev() {
                        stack.push(Step::Enter(child));
                    }
                }
                Step::Leave(block) => self.leave_block(block),
            }
        }

        Ok(())
    }

    /// Children of each block in the dominator tree of blocks, in block order.
    ///
    /// A block is a child of the block holding the immediate dominator of its
    /// head. The block headed by the exit node takes no part in renaming.
    fn dominator_children(&self) -> Result<Vec<Vec<BlockId>>> {
        let exit = self.graph.exit();
        let mut children = vec![Vec::new(); self.blocks.block_count()];
        for (id, block) in self.blocks.blocks() {
            if id == self.blocks.root() || block.head() == exit {
                continue;
            }
            let Some(idom) = self.dominators.immediate_dominator(block.head()) else {
                continue;
            };
            let Some(parent) = self.blocks.block_containing(idom) else {
                return Err(malformed_error!(
                    "immediate dominator {} of block {} is not part of any block",
                    idom,
                    id
                ));
            };
            children[parent.index()].push(id);
        }
        Ok(children)
    }

    fn members(&self, block: BlockId) -> Vec<NodeId> {
        self.blocks
            .block(block)
            .map(|b| b.nodes().to_vec())
            .unwrap_or_default()
    }

    fn rename_block(&mut self, block: BlockId) -> Result<()> {
        let exit = self.graph.exit();

        for node in self.members(block) {
            if node == exit {
                continue;
            }
            if let Some(statement) = self.graph.statement_mut(node) {
                let sources: Vec<Register> =
                    statement.sources().iter().map(|s| s.register()).collect();
                for (slot, register) in sources.into_iter().enumerate() {
                    statement.set_source(slot, self.versions.top(register)?);
                }
                if let Some(destination) = statement.destination() {
                    statement.set_destination(self.versions.push(destination.register())?);
                }
            } else if let Some(phi) = self.graph.phi_at_mut(node) {
                phi.set_destination(self.versions.push(phi.original())?);
            }
        }

        let successors: Vec<BlockId> = self.blocks.successors(block).collect();
        for successor in successors {
            let Some(slot) = self.blocks.predecessors(successor).position(|p| p == block) else {
                return Err(malformed_error!(
                    "block {} is not a predecessor of its successor {}",
                    block,
                    successor
                ));
            };
            for node in self.members(successor) {
                if let Some(phi) = self.graph.phi_at_mut(node) {
                    let version = self.versions.top(phi.original())?;
                    if !phi.set_operand(slot, version) {
                        return Err(malformed_error!(
                            "phi for v{} in block {} has no operand {}",
                            phi.original(),
                            successor,
                            slot
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Drops the versions defined in `block` from the stacks.
    fn leave_block(&mut self, block: BlockId) {
        let exit = self.graph.exit();
        for node in self.members(block) {
            if node == exit {
                continue;
            }
            let defined = match self.graph.statement(node) {
                Some(statement) => statement.destination().map(|d| d.register()),
                None => self.graph.phi_at(node).map(PhiFunction::original),
            };
            if let Some(register) = defined {
                self.versions.pop(register);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        analysis::{ssa::SsaName, AnalysisConfig},
        code::{InstructionId, Opcode},
        test::{diamond_method, insn, loop_method, straight_line_method},
        Error,
    };

    fn build(cfg: &ControlFlowGraph) -> SsaForm {
        SsaBuilder::build(cfg, cfg.dominators()).unwrap()
    }

    fn assert_single_assignment(ssa: &SsaForm) {
        let mut seen = HashSet::new();
        for name in ssa.graph().definitions() {
            assert!(seen.insert(name), "{name} defined twice");
        }
    }

    #[test]
    fn test_diamond_phi() {
        let cfg = ControlFlowGraph::build(diamond_method(), "diamond", false).unwrap();
        let ssa = build(&cfg);

        assert_eq!(ssa.phi_count(), 1);
        let phi = &ssa.graph().phis()[0];
        assert_eq!(phi.original(), 1);
        assert_eq!(
            phi.operands(),
            &[SsaName::new(1, 1), SsaName::new(1, 3)]
        );
        assert_eq!(phi.destination(), SsaName::new(1, 2));
        assert_eq!(phi.to_string(), "v1_2 = PHI(v1_1, v1_3)");

        let join = cfg.node_for_instruction(InstructionId::new(3)).unwrap();
        let block = ssa.blocks().block_containing(join).unwrap();
        assert_eq!(ssa.phis_in(block).count(), 1);

        let ret = ssa.graph().statement(join).unwrap();
        assert_eq!(ret.sources(), &[SsaName::new(1, 2)]);
        assert_single_assignment(&ssa);
    }

    #[test]
    fn test_phi_sits_between_predecessors_and_join() {
        let cfg = ControlFlowGraph::build(diamond_method(), "diamond", false).unwrap();
        let ssa = build(&cfg);
        let n = |i: usize| cfg.node_for_instruction(InstructionId::new(i)).unwrap();

        let phi = ssa.graph().predecessors(n(3)).next().unwrap();
        assert!(ssa.graph().phi_at(phi).is_some());
        assert_eq!(
            ssa.graph().predecessors(phi).collect::<Vec<_>>(),
            vec![n(1), n(2)]
        );
    }

    #[test]
    fn test_straight_line_has_no_phis() {
        let cfg = ControlFlowGraph::build(straight_line_method(4), "line", false).unwrap();
        let ssa = build(&cfg);

        assert_eq!(ssa.phi_count(), 0);
        let versions: Vec<SsaName> = ssa.graph().definitions().collect();
        assert_eq!(
            versions,
            vec![
                SsaName::new(0, 1),
                SsaName::new(0, 2),
                SsaName::new(0, 3),
                SsaName::new(0, 4)
            ]
        );

        let last = cfg.node_for_instruction(InstructionId::new(3)).unwrap();
        assert_eq!(
            ssa.graph().statement(last).unwrap().sources(),
            &[SsaName::new(0, 3)]
        );
    }

    #[test]
    fn test_loop_phi() {
        let cfg = ControlFlowGraph::build(loop_method(), "loop", false).unwrap();
        let ssa = build(&cfg);

        assert_eq!(ssa.phi_count(), 1);
        assert_eq!(ssa.graph().phis()[0].to_string(), "v0_2 = PHI(v0_1, v0_3)");

        let test = cfg.node_for_instruction(InstructionId::new(1)).unwrap();
        let ret = cfg.node_for_instruction(InstructionId::new(4)).unwrap();
        assert_eq!(ssa.graph().statement(test).unwrap().sources(), &[SsaName::new(0, 2)]);
        assert_eq!(ssa.graph().statement(ret).unwrap().sources(), &[SsaName::new(0, 2)]);
        assert_single_assignment(&ssa);
    }

    #[test]
    fn test_undefined_register_keeps_entry_version() {
        let cfg = ControlFlowGraph::build(diamond_method(), "diamond", false).unwrap();
        let ssa = build(&cfg);
        let branch = cfg.node_for_instruction(InstructionId::new(0)).unwrap();

        assert_eq!(
            ssa.graph().statement(branch).unwrap().sources(),
            &[SsaName::entry(0)]
        );
        assert_eq!(ssa.variables().iter().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_empty_method() {
        let cfg = ControlFlowGraph::build(Vec::new(), "empty", false).unwrap();
        let ssa = build(&cfg);
        assert_eq!(ssa.phi_count(), 0);
        assert_eq!(ssa.blocks().block_count(), 1);
        assert!(ssa.variables().is_empty());
    }

    #[test]
    fn test_nested_branches() {
        // 0: if-eqz v0 -> 1 | 4
        // 1: if-nez v0 -> 2 | 3
        // 2: const v1 -> 5
        // 3: const v1 -> 5
        // 4: const v1 -> 5
        // 5: return v1
        let instructions = vec![
            insn(0, Opcode::IF_EQZ).source(0).successors([1, 4]).build().unwrap(),
            insn(1, Opcode::IF_NEZ).source(0).successors([2, 3]).build().unwrap(),
            insn(2, Opcode::CONST_4).destination(1).successor(5).build().unwrap(),
            insn(3, Opcode::CONST_4).destination(1).successor(5).build().unwrap(),
            insn(4, Opcode::CONST_4).destination(1).successor(5).build().unwrap(),
            insn(5, Opcode::RETURN).source(1).build().unwrap(),
        ];
        let cfg = ControlFlowGraph::build(instructions, "nested", false).unwrap();
        let ssa = build(&cfg);

        assert_eq!(ssa.phi_count(), 1);
        assert_eq!(ssa.graph().phis()[0].arity(), 3);
        assert!(ssa.graph().phis()[0]
            .operands()
            .iter()
            .all(|o| !o.is_entry_value()));
        assert_single_assignment(&ssa);
    }

    #[test]
    fn test_rejects_foreign_dominators() {
        let cfg = ControlFlowGraph::build(diamond_method(), "diamond", false).unwrap();
        let post = cfg.post_dominators();
        assert!(matches!(
            SsaBuilder::build(&cfg, post),
            Err(Error::GraphError(_))
        ));

        let other = ControlFlowGraph::build(straight_line_method(1), "line", false).unwrap();
        assert!(matches!(
            SsaBuilder::build(&cfg, other.dominators()),
            Err(Error::GraphError(_))
        ));
    }

    #[test]
    fn test_rejects_unpruned_dead_code() {
        // 0: goto 3, 1-2: dead const/4 v0, 3: return v0
        let instructions = vec![
            insn(0, Opcode::GOTO).successor(3).build().unwrap(),
            insn(1, Opcode::CONST_4).destination(0).successor(2).build().unwrap(),
            insn(2, Opcode::CONST_4).destination(0).successor(3).build().unwrap(),
            insn(3, Opcode::RETURN).source(0).build().unwrap(),
        ];

        let raw = ControlFlowGraph::build_with_config(
            instructions.clone(),
            "dead",
            &AnalysisConfig::raw(),
        )
        .unwrap();
        assert!(matches!(
            SsaBuilder::build(&raw, raw.dominators()),
            Err(Error::SsaError(_))
        ));

        let pruned = ControlFlowGraph::build(instructions, "dead", false).unwrap();
        let ssa = build(&pruned);
        assert!(ssa.graph().definitions().next().is_none());
        assert_eq!(ssa.phi_count(), 0);
        assert_single_assignment(&ssa);
    }

    #[test]
    fn test_version_stacks() {
        let variables: BTreeSet<Register> = [2].into_iter().collect();
        let mut versions = VersionStacks::new(&variables);

        assert_eq!(versions.top(2).unwrap(), 0);
        assert_eq!(versions.push(2).unwrap(), 1);
        assert_eq!(versions.push(2).unwrap(), 2);
        versions.pop(2);
        assert_eq!(versions.top(2).unwrap(), 1);
        assert_eq!(versions.push(2).unwrap(), 3);

        assert!(matches!(versions.top(9), Err(Error::Malformed { .. })));
        assert!(matches!(versions.push(9), Err(Error::Malformed { .. })));
    }
}

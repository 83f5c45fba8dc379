//! # dexscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dexscope library. Import this module to get quick access to the essential
//! types for method analysis.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dexscope operations
pub use crate::Error;

/// The result type used throughout dexscope
pub use crate::Result;

// ================================================================================================
// Input Model
// ================================================================================================

/// Decoded instructions and their metadata
pub use crate::code::{AnalyzedInstruction, InstructionBuilder, InstructionId, Opcode, Register};

// ================================================================================================
// Analysis
// ================================================================================================

/// Per-method pipeline, configuration and batch driver
pub use crate::analysis::{
    analyze_methods, AnalysisConfig, BatchReport, GraphDumper, MethodAnalysis, MethodSummary,
};

/// Control flow, dominance and control dependence
pub use crate::analysis::{
    CfgEdge, ControlDependenceGraph, ControlFlowGraph, Dominators, EdgeKind, Node,
};

/// Static single assignment form
pub use crate::analysis::ssa::{
    BlockId, PhiFunction, SsaBlockTree, SsaBuilder, SsaForm, SsaGraph, SsaName,
};

// ================================================================================================
// Graph Infrastructure
// ================================================================================================

/// Graph handles and traits
pub use crate::utils::graph::{
    DirectedGraph, GraphBase, NodeId, Predecessors, RootedGraph, Successors,
};

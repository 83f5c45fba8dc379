//! Graph algorithms for program analysis.
//!
//! ## Traversal
//!
//! - [`GraphWalker`] - Iterative depth-first walk with discover/finish callbacks
//! - [`dfs`], [`postorder`], [`reverse_postorder`] - Collected depth-first orders
//! - [`reachable`] - Reachability flags from a start node
//!
//! ## Dominator Analysis
//!
//! - [`compute_dominators`] - Dominator tree using Lengauer-Tarjan
//! - [`compute_dominance_frontiers`] - Dominance frontiers for phi placement and control dependence
//! - [`DominatorTree`] - Result of dominator computation
//!
//! | Algorithm | Time Complexity | Use Case |
//! |-----------|-----------------|----------|
//! | Walker | O(V + E) | Reachability, orderings |
//! | Dominators | O(V²) worst case | SSA construction, post-dominance |
//! | Frontiers | O(V + E + Σ\|DF\|) | Phi placement, control dependence |

mod dominators;
mod traversal;

pub use dominators::{
    compute_dominance_frontiers, compute_dominators, compute_dominators_rooted,
    DominatorIterator, DominatorTree,
};
pub use traversal::{dfs, postorder, reachable, reverse_postorder, GraphVisitor, GraphWalker};

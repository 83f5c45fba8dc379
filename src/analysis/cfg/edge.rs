//! Edge kinds of the control flow and control dependence graphs.

use strum::{Display, EnumIter};

use crate::utils::graph::{EdgeId, NodeId};

/// The kind of an analysis graph edge.
///
/// The textual form is the short tag used in graph dumps.
///
/// # Examples
///
/// ```rust
/// use dexscope::analysis::EdgeKind;
///
/// assert_eq!(EdgeKind::ExceptionFlow.to_string(), "CF_EX");
/// assert!(EdgeKind::ExceptionFlow.is_control_flow());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
pub enum EdgeKind {
    /// Normal control flow
    #[strum(serialize = "CF")]
    ControlFlow,
    /// Control flow that only happens when an exception is raised
    #[strum(serialize = "CF_EX")]
    ExceptionFlow,
    /// Control dependence (control dependence graph only)
    #[strum(serialize = "CD")]
    ControlDependence,
}

impl EdgeKind {
    /// Returns `true` for normal and exceptional control flow.
    #[must_use]
    pub const fn is_control_flow(&self) -> bool {
        matches!(self, Self::ControlFlow | Self::ExceptionFlow)
    }

    /// Returns `true` for exception-only control flow.
    #[must_use]
    pub const fn is_exceptional(&self) -> bool {
        matches!(self, Self::ExceptionFlow)
    }

    /// Returns `true` for control dependence edges.
    #[must_use]
    pub const fn is_control_dependence(&self) -> bool {
        matches!(self, Self::ControlDependence)
    }
}

/// A materialized edge of a control flow or control dependence graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CfgEdge {
    /// Handle of the edge in its graph
    pub id: EdgeId,
    /// Source node
    pub source: NodeId,
    /// Target node
    pub target: NodeId,
    /// Edge classification
    pub kind: EdgeKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_tags() {
        let tags: Vec<String> = EdgeKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(tags, vec!["CF", "CF_EX", "CD"]);
    }

    #[test]
    fn test_predicates() {
        assert!(EdgeKind::ControlFlow.is_control_flow());
        assert!(!EdgeKind::ControlFlow.is_exceptional());
        assert!(EdgeKind::ExceptionFlow.is_exceptional());
        assert!(!EdgeKind::ControlDependence.is_control_flow());
        assert!(EdgeKind::ControlDependence.is_control_dependence());
    }
}

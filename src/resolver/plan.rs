// src/resolver/plan.rs

//! Resolution result types

use crate::graph::{NodeId, NodeState};
use std::path::PathBuf;

/// What happened to one unresolved node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// An RPM was chosen and the node moved to `state`
    Resolved {
        node: NodeId,
        rpm_path: PathBuf,
        state: NodeState,
    },
    /// Nothing provides an implicit requirement yet; it may be built later
    SoftFailure { node: NodeId, reason: String },
    /// The node could not be resolved
    HardFailure { node: NodeId, reason: String },
}

impl NodeOutcome {
    pub fn node(&self) -> NodeId {
        match self {
            Self::Resolved { node, .. } | Self::SoftFailure { node, .. } | Self::HardFailure { node, .. } => *node,
        }
    }

    pub fn is_hard_failure(&self) -> bool {
        matches!(self, Self::HardFailure { .. })
    }
}

/// Outcomes of one resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub outcomes: Vec<NodeOutcome>,
    /// Packages came from a restored summary instead of per-node resolution
    pub restored: bool,
}

impl ResolutionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report for a run that restored a summary
    pub fn restored() -> Self {
        Self {
            outcomes: Vec::new(),
            restored: true,
        }
    }

    pub fn push(&mut self, outcome: NodeOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn resolved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, NodeOutcome::Resolved { .. }))
            .count()
    }

    pub fn soft_failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, NodeOutcome::SoftFailure { .. }))
            .count()
    }

    pub fn hard_failures(&self) -> Vec<&NodeOutcome> {
        self.outcomes.iter().filter(|o| o.is_hard_failure()).collect()
    }

    pub fn has_hard_failures(&self) -> bool {
        self.outcomes.iter().any(NodeOutcome::is_hard_failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = ResolutionReport::new();
        report.push(NodeOutcome::Resolved {
            node: 0,
            rpm_path: PathBuf::from("/out/zlib.rpm"),
            state: NodeState::Cached,
        });
        report.push(NodeOutcome::SoftFailure {
            node: 1,
            reason: "nothing provides foo".to_string(),
        });
        assert!(!report.has_hard_failures());

        report.push(NodeOutcome::HardFailure {
            node: 2,
            reason: "download failed".to_string(),
        });

        assert_eq!(report.resolved_count(), 1);
        assert_eq!(report.soft_failure_count(), 1);
        assert!(report.has_hard_failures());
        assert_eq!(report.hard_failures()[0].node(), 2);
        assert!(!report.restored);
        assert!(ResolutionReport::restored().restored);
    }
}

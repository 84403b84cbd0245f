//! Diagnostics Emitter
//!
//! Recognized graph anomalies are rendered as inline comments carrying a
//! stable code instead of failing the build. The code namespace `FQT-CG-0xx`
//! is append-only: tooling keys off the exact strings below, so existing codes
//! are never renumbered.

use serde::Serialize;

use crate::lua::comment_text;

/// Stable diagnostic codes reported by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// Node type is neither registered nor a resolvable variable node
    UnknownNodeType,
    /// Entity has no nodes at all
    EmptyGraph,
    /// Entity has nodes but none of them is a trigger
    MissingTrigger,
    /// A node was reached again while it was still being expanded
    CycleDetected,
}

impl DiagnosticCode {
    /// The stable code string
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UnknownNodeType => "FQT-CG-001",
            DiagnosticCode::EmptyGraph => "FQT-CG-002",
            DiagnosticCode::MissingTrigger => "FQT-CG-003",
            DiagnosticCode::CycleDetected => "FQT-CG-004",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal compilation anomaly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    /// Node the diagnostic is attached to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl Diagnostic {
    pub fn unknown_node_type(node_id: &str, node_type: &str) -> Self {
        Self {
            code: DiagnosticCode::UnknownNodeType,
            message: format!("Unknown node type: {}", node_type),
            node_id: Some(node_id.to_string()),
        }
    }

    pub fn empty_graph() -> Self {
        Self {
            code: DiagnosticCode::EmptyGraph,
            message: "Entity has no behavior nodes".to_string(),
            node_id: None,
        }
    }

    pub fn missing_trigger(node_count: usize) -> Self {
        Self {
            code: DiagnosticCode::MissingTrigger,
            message: format!(
                "Entity has {} node(s) but no trigger node; nothing will run",
                node_count
            ),
            node_id: None,
        }
    }

    pub fn cycle_detected(node_id: &str) -> Self {
        Self {
            code: DiagnosticCode::CycleDetected,
            message: format!("Cycle detected at node {}; branch terminated", node_id),
            node_id: Some(node_id.to_string()),
        }
    }

    /// Render as a single Lua comment line (no trailing newline)
    pub fn to_comment(&self) -> String {
        format!("-- [{}] {}", self.code, comment_text(&self.message))
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(node_id) => write!(f, "[{}] {} (node {})", self.code, self.message, node_id),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DiagnosticCode::UnknownNodeType.as_str(), "FQT-CG-001");
        assert_eq!(DiagnosticCode::EmptyGraph.as_str(), "FQT-CG-002");
        assert_eq!(DiagnosticCode::MissingTrigger.as_str(), "FQT-CG-003");
        assert_eq!(DiagnosticCode::CycleDetected.as_str(), "FQT-CG-004");
    }

    #[test]
    fn test_unknown_node_comment_format() {
        let diag = Diagnostic::unknown_node_type("n7", "summonDragon");
        assert_eq!(diag.to_comment(), "-- [FQT-CG-001] Unknown node type: summonDragon");
        assert_eq!(diag.to_string(), "[FQT-CG-001] Unknown node type: summonDragon (node n7)");
    }

    #[test]
    fn test_comment_stays_on_one_line() {
        let diag = Diagnostic::unknown_node_type("n1", "bad\ntype");
        assert!(!diag.to_comment().contains('\n'));
    }
}

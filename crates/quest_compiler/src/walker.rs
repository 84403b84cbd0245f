// Graph Walker - Depth-first expansion of a behavior graph into Lua
//
// Each trigger node is a root. A node's code is its template with properties
// encoded and every continuation slot replaced by the code of the nodes wired
// to that port, expanded recursively. Nodes not reachable from a trigger are
// never visited.

use quest_types::{BehaviorNode, NodeCategory};

use crate::catalog::{NodeCatalog, NodeTypeDef};
use crate::diagnostics::Diagnostic;
use crate::encoder::{encode_property, zero_literal};
use crate::lua::INDENT;
use crate::resolver::VariableScope;
use crate::template::TemplateSegment;

/// Result of walking one entity's graph
#[derive(Debug, Clone, Default)]
pub struct WalkResult {
    /// Compiled code of each trigger, in node-list order
    pub triggers: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    /// At least one reachable node resolved to a queued entry
    pub uses_action_queue: bool,
}

/// Walks the graph of a single entity
pub struct GraphWalker<'a> {
    catalog: &'a NodeCatalog,
    scope: VariableScope<'a>,
    quest_table: &'a str,
    /// Nodes currently being expanded, root first
    path: Vec<&'a str>,
    result: WalkResult,
}

impl<'a> GraphWalker<'a> {
    pub fn new(catalog: &'a NodeCatalog, scope: VariableScope<'a>, quest_table: &'a str) -> Self {
        Self {
            catalog,
            scope,
            quest_table,
            path: Vec::new(),
            result: WalkResult::default(),
        }
    }

    /// Expand every trigger of the entity
    pub fn walk(mut self) -> WalkResult {
        let entity = self.scope.entity();
        let catalog = self.catalog;
        for node in entity.nodes.iter().filter(|n| is_root(catalog, n)) {
            tracing::debug!(
                entity = entity.script_name_or_id(),
                node = %node.id,
                node_type = %node.node_type,
                "Expanding trigger"
            );
            let code = self.expand(node);
            self.result.triggers.push(code);
        }
        self.result
    }

    /// Compiled code of one node and everything downstream of it
    fn expand(&mut self, node: &'a BehaviorNode) -> String {
        if self.path.contains(&node.id.as_str()) {
            let diagnostic = Diagnostic::cycle_detected(&node.id);
            let comment = diagnostic.to_comment();
            self.result.diagnostics.push(diagnostic);
            return comment;
        }

        self.path.push(&node.id);
        let catalog = self.catalog;
        let code = match catalog.lookup(&node.node_type, &self.scope) {
            Some(def) => self.render(node, &def),
            None => self.render_unknown(node),
        };
        self.path.pop();
        code
    }

    fn render(&mut self, node: &'a BehaviorNode, def: &NodeTypeDef) -> String {
        let mut out = String::new();
        for segment in def.template.segments() {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Property(name) => match def.property(name) {
                    Some(property) => {
                        out.push_str(&encode_property(node.property(name), property, &self.scope))
                    }
                    None => out.push_str(zero_literal(quest_types::ValueType::Object)),
                },
                TemplateSegment::Continuation(port) => {
                    let indent = placeholder_indent(&out).to_string();
                    let code = self.continuation(node, port);
                    push_indented(&mut out, &code, &indent);
                }
            }
        }
        let body = strip_blank_lines(&out);

        if !def.queued {
            return body;
        }

        self.result.uses_action_queue = true;
        let mut code = format!("{}.EnqueueAction(function()\n", self.quest_table);
        for line in body.lines() {
            code.push_str(INDENT);
            code.push_str(line);
            code.push('\n');
        }
        code.push_str("end)");
        for port in &def.outputs {
            let next = self.continuation(node, port);
            if !next.is_empty() {
                code.push('\n');
                code.push_str(&next);
            }
        }
        code
    }

    /// Unknown type: report it, then keep going through every outgoing wire
    fn render_unknown(&mut self, node: &'a BehaviorNode) -> String {
        tracing::debug!(node = %node.id, node_type = %node.node_type, "Unknown node type");
        let diagnostic = Diagnostic::unknown_node_type(&node.id, &node.node_type);
        let mut code = diagnostic.to_comment();
        self.result.diagnostics.push(diagnostic);

        let entity = self.scope.entity();
        for connection in entity.connections_from_node(&node.id) {
            if let Some(target) = entity.get_node(&connection.to_node_id) {
                let next = self.expand(target);
                if !next.is_empty() {
                    code.push('\n');
                    code.push_str(&next);
                }
            }
        }
        code
    }

    /// Code of every node wired to `port`, in connection order
    fn continuation(&mut self, node: &'a BehaviorNode, port: &str) -> String {
        let entity = self.scope.entity();
        let mut parts = Vec::new();
        for connection in entity.connections_from(&node.id, port) {
            // Dangling connections end the branch
            let Some(target) = entity.get_node(&connection.to_node_id) else {
                continue;
            };
            let code = self.expand(target);
            if !code.is_empty() {
                parts.push(code);
            }
        }
        parts.join("\n")
    }
}

/// A node is a graph root if it or its catalog entry is a trigger
pub fn is_root(catalog: &NodeCatalog, node: &BehaviorNode) -> bool {
    node.is_trigger()
        || catalog
            .get(&node.node_type)
            .is_some_and(|def| def.category == NodeCategory::Trigger)
}

/// Leading whitespace of the line the next placeholder sits on
fn placeholder_indent(out: &str) -> &str {
    let line = match out.rfind('\n') {
        Some(pos) => &out[pos + 1..],
        None => out,
    };
    let end = line
        .find(|c: char| !c.is_whitespace())
        .unwrap_or(line.len());
    &line[..end]
}

/// Append multi-line code so every line after the first keeps `indent`
fn push_indented(out: &mut String, code: &str, indent: &str) {
    for (i, line) in code.lines().enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
}

/// Drop whitespace-only lines left behind by empty continuations
fn strip_blank_lines(code: &str) -> String {
    code.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

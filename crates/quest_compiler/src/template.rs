//! Code Templates
//!
//! Catalog templates are parsed once, at registration, into a closed list of
//! segments. Syntax:
//!
//! - `{propName}`: a declared property, encoded with its declared type
//! - `{CHILDREN}`: continuation of the single output port
//! - `{PortName}`: continuation of a named output port (`{True}`, `{Yes}`, ...)
//! - `{{` and `}}`: literal braces
//!
//! Anything else inside braces is rejected, so a broken template fails when the
//! catalog is loaded rather than when a quest is compiled.

use crate::catalog::PropertyDef;

/// Placeholder for the continuation of a single-output node
pub const CHILDREN_PLACEHOLDER: &str = "CHILDREN";

/// One piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    /// Text copied verbatim
    Literal(String),
    /// A property substituted through the value encoder
    Property(String),
    /// The compiled code reached through an output port
    Continuation(String),
}

/// Template parse failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed placeholder starting at byte {0}")]
    UnclosedPlaceholder(usize),

    #[error("unmatched '}}' at byte {0} (write '}}}}' for a literal brace)")]
    UnmatchedBrace(usize),

    #[error("empty placeholder at byte {0} (write '{{{{}}}}' for a literal '{{}}')")]
    EmptyPlaceholder(usize),

    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),

    #[error("placeholder '{{{0}}}' names both a property and an output port")]
    AmbiguousPlaceholder(String),

    #[error("'{{CHILDREN}}' requires exactly one output port, found {0}")]
    ChildrenNeedsSingleOutput(usize),

    #[error("output port '{0}' is referenced more than once")]
    DuplicateContinuation(String),

    #[error("output port '{0}' is never referenced")]
    UnusedOutputPort(String),

    #[error("queued templates cannot reference continuation '{0}'")]
    QueuedContinuation(String),
}

/// A parsed code template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    segments: Vec<TemplateSegment>,
}

impl Template {
    /// Build a template from already-validated segments
    pub fn from_segments(segments: Vec<TemplateSegment>) -> Self {
        Self { segments }
    }

    /// Parse template source against the entry's ports and properties.
    ///
    /// Queued templates describe a deferred attempt; their continuations are
    /// appended by the walker, so they may not reference any.
    pub fn parse(
        source: &str,
        outputs: &[String],
        properties: &[PropertyDef],
        queued: bool,
    ) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut used_ports: Vec<&str> = Vec::new();
        let mut chars = source.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|(_, next)| *next == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        if c == '{' {
                            return Err(TemplateError::UnclosedPlaceholder(offset));
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::UnclosedPlaceholder(offset));
                    }
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder(offset));
                    }

                    let segment = classify(name, outputs, properties)?;
                    if let TemplateSegment::Continuation(port) = &segment {
                        if queued {
                            return Err(TemplateError::QueuedContinuation(port.clone()));
                        }
                        let port = outputs
                            .iter()
                            .find(|p| *p == port)
                            .map(|p| p.as_str())
                            .unwrap_or_default();
                        if used_ports.contains(&port) {
                            return Err(TemplateError::DuplicateContinuation(port.to_string()));
                        }
                        used_ports.push(port);
                    }

                    if !literal.is_empty() {
                        segments.push(TemplateSegment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' if chars.peek().is_some_and(|(_, next)| *next == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnmatchedBrace(offset)),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(TemplateSegment::Literal(literal));
        }

        if !queued {
            if let Some(unused) = outputs.iter().find(|p| !used_ports.contains(&p.as_str())) {
                return Err(TemplateError::UnusedOutputPort(unused.clone()));
            }
        }

        Ok(Self { segments })
    }

    /// Parsed segments in order
    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    /// Output ports referenced by this template, in template order
    pub fn continuation_ports(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Continuation(port) => Some(port.as_str()),
            _ => None,
        })
    }

    /// Check if the template produces no text of its own
    pub fn is_pass_through(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, TemplateSegment::Continuation(_)))
    }
}

fn classify(
    name: String,
    outputs: &[String],
    properties: &[PropertyDef],
) -> Result<TemplateSegment, TemplateError> {
    if name == CHILDREN_PLACEHOLDER {
        return match outputs {
            [single] => Ok(TemplateSegment::Continuation(single.clone())),
            _ => Err(TemplateError::ChildrenNeedsSingleOutput(outputs.len())),
        };
    }

    let is_port = outputs.iter().any(|p| *p == name);
    let is_property = properties.iter().any(|p| p.name == name);
    match (is_port, is_property) {
        (true, true) => Err(TemplateError::AmbiguousPlaceholder(name)),
        (true, false) => Ok(TemplateSegment::Continuation(name)),
        (false, true) => Ok(TemplateSegment::Property(name)),
        (false, false) => Err(TemplateError::UnknownPlaceholder(name)),
    }
}

//! Value Encoder
//!
//! Converts an untyped property value plus its declared [`ValueType`] into Lua
//! source text. Placeholders (`$...`) are handed to the [`VariableScope`]
//! before any type-based encoding happens.
//!
//! Every degrade path is a named function so it can be tested (and later
//! reported) on its own:
//! - [`degrade_unparsable`]: the value does not fit its declared type
//! - [`degrade_unresolved`]: the placeholder names no declared variable
//! - [`missing_property`]: the node does not set the property at all

use quest_types::ValueType;
use serde_json::Value;

use crate::catalog::PropertyDef;
use crate::lua::quote_lua_string;
use crate::resolver::{PLACEHOLDER_PREFIX, VariableScope};

/// Literal emitted for values that cannot be parsed as their declared type
pub const UNPARSABLE_LITERAL: &str = "\"\"";

/// Zero value of a type, used when a property is missing and has no default
pub fn zero_literal(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::String => "\"\"",
        ValueType::Boolean => "false",
        ValueType::Integer => "0",
        ValueType::Float => "0.0",
        ValueType::Object => "nil",
    }
}

/// Encode a value as a literal of the given type, ignoring placeholders
pub fn encode_literal(value: &Value, value_type: ValueType) -> String {
    match try_encode_literal(value, value_type) {
        Some(literal) => literal,
        None => degrade_unparsable(value, value_type),
    }
}

/// Encode a value, resolving `$` placeholders against `scope` first
pub fn encode_value(value: &Value, value_type: ValueType, scope: &VariableScope<'_>) -> String {
    if let Value::String(text) = value {
        if text.starts_with(PLACEHOLDER_PREFIX) {
            let resolution = scope.resolve(text);
            return match resolution.expression() {
                Some(ident) => ident.to_string(),
                None => degrade_unresolved(value, value_type),
            };
        }
    }
    encode_literal(value, value_type)
}

/// Encode the value a node sets for a declared property
pub fn encode_property(
    value: Option<&Value>,
    property: &PropertyDef,
    scope: &VariableScope<'_>,
) -> String {
    match value {
        Some(value) => encode_value(value, property.value_type, scope),
        None => missing_property(property, scope),
    }
}

/// Fallback for a value that does not parse as its declared type
pub fn degrade_unparsable(value: &Value, value_type: ValueType) -> String {
    tracing::trace!(%value, %value_type, "Unparsable property value encoded as empty string");
    UNPARSABLE_LITERAL.to_string()
}

/// Fallback for a placeholder that names no declared variable
pub fn degrade_unresolved(value: &Value, value_type: ValueType) -> String {
    tracing::trace!(%value, "Unresolved variable placeholder encoded as literal");
    encode_literal(value, value_type)
}

/// Fallback for a property the node does not set
pub fn missing_property(property: &PropertyDef, scope: &VariableScope<'_>) -> String {
    match &property.default {
        Some(default) => encode_value(default, property.value_type, scope),
        None => zero_literal(property.value_type).to_string(),
    }
}

fn try_encode_literal(value: &Value, value_type: ValueType) -> Option<String> {
    match value_type {
        ValueType::String => match value {
            Value::String(text) => Some(quote_lua_string(text)),
            Value::Number(n) => Some(quote_lua_string(&n.to_string())),
            Value::Bool(b) => Some(quote_lua_string(&b.to_string())),
            _ => None,
        },
        ValueType::Boolean => match value {
            Value::Bool(b) => Some(b.to_string()),
            Value::String(text) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") {
                    Some("true".to_string())
                } else if text.eq_ignore_ascii_case("false") {
                    Some("false".to_string())
                } else {
                    None
                }
            }
            _ => None,
        },
        ValueType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            Value::String(text) => {
                let text = text.trim();
                (is_unsigned_or_negative(text) && text.parse::<i64>().is_ok())
                    .then(|| text.to_string())
            }
            _ => None,
        },
        ValueType::Float => match value {
            Value::Number(n) => n.as_f64().is_some_and(f64::is_finite).then(|| n.to_string()),
            Value::String(text) => {
                let text = text.trim();
                let finite = text.parse::<f64>().is_ok_and(|f| f.is_finite());
                (is_unsigned_or_negative(text) && finite).then(|| text.to_string())
            }
            _ => None,
        },
        ValueType::Object => match value {
            Value::String(text) => Some(quote_lua_string(text)),
            Value::Null => Some("nil".to_string()),
            _ => None,
        },
    }
}

/// Lua has no unary plus, so `+5` is rejected even though Rust parses it
fn is_unsigned_or_negative(text: &str) -> bool {
    !text.is_empty() && !text.starts_with('+')
}

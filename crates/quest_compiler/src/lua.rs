//! Lua Source Helpers
//!
//! Identifier mangling, string literal escaping and an indentation-aware
//! writer used by every emitter in this crate.

/// One level of indentation in generated scripts
pub const INDENT: &str = "    ";

/// Reserved words of the target runtime
const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Check if a word is reserved in Lua
pub fn is_lua_keyword(word: &str) -> bool {
    LUA_KEYWORDS.contains(&word)
}

/// Build a Lua-safe identifier from arbitrary text.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`; a leading digit, an
/// empty result or a reserved word gets an extra `_` prefix.
pub fn sanitize_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    let needs_prefix = ident.is_empty()
        || ident.starts_with(|c: char| c.is_ascii_digit())
        || is_lua_keyword(&ident);
    if needs_prefix {
        ident.insert(0, '_');
    }
    ident
}

/// Mangle a variable name into its script identifier (`var_<Name>`)
pub fn mangle_variable(name: &str) -> String {
    sanitize_identifier(&format!("var_{}", name))
}

/// Mangle a cross-entity variable reference (`<Owner>.var_<Name>`)
pub fn mangle_external_variable(owner_script_name: &str, name: &str) -> String {
    format!("{}.{}", sanitize_identifier(owner_script_name), mangle_variable(name))
}

/// Escape a string for use inside a double-quoted Lua literal.
///
/// Only backslash, double quote, newline and tab are rewritten.
pub fn escape_lua_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Quote and escape a string as a Lua literal
pub fn quote_lua_string(text: &str) -> String {
    format!("\"{}\"", escape_lua_string(text))
}

/// Flatten text so it can live inside a single `--` comment line
pub fn comment_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Writer
// ─────────────────────────────────────────────────────────────────────────────

/// Line-oriented script writer that tracks indentation
#[derive(Debug, Default)]
pub struct LuaWriter {
    out: String,
    depth: usize,
}

impl LuaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indentation
    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Write an empty line
    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Write a `-- comment` line
    pub fn comment(&mut self, text: &str) {
        self.line(&format!("-- {}", comment_text(text)));
    }

    /// Write a multi-line block, each line at the current indentation
    pub fn block(&mut self, code: &str) {
        for line in code.lines() {
            self.line(line);
        }
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Consume the writer and return the script text
    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of `escape_lua_string` for the escapes it produces
    fn unescape(literal: &str) -> String {
        let inner = &literal[1..literal.len() - 1];
        let mut out = String::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => {}
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_escape_round_trip() {
        let samples = [
            "plain",
            "say \"hello\"",
            "C:\\quests\\ring",
            "line one\nline two",
            "col\tcol",
            "\\\"\n\t mixed \\n literal",
            "ünïcødé stays",
        ];
        for sample in samples {
            let literal = quote_lua_string(sample);
            assert!(literal.starts_with('"') && literal.ends_with('"'));
            assert!(!literal.contains('\n'));
            assert_eq!(unescape(&literal), sample, "round trip of {:?}", sample);
        }
    }

    #[test]
    fn test_escape_exact_sequences() {
        assert_eq!(escape_lua_string("a\\b"), "a\\\\b");
        assert_eq!(escape_lua_string("\""), "\\\"");
        assert_eq!(escape_lua_string("\n\t"), "\\n\\t");
        assert_eq!(escape_lua_string("'"), "'");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("Guard_Bob"), "Guard_Bob");
        assert_eq!(sanitize_identifier("Guard Bob-2"), "Guard_Bob_2");
        assert_eq!(sanitize_identifier("1stGuard"), "_1stGuard");
        assert_eq!(sanitize_identifier(""), "_");
        assert_eq!(sanitize_identifier("end"), "_end");
        assert_eq!(sanitize_identifier("é"), "_");
    }

    #[test]
    fn test_mangle_variable() {
        assert_eq!(mangle_variable("Stage Name"), "var_Stage_Name");
        assert_eq!(mangle_variable("9lives"), "var_9lives");
        assert_eq!(
            mangle_external_variable("Guard Bob", "Stage Name"),
            "Guard_Bob.var_Stage_Name"
        );
    }

    #[test]
    fn test_writer_indentation() {
        let mut w = LuaWriter::new();
        w.line("function Main()");
        w.indent();
        w.block("if x then\n    y()\nend");
        w.dedent();
        w.line("end");
        assert_eq!(
            w.finish(),
            "function Main()\n    if x then\n        y()\n    end\nend\n"
        );
    }

    #[test]
    fn test_comment_text_flattens_newlines() {
        assert_eq!(comment_text("a\nb\r\nc"), "a b  c");
    }
}

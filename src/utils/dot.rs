//! DOT format utilities for graph visualization.
//!
//! Every analysis graph in the crate can render itself to Graphviz DOT text.
//! They all go through [`DotWriter`] so that node naming, escaping and the
//! common graph attributes stay identical between the control flow graph, the
//! control dependence graph, the dominator tree and the SSA graphs.

use std::fmt::Write;

/// Escapes a string for safe use in DOT format labels and identifiers.
///
/// This function handles all characters that have special meaning in DOT format,
/// including quotes, backslashes, newlines, and angle brackets.
///
/// # Examples
///
/// ```rust
/// use dexscope::utils::escape_dot;
///
/// let escaped = escape_dot("Ljava/util/List<TT;>;");
/// assert_eq!(escaped, "Ljava/util/List\\<TT;\\>;");
/// ```
#[must_use]
pub fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
        .replace('<', "\\<")
        .replace('>', "\\>")
}

/// Incremental builder for a `digraph` document.
///
/// Node identifiers are emitted as `n<index>`; labels are escaped on the way in.
pub struct DotWriter {
    out: String,
}

impl DotWriter {
    /// Starts a new digraph called `kind`, optionally with a title label.
    #[must_use]
    pub fn new(kind: &str, title: Option<&str>) -> Self {
        let mut out = String::new();
        let _ = writeln!(out, "digraph {kind} {{");
        if let Some(title) = title {
            let _ = writeln!(out, "    label=\"{}\";", escape_dot(title));
        }
        out.push_str("    labelloc=t;\n");
        out.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n");
        out.push_str("    edge [fontname=\"Courier\", fontsize=9];\n\n");
        DotWriter { out }
    }

    /// Emits a node. `style` is appended verbatim to the attribute list.
    pub fn node(&mut self, index: usize, label: &str, style: Option<&str>) {
        let _ = write!(self.out, "    n{index} [label=\"{}\"", escape_dot(label));
        if let Some(style) = style {
            let _ = write!(self.out, ", {style}");
        }
        self.out.push_str("];\n");
    }

    /// Emits an edge. `style` is appended verbatim to the attribute list.
    pub fn edge(&mut self, source: usize, target: usize, label: Option<&str>, style: Option<&str>) {
        let _ = write!(self.out, "    n{source} -> n{target}");
        let mut attrs = Vec::new();
        if let Some(label) = label {
            attrs.push(format!("label=\"{}\"", escape_dot(label)));
        }
        if let Some(style) = style {
            attrs.push(style.to_string());
        }
        if !attrs.is_empty() {
            let _ = write!(self.out, " [{}]", attrs.join(", "));
        }
        self.out.push_str(";\n");
    }

    /// Closes the graph and returns the document.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.out.push_str("}\n");
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_dot_quotes_and_backslash() {
        assert_eq!(escape_dot("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_dot("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_escape_dot_newlines() {
        assert_eq!(escape_dot("line1\r\nline2"), "line1\\nline2");
    }

    #[test]
    fn test_escape_dot_type_descriptor() {
        assert_eq!(
            escape_dot("Lcom/example/Box<TT;>;->get()"),
            "Lcom/example/Box\\<TT;\\>;->get()"
        );
    }

    #[test]
    fn test_dot_writer_document() {
        let mut dot = DotWriter::new("CFG", Some("m\"1\""));
        dot.node(0, "ENTRY", Some("style=filled"));
        dot.node(1, "EXIT", None);
        dot.edge(0, 1, Some("CF"), None);
        dot.edge(1, 0, None, Some("style=dashed"));
        let text = dot.finish();

        assert!(text.starts_with("digraph CFG {\n"));
        assert!(text.contains("label=\"m\\\"1\\\"\";"));
        assert!(text.contains("    n0 [label=\"ENTRY\", style=filled];\n"));
        assert!(text.contains("    n1 [label=\"EXIT\"];\n"));
        assert!(text.contains("    n0 -> n1 [label=\"CF\"];\n"));
        assert!(text.contains("    n1 -> n0 [style=dashed];\n"));
        assert!(text.ends_with("}\n"));
    }
}

//! Tree traversal and mutation codegen.
//!
//! Walks the parsed tree pre-order, offers every node to every enabled
//! operator, and converts each accepted site into a [`Mutation`] with a
//! byte-accurate location. Generation is deterministic: the same source and
//! operator selection always yields the same ordered list, ids included.

use std::path::Path;

use crate::mutants::{Mutation, SourceLocation};
use crate::parser::SyntaxNode;
use crate::registry::MutationOperator;

/// Cached newline index for lazy line/column computation from byte offsets.
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-based `(line, column)` for a byte offset; columns count bytes.
    pub fn line_col(&self, byte: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, byte - self.line_starts[line] + 1)
    }
}

/// Render a replacement node back into source text. Subtrees reused from the
/// parse keep their byte range and print as the original slice; synthesized
/// atoms print their stored text.
pub fn node_text(node: &SyntaxNode, source: &str) -> String {
    let slice = node.source_text(source);
    if !slice.is_empty() {
        return slice.to_string();
    }
    match node {
        SyntaxNode::Atom { text, .. } => text.clone(),
        SyntaxNode::Identifier { name, .. } => name.clone(),
        SyntaxNode::Node { children, .. } => children
            .iter()
            .map(|c| node_text(c, source))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        SyntaxNode::Missing => String::new(),
    }
}

/// Discover all mutations in one parsed file, in traversal order. Ids are
/// file-local here; the coordinator renumbers across files before
/// scheduling.
pub fn discover(
    root: &SyntaxNode,
    source: &str,
    file: &Path,
    operators: &[&dyn MutationOperator],
) -> Vec<Mutation> {
    let index = LineIndex::new(source);
    let mut mutations = Vec::new();
    walk(root, source, file, &index, operators, &mut mutations);
    mutations
}

fn walk(
    node: &SyntaxNode,
    source: &str,
    file: &Path,
    index: &LineIndex,
    operators: &[&dyn MutationOperator],
    out: &mut Vec<Mutation>,
) {
    for op in operators {
        if !op.can_mutate(node) {
            continue;
        }
        for (replacement, description) in op.mutate(node) {
            let byte_start = node.byte_start();
            let original_text = node.source_text(source).to_string();
            let byte_end = byte_start + original_text.len();
            let mutated_text = node_text(&replacement, source);
            let (start_line, start_col) = index.line_col(byte_start);
            let (end_line, end_col) = index.line_col(byte_end);
            out.push(Mutation {
                id: out.len(),
                file: file.to_path_buf(),
                location: SourceLocation {
                    file: file.to_path_buf(),
                    start_line,
                    start_col,
                    end_line,
                    end_col,
                    byte_start,
                    byte_end,
                },
                original_text,
                mutated_text,
                operator_name: op.name().to_string(),
                description,
            });
        }
    }
    for child in node.children() {
        walk(child, source, file, index, operators, out);
    }
}

/// Reassign monotonic ids starting from 0, preserving order. Applied once
/// after all files (and the source-pattern pass) have contributed.
pub fn renumber(mutations: &mut [Mutation]) {
    for (i, m) in mutations.iter_mut().enumerate() {
        m.id = i;
    }
}

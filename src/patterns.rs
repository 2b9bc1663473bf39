//! Source-pattern operators.
//!
//! A raw-byte fallback pass for the sites the syntactic pass wraps in node
//! kinds it does not recognize (or refuses to parse at all). Patterns are
//! space-padded so they never match inside identifiers: `a+b` is not a site,
//! `a + b` is. The pass over-generates relative to the syntactic pass; the
//! deduplicator prefers the syntactic producer for overlapping sites.

use std::path::Path;

use crate::mutants::{Mutation, SourceLocation};
use crate::traverse::LineIndex;

/// `(padded pattern, padded replacement, operator family)`, scanned in this
/// order. The family ties each pattern to the syntactic operator covering
/// the same notion, so operator-name selection applies to both passes.
const SOURCE_PATTERNS: &[(&str, &str, &str)] = &[
    (" && ", " || ", "boolean-and-or"),
    (" || ", " && ", "boolean-and-or"),
    (" ∧ ", " ∨ ", "boolean-and-or"),
    (" ∨ ", " ∧ ", "boolean-and-or"),
    (" + ", " - ", "arithmetic-add-sub"),
    (" - ", " + ", "arithmetic-add-sub"),
    (" * ", " / ", "arithmetic-mul-div"),
    (" / ", " * ", "arithmetic-mul-div"),
    (" % ", " * ", "arithmetic-mul-div"),
    (" == ", " != ", "comparison-equality"),
    (" != ", " == ", "comparison-equality"),
    (" = ", " ≠ ", "comparison-equality"),
    (" ≠ ", " = ", "comparison-equality"),
    (" /= ", " == ", "comparison-equality"),
    (" < ", " <= ", "comparison-relational"),
    (" <= ", " < ", "comparison-relational"),
    (" ≤ ", " < ", "comparison-relational"),
    (" > ", " >= ", "comparison-relational"),
    (" >= ", " > ", "comparison-relational"),
    (" ≥ ", " > ", "comparison-relational"),
];

/// Scan the raw source for padded infix patterns. `operator_names` filters
/// by family, empty selecting all. Ids are file-local; the coordinator
/// renumbers after merging with the syntactic pass.
pub fn scan(source: &str, file: &Path, operator_names: &[String]) -> Vec<Mutation> {
    let index = LineIndex::new(source);
    let mut mutations = Vec::new();
    for (pattern, replacement, family) in SOURCE_PATTERNS {
        if !operator_names.is_empty() && !operator_names.iter().any(|n| n == family) {
            continue;
        }
        for (byte_start, matched) in source.match_indices(pattern) {
            let byte_end = byte_start + matched.len();
            let (start_line, start_col) = index.line_col(byte_start);
            let (end_line, end_col) = index.line_col(byte_end);
            mutations.push(Mutation {
                id: mutations.len(),
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
                original_text: matched.to_string(),
                mutated_text: replacement.to_string(),
                operator_name: family.to_string(),
                description: format!(
                    "replace `{}` with `{}`",
                    pattern.trim(),
                    replacement.trim()
                ),
            });
        }
    }
    // Stable site order regardless of which pattern produced the match.
    mutations.sort_by_key(|m| (m.location.byte_start, m.mutated_text.clone()));
    mutations
}

/// Drop pattern-pass mutations already covered by the syntactic pass: an
/// identical `(file, byte_start, byte_end, mutated_text)` is always a
/// duplicate, and an overlapping byte range with the same trimmed
/// replacement token is the same site seen with padding. The syntactic
/// producer wins because it carries node context.
pub fn dedup_against(syntactic: &[Mutation], pattern: Vec<Mutation>) -> Vec<Mutation> {
    pattern
        .into_iter()
        .filter(|p| {
            !syntactic.iter().any(|s| {
                if s.file != p.file {
                    return false;
                }
                let identical = s.location.byte_start == p.location.byte_start
                    && s.location.byte_end == p.location.byte_end
                    && s.mutated_text == p.mutated_text;
                let overlaps = s.location.byte_start < p.location.byte_end
                    && p.location.byte_start < s.location.byte_end;
                identical || (overlaps && s.mutated_text.trim() == p.mutated_text.trim())
            })
        })
        .collect()
}

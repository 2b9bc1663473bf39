//! Built-in syntactic mutation operators.
//!
//! Each operator matches one syntactic shape on the parsed tree and owns its
//! replacement policy. All operators are pure; replacements are synthesized
//! atoms (or reused subtrees for negation removal) that the traversal prints
//! back into the source.

use crate::parser::SyntaxNode;
use crate::registry::{MutationOperator, OperatorRegistry};

/// All built-ins, in the fixed registration order the CLI exposes.
pub fn default_registry() -> OperatorRegistry {
    let mut registry = OperatorRegistry::new();
    registry.register(Box::new(BooleanFlip));
    registry.register(Box::new(BooleanAndOr));
    registry.register(Box::new(BooleanNegation));
    registry.register(Box::new(ArithmeticAddSub));
    registry.register(Box::new(ArithmeticMulDiv));
    registry.register(Box::new(ArithmeticSwap));
    registry.register(Box::new(NumericBoundary));
    registry.register(Box::new(ComparisonEquality));
    registry.register(Box::new(ComparisonRelational));
    registry.register(Box::new(ComparisonBoundary));
    registry.register(Box::new(StringLiteral));
    registry.register(Box::new(CharLiteral));
    registry
}

fn replacement(original: &str, replacement_text: &str) -> (SyntaxNode, String) {
    (
        SyntaxNode::atom(replacement_text),
        format!("replace `{original}` with `{replacement_text}`"),
    )
}

pub struct BooleanFlip;

impl MutationOperator for BooleanFlip {
    fn name(&self) -> &'static str {
        "boolean-flip"
    }

    fn description(&self) -> &'static str {
        "Flips the boolean literals true and false"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        matches!(node.ident_name(), Some("true" | "false"))
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        match node.ident_name() {
            Some("true") => vec![(
                SyntaxNode::ident("false"),
                "replace `true` with `false`".to_string(),
            )],
            Some("false") => vec![(
                SyntaxNode::ident("true"),
                "replace `false` with `true`".to_string(),
            )],
            _ => vec![],
        }
    }
}

pub struct BooleanAndOr;

impl MutationOperator for BooleanAndOr {
    fn name(&self) -> &'static str {
        "boolean-and-or"
    }

    fn description(&self) -> &'static str {
        "Swaps logical and with logical or, preserving ASCII/Unicode notation"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        matches!(node.atom_text(), Some("&&" | "||" | "∧" | "∨"))
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        let swapped = match node.atom_text() {
            Some("&&") => "||",
            Some("||") => "&&",
            Some("∧") => "∨",
            Some("∨") => "∧",
            _ => return vec![],
        };
        vec![replacement(node.atom_text().unwrap_or_default(), swapped)]
    }
}

pub struct BooleanNegation;

impl MutationOperator for BooleanNegation {
    fn name(&self) -> &'static str {
        "boolean-negation"
    }

    fn description(&self) -> &'static str {
        "Removes a negation, leaving the negated expression"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        node.kind() == "neg"
            && node
                .children()
                .first()
                .is_some_and(|operand| !matches!(operand, SyntaxNode::Missing))
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        if !self.can_mutate(node) {
            return vec![];
        }
        let operand = node.children()[0].clone();
        vec![(operand, "remove negation".to_string())]
    }
}

pub struct ArithmeticAddSub;

impl MutationOperator for ArithmeticAddSub {
    fn name(&self) -> &'static str {
        "arithmetic-add-sub"
    }

    fn description(&self) -> &'static str {
        "Swaps binary + with -"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        matches!(node.atom_text(), Some("+" | "-"))
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        match node.atom_text() {
            Some("+") => vec![replacement("+", "-")],
            Some("-") => vec![replacement("-", "+")],
            _ => vec![],
        }
    }
}

pub struct ArithmeticMulDiv;

impl MutationOperator for ArithmeticMulDiv {
    fn name(&self) -> &'static str {
        "arithmetic-mul-div"
    }

    fn description(&self) -> &'static str {
        "Swaps binary * with /; modulus maps to both"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        matches!(node.atom_text(), Some("*" | "/" | "%"))
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        match node.atom_text() {
            Some("*") => vec![replacement("*", "/")],
            Some("/") => vec![replacement("/", "*")],
            Some("%") => vec![replacement("%", "*"), replacement("%", "/")],
            _ => vec![],
        }
    }
}

pub struct ArithmeticSwap;

impl MutationOperator for ArithmeticSwap {
    fn name(&self) -> &'static str {
        "arithmetic-swap"
    }

    fn description(&self) -> &'static str {
        "Swaps arithmetic operators within and across the +/- and */ pairs"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        matches!(node.atom_text(), Some("+" | "-" | "*" | "/" | "%"))
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        let alternatives: &[&str] = match node.atom_text() {
            Some("+") => &["-", "*"],
            Some("-") => &["+", "/"],
            Some("*") => &["/", "+"],
            Some("/") => &["*", "-"],
            Some("%") => &["*", "/"],
            _ => return vec![],
        };
        let original = node.atom_text().unwrap_or_default();
        alternatives
            .iter()
            .map(|alt| replacement(original, alt))
            .collect()
    }
}

pub struct NumericBoundary;

impl MutationOperator for NumericBoundary {
    fn name(&self) -> &'static str {
        "numeric-boundary"
    }

    fn description(&self) -> &'static str {
        "Nudges integer literals to their off-by-one neighbors and zero"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        int_literal(node).is_some()
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        let Some(n) = int_literal(node) else {
            return vec![];
        };
        let mut values = Vec::with_capacity(3);
        if let Some(plus) = n.checked_add(1) {
            values.push(plus);
        }
        values.push(n - 1);
        if n != 0 {
            // The zero probe degenerates to -1 when the decrement already
            // produced the literal 0.
            values.push(if n == 1 { -1 } else { 0 });
        }
        let original = node.atom_text().unwrap_or_default();
        values
            .into_iter()
            .map(|v| replacement(original, &v.to_string()))
            .collect()
    }
}

fn int_literal(node: &SyntaxNode) -> Option<i128> {
    let text = node.atom_text()?;
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

pub struct ComparisonEquality;

impl MutationOperator for ComparisonEquality {
    fn name(&self) -> &'static str {
        "comparison-equality"
    }

    fn description(&self) -> &'static str {
        "Negates equality tests, preserving notation family"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        matches!(node.atom_text(), Some("=" | "==" | "≠" | "!=" | "/="))
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        let swapped = match node.atom_text() {
            Some("=") => "≠",
            Some("≠") => "=",
            Some("==") => "!=",
            Some("!=") => "==",
            Some("/=") => "==",
            _ => return vec![],
        };
        vec![replacement(node.atom_text().unwrap_or_default(), swapped)]
    }
}

pub struct ComparisonRelational;

impl MutationOperator for ComparisonRelational {
    fn name(&self) -> &'static str {
        "comparison-relational"
    }

    fn description(&self) -> &'static str {
        "Flips strictness and reverses direction of relational operators"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        relational_alternatives(node).is_some()
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        let Some((strictness, reversed)) = relational_alternatives(node) else {
            return vec![];
        };
        let original = node.atom_text().unwrap_or_default();
        vec![replacement(original, strictness), replacement(original, reversed)]
    }
}

/// `(strictness flip, direction reverse)` for a relational operator token.
fn relational_alternatives(node: &SyntaxNode) -> Option<(&'static str, &'static str)> {
    match node.atom_text()? {
        "<" => Some(("<=", ">")),
        "<=" => Some(("<", ">=")),
        "≤" => Some(("<", "≥")),
        ">" => Some((">=", "<")),
        ">=" => Some((">", "<=")),
        "≥" => Some((">", "≤")),
        _ => None,
    }
}

pub struct ComparisonBoundary;

impl MutationOperator for ComparisonBoundary {
    fn name(&self) -> &'static str {
        "comparison-boundary"
    }

    fn description(&self) -> &'static str {
        "Collapses relational operators to equality"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        matches!(node.atom_text(), Some("<" | "<=" | "≤" | ">" | ">=" | "≥"))
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        if !self.can_mutate(node) {
            return vec![];
        }
        vec![replacement(node.atom_text().unwrap_or_default(), "=")]
    }
}

pub struct StringLiteral;

impl MutationOperator for StringLiteral {
    fn name(&self) -> &'static str {
        "string-literal"
    }

    fn description(&self) -> &'static str {
        "Empties non-empty string literals and fills empty ones"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        string_inner(node).is_some()
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        let Some(inner) = string_inner(node) else {
            return vec![];
        };
        let original = node.atom_text().unwrap_or_default();
        if inner.is_empty() {
            return vec![replacement(original, "\"non-empty\"")];
        }
        ["\"\"", "\"MUTATED\""]
            .iter()
            .filter(|candidate| **candidate != original)
            .map(|candidate| replacement(original, candidate))
            .collect()
    }
}

fn string_inner(node: &SyntaxNode) -> Option<&str> {
    let text = node.atom_text()?;
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

pub struct CharLiteral;

impl MutationOperator for CharLiteral {
    fn name(&self) -> &'static str {
        "char-literal"
    }

    fn description(&self) -> &'static str {
        "Replaces char literals with a space, a letter, and a digit"
    }

    fn can_mutate(&self, node: &SyntaxNode) -> bool {
        char_inner(node).is_some()
    }

    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)> {
        let Some(inner) = char_inner(node) else {
            return vec![];
        };
        let original = node.atom_text().unwrap_or_default();
        let letter = if inner == "a" { "'z'" } else { "'a'" };
        let alphabetic = {
            let mut chars = inner.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
        };

        let mut candidates = vec!["' '", letter];
        if alphabetic {
            candidates.push("'0'");
        }
        candidates
            .into_iter()
            .filter(|candidate| *candidate != original)
            .map(|candidate| replacement(original, candidate))
            .collect()
    }
}

fn char_inner(node: &SyntaxNode) -> Option<&str> {
    let text = node.atom_text()?;
    if text.len() >= 3 && text.starts_with('\'') && text.ends_with('\'') {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

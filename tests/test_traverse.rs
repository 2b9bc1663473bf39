use std::path::Path;

use leanmutator::mutants::Mutation;
use leanmutator::operators::default_registry;
use leanmutator::parser;
use leanmutator::registry::{MutationOperator, OperatorRegistry};
use leanmutator::traverse::{self, LineIndex};

fn discover_with(source: &str, names: &[&str]) -> Vec<Mutation> {
    let registry = default_registry();
    let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    let selected = registry.get_by_names(&names);
    let parsed = parser::parse(source).unwrap();
    traverse::discover(&parsed.root, source, Path::new("test.lean"), &selected)
}

fn all_operators(registry: &OperatorRegistry) -> Vec<&dyn MutationOperator> {
    registry.get_by_names(&[])
}

// --- line index ---

#[test]
fn line_index_maps_bytes_to_lines_and_cols() {
    let index = LineIndex::new("ab\ncde\n\nf");
    assert_eq!(index.line_col(0), (1, 1));
    assert_eq!(index.line_col(1), (1, 2));
    assert_eq!(index.line_col(3), (2, 1));
    assert_eq!(index.line_col(5), (2, 3));
    assert_eq!(index.line_col(7), (3, 1));
    assert_eq!(index.line_col(8), (4, 1));
}

// --- relational scenario ---

#[test]
fn relational_only_yields_two_mutations() {
    let source = "def p (n : Nat) : Bool := n > 0";
    let mutations = discover_with(source, &["comparison-relational"]);
    assert_eq!(mutations.len(), 2);
    assert_eq!(mutations[0].original_text, ">");
    assert_eq!(mutations[0].mutated_text, ">=");
    assert_eq!(mutations[1].mutated_text, "<");
    assert_eq!(mutations[0].location.byte_start, 29);
    assert_eq!(mutations[0].location.byte_end, 30);
    assert_eq!(mutations[0].location.start_line, 1);
    assert_eq!(mutations[0].location.start_col, 30);
}

// --- numeric boundary scenario ---

#[test]
fn numeric_boundary_on_one_yields_three_mutations() {
    let source = "def x : Nat := 1";
    let mutations = discover_with(source, &["numeric-boundary"]);
    let replacements: Vec<&str> = mutations.iter().map(|m| m.mutated_text.as_str()).collect();
    assert_eq!(replacements, vec!["2", "0", "-1"]);
    for m in &mutations {
        assert_eq!(m.original_text, "1");
        assert_eq!(&source[m.location.byte_start..m.location.byte_end], "1");
    }
}

// --- and/or scenario ---

#[test]
fn and_or_yields_one_mutation_on_the_operator_token() {
    let source = "def f (a b : Bool) := a && b";
    let mutations = discover_with(source, &["boolean-and-or"]);
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].original_text, "&&");
    assert_eq!(mutations[0].mutated_text, "||");
    assert_eq!(
        &source[mutations[0].location.byte_start..mutations[0].location.byte_end],
        "&&"
    );
}

// --- string scenario ---

#[test]
fn string_literal_yields_empty_and_mutated() {
    let source = "def g : String := \"hi\"";
    let mutations = discover_with(source, &["string-literal"]);
    assert_eq!(mutations.len(), 2);
    assert_eq!(mutations[0].original_text, "\"hi\"");
    assert_eq!(mutations[0].mutated_text, "\"\"");
    assert_eq!(mutations[1].mutated_text, "\"MUTATED\"");
}

// --- negation removal byte ranges ---

#[test]
fn negation_removal_replaces_whole_negation() {
    let source = "def f (b : Bool) := !b";
    let mutations = discover_with(source, &["boolean-negation"]);
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].original_text, "!b");
    assert_eq!(mutations[0].mutated_text, "b");
}

#[test]
fn negation_removal_of_group_keeps_group_text() {
    let source = "def f (a b : Bool) := !(a && b)";
    let mutations = discover_with(source, &["boolean-negation"]);
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].original_text, "!(a && b)");
    assert_eq!(mutations[0].mutated_text, "(a && b)");
}

// --- id assignment and determinism ---

#[test]
fn ids_are_monotonic_in_traversal_order() {
    let source = "def f (a b : Nat) : Bool := a + b > 0 && a < b";
    let registry = default_registry();
    let parsed = parser::parse(source).unwrap();
    let mutations = traverse::discover(
        &parsed.root,
        source,
        Path::new("test.lean"),
        &all_operators(&registry),
    );
    assert!(!mutations.is_empty());
    for (i, m) in mutations.iter().enumerate() {
        assert_eq!(m.id, i);
    }
    // Traversal order follows byte order for sibling sites.
    for pair in mutations.windows(2) {
        assert!(pair[0].location.byte_start <= pair[1].location.byte_start);
    }
}

#[test]
fn generation_is_deterministic() {
    let source = "def f (a b : Nat) : Bool := a + b > 0 && a < b\n#guard f 1 2 = true";
    let registry = default_registry();
    let parsed = parser::parse(source).unwrap();
    let first = traverse::discover(
        &parsed.root,
        source,
        Path::new("test.lean"),
        &all_operators(&registry),
    );
    let second = traverse::discover(
        &parsed.root,
        source,
        Path::new("test.lean"),
        &all_operators(&registry),
    );
    assert_eq!(first, second);
}

// --- original text precondition ---

#[test]
fn original_text_always_matches_source_slice() {
    let source = "def f (a b : Nat) : Bool := a * 2 >= b - 1 ∧ a ≤ b";
    let registry = default_registry();
    let parsed = parser::parse(source).unwrap();
    let mutations = traverse::discover(
        &parsed.root,
        source,
        Path::new("test.lean"),
        &all_operators(&registry),
    );
    assert!(!mutations.is_empty());
    for m in &mutations {
        assert_eq!(
            &source[m.location.byte_start..m.location.byte_end],
            m.original_text,
            "mutation {} has a stale byte range",
            m.id
        );
        assert_ne!(m.mutated_text, m.original_text);
    }
}

// --- renumbering ---

#[test]
fn renumber_assigns_global_ids() {
    let source_a = "def a := 1";
    let source_b = "def b := 2";
    let registry = default_registry();
    let ops = all_operators(&registry);
    let parsed_a = parser::parse(source_a).unwrap();
    let parsed_b = parser::parse(source_b).unwrap();
    let mut all = traverse::discover(&parsed_a.root, source_a, Path::new("a.lean"), &ops);
    all.extend(traverse::discover(
        &parsed_b.root,
        source_b,
        Path::new("b.lean"),
        &ops,
    ));
    traverse::renumber(&mut all);
    for (i, m) in all.iter().enumerate() {
        assert_eq!(m.id, i);
    }
}

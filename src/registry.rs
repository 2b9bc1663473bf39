//! Ordered registry of mutation operators.

use crate::parser::SyntaxNode;

/// A mutation operator: a site-matching predicate plus a replacement
/// generator. Operators are pure and deterministic, do no I/O, and never
/// produce a replacement that prints equal to the matched node.
pub trait MutationOperator {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Pure predicate: does this operator apply at `node`?
    fn can_mutate(&self, node: &SyntaxNode) -> bool;
    /// Replacement nodes with human descriptions, in a stable order.
    fn mutate(&self, node: &SyntaxNode) -> Vec<(SyntaxNode, String)>;
}

/// Operators in registration order. Two operators with the same name shadow
/// per last-registered-wins.
#[derive(Default)]
pub struct OperatorRegistry {
    operators: Vec<Box<dyn MutationOperator>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operator: Box<dyn MutationOperator>) {
        self.operators.push(operator);
    }

    pub fn len(&self) -> usize {
        self.all().count()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// All visible operators in registration order; a shadowed registration
    /// (same name registered again later) is skipped.
    pub fn all(&self) -> impl Iterator<Item = &dyn MutationOperator> + '_ {
        self.operators.iter().enumerate().filter_map(|(i, op)| {
            let shadowed = self.operators[i + 1..]
                .iter()
                .any(|later| later.name() == op.name());
            if shadowed {
                None
            } else {
                Some(op.as_ref())
            }
        })
    }

    /// Lookup by name; the last registration under that name wins.
    pub fn get(&self, name: &str) -> Option<&dyn MutationOperator> {
        self.operators
            .iter()
            .rev()
            .find(|op| op.name() == name)
            .map(|op| op.as_ref())
    }

    /// Select operators by name, keeping registration order. An empty list
    /// selects everything; unknown names are silently dropped.
    pub fn get_by_names(&self, names: &[String]) -> Vec<&dyn MutationOperator> {
        if names.is_empty() {
            return self.all().collect();
        }
        self.all()
            .filter(|op| names.iter().any(|n| n == op.name()))
            .collect()
    }
}

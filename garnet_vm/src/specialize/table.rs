//! Declarative specialization tables.
//!
//! A table is the priority-ordered list of `(guard, implementation)` rules a
//! node may install from, plus the generic fallback. Tables are validated
//! against the full shape domain when they are built, so a table whose guards
//! overlap never reaches a node.

use super::shape::Shape;
use garnet_core::ConfigurationError;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Guard over a shape. Must be O(1) and side-effect free.
pub type Guard<S> = fn(S) -> bool;

/// One declared specialization.
#[derive(Debug, Clone, Copy)]
pub struct Rule<S, I> {
    /// Name used in logs and configuration errors.
    pub name: &'static str,
    pub guard: Guard<S>,
    pub implementation: I,
}

impl<S, I> Rule<S, I> {
    #[inline]
    pub const fn new(name: &'static str, guard: Guard<S>, implementation: I) -> Self {
        Self {
            name,
            guard,
            implementation,
        }
    }
}

/// Validated rule table for one kind of node.
#[derive(Debug)]
pub struct SpecializationTable<S: Shape, I> {
    rules: SmallVec<[Rule<S, I>; 8]>,
    /// Rule index accepting each shape, precomputed at validation.
    by_shape: FxHashMap<S, usize>,
    fallback: I,
}

impl<S: Shape, I: Copy> SpecializationTable<S, I> {
    /// Build a table, rejecting empty tables, duplicate rule names and any
    /// shape accepted by more than one rule.
    ///
    /// Shapes accepted by no rule are legal; nodes route them to `fallback`.
    pub fn new(
        rules: impl IntoIterator<Item = Rule<S, I>>,
        fallback: I,
    ) -> Result<Self, ConfigurationError> {
        let rules: SmallVec<[Rule<S, I>; 8]> = rules.into_iter().collect();
        if rules.is_empty() {
            return Err(ConfigurationError::EmptyTable);
        }

        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|earlier| earlier.name == rule.name) {
                return Err(ConfigurationError::DuplicateRule(rule.name));
            }
        }

        let mut by_shape = FxHashMap::default();
        for &shape in S::domain() {
            let mut accepting = rules.iter().enumerate().filter(|(_, r)| (r.guard)(shape));
            let Some((index, first)) = accepting.next() else {
                continue;
            };
            if let Some((_, second)) = accepting.next() {
                return Err(ConfigurationError::OverlappingGuards {
                    shape: shape.to_string(),
                    first: first.name,
                    second: second.name,
                });
            }
            by_shape.insert(shape, index);
        }

        Ok(Self {
            rules,
            by_shape,
            fallback,
        })
    }

    /// The rule accepting `shape`, with its index, if any.
    #[inline]
    pub fn rule_for(&self, shape: S) -> Option<(usize, &Rule<S, I>)> {
        let index = *self.by_shape.get(&shape)?;
        Some((index, &self.rules[index]))
    }

    #[inline]
    pub fn rules(&self) -> &[Rule<S, I>] {
        &self.rules
    }

    #[inline]
    pub fn fallback(&self) -> I {
        self.fallback
    }

    /// Number of domain shapes some rule accepts.
    pub fn covered_shapes(&self) -> usize {
        self.by_shape.len()
    }
}

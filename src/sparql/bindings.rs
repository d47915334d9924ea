//! Solution bindings flowing through the operator pipeline
//!
//! A [`Bindings`] maps variables to terms in insertion order. Grouped solutions
//! emitted by GROUP BY also carry an [`AggregationGroup`] in their metadata,
//! which only aggregate expressions read.

use crate::rdf::{Term, Variable};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Per-variable value lists collected for one group
#[derive(Debug, Clone, Default)]
pub struct AggregationGroup {
    values: IndexMap<Variable, Vec<Term>>,
    rows: usize,
}

impl AggregationGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every bound value of `row` to its variable's list
    pub fn push_row(&mut self, row: &Bindings) {
        for (var, term) in row.iter() {
            self.values
                .entry(var.clone())
                .or_default()
                .push(term.clone());
        }
        self.rows += 1;
    }

    /// Values collected for a variable, in input order
    pub fn get(&self, var: &Variable) -> Option<&[Term]> {
        self.values.get(var).map(Vec::as_slice)
    }

    /// Variables observed in the group
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.values.keys()
    }

    /// Number of solutions folded into the group
    pub fn row_count(&self) -> usize {
        self.rows
    }
}

/// Out-of-band data attached to a solution
#[derive(Debug, Clone, Default)]
pub enum BindingsMetadata {
    #[default]
    Plain,
    Grouped(Arc<AggregationGroup>),
}

/// A single solution: ordered variable → term mapping
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: IndexMap<Variable, Term>,
    metadata: BindingsMetadata,
}

impl Bindings {
    /// Create empty bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable in place, replacing any previous value
    pub fn bind(&mut self, var: Variable, term: Term) {
        self.values.insert(var, term);
    }

    /// Copy of these bindings with one more variable bound
    pub fn extend(&self, var: Variable, term: Term) -> Bindings {
        let mut extended = self.clone();
        extended.bind(var, term);
        extended
    }

    /// Get a bound term
    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.values.get(var)
    }

    /// Get a bound term by variable name (without `?`)
    pub fn get_by_name(&self, name: &str) -> Option<&Term> {
        self.values
            .iter()
            .find(|(var, _)| var.name() == name)
            .map(|(_, term)| term)
    }

    /// Check if a variable is bound
    pub fn has(&self, var: &Variable) -> bool {
        self.values.contains_key(var)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.values.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Term> {
        self.values.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when every variable bound on both sides has equal terms
    pub fn is_compatible(&self, other: &Bindings) -> bool {
        self.values
            .iter()
            .all(|(var, term)| other.get(var).map_or(true, |o| o == term))
    }

    /// All bindings of both sides; `other` wins on conflicts
    pub fn union(&self, other: &Bindings) -> Bindings {
        let mut merged = self.clone();
        for (var, term) in other.iter() {
            merged.bind(var.clone(), term.clone());
        }
        merged
    }

    /// Bindings present on both sides with equal terms
    pub fn intersection(&self, other: &Bindings) -> Bindings {
        self.filter(|var, term| other.get(var).is_some_and(|o| o == term))
    }

    /// Bindings whose variable is not bound in `other`
    pub fn difference(&self, other: &Bindings) -> Bindings {
        self.filter(|var, _| !other.has(var))
    }

    /// Keep bindings matching the predicate
    pub fn filter<F>(&self, predicate: F) -> Bindings
    where
        F: Fn(&Variable, &Term) -> bool,
    {
        Bindings {
            values: self
                .values
                .iter()
                .filter(|(var, term)| predicate(var, term))
                .map(|(var, term)| (var.clone(), term.clone()))
                .collect(),
            metadata: self.metadata.clone(),
        }
    }

    /// Replace every bound term
    pub fn map<F>(&self, f: F) -> Bindings
    where
        F: Fn(&Variable, &Term) -> Term,
    {
        Bindings {
            values: self
                .values
                .iter()
                .map(|(var, term)| (var.clone(), f(var, term)))
                .collect(),
            metadata: self.metadata.clone(),
        }
    }

    /// Fold over bindings in insertion order
    pub fn reduce<T, F>(&self, init: T, mut f: F) -> T
    where
        F: FnMut(T, &Variable, &Term) -> T,
    {
        self.values
            .iter()
            .fold(init, |acc, (var, term)| f(acc, var, term))
    }

    /// Clone with only the given variables, dropping metadata
    pub fn project(&self, variables: &[Variable]) -> Bindings {
        variables
            .iter()
            .filter_map(|var| self.get(var).map(|term| (var.clone(), term.clone())))
            .collect()
    }

    /// Group payload, when these bindings came out of GROUP BY
    pub fn group(&self) -> Option<&AggregationGroup> {
        match &self.metadata {
            BindingsMetadata::Grouped(group) => Some(group),
            BindingsMetadata::Plain => None,
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self.metadata, BindingsMetadata::Grouped(_))
    }

    /// Attach a group payload
    pub fn with_group(mut self, group: Arc<AggregationGroup>) -> Bindings {
        self.metadata = BindingsMetadata::Grouped(group);
        self
    }

    pub fn metadata(&self) -> &BindingsMetadata {
        &self.metadata
    }
}

/// Equality over the variable → term mapping; metadata is not compared
impl PartialEq for Bindings {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.variables().all(|var| other.has(var))
            && self.is_compatible(other)
    }
}

impl FromIterator<(Variable, Term)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (Variable, Term)>>(iter: I) -> Self {
        Bindings {
            values: iter.into_iter().collect(),
            metadata: BindingsMetadata::Plain,
        }
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, term)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", var, term)?;
        }
        write!(f, "}}")
    }
}

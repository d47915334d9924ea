//! SPARQL variables and the interning registry
//!
//! Every variable handed out by a [`VariableRegistry`] for a given name shares
//! one allocation, so two lookups of `?x` are reference-equal and binding maps
//! can key on them cheaply. The registry only grows.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A SPARQL query variable, stored without its `?` sigil
#[derive(Clone)]
pub struct Variable(Arc<str>);

impl Variable {
    fn new(name: Arc<str>) -> Self {
        Self(name)
    }

    /// Get the variable name (without `?`)
    pub fn name(&self) -> &str {
        &self.0
    }

    /// True when both handles point at the same interned entry
    pub fn ptr_eq(&self, other: &Variable) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Blank node labels (`_:b0`) are carried as variables
    pub fn is_blank_label(&self) -> bool {
        self.0.starts_with("_:")
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blank_label() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "?{}", self.0)
        }
    }
}

/// Strip a leading `?` or `$` sigil
pub fn variable_name(raw: &str) -> &str {
    raw.strip_prefix('?')
        .or_else(|| raw.strip_prefix('$'))
        .unwrap_or(raw)
}

/// Append-only table of canonical variables, keyed by name
///
/// Lookups take a shared lock; only the first registration of a name takes
/// the write lock, and it re-checks the table before inserting.
#[derive(Default)]
pub struct VariableRegistry {
    variables: RwLock<FxHashMap<Arc<str>, Variable>>,
}

impl VariableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the canonical variable for `name`, registering it on first sight.
    /// A leading `?`/`$` is ignored.
    pub fn get_or_insert(&self, name: &str) -> Variable {
        let name = variable_name(name);
        if let Some(var) = self.variables.read().get(name) {
            return var.clone();
        }

        let mut variables = self.variables.write();
        if let Some(var) = variables.get(name) {
            return var.clone();
        }
        let key: Arc<str> = Arc::from(name);
        let var = Variable::new(key.clone());
        variables.insert(key, var.clone());
        var
    }

    /// Look up a variable without registering it
    pub fn get(&self, name: &str) -> Option<Variable> {
        self.variables.read().get(variable_name(name)).cloned()
    }

    /// Number of registered variables
    pub fn len(&self) -> usize {
        self.variables.read().len()
    }

    /// Check if no variable was registered yet
    pub fn is_empty(&self) -> bool {
        self.variables.read().is_empty()
    }
}

impl fmt::Debug for VariableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableRegistry")
            .field("len", &self.len())
            .finish()
    }
}

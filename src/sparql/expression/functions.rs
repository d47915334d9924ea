//! Caller-supplied extension functions
//!
//! Function-call nodes resolve their name here at compile time. A function
//! receives its evaluated arguments (`None` for unbound ones) and may fail
//! with any error; the compiled call site turns a failure into an unbound
//! result.

use crate::rdf::Term;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Extension function over evaluated arguments
pub type CustomFunction = Arc<dyn Fn(&[Option<Term>]) -> anyhow::Result<Term> + Send + Sync>;

/// Name → function registry, keyed by function IRI
#[derive(Clone, Default)]
pub struct CustomFunctions {
    functions: HashMap<String, CustomFunction>,
}

impl CustomFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any previous one with the same name
    pub fn register<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[Option<Term>]) -> anyhow::Result<Term> + Send + Sync + 'static,
    {
        self.functions
            .insert(normalize(name).to_string(), Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<CustomFunction> {
        self.functions.get(normalize(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(normalize(name))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for CustomFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("CustomFunctions")
            .field("functions", &names)
            .finish()
    }
}

/// `<iri>` and `iri` name the same function
fn normalize(name: &str) -> &str {
    name.strip_prefix('<')
        .and_then(|n| n.strip_suffix('>'))
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Literal;

    #[test]
    fn test_register_and_lookup() {
        let mut functions = CustomFunctions::new();
        assert!(functions.is_empty());

        functions.register("http://example.org/answer", |_args| Ok(Literal::integer(42).into()));
        assert_eq!(functions.len(), 1);
        assert!(functions.contains("<http://example.org/answer>"));

        let answer = functions.get("http://example.org/answer").unwrap();
        assert_eq!(answer(&[]).unwrap(), Term::from(Literal::integer(42)));
        assert!(functions.get("http://example.org/missing").is_none());
    }
}

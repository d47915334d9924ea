//! RDF term definitions
//!
//! IRIs wrap the oxrdf `NamedNode` so they are validated on construction.
//! Terms are immutable once built and compare by kind-aware equality.

use super::literal::Literal;
use super::variable::Variable;
use chrono::{DateTime, FixedOffset};
use oxrdf::NamedNode as OxNamedNode;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// RDF errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RdfError {
    /// Invalid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    /// Invalid literal
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),

    /// Invalid language tag
    #[error("Invalid language tag: {0}")]
    InvalidLanguageTag(String),
}

pub type RdfResult<T> = Result<T, RdfError>;

/// Named node (IRI)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedNode(OxNamedNode);

impl NamedNode {
    /// Create a new named node from an IRI string
    pub fn new(iri: &str) -> RdfResult<Self> {
        OxNamedNode::new(iri)
            .map(Self)
            .map_err(|e| RdfError::InvalidIri(format!("{}: {}", iri, e)))
    }

    /// Wrap an IRI known to be valid, such as a vocabulary constant
    pub(crate) fn new_unchecked(iri: &str) -> Self {
        Self(OxNamedNode::new_unchecked(iri))
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the inner oxrdf NamedNode
    pub fn inner(&self) -> &OxNamedNode {
        &self.0
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.as_str())
    }
}

impl From<OxNamedNode> for NamedNode {
    fn from(node: OxNamedNode) -> Self {
        Self(node)
    }
}

impl From<NamedNode> for OxNamedNode {
    fn from(node: NamedNode) -> Self {
        node.0
    }
}

/// Host-language view of a term, used by custom functions and result output
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Iri(String),
    Variable(String),
    Number(f64),
    String(String),
    Boolean(bool),
    Date(DateTime<FixedOffset>),
    Bytes(Vec<u8>),
}

/// RDF term: IRI, variable or literal
#[derive(Debug, Clone)]
pub enum Term {
    /// Named node (IRI)
    Iri(NamedNode),
    /// Query variable (blank node labels are carried here too)
    Variable(Variable),
    /// Literal value
    Literal(Literal),
}

impl Term {
    /// Check if this is an IRI
    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// Check if this is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Check if this is a numeric literal
    pub fn is_numeric(&self) -> bool {
        matches!(self, Term::Literal(lit) if lit.is_numeric())
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_iri(&self) -> Option<&NamedNode> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(var) => Some(var),
            _ => None,
        }
    }

    /// Lexical form, IRI string or variable name
    pub fn string_value(&self) -> &str {
        match self {
            Term::Iri(iri) => iri.as_str(),
            Term::Variable(var) => var.name(),
            Term::Literal(lit) => lit.value(),
        }
    }

    /// Kind-aware equality; terms of different kinds compare by RDF text
    pub fn equals(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Iri(a), Term::Iri(b)) => a == b,
            (Term::Variable(a), Term::Variable(b)) => a == b,
            (Term::Literal(a), Term::Literal(b)) => a.equals(b),
            _ => self.to_rdf() == other.to_rdf(),
        }
    }

    /// Kind-aware ordering; terms of different kinds compare by RDF text
    pub fn compare_to(&self, other: &Term) -> Ordering {
        match (self, other) {
            (Term::Literal(a), Term::Literal(b)) => a.compare(b),
            _ => self.to_rdf().cmp(&other.to_rdf()),
        }
    }

    /// RDF text serialization: `<iri>`, `?var`, or a quoted literal
    pub fn to_rdf(&self) -> String {
        match self {
            Term::Iri(iri) => iri.to_string(),
            Term::Variable(var) => var.to_string(),
            Term::Literal(lit) => lit.to_rdf(),
        }
    }

    /// Coerced host value
    pub fn to_native(&self) -> NativeValue {
        match self {
            Term::Iri(iri) => NativeValue::Iri(iri.as_str().to_string()),
            Term::Variable(var) => NativeValue::Variable(var.name().to_string()),
            Term::Literal(lit) => lit.to_native(),
        }
    }

    /// SPARQL effective boolean value; IRIs and variables have none
    pub fn effective_boolean_value(&self) -> Option<bool> {
        match self {
            Term::Literal(lit) => lit.effective_boolean_value(),
            _ => None,
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare_to(other))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rdf())
    }
}

impl From<NamedNode> for Term {
    fn from(node: NamedNode) -> Self {
        Term::Iri(node)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

impl From<Variable> for Term {
    fn from(var: Variable) -> Self {
        Term::Variable(var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::variable::VariableRegistry;

    #[test]
    fn test_named_node() {
        let node = NamedNode::new("http://example.org/alice").unwrap();
        assert_eq!(node.as_str(), "http://example.org/alice");
        assert_eq!(node.to_string(), "<http://example.org/alice>");
        assert!(NamedNode::new("not an iri").is_err());
    }

    #[test]
    fn test_term_kinds_and_rdf_text() {
        let registry = VariableRegistry::new();
        let iri: Term = NamedNode::new("http://example.org/a").unwrap().into();
        let var: Term = registry.get_or_insert("x").into();
        let lit: Term = Literal::new_language_tagged_literal("hello", "en").unwrap().into();

        assert!(iri.is_iri() && !iri.is_literal());
        assert!(var.is_variable());
        assert!(lit.is_literal() && !lit.is_numeric());

        assert_eq!(iri.to_rdf(), "<http://example.org/a>");
        assert_eq!(var.to_rdf(), "?x");
        assert_eq!(lit.to_rdf(), "\"hello\"@en");
        assert_eq!(lit.string_value(), "hello");
    }

    #[test]
    fn test_term_equality_and_order() {
        let one: Term = Literal::integer(1).into();
        let two: Term = Literal::integer(2).into();
        let iri: Term = NamedNode::new("http://example.org/1").unwrap().into();

        assert!(one < two);
        assert_eq!(one, Term::from(Literal::decimal(1.0)));
        assert_ne!(one, iri);
        assert_eq!(iri.compare_to(&one), iri.to_rdf().cmp(&one.to_rdf()));
    }

    #[test]
    fn test_native_values() {
        assert_eq!(Term::from(Literal::integer(3)).to_native(), NativeValue::Number(3.0));
        assert_eq!(Term::from(Literal::boolean(true)).to_native(), NativeValue::Boolean(true));
        assert_eq!(
            Term::from(NamedNode::new("http://example.org/").unwrap()).to_native(),
            NativeValue::Iri("http://example.org/".to_string())
        );
    }

    #[test]
    fn test_effective_boolean_value() {
        assert_eq!(Term::from(Literal::integer(0)).effective_boolean_value(), Some(false));
        assert_eq!(Term::from(Literal::new_simple_literal("x")).effective_boolean_value(), Some(true));
        assert_eq!(Term::from(Literal::new_simple_literal("")).effective_boolean_value(), Some(false));
        assert_eq!(
            Term::from(NamedNode::new("http://example.org/").unwrap()).effective_boolean_value(),
            None
        );
    }
}

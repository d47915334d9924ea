//! RDF term model for SPARQL expression evaluation
//!
//! This module implements the values expressions operate on:
//! - IRIs, variables and literals ([`Term`])
//! - Datatype-dispatched literal kinds with cross-kind arithmetic ([`Literal`])
//! - Interned variables ([`VariableRegistry`])
//! - Prefix handling and the compact term text syntax ([`TermParser`])
//!
//! # Example
//!
//! ```rust
//! use samyama_sparql::rdf::{Literal, NamespaceManager, TermParser, VariableRegistry};
//!
//! let variables = VariableRegistry::new();
//! let namespaces = NamespaceManager::new();
//! let parser = TermParser::new(&variables, &namespaces);
//!
//! let term = parser.parse("\"41\"^^xsd:integer").unwrap();
//! let sum = term.as_literal().unwrap().add(&Literal::integer(1)).unwrap();
//! assert_eq!(sum.value(), "42");
//! ```

mod literal;
mod namespace;
mod parser;
mod types;
mod variable;

pub use types::{NamedNode, NativeValue, RdfError, RdfResult, Term};

pub use literal::{
    ArithmeticOp, BinaryEncoding, Literal, LiteralKind, LiteralOperationError, NumericType,
};

pub use variable::{variable_name, Variable, VariableRegistry};

pub use namespace::{rdf, xsd, Namespace, NamespaceManager, PrefixError, PrefixResult};

pub use parser::{ParseError, ParseResult, TermParser};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rdf_module_exports() {
        let _registry = VariableRegistry::new();
        let _ns_mgr = NamespaceManager::new();
        let _lit: Term = Literal::new_simple_literal("x").into();
    }
}

//! Samyama SPARQL expression core
//!
//! Evaluation machinery for SPARQL 1.1 expressions over solution mappings.
//!
//! # Architecture
//!
//! - [`rdf`]: terms, literals with datatype-aware arithmetic, interned variables,
//!   prefixes and the compact term syntax
//! - [`sparql`]: expression trees, the expression compiler with its operation
//!   and aggregation tables, bindings, and the GROUP BY pipeline
//! - [`config`]: YAML engine configuration
//!
//! ## Example Usage
//!
//! ```rust
//! use samyama_sparql::{Expression, SparqlEngine};
//!
//! let engine = SparqlEngine::new();
//! let row = engine.bindings(&[("name", "\"Alice\"@en")]).unwrap();
//!
//! let expr = Expression::operation(
//!     "ucase",
//!     vec![Expression::term("?name")],
//! );
//! let upper = engine.compile(&expr).unwrap().evaluate_term(&row).unwrap().unwrap();
//! assert_eq!(upper.to_rdf(), "\"ALICE\"@en");
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod rdf;
pub mod sparql;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigResult, EngineConfig};

pub use rdf::{
    Literal, LiteralKind, LiteralOperationError, NamedNode, NamespaceManager, NumericType, Term,
    TermParser, Variable, VariableRegistry,
};

pub use sparql::{
    Bindings, CompileError, CompiledExpression, EvaluationError, ExecutionError, ExprValue,
    Expression, ExpressionNode, SparqlEngine, SparqlError, SparqlResult,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "1.0.0");
    }
}

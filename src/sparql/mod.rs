//! SPARQL expression evaluation
//!
//! This module compiles SPARQL expression trees and runs them over solution
//! streams.
//!
//! - [`algebra`]: the JSON-shaped expression tree
//! - [`bindings`]: solutions and group payloads
//! - [`expression`]: compiler, operation table, aggregation table
//! - [`executor`]: Volcano-style operators, GROUP BY included
//!
//! # Example
//!
//! ```rust
//! use samyama_sparql::sparql::{algebra::Expression, SparqlEngine};
//!
//! let engine = SparqlEngine::new();
//! let rows = vec![
//!     engine.bindings(&[("k", "\"a\""), ("v", "10")]).unwrap(),
//!     engine.bindings(&[("k", "\"a\""), ("v", "20")]).unwrap(),
//!     engine.bindings(&[("k", "\"b\""), ("v", "5")]).unwrap(),
//! ];
//!
//! let groups = engine.group_by(rows, &["k"]).unwrap();
//! let sum = engine
//!     .compile(&Expression::aggregate("sum", Expression::term("?v")))
//!     .unwrap();
//! let totals: Vec<String> = groups
//!     .iter()
//!     .map(|g| sum.evaluate_term(g).unwrap().unwrap().string_value().to_string())
//!     .collect();
//! assert_eq!(totals, vec!["30", "5"]);
//! ```

pub mod algebra;
pub mod bindings;
pub mod executor;
pub mod expression;

pub use algebra::{Expression, ExpressionNode};
pub use bindings::{AggregationGroup, Bindings, BindingsMetadata};
pub use executor::{
    ExecutionError, ExecutionResult, ExtendOperator, FilterOperator, GroupByOperator,
    OperatorBox, PhysicalOperator, ValuesOperator,
};
pub use expression::{
    CompileError, CompiledExpression, CustomFunctions, EvaluationError, ExprValue,
    ExpressionCompiler,
};

use crate::config::{ConfigError, EngineConfig};
use crate::rdf::{NamespaceManager, ParseError, Term, TermParser, Variable, VariableRegistry};
use thiserror::Error;
use tracing::info;

/// SPARQL errors
#[derive(Error, Debug)]
pub enum SparqlError {
    /// Term syntax error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Expression compilation error
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// Expression evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Pipeline error
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed JSON expression tree
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SparqlResult<T> = Result<T, SparqlError>;

/// Expression engine: owns the variable registry, prefixes and custom functions
/// every compiled expression is resolved against
pub struct SparqlEngine {
    config: EngineConfig,
    variables: VariableRegistry,
    namespaces: NamespaceManager,
    functions: CustomFunctions,
}

impl SparqlEngine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine, registering the configured prefixes
    pub fn with_config(config: EngineConfig) -> Self {
        let mut namespaces = NamespaceManager::new();
        for (prefix, iri) in &config.prefixes {
            namespaces.add_prefix(prefix.as_str(), iri.as_str());
        }
        info!(
            prefixes = config.prefixes.len(),
            strict = config.strict_errors,
            "Initialized SPARQL expression engine"
        );
        Self {
            config,
            variables: VariableRegistry::new(),
            namespaces,
            functions: CustomFunctions::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    pub fn namespaces(&self) -> &NamespaceManager {
        &self.namespaces
    }

    /// Interned variable for a name, with or without its `?` sigil
    pub fn variable(&self, name: &str) -> Variable {
        self.variables.get_or_insert(name)
    }

    pub fn add_prefix(&mut self, prefix: &str, iri: &str) {
        self.namespaces.add_prefix(prefix, iri);
    }

    /// Register an extension function for function-call nodes
    pub fn register_function<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[Option<Term>]) -> anyhow::Result<Term> + Send + Sync + 'static,
    {
        self.functions.register(name, function);
    }

    /// Parse one term in the compact text syntax
    pub fn parse_term(&self, text: &str) -> SparqlResult<Term> {
        Ok(TermParser::new(&self.variables, &self.namespaces).parse(text)?)
    }

    /// Build a solution from `(variable, term text)` pairs
    pub fn bindings(&self, pairs: &[(&str, &str)]) -> SparqlResult<Bindings> {
        pairs
            .iter()
            .map(|(name, text)| Ok((self.variable(name), self.parse_term(text)?)))
            .collect()
    }

    pub fn compiler(&self) -> ExpressionCompiler<'_> {
        ExpressionCompiler::new(&self.variables, &self.namespaces, &self.functions)
            .with_separator(self.config.group_concat_separator.as_str())
    }

    /// Compile an expression tree
    pub fn compile(&self, expression: &Expression) -> SparqlResult<CompiledExpression> {
        Ok(self.compiler().compile(expression)?)
    }

    /// Compile an expression tree given as JSON
    pub fn compile_json(&self, json: &str) -> SparqlResult<CompiledExpression> {
        self.compile(&Expression::from_json(json)?)
    }

    /// Group solutions by the named variables
    pub fn group_by(&self, rows: Vec<Bindings>, variables: &[&str]) -> SparqlResult<Vec<Bindings>> {
        let variables = variables.iter().map(|name| self.variable(name)).collect();
        let mut op = GroupByOperator::new(ValuesOperator::from_rows(rows), variables);
        self.collect(&mut op)
    }

    /// Keep the solutions the expression accepts
    pub fn filter(&self, rows: Vec<Bindings>, predicate: &Expression) -> SparqlResult<Vec<Bindings>> {
        let predicate = self.compile(predicate)?;
        let mut op = FilterOperator::new(ValuesOperator::from_rows(rows), predicate)
            .strict(self.config.strict_errors);
        self.collect(&mut op)
    }

    /// Bind the expression's value to `variable` in every solution
    pub fn extend(
        &self,
        rows: Vec<Bindings>,
        variable: &str,
        expression: &Expression,
    ) -> SparqlResult<Vec<Bindings>> {
        let expression = self.compile(expression)?;
        let mut op = ExtendOperator::new(ValuesOperator::from_rows(rows), self.variable(variable), expression)
            .strict(self.config.strict_errors);
        self.collect(&mut op)
    }

    /// Drain an operator with the configured batch size
    pub fn collect(&self, root: &mut dyn PhysicalOperator) -> SparqlResult<Vec<Bindings>> {
        Ok(executor::collect(root, self.config.batch_size)?)
    }
}

impl Default for SparqlEngine {
    fn default() -> Self {
        Self::new()
    }
}

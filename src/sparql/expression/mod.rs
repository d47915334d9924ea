//! Expression compilation and evaluation
//!
//! [`ExpressionCompiler`] turns an [`Expression`] tree into one
//! [`CompiledExpression`] closure. Names are resolved at compile time:
//!
//! - operation nodes against the built-in operation table
//! - aggregate nodes against the aggregation table
//! - function-call nodes against the caller's [`CustomFunctions`]
//!
//! At evaluation time, an error inside an operation propagates to the caller,
//! while any error inside a function call (argument evaluation included)
//! leaves the result unbound.

pub mod aggregates;
pub mod functions;
pub mod operations;

use crate::rdf::{
    Literal, LiteralOperationError, NamespaceManager, ParseError, RdfError, Term, TermParser,
    Variable, VariableRegistry,
};
use crate::sparql::algebra::{Expression, ExpressionNode};
use crate::sparql::bindings::Bindings;
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub use functions::{CustomFunction, CustomFunctions};

/// Default GROUP_CONCAT separator
pub const DEFAULT_SEPARATOR: &str = " ";

/// Compile-time failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Operator not in the operation table
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Aggregation not in the aggregation table
    #[error("Unknown aggregation: {0}")]
    UnknownAggregation(String),

    /// Function not registered
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Node shape the compiler cannot evaluate
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// Leaf that is not a valid term
    #[error("Invalid term: {0}")]
    Parse(#[from] ParseError),
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Evaluation failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Argument of the wrong kind
    #[error("{function}: expected {expected}, got {found}")]
    TypeMismatch {
        function: String,
        expected: &'static str,
        found: String,
    },

    /// Wrong number of arguments
    #[error("{function}: expected {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },

    /// Argument of the right kind with an unusable value
    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },

    /// Operand required but unbound
    #[error("{0}: unbound operand")]
    Unbound(String),

    /// Aggregate that needs at least one value
    #[error("{0}: empty group")]
    EmptyGroup(String),

    #[error(transparent)]
    Literal(#[from] LiteralOperationError),

    #[error(transparent)]
    Rdf(#[from] RdfError),
}

pub type EvalResult<T> = Result<T, EvaluationError>;

/// Result of evaluating a compiled expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    /// Single term
    Term(Term),
    /// Constant term list (IN / NOT IN operand)
    Terms(Vec<Term>),
    /// Aggregate evaluated outside a group: the bindings themselves
    Bindings(Bindings),
}

impl ExprValue {
    pub fn as_term(&self) -> Option<&Term> {
        match self {
            ExprValue::Term(term) => Some(term),
            _ => None,
        }
    }

    pub fn into_term(self) -> Option<Term> {
        match self {
            ExprValue::Term(term) => Some(term),
            _ => None,
        }
    }
}

type EvalFn = dyn Fn(&Bindings) -> EvalResult<Option<ExprValue>> + Send + Sync;

/// Evaluable closure produced by [`ExpressionCompiler::compile`]
#[derive(Clone)]
pub struct CompiledExpression {
    eval: Arc<EvalFn>,
}

impl CompiledExpression {
    fn new<F>(eval: F) -> Self
    where
        F: Fn(&Bindings) -> EvalResult<Option<ExprValue>> + Send + Sync + 'static,
    {
        Self {
            eval: Arc::new(eval),
        }
    }

    /// Evaluate against one solution; `Ok(None)` means unbound
    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult<Option<ExprValue>> {
        (self.eval)(bindings)
    }

    /// Evaluate and keep only single-term results
    pub fn evaluate_term(&self, bindings: &Bindings) -> EvalResult<Option<Term>> {
        Ok(self.evaluate(bindings)?.and_then(ExprValue::into_term))
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompiledExpression")
    }
}

/// What an aggregate node collects from the group
enum AggregateTarget {
    Variable(Variable),
    AllRows,
}

/// Compiles expression trees against a variable registry, prefix table and
/// custom-function registry
pub struct ExpressionCompiler<'a> {
    parser: TermParser<'a>,
    functions: &'a CustomFunctions,
    separator: String,
}

impl<'a> ExpressionCompiler<'a> {
    pub fn new(
        variables: &'a VariableRegistry,
        namespaces: &'a NamespaceManager,
        functions: &'a CustomFunctions,
    ) -> Self {
        Self {
            parser: TermParser::new(variables, namespaces),
            functions,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// GROUP_CONCAT separator used when the aggregate node names none
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Compile an expression tree
    pub fn compile(&self, expression: &Expression) -> CompileResult<CompiledExpression> {
        match expression {
            Expression::Term(text) => self.compile_term(text),
            Expression::Array(items) => {
                let terms = items
                    .iter()
                    .map(|item| self.parser.parse(item))
                    .collect::<Result<Vec<_>, _>>()?;
                // Variable members are substituted; unbound ones drop out of the list
                Ok(CompiledExpression::new(move |bindings| {
                    let resolved = terms
                        .iter()
                        .filter_map(|term| match term {
                            Term::Variable(var) => bindings.get(var).cloned(),
                            constant => Some(constant.clone()),
                        })
                        .collect();
                    Ok(Some(ExprValue::Terms(resolved)))
                }))
            }
            Expression::Node(ExpressionNode::Operation { operator, args }) => {
                self.compile_operation(operator, args)
            }
            Expression::Node(ExpressionNode::Aggregate {
                aggregation,
                expression,
                distinct,
                separator,
            }) => self.compile_aggregate(aggregation, expression, *distinct, separator.as_deref()),
            Expression::Node(ExpressionNode::FunctionCall { function, args }) => {
                self.compile_function_call(function, args)
            }
        }
    }

    fn compile_term(&self, text: &str) -> CompileResult<CompiledExpression> {
        match self.parser.parse(text)? {
            Term::Variable(var) => Ok(CompiledExpression::new(move |bindings| {
                Ok(bindings.get(&var).cloned().map(ExprValue::Term))
            })),
            term => Ok(CompiledExpression::new(move |_| {
                Ok(Some(ExprValue::Term(term.clone())))
            })),
        }
    }

    fn compile_args(&self, args: &[Expression]) -> CompileResult<Vec<CompiledExpression>> {
        args.iter().map(|arg| self.compile(arg)).collect()
    }

    fn compile_operation(
        &self,
        operator: &str,
        args: &[Expression],
    ) -> CompileResult<CompiledExpression> {
        let name = operator.to_lowercase();
        let operation = operations::lookup(&name)
            .ok_or_else(|| CompileError::UnknownOperator(operator.to_string()))?;
        let args = self.compile_args(args)?;
        debug!(operator = %name, arity = args.len(), "Compiled operation");

        match name.as_str() {
            "if" => return Self::compile_if(args),
            "coalesce" => return Ok(Self::compile_coalesce(args)),
            _ => {}
        }

        Ok(CompiledExpression::new(move |bindings| {
            let values = args
                .iter()
                .map(|arg| arg.evaluate(bindings))
                .collect::<EvalResult<Vec<_>>>()?;
            operation(&values).map(|term| Some(ExprValue::Term(term)))
        }))
    }

    /// IF evaluates its condition, then only the selected branch
    fn compile_if(args: Vec<CompiledExpression>) -> CompileResult<CompiledExpression> {
        let Ok([condition, then_branch, else_branch]) = <[CompiledExpression; 3]>::try_from(args)
        else {
            return Err(CompileError::UnsupportedExpression(
                "if requires exactly 3 arguments".to_string(),
            ));
        };

        Ok(CompiledExpression::new(move |bindings| {
            let branch = match operations::if_branch(&[condition.evaluate(bindings)?])? {
                1 => &then_branch,
                _ => &else_branch,
            };
            let value = branch.evaluate(bindings)?;
            operations::expect_term(value, "if").map(|term| Some(ExprValue::Term(term)))
        }))
    }

    /// COALESCE returns the first argument yielding a term; unbound and erroring ones are skipped
    fn compile_coalesce(args: Vec<CompiledExpression>) -> CompiledExpression {
        CompiledExpression::new(move |bindings| {
            for arg in &args {
                match arg.evaluate(bindings) {
                    Ok(Some(ExprValue::Term(term))) => return Ok(Some(ExprValue::Term(term))),
                    Ok(_) => {}
                    Err(error) => debug!(%error, "coalesce argument failed, skipping"),
                }
            }
            Err(EvaluationError::Unbound("coalesce".to_string()))
        })
    }

    fn compile_aggregate(
        &self,
        aggregation: &str,
        expression: &Expression,
        distinct: bool,
        separator: Option<&str>,
    ) -> CompileResult<CompiledExpression> {
        let name = aggregation.to_lowercase();
        let aggregate = aggregates::lookup(&name)
            .ok_or_else(|| CompileError::UnknownAggregation(aggregation.to_string()))?;

        let target = match expression {
            Expression::Term(text) if text.trim() == "*" => {
                if name != "count" || distinct {
                    return Err(CompileError::UnsupportedExpression(format!(
                        "{}({}*)",
                        aggregation,
                        if distinct { "DISTINCT " } else { "" }
                    )));
                }
                AggregateTarget::AllRows
            }
            Expression::Term(text) => match self.parser.parse(text)? {
                Term::Variable(var) => AggregateTarget::Variable(var),
                other => {
                    return Err(CompileError::UnsupportedExpression(format!(
                        "{} over non-variable {}",
                        aggregation, other
                    )))
                }
            },
            other => {
                return Err(CompileError::UnsupportedExpression(format!(
                    "{} over {:?}",
                    aggregation, other
                )))
            }
        };
        let separator = separator.unwrap_or(&self.separator).to_string();
        debug!(aggregation = %name, distinct, "Compiled aggregate");

        Ok(CompiledExpression::new(move |bindings| {
            let Some(group) = bindings.group() else {
                return Ok(Some(ExprValue::Bindings(bindings.clone())));
            };
            let var = match &target {
                AggregateTarget::AllRows => {
                    let count = Literal::integer(group.row_count() as i64);
                    return Ok(Some(ExprValue::Term(count.into())));
                }
                AggregateTarget::Variable(var) => var,
            };
            let values = group.get(var).unwrap_or(&[]);
            let result = if distinct {
                let mut seen = FxHashSet::default();
                let unique: Vec<Term> = values
                    .iter()
                    .filter(|term| seen.insert(term.to_rdf()))
                    .cloned()
                    .collect();
                aggregate(&unique, Some(separator.as_str()))?
            } else {
                aggregate(values, Some(separator.as_str()))?
            };
            Ok(Some(ExprValue::Term(result)))
        }))
    }

    fn compile_function_call(
        &self,
        function: &str,
        args: &[Expression],
    ) -> CompileResult<CompiledExpression> {
        let callable = self
            .functions
            .get(function)
            .ok_or_else(|| CompileError::UnknownFunction(function.to_string()))?;
        let args = self.compile_args(args)?;
        let name = function.to_string();
        debug!(function = %name, arity = args.len(), "Compiled function call");

        Ok(CompiledExpression::new(move |bindings| {
            let call = || -> anyhow::Result<Term> {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate_term(bindings))
                    .collect::<EvalResult<Vec<_>>>()?;
                callable(values.as_slice())
            };
            match call() {
                Ok(term) => Ok(Some(ExprValue::Term(term))),
                Err(error) => {
                    debug!(function = %name, %error, "Function call failed, result left unbound");
                    Ok(None)
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::bindings::AggregationGroup;

    struct Fixture {
        variables: VariableRegistry,
        namespaces: NamespaceManager,
        functions: CustomFunctions,
    }

    impl Fixture {
        fn new() -> Self {
            let mut functions = CustomFunctions::new();
            functions.register("http://example.org/double", |args| {
                let value = args
                    .first()
                    .and_then(|arg| arg.as_ref())
                    .and_then(|term| term.as_literal())
                    .and_then(|lit| lit.as_f64())
                    .ok_or_else(|| anyhow::anyhow!("numeric argument required"))?;
                Ok(Literal::integer((value * 2.0) as i64).into())
            });
            Self {
                variables: VariableRegistry::new(),
                namespaces: NamespaceManager::new(),
                functions,
            }
        }

        fn compiler(&self) -> ExpressionCompiler<'_> {
            ExpressionCompiler::new(&self.variables, &self.namespaces, &self.functions)
        }

        fn bindings(&self, pairs: &[(&str, Term)]) -> Bindings {
            pairs
                .iter()
                .map(|(name, term)| (self.variables.get_or_insert(name), term.clone()))
                .collect()
        }
    }

    fn int(n: i64) -> Term {
        Literal::integer(n).into()
    }

    #[test]
    fn test_variable_and_constant_leaves() {
        let fx = Fixture::new();
        let compiler = fx.compiler();
        let bindings = fx.bindings(&[("x", int(1))]);

        let var = compiler.compile(&Expression::term("?x")).unwrap();
        assert_eq!(var.evaluate_term(&bindings).unwrap(), Some(int(1)));

        let unbound = compiler.compile(&Expression::term("?y")).unwrap();
        assert_eq!(unbound.evaluate(&bindings).unwrap(), None);

        let constant = compiler.compile(&Expression::term("7")).unwrap();
        assert_eq!(constant.evaluate_term(&Bindings::new()).unwrap(), Some(int(7)));

        let array = compiler.compile(&Expression::array(["2", "?x", "?y"])).unwrap();
        match array.evaluate(&bindings).unwrap() {
            Some(ExprValue::Terms(terms)) => assert_eq!(terms, vec![int(2), int(1)]),
            other => panic!("expected term list, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_names_fail_at_compile_time() {
        let fx = Fixture::new();
        let compiler = fx.compiler();

        let err = compiler
            .compile(&Expression::operation("frobnicate", vec![]))
            .unwrap_err();
        assert_eq!(err, CompileError::UnknownOperator("frobnicate".into()));

        let err = compiler
            .compile(&Expression::aggregate("median", Expression::term("?x")))
            .unwrap_err();
        assert_eq!(err, CompileError::UnknownAggregation("median".into()));

        let err = compiler
            .compile(&Expression::function_call("http://example.org/nope", vec![]))
            .unwrap_err();
        assert_eq!(err, CompileError::UnknownFunction("http://example.org/nope".into()));

        assert!(matches!(
            compiler.compile(&Expression::term("not a term")),
            Err(CompileError::Parse(_))
        ));
    }

    #[test]
    fn test_operator_names_are_case_insensitive() {
        let fx = Fixture::new();
        let expr = Expression::operation("STRLEN", vec![Expression::term("\"abc\"")]);
        let compiled = fx.compiler().compile(&expr).unwrap();
        assert_eq!(compiled.evaluate_term(&Bindings::new()).unwrap(), Some(int(3)));
    }

    #[test]
    fn test_operation_errors_propagate() {
        let fx = Fixture::new();
        let expr = Expression::operation("-", vec![Expression::term("\"a\""), Expression::term("\"b\"")]);
        let compiled = fx.compiler().compile(&expr).unwrap();
        assert!(matches!(
            compiled.evaluate(&Bindings::new()),
            Err(EvaluationError::Literal(_))
        ));
    }

    #[test]
    fn test_if_evaluates_only_the_selected_branch() {
        let fx = Fixture::new();
        let compiler = fx.compiler();
        // IF(BOUND(?x), ?x + 1, 0)
        let expr = Expression::operation(
            "if",
            vec![
                Expression::operation("bound", vec![Expression::term("?x")]),
                Expression::operation("+", vec![Expression::term("?x"), Expression::term("1")]),
                Expression::term("0"),
            ],
        );
        let compiled = compiler.compile(&expr).unwrap();

        assert_eq!(compiled.evaluate_term(&Bindings::new()).unwrap(), Some(int(0)));
        assert_eq!(
            compiled.evaluate_term(&fx.bindings(&[("x", int(4))])).unwrap(),
            Some(int(5))
        );

        // An error in the condition still propagates
        let bad_condition = Expression::operation(
            "if",
            vec![
                Expression::operation("-", vec![Expression::term("\"a\""), Expression::term("\"b\"")]),
                Expression::term("1"),
                Expression::term("2"),
            ],
        );
        assert!(compiler.compile(&bad_condition).unwrap().evaluate(&Bindings::new()).is_err());

        assert!(matches!(
            compiler.compile(&Expression::operation("if", vec![Expression::term("true")])),
            Err(CompileError::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn test_coalesce_skips_unbound_and_erroring_arguments() {
        let fx = Fixture::new();
        let compiler = fx.compiler();
        let failing = Expression::operation("-", vec![Expression::term("\"a\""), Expression::term("\"b\"")]);

        let expr = Expression::operation(
            "coalesce",
            vec![failing.clone(), Expression::term("?missing"), Expression::term("2")],
        );
        let compiled = compiler.compile(&expr).unwrap();
        assert_eq!(compiled.evaluate_term(&Bindings::new()).unwrap(), Some(int(2)));

        let nothing = Expression::operation("coalesce", vec![failing, Expression::term("?missing")]);
        assert!(matches!(
            compiler.compile(&nothing).unwrap().evaluate(&Bindings::new()),
            Err(EvaluationError::Unbound(_))
        ));
    }

    #[test]
    fn test_function_call_errors_become_unbound() {
        let fx = Fixture::new();
        let compiler = fx.compiler();
        let call = |arg: Expression| {
            compiler
                .compile(&Expression::function_call("http://example.org/double", vec![arg]))
                .unwrap()
        };

        let ok = call(Expression::term("?x"));
        assert_eq!(ok.evaluate_term(&fx.bindings(&[("x", int(21))])).unwrap(), Some(int(42)));

        // The function itself fails
        let bad_input = fx.bindings(&[("x", Literal::new_simple_literal("x").into())]);
        assert_eq!(ok.evaluate(&bad_input).unwrap(), None);

        // A nested operation fails while evaluating the arguments
        let nested = call(Expression::operation(
            "-",
            vec![Expression::term("\"a\""), Expression::term("\"b\"")],
        ));
        assert_eq!(nested.evaluate(&Bindings::new()).unwrap(), None);
    }

    #[test]
    fn test_aggregate_without_group_returns_bindings() {
        let fx = Fixture::new();
        let compiled = fx
            .compiler()
            .compile(&Expression::aggregate("count", Expression::term("?v")))
            .unwrap();
        let bindings = fx.bindings(&[("v", int(1))]);
        assert_eq!(
            compiled.evaluate(&bindings).unwrap(),
            Some(ExprValue::Bindings(bindings.clone()))
        );
    }

    #[test]
    fn test_aggregate_over_group() {
        let fx = Fixture::new();
        let compiler = fx.compiler().with_separator("|");
        let v = fx.variables.get_or_insert("v");

        let mut group = AggregationGroup::new();
        for n in [3, 1, 3] {
            group.push_row(&fx.bindings(&[("v", int(n))]));
        }
        let grouped = Bindings::new().with_group(Arc::new(group));

        let eval = |expr: Expression| {
            compiler.compile(&expr).unwrap().evaluate_term(&grouped).unwrap().unwrap()
        };

        assert_eq!(eval(Expression::aggregate("count", Expression::term("?v"))), int(3));
        assert_eq!(
            eval(Expression::aggregate_with("count", Expression::term("?v"), true, None)),
            int(2)
        );
        assert_eq!(eval(Expression::aggregate("count", Expression::term("*"))), int(3));
        assert_eq!(eval(Expression::aggregate("SUM", Expression::term("?v"))), int(7));

        let concat = eval(Expression::aggregate_with(
            "group_concat",
            Expression::term("?v"),
            true,
            None,
        ));
        assert_eq!(
            concat.string_value(),
            format!("{}|{}", int(3).to_rdf(), int(1).to_rdf())
        );

        // Unobserved variables aggregate over an empty list
        let other = Expression::aggregate("count", Expression::term("?missing"));
        assert_eq!(eval(other), int(0));
        assert!(grouped.group().unwrap().get(&v).is_some());
    }

    #[test]
    fn test_aggregate_requires_variable() {
        let fx = Fixture::new();
        let compiler = fx.compiler();
        assert!(matches!(
            compiler.compile(&Expression::aggregate("sum", Expression::term("1"))),
            Err(CompileError::UnsupportedExpression(_))
        ));
        assert!(matches!(
            compiler.compile(&Expression::aggregate("sum", Expression::term("*"))),
            Err(CompileError::UnsupportedExpression(_))
        ));
    }
}

//! SPARQL expression algebra
//!
//! The tree handed to the compiler. Leaves are term strings in the compact
//! syntax of [`crate::rdf::TermParser`]; arrays only appear as the right-hand
//! side of `IN` / `NOT IN`. The serde form is what the CLI reads:
//!
//! ```json
//! {"type": "operation", "operator": "+", "args": ["?x", "1"]}
//! {"type": "aggregate", "aggregation": "sum", "expression": "?v", "distinct": true}
//! {"type": "functionCall", "function": "http://example.org/fn", "args": ["?x"]}
//! ```

use serde::{Deserialize, Serialize};

/// Expression tree node or leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    /// Term or variable leaf
    Term(String),
    /// Constant term list (IN / NOT IN operand)
    Array(Vec<String>),
    /// Operation, aggregate or function call
    Node(ExpressionNode),
}

/// Interior expression nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExpressionNode {
    /// Built-in operator or functional form
    Operation {
        operator: String,
        args: Vec<Expression>,
    },
    /// Aggregate over a grouped variable (`*` for COUNT(*))
    Aggregate {
        aggregation: String,
        expression: Box<Expression>,
        #[serde(default)]
        distinct: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        separator: Option<String>,
    },
    /// Caller-registered extension function
    FunctionCall {
        function: String,
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn term(term: impl Into<String>) -> Self {
        Expression::Term(term.into())
    }

    pub fn array<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expression::Array(terms.into_iter().map(Into::into).collect())
    }

    pub fn operation(operator: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Node(ExpressionNode::Operation {
            operator: operator.into(),
            args,
        })
    }

    pub fn aggregate(aggregation: impl Into<String>, expression: Expression) -> Self {
        Expression::Node(ExpressionNode::Aggregate {
            aggregation: aggregation.into(),
            expression: Box::new(expression),
            distinct: false,
            separator: None,
        })
    }

    /// Aggregate with the DISTINCT flag and an optional GROUP_CONCAT separator
    pub fn aggregate_with(
        aggregation: impl Into<String>,
        expression: Expression,
        distinct: bool,
        separator: Option<String>,
    ) -> Self {
        Expression::Node(ExpressionNode::Aggregate {
            aggregation: aggregation.into(),
            expression: Box::new(expression),
            distinct,
            separator,
        })
    }

    pub fn function_call(function: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Node(ExpressionNode::FunctionCall {
            function: function.into(),
            args,
        })
    }

    /// Parse an expression tree from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

//! Physical operators over solution streams (Volcano iterator model)
//!
//! Each operator pulls [`Bindings`] from its input one at a time. Sources are
//! in-memory; the graph-pattern side of query evaluation lives elsewhere.

use crate::rdf::{Term, Variable};
use crate::sparql::bindings::Bindings;
use crate::sparql::executor::{ExecutionError, ExecutionResult};
use crate::sparql::expression::CompiledExpression;
use std::collections::VecDeque;
use tracing::debug;

/// Physical operator trait
pub trait PhysicalOperator: Send {
    /// Get the next solution from this operator
    fn next(&mut self) -> ExecutionResult<Option<Bindings>>;

    /// Reset the operator to start from the beginning
    fn reset(&mut self);

    /// Pull up to `batch_size` solutions; `None` once exhausted
    fn next_batch(&mut self, batch_size: usize) -> ExecutionResult<Option<Vec<Bindings>>> {
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            match self.next()? {
                Some(bindings) => batch.push(bindings),
                None => break,
            }
        }
        Ok(if batch.is_empty() { None } else { Some(batch) })
    }
}

/// Type alias for boxed operators
pub type OperatorBox = Box<dyn PhysicalOperator>;

/// In-memory source of solutions
pub struct ValuesOperator {
    rows: Vec<Bindings>,
    current: usize,
}

impl ValuesOperator {
    pub fn new(rows: Vec<Bindings>) -> Self {
        Self { rows, current: 0 }
    }

    /// Boxed source over any iterator of solutions
    pub fn from_rows<I: IntoIterator<Item = Bindings>>(rows: I) -> OperatorBox {
        Box::new(Self::new(rows.into_iter().collect()))
    }

    /// Single-row source
    pub fn of(row: Bindings) -> OperatorBox {
        Box::new(Self::new(vec![row]))
    }
}

impl PhysicalOperator for ValuesOperator {
    fn next(&mut self) -> ExecutionResult<Option<Bindings>> {
        let row = self.rows.get(self.current).cloned();
        if row.is_some() {
            self.current += 1;
        }
        Ok(row)
    }

    fn reset(&mut self) {
        self.current = 0;
    }
}

type MapFn = Box<dyn FnMut(Bindings) -> ExecutionResult<Bindings> + Send>;

/// One-to-one transformation of solutions
pub struct MapOperator {
    input: OperatorBox,
    f: MapFn,
}

impl MapOperator {
    pub fn new<F>(input: OperatorBox, f: F) -> Self
    where
        F: FnMut(Bindings) -> ExecutionResult<Bindings> + Send + 'static,
    {
        Self {
            input,
            f: Box::new(f),
        }
    }
}

impl PhysicalOperator for MapOperator {
    fn next(&mut self) -> ExecutionResult<Option<Bindings>> {
        match self.input.next()? {
            Some(bindings) => (self.f)(bindings).map(Some),
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.input.reset();
    }
}

type FlatMapFn = Box<dyn FnMut(Bindings) -> ExecutionResult<Vec<Bindings>> + Send>;

/// One-to-many transformation of solutions
pub struct FlatMapOperator {
    input: OperatorBox,
    f: FlatMapFn,
    pending: VecDeque<Bindings>,
}

impl FlatMapOperator {
    pub fn new<F>(input: OperatorBox, f: F) -> Self
    where
        F: FnMut(Bindings) -> ExecutionResult<Vec<Bindings>> + Send + 'static,
    {
        Self {
            input,
            f: Box::new(f),
            pending: VecDeque::new(),
        }
    }
}

impl PhysicalOperator for FlatMapOperator {
    fn next(&mut self) -> ExecutionResult<Option<Bindings>> {
        loop {
            if let Some(bindings) = self.pending.pop_front() {
                return Ok(Some(bindings));
            }
            match self.input.next()? {
                Some(bindings) => self.pending.extend((self.f)(bindings)?),
                None => return Ok(None),
            }
        }
    }

    fn reset(&mut self) {
        self.input.reset();
        self.pending.clear();
    }
}

/// Concatenation of two inputs
pub struct UnionOperator {
    left: OperatorBox,
    right: OperatorBox,
    left_done: bool,
}

impl UnionOperator {
    pub fn new(left: OperatorBox, right: OperatorBox) -> Self {
        Self {
            left,
            right,
            left_done: false,
        }
    }
}

impl PhysicalOperator for UnionOperator {
    fn next(&mut self) -> ExecutionResult<Option<Bindings>> {
        if !self.left_done {
            if let Some(bindings) = self.left.next()? {
                return Ok(Some(bindings));
            }
            self.left_done = true;
        }
        self.right.next()
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.left_done = false;
    }
}

/// Filter operator: FILTER(expr)
///
/// Keeps solutions whose expression has a true effective boolean value.
/// Unbound results and values without one reject the solution.
pub struct FilterOperator {
    input: OperatorBox,
    predicate: CompiledExpression,
    strict: bool,
}

impl FilterOperator {
    pub fn new(input: OperatorBox, predicate: CompiledExpression) -> Self {
        Self {
            input,
            predicate,
            strict: false,
        }
    }

    /// Fail the stream on evaluation errors instead of dropping the solution
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn evaluate_predicate(&self, bindings: &Bindings) -> ExecutionResult<bool> {
        match self.predicate.evaluate_term(bindings) {
            Ok(term) => Ok(term
                .as_ref()
                .and_then(Term::effective_boolean_value)
                .unwrap_or(false)),
            Err(error) if self.strict => Err(error.into()),
            Err(error) => {
                debug!(%error, "Filter evaluation failed, solution dropped");
                Ok(false)
            }
        }
    }
}

impl PhysicalOperator for FilterOperator {
    fn next(&mut self) -> ExecutionResult<Option<Bindings>> {
        while let Some(bindings) = self.input.next()? {
            if self.evaluate_predicate(&bindings)? {
                return Ok(Some(bindings));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.input.reset();
    }
}

/// Extend operator: BIND(expr AS ?var)
///
/// Errors and unbound results leave the variable unbound.
pub struct ExtendOperator {
    input: OperatorBox,
    variable: Variable,
    expression: CompiledExpression,
    strict: bool,
}

impl ExtendOperator {
    pub fn new(input: OperatorBox, variable: Variable, expression: CompiledExpression) -> Self {
        Self {
            input,
            variable,
            expression,
            strict: false,
        }
    }

    /// Fail the stream on evaluation errors instead of leaving the variable unbound
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl PhysicalOperator for ExtendOperator {
    fn next(&mut self) -> ExecutionResult<Option<Bindings>> {
        let Some(mut bindings) = self.input.next()? else {
            return Ok(None);
        };
        if bindings.has(&self.variable) {
            return Err(ExecutionError::RuntimeError(format!(
                "{} is already bound",
                self.variable
            )));
        }
        match self.expression.evaluate_term(&bindings) {
            Ok(Some(term)) => bindings.bind(self.variable.clone(), term),
            Ok(None) => {}
            Err(error) if self.strict => return Err(error.into()),
            Err(error) => {
                debug!(variable = %self.variable, %error, "Extend evaluation failed, left unbound");
            }
        }
        Ok(Some(bindings))
    }

    fn reset(&mut self) {
        self.input.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{Literal, NamespaceManager, VariableRegistry};
    use crate::sparql::algebra::Expression;
    use crate::sparql::expression::{CustomFunctions, ExpressionCompiler};

    fn int(n: i64) -> Term {
        Literal::integer(n).into()
    }

    fn rows(registry: &VariableRegistry, values: &[i64]) -> Vec<Bindings> {
        let x = registry.get_or_insert("x");
        values
            .iter()
            .map(|&n| Bindings::from_iter(vec![(x.clone(), int(n))]))
            .collect()
    }

    fn compile(registry: &VariableRegistry, expr: Expression) -> CompiledExpression {
        let namespaces = NamespaceManager::new();
        let functions = CustomFunctions::new();
        ExpressionCompiler::new(registry, &namespaces, &functions)
            .compile(&expr)
            .unwrap()
    }

    fn drain(op: &mut dyn PhysicalOperator) -> Vec<Bindings> {
        let mut out = Vec::new();
        while let Some(b) = op.next().unwrap() {
            out.push(b);
        }
        out
    }

    #[test]
    fn test_values_and_reset() {
        let registry = VariableRegistry::new();
        let mut op = ValuesOperator::from_rows(rows(&registry, &[1, 2, 3]));
        assert_eq!(drain(op.as_mut()).len(), 3);
        assert!(op.next().unwrap().is_none());

        op.reset();
        assert_eq!(drain(op.as_mut()).len(), 3);

        let mut single = ValuesOperator::of(Bindings::new());
        assert_eq!(drain(single.as_mut()).len(), 1);
    }

    #[test]
    fn test_next_batch() {
        let registry = VariableRegistry::new();
        let mut op = ValuesOperator::from_rows(rows(&registry, &[1, 2, 3, 4, 5]));
        assert_eq!(op.next_batch(2).unwrap().unwrap().len(), 2);
        assert_eq!(op.next_batch(2).unwrap().unwrap().len(), 2);
        assert_eq!(op.next_batch(2).unwrap().unwrap().len(), 1);
        assert!(op.next_batch(2).unwrap().is_none());
    }

    #[test]
    fn test_map_flat_map_union() {
        let registry = VariableRegistry::new();
        let y = registry.get_or_insert("y");

        let y_map = y.clone();
        let mut map = MapOperator::new(ValuesOperator::from_rows(rows(&registry, &[1, 2])), move |b| {
            Ok(b.extend(y_map.clone(), int(0)))
        });
        assert!(drain(&mut map).iter().all(|b| b.has(&y)));

        let mut flat = FlatMapOperator::new(ValuesOperator::from_rows(rows(&registry, &[1, 2])), |b| {
            Ok(vec![b.clone(), b])
        });
        assert_eq!(drain(&mut flat).len(), 4);
        flat.reset();
        assert_eq!(drain(&mut flat).len(), 4);

        let mut union = UnionOperator::new(
            ValuesOperator::from_rows(rows(&registry, &[1])),
            ValuesOperator::from_rows(rows(&registry, &[2, 3])),
        );
        let x = registry.get_or_insert("x");
        let values: Vec<Term> = drain(&mut union)
            .iter()
            .map(|b| b.get(&x).cloned().unwrap())
            .collect();
        assert_eq!(values, vec![int(1), int(2), int(3)]);
    }

    #[test]
    fn test_filter_keeps_true_solutions() {
        let registry = VariableRegistry::new();
        let predicate = compile(
            &registry,
            Expression::operation(">", vec![Expression::term("?x"), Expression::term("1")]),
        );
        let mut filter = FilterOperator::new(ValuesOperator::from_rows(rows(&registry, &[1, 2, 3])), predicate);
        assert_eq!(drain(&mut filter).len(), 2);
    }

    #[test]
    fn test_filter_errors_drop_or_fail() {
        let registry = VariableRegistry::new();
        let predicate = compile(
            &registry,
            Expression::operation("-", vec![Expression::term("\"a\""), Expression::term("?x")]),
        );

        let mut lenient =
            FilterOperator::new(ValuesOperator::from_rows(rows(&registry, &[1])), predicate.clone());
        assert!(drain(&mut lenient).is_empty());

        let mut strict =
            FilterOperator::new(ValuesOperator::from_rows(rows(&registry, &[1])), predicate).strict(true);
        assert!(matches!(strict.next(), Err(ExecutionError::Evaluation(_))));
    }

    #[test]
    fn test_extend_binds_result() {
        let registry = VariableRegistry::new();
        let doubled = registry.get_or_insert("doubled");
        let expr = compile(
            &registry,
            Expression::operation("*", vec![Expression::term("?x"), Expression::term("2")]),
        );
        let mut extend =
            ExtendOperator::new(ValuesOperator::from_rows(rows(&registry, &[4])), doubled.clone(), expr);
        let out = drain(&mut extend);
        assert_eq!(out[0].get(&doubled), Some(&int(8)));
    }

    #[test]
    fn test_extend_error_leaves_unbound() {
        let registry = VariableRegistry::new();
        let z = registry.get_or_insert("z");
        let expr = compile(
            &registry,
            Expression::operation("-", vec![Expression::term("\"a\""), Expression::term("\"b\"")]),
        );

        let mut lenient =
            ExtendOperator::new(ValuesOperator::from_rows(rows(&registry, &[1])), z.clone(), expr.clone());
        let out = drain(&mut lenient);
        assert_eq!(out.len(), 1);
        assert!(!out[0].has(&z));

        let mut strict =
            ExtendOperator::new(ValuesOperator::from_rows(rows(&registry, &[1])), z, expr).strict(true);
        assert!(strict.next().is_err());
    }

    #[test]
    fn test_extend_rejects_bound_variable() {
        let registry = VariableRegistry::new();
        let x = registry.get_or_insert("x");
        let expr = compile(&registry, Expression::term("1"));
        let mut extend = ExtendOperator::new(ValuesOperator::from_rows(rows(&registry, &[1])), x, expr);
        assert!(matches!(extend.next(), Err(ExecutionError::RuntimeError(_))));
    }
}

//! Solution-stream execution using the Volcano iterator model

pub mod group_by;
pub mod operator;

pub use group_by::GroupByOperator;
pub use operator::{
    ExtendOperator, FilterOperator, FlatMapOperator, MapOperator, OperatorBox, PhysicalOperator,
    UnionOperator, ValuesOperator,
};

use crate::sparql::bindings::Bindings;
use crate::sparql::expression::EvaluationError;
use thiserror::Error;

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Expression evaluation failed in strict mode
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Pull every solution from `root` in batches of `batch_size`
pub fn collect(root: &mut dyn PhysicalOperator, batch_size: usize) -> ExecutionResult<Vec<Bindings>> {
    let mut solutions = Vec::new();
    while let Some(batch) = root.next_batch(batch_size.max(1))? {
        solutions.extend(batch);
    }
    Ok(solutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{Literal, VariableRegistry};

    #[test]
    fn test_collect_across_batches() {
        let registry = VariableRegistry::new();
        let x = registry.get_or_insert("x");
        let rows: Vec<Bindings> = (0..10)
            .map(|n| Bindings::from_iter(vec![(x.clone(), Literal::integer(n).into())]))
            .collect();

        let mut root = ValuesOperator::from_rows(rows.clone());
        assert_eq!(collect(root.as_mut(), 3).unwrap(), rows);

        root.reset();
        assert_eq!(collect(root.as_mut(), 0).unwrap().len(), 10);
    }
}

//! GROUP BY operator
//!
//! Drains its input on the first pull, partitions the solutions by the RDF
//! text of the grouping variables, and emits one solution per group. Each
//! emitted solution binds the grouping variables and carries the group's
//! [`AggregationGroup`] so aggregate expressions evaluated against it see
//! every value collected for the group.

use crate::rdf::Variable;
use crate::sparql::bindings::{AggregationGroup, Bindings};
use crate::sparql::executor::{ExecutionResult, OperatorBox, PhysicalOperator};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use tracing::debug;

const KEY_SEPARATOR: char = '\u{1F}';
const UNBOUND_KEY: &str = "UNBOUND";
const ALL_KEY: &str = "__all__";

/// Group under construction
struct GroupState {
    representative: Bindings,
    group: AggregationGroup,
}

pub struct GroupByOperator {
    input: OperatorBox,
    variables: Vec<Variable>,
    results: std::vec::IntoIter<Bindings>,
    executed: bool,
}

impl GroupByOperator {
    pub fn new(input: OperatorBox, variables: Vec<Variable>) -> Self {
        Self {
            input,
            variables,
            results: Vec::new().into_iter(),
            executed: false,
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Partition key; equal keys mean equal RDF text for every grouping variable
    fn group_key(&self, row: &Bindings) -> String {
        if self.variables.is_empty() {
            return ALL_KEY.to_string();
        }
        let mut key = String::new();
        for (i, var) in self.variables.iter().enumerate() {
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            match row.get(var) {
                Some(term) => key.push_str(&term.to_rdf()),
                None => key.push_str(UNBOUND_KEY),
            }
        }
        key
    }

    fn execute(&mut self) -> ExecutionResult<Vec<Bindings>> {
        let mut groups: IndexMap<String, GroupState, FxBuildHasher> = IndexMap::default();
        let mut rows = 0usize;

        while let Some(row) = self.input.next()? {
            rows += 1;
            let key = self.group_key(&row);
            let state = groups.entry(key).or_insert_with(|| GroupState {
                representative: row.project(&self.variables),
                group: AggregationGroup::new(),
            });
            state.group.push_row(&row);
        }

        // Aggregating an empty input without grouping variables yields one empty group
        if groups.is_empty() && self.variables.is_empty() {
            groups.insert(
                ALL_KEY.to_string(),
                GroupState {
                    representative: Bindings::new(),
                    group: AggregationGroup::new(),
                },
            );
        }

        debug!(rows, groups = groups.len(), "Grouped solutions");

        Ok(groups
            .into_values()
            .map(|state| state.representative.with_group(Arc::new(state.group)))
            .collect())
    }
}

impl PhysicalOperator for GroupByOperator {
    fn next(&mut self) -> ExecutionResult<Option<Bindings>> {
        if !self.executed {
            self.results = self.execute()?.into_iter();
            self.executed = true;
        }
        Ok(self.results.next())
    }

    fn reset(&mut self) {
        self.input.reset();
        self.executed = false;
        self.results = Vec::new().into_iter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{Literal, Term, VariableRegistry};
    use crate::sparql::executor::ValuesOperator;

    fn int(n: i64) -> Term {
        Literal::integer(n).into()
    }

    fn drain(op: &mut GroupByOperator) -> Vec<Bindings> {
        let mut out = Vec::new();
        while let Some(b) = op.next().unwrap() {
            out.push(b);
        }
        out
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let registry = VariableRegistry::new();
        let k = registry.get_or_insert("k");
        let v = registry.get_or_insert("v");
        let row = |key: &str, n: i64| {
            Bindings::from_iter(vec![
                (k.clone(), Literal::new_simple_literal(key).into()),
                (v.clone(), int(n)),
            ])
        };

        let input = ValuesOperator::from_rows(vec![row("a", 10), row("b", 5), row("a", 20)]);
        let mut op = GroupByOperator::new(input, vec![k.clone()]);
        let groups = drain(&mut op);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].get(&k), Some(&Term::from(Literal::new_simple_literal("a"))));
        assert!(!groups[0].has(&v));

        let a = groups[0].group().unwrap();
        assert_eq!(a.row_count(), 2);
        assert_eq!(a.get(&v).unwrap(), &[int(10), int(20)]);
        assert_eq!(groups[1].group().unwrap().get(&v).unwrap(), &[int(5)]);
    }

    #[test]
    fn test_unbound_grouping_variable() {
        let registry = VariableRegistry::new();
        let k = registry.get_or_insert("k");
        let v = registry.get_or_insert("v");

        let input = ValuesOperator::from_rows(vec![
            Bindings::from_iter(vec![(v.clone(), int(1))]),
            Bindings::from_iter(vec![(v.clone(), int(2))]),
            Bindings::from_iter(vec![(k.clone(), int(0)), (v.clone(), int(3))]),
        ]);
        let mut op = GroupByOperator::new(input, vec![k.clone()]);
        let groups = drain(&mut op);

        assert_eq!(groups.len(), 2);
        assert!(!groups[0].has(&k));
        assert_eq!(groups[0].group().unwrap().row_count(), 2);
    }

    #[test]
    fn test_no_grouping_variables() {
        let registry = VariableRegistry::new();
        let v = registry.get_or_insert("v");
        let input = ValuesOperator::from_rows((1..=3).map(|n| Bindings::from_iter(vec![(v.clone(), int(n))])));
        let mut op = GroupByOperator::new(input, vec![]);
        let groups = drain(&mut op);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_empty());
        assert_eq!(groups[0].group().unwrap().row_count(), 3);
    }

    #[test]
    fn test_empty_input() {
        let registry = VariableRegistry::new();
        let k = registry.get_or_insert("k");

        let mut whole = GroupByOperator::new(ValuesOperator::from_rows(Vec::<Bindings>::new()), vec![]);
        let groups = drain(&mut whole);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group().unwrap().row_count(), 0);

        let mut keyed = GroupByOperator::new(ValuesOperator::from_rows(Vec::<Bindings>::new()), vec![k]);
        assert!(drain(&mut keyed).is_empty());
    }

    #[test]
    fn test_reset_regroups() {
        let registry = VariableRegistry::new();
        let v = registry.get_or_insert("v");
        let input = ValuesOperator::from_rows(vec![Bindings::from_iter(vec![(v.clone(), int(1))])]);
        let mut op = GroupByOperator::new(input, vec![v]);
        assert_eq!(drain(&mut op).len(), 1);
        op.reset();
        assert_eq!(drain(&mut op).len(), 1);
    }
}

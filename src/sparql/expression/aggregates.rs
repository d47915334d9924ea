//! Aggregation table
//!
//! Functions over the list of terms a group collected for one variable.
//! SUM and AVG skip non-numeric entries; AVG divides by the number of numeric
//! entries, not the list length.

use super::{EvalResult, EvaluationError, DEFAULT_SEPARATOR};
use crate::rdf::{Literal, Term};
use std::cmp::Ordering;

/// Aggregate over collected terms, with an optional GROUP_CONCAT separator
pub type AggregateFn = fn(&[Term], Option<&str>) -> EvalResult<Term>;

/// Resolve a lower-cased aggregation name
pub fn lookup(name: &str) -> Option<AggregateFn> {
    let aggregate: AggregateFn = match name {
        "count" => count,
        "sum" => sum,
        "avg" => avg,
        "min" => min,
        "max" => max,
        "group_concat" => group_concat,
        "sample" => sample,
        _ => return None,
    };
    Some(aggregate)
}

fn count(values: &[Term], _separator: Option<&str>) -> EvalResult<Term> {
    Ok(Literal::integer(values.len() as i64).into())
}

/// Sum of the numeric entries and how many there were
fn numeric_total(values: &[Term]) -> EvalResult<(Literal, usize)> {
    values
        .iter()
        .filter_map(Term::as_literal)
        .filter(|lit| lit.is_numeric())
        .try_fold((Literal::integer(0), 0), |(total, n), lit| {
            Ok((total.add(lit)?, n + 1))
        })
}

fn sum(values: &[Term], _separator: Option<&str>) -> EvalResult<Term> {
    let (total, _) = numeric_total(values)?;
    Ok(total.into())
}

fn avg(values: &[Term], _separator: Option<&str>) -> EvalResult<Term> {
    match numeric_total(values)? {
        (_, 0) => Ok(Literal::integer(0).into()),
        (total, n) => Ok(total.divide(&Literal::integer(n as i64))?.into()),
    }
}

fn extreme(values: &[Term], function: &str, keep: Ordering) -> EvalResult<Term> {
    values
        .iter()
        .reduce(|best, candidate| {
            if candidate.compare_to(best) == keep {
                candidate
            } else {
                best
            }
        })
        .cloned()
        .ok_or_else(|| EvaluationError::EmptyGroup(function.to_string()))
}

fn min(values: &[Term], _separator: Option<&str>) -> EvalResult<Term> {
    extreme(values, "min", Ordering::Less)
}

fn max(values: &[Term], _separator: Option<&str>) -> EvalResult<Term> {
    extreme(values, "max", Ordering::Greater)
}

fn group_concat(values: &[Term], separator: Option<&str>) -> EvalResult<Term> {
    let joined = values
        .iter()
        .map(Term::to_rdf)
        .collect::<Vec<_>>()
        .join(separator.unwrap_or(DEFAULT_SEPARATOR));
    Ok(Literal::new_simple_literal(joined).into())
}

fn sample(values: &[Term], _separator: Option<&str>) -> EvalResult<Term> {
    values
        .first()
        .cloned()
        .ok_or_else(|| EvaluationError::EmptyGroup("sample".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Term> {
        values.iter().map(|&v| Literal::integer(v).into()).collect()
    }

    fn run(name: &str, values: &[Term]) -> EvalResult<Term> {
        lookup(name).unwrap()(values, None)
    }

    #[test]
    fn test_count_sum_avg() {
        let values = ints(&[10, 20, 30]);
        assert_eq!(run("count", &values).unwrap(), Term::from(Literal::integer(3)));
        assert_eq!(run("sum", &values).unwrap(), Term::from(Literal::integer(60)));
        assert_eq!(run("avg", &values).unwrap(), Term::from(Literal::integer(20)));

        let avg = run("avg", &ints(&[1, 2])).unwrap();
        assert_eq!(avg.as_literal().unwrap().as_f64(), Some(1.5));
    }

    #[test]
    fn test_sum_and_avg_skip_non_numeric() {
        let mut values = ints(&[4, 6]);
        values.push(Literal::new_simple_literal("x").into());

        assert_eq!(run("count", &values).unwrap(), Term::from(Literal::integer(3)));
        assert_eq!(run("sum", &values).unwrap(), Term::from(Literal::integer(10)));
        assert_eq!(run("avg", &values).unwrap(), Term::from(Literal::integer(5)));
    }

    #[test]
    fn test_empty_groups() {
        assert_eq!(run("count", &[]).unwrap(), Term::from(Literal::integer(0)));
        assert_eq!(run("sum", &[]).unwrap(), Term::from(Literal::integer(0)));
        assert_eq!(run("avg", &[]).unwrap(), Term::from(Literal::integer(0)));
        assert!(matches!(run("min", &[]), Err(EvaluationError::EmptyGroup(_))));
        assert!(matches!(run("sample", &[]), Err(EvaluationError::EmptyGroup(_))));
    }

    #[test]
    fn test_min_max_sample() {
        let values = ints(&[7, -2, 9]);
        assert_eq!(run("min", &values).unwrap(), Term::from(Literal::integer(-2)));
        assert_eq!(run("max", &values).unwrap(), Term::from(Literal::integer(9)));
        assert!(values.contains(&run("sample", &values).unwrap()));
    }

    #[test]
    fn test_group_concat_uses_rdf_text() {
        let values: Vec<Term> = vec![
            Literal::new_simple_literal("a").into(),
            Literal::new_simple_literal("b").into(),
        ];
        let joined = lookup("group_concat").unwrap()(&values, Some(", ")).unwrap();
        assert_eq!(joined.string_value(), "\"a\", \"b\"");

        let default = run("group_concat", &values).unwrap();
        assert_eq!(default.string_value(), "\"a\" \"b\"");
    }

    #[test]
    fn test_unknown_aggregation() {
        assert!(lookup("median").is_none());
    }
}

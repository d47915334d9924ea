use samyama_sparql::sparql::{Bindings, Expression, GroupByOperator, PhysicalOperator, ValuesOperator};
use samyama_sparql::{Literal, SparqlEngine, Term};

fn int(n: i64) -> Term {
    Literal::integer(n).into()
}

fn eval(engine: &SparqlEngine, group: &Bindings, expr: Expression) -> Term {
    engine
        .compile(&expr)
        .unwrap()
        .evaluate_term(group)
        .unwrap()
        .unwrap()
}

#[test]
fn test_grouped_count_and_sum() {
    let engine = SparqlEngine::new();
    let rows = vec![
        engine.bindings(&[("g", "1"), ("v", "10")]).unwrap(),
        engine.bindings(&[("g", "1"), ("v", "20")]).unwrap(),
        engine.bindings(&[("g", "2"), ("v", "5")]).unwrap(),
    ];

    let groups = engine.group_by(rows, &["g"]).unwrap();
    assert_eq!(groups.len(), 2);

    let g = engine.variable("g");
    let v = engine.variable("v");
    let first = groups.iter().find(|b| b.get(&g) == Some(&int(1))).unwrap();
    let second = groups.iter().find(|b| b.get(&g) == Some(&int(2))).unwrap();

    assert_eq!(first.group().unwrap().get(&v).unwrap(), &[int(10), int(20)]);
    assert_eq!(second.group().unwrap().get(&v).unwrap(), &[int(5)]);

    let count = || Expression::aggregate("count", Expression::term("?v"));
    let sum = || Expression::aggregate("sum", Expression::term("?v"));
    assert_eq!(eval(&engine, first, count()), int(2));
    assert_eq!(eval(&engine, second, count()), int(1));
    assert_eq!(eval(&engine, first, sum()), int(30));
    assert_eq!(eval(&engine, second, sum()), int(5));
}

#[test]
fn test_grouped_aggregations() {
    let engine = SparqlEngine::new();

    // 3 people in HR and 2 in Engineering
    let mut rows = Vec::new();
    for age in ["30", "40", "50"] {
        rows.push(engine.bindings(&[("dept", "\"HR\""), ("age", age)]).unwrap());
    }
    for age in ["20", "25"] {
        rows.push(engine.bindings(&[("dept", "\"Engineering\""), ("age", age)]).unwrap());
    }

    let groups = engine.group_by(rows, &["dept"]).unwrap();
    assert_eq!(groups.len(), 2);

    // First-seen order
    let hr = &groups[0];
    let eng = &groups[1];
    assert_eq!(hr.get_by_name("dept").unwrap().string_value(), "HR");
    assert_eq!(eng.get_by_name("dept").unwrap().string_value(), "Engineering");

    let avg = |group: &Bindings| {
        let term = eval(&engine, group, Expression::aggregate("avg", Expression::term("?age")));
        term.as_literal().unwrap().as_f64().unwrap()
    };
    assert_eq!(avg(hr), 40.0);
    assert_eq!(avg(eng), 22.5);

    let max = Expression::aggregate("max", Expression::term("?age"));
    let min = Expression::aggregate("min", Expression::term("?age"));
    assert_eq!(eval(&engine, hr, max.clone()), int(50));
    assert_eq!(eval(&engine, eng, max), int(25));
    assert_eq!(eval(&engine, eng, min), int(20));

    let count_all = Expression::aggregate("count", Expression::term("*"));
    assert_eq!(eval(&engine, hr, count_all), int(3));
}

#[test]
fn test_zero_grouping_variables_form_one_group() {
    let engine = SparqlEngine::new();
    let rows: Vec<Bindings> = (1..=4)
        .map(|n| engine.bindings(&[("v", n.to_string().as_str())]).unwrap())
        .collect();

    let groups = engine.group_by(rows, &[]).unwrap();
    assert_eq!(groups.len(), 1);
    assert!(groups[0].is_empty());

    let v = engine.variable("v");
    assert_eq!(groups[0].group().unwrap().get(&v).unwrap().len(), 4);
    assert_eq!(
        eval(&engine, &groups[0], Expression::aggregate("sum", Expression::term("?v"))),
        int(10)
    );
}

#[test]
fn test_empty_input_counts_zero() {
    let engine = SparqlEngine::new();
    let groups = engine.group_by(Vec::new(), &[]).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(
        eval(&engine, &groups[0], Expression::aggregate("count", Expression::term("*"))),
        int(0)
    );

    assert!(engine.group_by(Vec::new(), &["k"]).unwrap().is_empty());
}

#[test]
fn test_variables_seen_later_get_their_own_lists() {
    let engine = SparqlEngine::new();
    let rows = vec![
        engine.bindings(&[("k", "\"a\""), ("x", "1")]).unwrap(),
        engine.bindings(&[("k", "\"a\""), ("y", "2")]).unwrap(),
        engine.bindings(&[("k", "\"a\""), ("x", "3"), ("y", "4")]).unwrap(),
    ];
    let groups = engine.group_by(rows, &["k"]).unwrap();
    let payload = groups[0].group().unwrap();

    assert_eq!(payload.row_count(), 3);
    assert_eq!(payload.get(&engine.variable("x")).unwrap(), &[int(1), int(3)]);
    assert_eq!(payload.get(&engine.variable("y")).unwrap(), &[int(2), int(4)]);
}

#[test]
fn test_distinct_and_group_concat() {
    let engine = SparqlEngine::new();
    let rows = vec![
        engine.bindings(&[("tag", "\"x\"")]).unwrap(),
        engine.bindings(&[("tag", "\"y\"")]).unwrap(),
        engine.bindings(&[("tag", "\"x\"")]).unwrap(),
    ];
    let groups = engine.group_by(rows, &[]).unwrap();

    let distinct = Expression::aggregate_with("count", Expression::term("?tag"), true, None);
    assert_eq!(eval(&engine, &groups[0], distinct), int(2));

    let concat = Expression::aggregate_with(
        "group_concat",
        Expression::term("?tag"),
        true,
        Some(", ".to_string()),
    );
    assert_eq!(eval(&engine, &groups[0], concat).string_value(), "\"x\", \"y\"");
}

#[test]
fn test_group_by_over_operator_pipeline() {
    let engine = SparqlEngine::new();
    let rows = vec![
        engine.bindings(&[("k", "<http://example.org/a>"), ("v", "1")]).unwrap(),
        engine.bindings(&[("k", "<http://example.org/b>"), ("v", "2")]).unwrap(),
        engine.bindings(&[("k", "<http://example.org/a>"), ("v", "3")]).unwrap(),
    ];

    let mut op = GroupByOperator::new(ValuesOperator::from_rows(rows), vec![engine.variable("k")]);
    let first = op.next().unwrap().unwrap();
    assert_eq!(first.group().unwrap().row_count(), 2);
    assert!(op.next().unwrap().is_some());
    assert!(op.next().unwrap().is_none());
}

//! Built-in operation table
//!
//! Maps lower-cased SPARQL operator and built-in names to functions over
//! already-evaluated arguments. Every function returns a [`Term`]; failures
//! are [`EvaluationError`]s that the compiled operation node propagates.
//!
//! Categories:
//! - arithmetic `+ - * /` and comparisons `= != < <= > >=`
//! - logical `! && ||` (a non-boolean operand makes the result `false`)
//! - functional forms `bound`, `sameterm`, `in`, `notin`, `coalesce`, `if`
//! - term tests and constructors (`isiri`, `str`, `datatype`, `strdt`, `uuid`, ...)
//! - string, numeric, date and hash built-ins

use super::{EvalResult, EvaluationError, ExprValue};
use crate::rdf::{ArithmeticOp, Literal, NamedNode, NumericType, Term};
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use lru::LruCache;
use md5::Md5;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Regex, RegexBuilder};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::num::NonZeroUsize;
use uuid::Uuid;

/// Operation over evaluated arguments (`None` = unbound)
pub type OperationFn = fn(&[Option<ExprValue>]) -> EvalResult<Term>;

/// Unreserved characters kept as-is by ENCODE_FOR_URI
const URI_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const REGEX_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(size) => size,
    None => NonZeroUsize::MIN,
};

// REGEX/REPLACE patterns are usually constant across a query
thread_local! {
    static REGEX_CACHE: RefCell<LruCache<(String, String), Regex>> =
        RefCell::new(LruCache::new(REGEX_CACHE_SIZE));
}

/// Resolve a lower-cased operator name
pub fn lookup(name: &str) -> Option<OperationFn> {
    let operation: OperationFn = match name {
        "+" => add,
        "-" => subtract,
        "*" => multiply,
        "/" => divide,
        "=" => equal,
        "!=" => not_equal,
        "<" => less,
        "<=" => less_or_equal,
        ">" => greater,
        ">=" => greater_or_equal,
        "!" => not,
        "&&" => and,
        "||" => or,
        "bound" => bound,
        "sameterm" => same_term,
        "in" => in_list,
        "notin" => not_in_list,
        "isiri" | "isuri" => is_iri,
        "isblank" => is_blank,
        "isliteral" => is_literal,
        "isnumeric" => is_numeric,
        "str" => to_str,
        "lang" => lang,
        "datatype" => datatype,
        "iri" | "uri" => to_iri,
        "strdt" => strdt,
        "strlang" => strlang,
        "uuid" => uuid,
        "struuid" => struuid,
        "strlen" => strlen,
        "substr" => substr,
        "ucase" => ucase,
        "lcase" => lcase,
        "strstarts" => strstarts,
        "strends" => strends,
        "contains" => contains,
        "strbefore" => strbefore,
        "strafter" => strafter,
        "encode_for_uri" => encode_for_uri,
        "concat" => concat,
        "langmatches" => langmatches,
        "regex" => regex,
        "replace" => replace,
        "abs" => abs,
        "round" => round,
        "ceil" => ceil,
        "floor" => floor,
        "rand" => rand,
        "now" => now,
        "year" => year,
        "month" => month,
        "day" => day,
        "hours" => hours,
        "minutes" => minutes,
        "seconds" => seconds,
        "tz" => tz,
        "md5" => md5,
        "sha1" => sha1,
        "sha256" => sha256,
        "sha384" => sha384,
        "sha512" => sha512,
        "coalesce" => coalesce,
        "if" => if_then_else,
        _ => return None,
    };
    Some(operation)
}

// ============================================================================
// Argument helpers
// ============================================================================

fn check_arity(args: &[Option<ExprValue>], expected: usize, function: &str) -> EvalResult<()> {
    check_arity_range(args, expected, expected, function)
}

fn check_arity_range(
    args: &[Option<ExprValue>],
    min: usize,
    max: usize,
    function: &str,
) -> EvalResult<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(EvaluationError::Arity {
            function: function.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn mismatch(function: &str, expected: &'static str, found: impl ToString) -> EvaluationError {
    EvaluationError::TypeMismatch {
        function: function.to_string(),
        expected,
        found: found.to_string(),
    }
}

fn term<'v>(args: &'v [Option<ExprValue>], index: usize, function: &str) -> EvalResult<&'v Term> {
    match args.get(index) {
        Some(Some(ExprValue::Term(term))) => Ok(term),
        Some(Some(ExprValue::Terms(_))) => Err(mismatch(function, "a term", "a term list")),
        Some(Some(ExprValue::Bindings(_))) => Err(mismatch(function, "a term", "bindings")),
        _ => Err(EvaluationError::Unbound(function.to_string())),
    }
}

fn literal<'v>(
    args: &'v [Option<ExprValue>],
    index: usize,
    function: &str,
) -> EvalResult<&'v Literal> {
    match term(args, index, function)? {
        Term::Literal(lit) => Ok(lit),
        other => Err(mismatch(function, "a literal", other)),
    }
}

fn string_literal<'v>(
    args: &'v [Option<ExprValue>],
    index: usize,
    function: &str,
) -> EvalResult<&'v Literal> {
    let lit = literal(args, index, function)?;
    if lit.is_string() {
        Ok(lit)
    } else {
        Err(mismatch(function, "a string literal", lit))
    }
}

fn numeric(
    args: &[Option<ExprValue>],
    index: usize,
    function: &str,
) -> EvalResult<(f64, NumericType)> {
    let lit = literal(args, index, function)?;
    lit.as_numeric()
        .ok_or_else(|| mismatch(function, "a numeric literal", lit))
}

fn date<'v>(
    args: &'v [Option<ExprValue>],
    index: usize,
    function: &str,
) -> EvalResult<&'v DateTime<FixedOffset>> {
    let lit = literal(args, index, function)?;
    lit.as_date()
        .ok_or_else(|| mismatch(function, "a date literal", lit))
}

/// Boolean value of an operand, `None` when it is not a boolean literal
fn truth(args: &[Option<ExprValue>], index: usize) -> Option<bool> {
    match args.get(index) {
        Some(Some(ExprValue::Term(Term::Literal(lit)))) => lit.as_bool(),
        _ => None,
    }
}

fn boolean(value: bool) -> EvalResult<Term> {
    Ok(Literal::boolean(value).into())
}

fn simple(value: impl Into<String>) -> EvalResult<Term> {
    Ok(Literal::new_simple_literal(value).into())
}

// ============================================================================
// Arithmetic and comparison
// ============================================================================

fn add(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    arithmetic(args, ArithmeticOp::Add, "+")
}

fn subtract(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    arithmetic(args, ArithmeticOp::Subtract, "-")
}

fn multiply(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    arithmetic(args, ArithmeticOp::Multiply, "*")
}

fn divide(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    arithmetic(args, ArithmeticOp::Divide, "/")
}

/// Literals follow the literal coercion table. Any other operand pair
/// concatenates for `+` and falls back to host floating point otherwise.
fn arithmetic(args: &[Option<ExprValue>], op: ArithmeticOp, function: &str) -> EvalResult<Term> {
    check_arity(args, 2, function)?;
    let left = term(args, 0, function)?;
    let right = term(args, 1, function)?;

    match (left, right) {
        (Term::Literal(a), Term::Literal(b)) => Ok(a.apply(op, b)?.into()),
        _ if op == ArithmeticOp::Add => {
            simple(format!("{}{}", left.string_value(), right.string_value()))
        }
        _ => {
            let a = host_number(left);
            let b = host_number(right);
            let value = match op {
                ArithmeticOp::Add => a + b,
                ArithmeticOp::Subtract => a - b,
                ArithmeticOp::Multiply => a * b,
                ArithmeticOp::Divide => a / b,
            };
            Ok(Literal::double(value).into())
        }
    }
}

fn host_number(term: &Term) -> f64 {
    term.string_value().trim().parse().unwrap_or(f64::NAN)
}

fn ordering(args: &[Option<ExprValue>], function: &str) -> EvalResult<Ordering> {
    check_arity(args, 2, function)?;
    Ok(term(args, 0, function)?.compare_to(term(args, 1, function)?))
}

fn equal(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 2, "=")?;
    boolean(term(args, 0, "=")?.equals(term(args, 1, "=")?))
}

fn not_equal(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 2, "!=")?;
    boolean(!term(args, 0, "!=")?.equals(term(args, 1, "!=")?))
}

fn less(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    boolean(ordering(args, "<")? == Ordering::Less)
}

fn less_or_equal(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    boolean(ordering(args, "<=")? != Ordering::Greater)
}

fn greater(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    boolean(ordering(args, ">")? == Ordering::Greater)
}

fn greater_or_equal(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    boolean(ordering(args, ">=")? != Ordering::Less)
}

// ============================================================================
// Logical operators and functional forms
// ============================================================================

fn not(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "!")?;
    boolean(truth(args, 0).map_or(false, |b| !b))
}

fn and(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 2, "&&")?;
    boolean(matches!((truth(args, 0), truth(args, 1)), (Some(true), Some(true))))
}

fn or(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 2, "||")?;
    boolean(matches!(
        (truth(args, 0), truth(args, 1)),
        (Some(a), Some(b)) if a || b
    ))
}

fn bound(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "bound")?;
    boolean(matches!(args.first(), Some(Some(ExprValue::Term(_)))))
}

fn same_term(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 2, "sameterm")?;
    boolean(term(args, 0, "sameterm")?.to_rdf() == term(args, 1, "sameterm")?.to_rdf())
}

/// Linear scan; candidates come as a term list or as further arguments
fn membership(args: &[Option<ExprValue>], function: &str) -> EvalResult<bool> {
    if args.is_empty() {
        return Err(EvaluationError::Arity {
            function: function.to_string(),
            expected: "at least 1".to_string(),
            found: 0,
        });
    }
    let needle = term(args, 0, function)?;
    Ok(args[1..].iter().any(|candidate| match candidate {
        Some(ExprValue::Terms(list)) => list.iter().any(|t| t.equals(needle)),
        Some(ExprValue::Term(t)) => t.equals(needle),
        _ => false,
    }))
}

fn in_list(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    boolean(membership(args, "in")?)
}

fn not_in_list(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    boolean(!membership(args, "notin")?)
}

fn coalesce(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    args.iter()
        .find_map(|arg| match arg {
            Some(ExprValue::Term(term)) => Some(term.clone()),
            _ => None,
        })
        .ok_or_else(|| EvaluationError::Unbound("coalesce".to_string()))
}

fn if_then_else(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 3, "if")?;
    let branch = if_branch(&args[..1])?;
    Ok(term(args, branch, "if")?.clone())
}

/// Argument index IF selects from its condition: 1 (then) or 2 (else)
pub(super) fn if_branch(condition: &[Option<ExprValue>]) -> EvalResult<usize> {
    let condition = term(condition, 0, "if")?;
    match condition.effective_boolean_value() {
        Some(true) => Ok(1),
        Some(false) => Ok(2),
        None => Err(mismatch("if", "a value with a boolean meaning", condition)),
    }
}

/// Evaluated argument as a single bound term
pub(super) fn expect_term(value: Option<ExprValue>, function: &str) -> EvalResult<Term> {
    let args = [value];
    term(&args, 0, function).cloned()
}

// ============================================================================
// Term tests and constructors
// ============================================================================

fn is_iri(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "isiri")?;
    boolean(term(args, 0, "isiri")?.is_iri())
}

/// Blank nodes are carried as variables
fn is_blank(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "isblank")?;
    boolean(term(args, 0, "isblank")?.is_variable())
}

fn is_literal(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "isliteral")?;
    boolean(term(args, 0, "isliteral")?.is_literal())
}

fn is_numeric(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "isnumeric")?;
    boolean(term(args, 0, "isnumeric")?.is_numeric())
}

fn to_str(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "str")?;
    match term(args, 0, "str")? {
        Term::Iri(iri) => simple(iri.as_str()),
        Term::Literal(lit) => simple(lit.value()),
        other => Err(mismatch("str", "an IRI or literal", other)),
    }
}

fn lang(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "lang")?;
    simple(literal(args, 0, "lang")?.language().unwrap_or(""))
}

fn datatype(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "datatype")?;
    let lit = literal(args, 0, "datatype")?;
    let datatype = match lit.datatype() {
        Some(datatype) => datatype.clone(),
        None => NamedNode::new_unchecked(lit.datatype_iri()),
    };
    Ok(Term::Iri(datatype))
}

fn to_iri(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "iri")?;
    match term(args, 0, "iri")? {
        Term::Iri(iri) => Ok(Term::Iri(iri.clone())),
        Term::Literal(lit) => Ok(Term::Iri(NamedNode::new(lit.value())?)),
        other => Err(mismatch("iri", "an IRI or literal", other)),
    }
}

fn strdt(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 2, "strdt")?;
    let lexical = string_literal(args, 0, "strdt")?.value();
    let datatype = match term(args, 1, "strdt")? {
        Term::Iri(iri) => iri.clone(),
        other => return Err(mismatch("strdt", "a datatype IRI", other)),
    };
    Ok(Literal::new(lexical, Some(datatype), None)?.into())
}

fn strlang(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 2, "strlang")?;
    let lexical = string_literal(args, 0, "strlang")?.value();
    let language = literal(args, 1, "strlang")?.value();
    Ok(Literal::new_language_tagged_literal(lexical, language)?.into())
}

fn uuid(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 0, "uuid")?;
    Ok(Term::Iri(NamedNode::new(&format!("urn:uuid:{}", Uuid::new_v4()))?))
}

fn struuid(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 0, "struuid")?;
    simple(Uuid::new_v4().to_string())
}

// ============================================================================
// String functions
// ============================================================================

fn strlen(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "strlen")?;
    let s = string_literal(args, 0, "strlen")?.value();
    Ok(Literal::integer(s.chars().count() as i64).into())
}

/// 1-based start; a start below 1 (before rounding) is an error rather than clamped
fn substr(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity_range(args, 2, 3, "substr")?;
    let source = string_literal(args, 0, "substr")?;
    let (start, _) = numeric(args, 1, "substr")?;
    if start.is_nan() || start < 1.0 {
        return Err(EvaluationError::InvalidArgument {
            function: "substr".to_string(),
            message: format!("starting index {} is below 1", start),
        });
    }
    let length = match args.len() {
        3 => numeric(args, 2, "substr")?.0.round().max(0.0) as usize,
        _ => usize::MAX,
    };

    let skip = start.round() as usize - 1;
    let result: String = source.value().chars().skip(skip).take(length).collect();
    Ok(source.with_lexical(result).into())
}

fn ucase(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "ucase")?;
    let source = string_literal(args, 0, "ucase")?;
    Ok(source.with_lexical(source.value().to_uppercase()).into())
}

fn lcase(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "lcase")?;
    let source = string_literal(args, 0, "lcase")?;
    Ok(source.with_lexical(source.value().to_lowercase()).into())
}

fn string_pair<'v>(
    args: &'v [Option<ExprValue>],
    function: &str,
) -> EvalResult<(&'v Literal, &'v str)> {
    check_arity(args, 2, function)?;
    Ok((
        string_literal(args, 0, function)?,
        string_literal(args, 1, function)?.value(),
    ))
}

fn strstarts(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    let (source, token) = string_pair(args, "strstarts")?;
    boolean(source.value().starts_with(token))
}

fn strends(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    let (source, token) = string_pair(args, "strends")?;
    boolean(source.value().ends_with(token))
}

fn contains(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    let (source, token) = string_pair(args, "contains")?;
    boolean(source.value().contains(token))
}

fn strbefore(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    let (source, token) = string_pair(args, "strbefore")?;
    match source.value().find(token) {
        Some(pos) => Ok(source.with_lexical(&source.value()[..pos]).into()),
        None => simple(""),
    }
}

fn strafter(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    let (source, token) = string_pair(args, "strafter")?;
    match source.value().find(token) {
        Some(pos) => Ok(source.with_lexical(&source.value()[pos + token.len()..]).into()),
        None => simple(""),
    }
}

fn encode_for_uri(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "encode_for_uri")?;
    let s = literal(args, 0, "encode_for_uri")?.value();
    simple(utf8_percent_encode(s, URI_UNRESERVED).to_string())
}

/// Keeps the language tag only when every part shares it
fn concat(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    let parts = (0..args.len())
        .map(|i| string_literal(args, i, "concat"))
        .collect::<EvalResult<Vec<_>>>()?;
    let joined: String = parts.iter().map(|lit| lit.value()).collect();

    match parts.split_first() {
        Some((first, rest))
            if rest.iter().all(|lit| {
                lit.language() == first.language() && lit.datatype_iri() == first.datatype_iri()
            }) =>
        {
            Ok(first.with_lexical(joined).into())
        }
        _ => simple(joined),
    }
}

/// RFC 4647 basic filtering
fn langmatches(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 2, "langmatches")?;
    let tag = literal(args, 0, "langmatches")?.value().to_lowercase();
    let range = literal(args, 1, "langmatches")?.value().to_lowercase();

    let matched = if range == "*" {
        !tag.is_empty()
    } else {
        tag == range
            || (tag.starts_with(&range) && tag[range.len()..].starts_with('-'))
    };
    boolean(matched)
}

/// Compile a pattern with XPath flags, reusing the thread-local cache
fn cached_regex(pattern: &str, flags: &str, function: &str) -> EvalResult<Regex> {
    let key = (pattern.to_string(), flags.to_string());
    if let Some(re) = REGEX_CACHE.with(|cache| cache.borrow_mut().get(&key).cloned()) {
        return Ok(re);
    }

    let invalid = |message: String| EvaluationError::InvalidArgument {
        function: function.to_string(),
        message,
    };
    let source = if flags.contains('q') {
        regex::escape(pattern)
    } else {
        pattern.to_string()
    };
    let mut builder = RegexBuilder::new(&source);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'q' => {}
            c => return Err(invalid(format!("unknown regex flag '{}'", c))),
        }
    }
    let re = builder
        .build()
        .map_err(|e| invalid(format!("invalid pattern: {}", e)))?;

    REGEX_CACHE.with(|cache| cache.borrow_mut().put(key, re.clone()));
    Ok(re)
}

fn optional_flags<'v>(
    args: &'v [Option<ExprValue>],
    index: usize,
    function: &str,
) -> EvalResult<&'v str> {
    if args.len() > index {
        Ok(literal(args, index, function)?.value())
    } else {
        Ok("")
    }
}

fn regex(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity_range(args, 2, 3, "regex")?;
    let text = string_literal(args, 0, "regex")?.value();
    let pattern = literal(args, 1, "regex")?.value();
    let flags = optional_flags(args, 2, "regex")?;
    boolean(cached_regex(pattern, flags, "regex")?.is_match(text))
}

fn replace(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity_range(args, 3, 4, "replace")?;
    let source = string_literal(args, 0, "replace")?;
    let pattern = literal(args, 1, "replace")?.value();
    let replacement = literal(args, 2, "replace")?.value();
    let flags = optional_flags(args, 3, "replace")?;

    let re = cached_regex(pattern, flags, "replace")?;
    let replaced = re.replace_all(source.value(), replacement).into_owned();
    Ok(source.with_lexical(replaced).into())
}

// ============================================================================
// Numeric functions
// ============================================================================

fn numeric_map(
    args: &[Option<ExprValue>],
    function: &str,
    f: fn(f64) -> f64,
) -> EvalResult<Term> {
    check_arity(args, 1, function)?;
    let (value, numeric_type) = numeric(args, 0, function)?;
    Ok(Literal::numeric(f(value), numeric_type).into())
}

fn abs(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    numeric_map(args, "abs", f64::abs)
}

/// Halves round towards positive infinity
fn round(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    numeric_map(args, "round", |v| (v + 0.5).floor())
}

fn ceil(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    numeric_map(args, "ceil", f64::ceil)
}

fn floor(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    numeric_map(args, "floor", f64::floor)
}

fn rand(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 0, "rand")?;
    Ok(Literal::double(rand::random::<f64>()).into())
}

// ============================================================================
// Date functions
// ============================================================================

fn now(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 0, "now")?;
    Ok(Literal::date_time(Utc::now().fixed_offset()).into())
}

fn date_part(
    args: &[Option<ExprValue>],
    function: &str,
    part: fn(&DateTime<FixedOffset>) -> i64,
) -> EvalResult<Term> {
    check_arity(args, 1, function)?;
    Ok(Literal::integer(part(date(args, 0, function)?)).into())
}

fn year(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    date_part(args, "year", |d| d.year() as i64)
}

fn month(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    date_part(args, "month", |d| d.month() as i64)
}

fn day(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    date_part(args, "day", |d| d.day() as i64)
}

fn hours(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    date_part(args, "hours", |d| d.hour() as i64)
}

fn minutes(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    date_part(args, "minutes", |d| d.minute() as i64)
}

fn seconds(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "seconds")?;
    let d = date(args, 0, "seconds")?;
    let value = d.second() as f64 + d.nanosecond() as f64 / 1e9;
    Ok(Literal::decimal(value).into())
}

/// Offset from UTC in hours
fn tz(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    check_arity(args, 1, "tz")?;
    let offset_minutes = date(args, 0, "tz")?.offset().local_minus_utc() / 60;
    let hours = offset_minutes as f64 / 60.0;
    let numeric_type = if hours.fract() == 0.0 {
        NumericType::Integer
    } else {
        NumericType::Decimal
    };
    Ok(Literal::numeric(hours, numeric_type).into())
}

// ============================================================================
// Hash functions
// ============================================================================

fn digest<D: Digest>(args: &[Option<ExprValue>], function: &str) -> EvalResult<Term> {
    check_arity(args, 1, function)?;
    let s = literal(args, 0, function)?.value();
    Ok(Literal::hex_binary(D::digest(s.as_bytes()).as_slice()).into())
}

fn md5(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    digest::<Md5>(args, "md5")
}

fn sha1(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    digest::<Sha1>(args, "sha1")
}

fn sha256(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    digest::<Sha256>(args, "sha256")
}

fn sha384(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    digest::<Sha384>(args, "sha384")
}

fn sha512(args: &[Option<ExprValue>]) -> EvalResult<Term> {
    digest::<Sha512>(args, "sha512")
}

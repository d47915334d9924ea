//! RDF literal values
//!
//! A literal keeps its lexical form, its datatype IRI (or language tag) and a
//! decoded [`LiteralKind`] chosen from the datatype on construction:
//!
//! - integer / decimal / float / double and the derived integer types → `Numeric`
//! - `xsd:boolean` → `Boolean`
//! - `xsd:dateTime`, `dateTimeStamp`, `date`, `time`, `duration` → `Date`
//! - `xsd:hexBinary`, `base64Binary` → `Buffer`
//! - anything else → `String` (datatype and language tag kept verbatim)
//!
//! Numeric, Boolean and Date literals support `+ - * /` with the cross-kind
//! coercions below. String only concatenates with another String.
//!
//! | left    | right            | result                                   |
//! |---------|------------------|------------------------------------------|
//! | Numeric | Numeric, Boolean | Numeric (boolean as 0/1)                 |
//! | Boolean | Boolean, Numeric | Boolean: `+` AND, `-` OR, `* /` equals 1 |
//! | Date    | Date, Numeric    | Date from epoch-millisecond arithmetic   |
//! | Date    | Boolean          | Date shifted by 0/1 second (`+ -` only)  |
//! | String  | String           | String concatenation (`+` only)          |

use super::namespace::{rdf, xsd};
use super::types::{NamedNode, NativeValue, RdfError, RdfResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Arithmetic operator applied between two literals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        };
        write!(f, "{}", symbol)
    }
}

/// A literal arithmetic combination that is not allowed
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot compute {left} {operator} {right}")]
pub struct LiteralOperationError {
    /// RDF serialization of the left operand
    pub left: String,
    /// RDF serialization of the right operand
    pub right: String,
    /// Attempted operator
    pub operator: ArithmeticOp,
}

/// Numeric type promotion lattice: integer < decimal < float < double
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumericType {
    Integer,
    Decimal,
    Float,
    Double,
}

impl NumericType {
    /// Map a numeric datatype IRI to its promotion class
    pub fn from_datatype(iri: &str) -> Option<Self> {
        match iri {
            xsd::INTEGER | xsd::BYTE | xsd::SHORT | xsd::INT | xsd::LONG
            | xsd::UNSIGNED_BYTE | xsd::UNSIGNED_SHORT | xsd::UNSIGNED_INT
            | xsd::UNSIGNED_LONG | xsd::POSITIVE_INTEGER | xsd::NEGATIVE_INTEGER
            | xsd::NON_POSITIVE_INTEGER | xsd::NON_NEGATIVE_INTEGER => Some(NumericType::Integer),
            xsd::DECIMAL => Some(NumericType::Decimal),
            xsd::FLOAT => Some(NumericType::Float),
            xsd::DOUBLE => Some(NumericType::Double),
            _ => None,
        }
    }

    /// Canonical datatype IRI for results of this type
    pub fn datatype(self) -> &'static str {
        match self {
            NumericType::Integer => xsd::INTEGER,
            NumericType::Decimal => xsd::DECIMAL,
            NumericType::Float => xsd::FLOAT,
            NumericType::Double => xsd::DOUBLE,
        }
    }

    /// Canonical lexical form of `value` for this type
    pub fn format(self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_string();
        }
        if value.is_infinite() {
            return if value > 0.0 { "INF" } else { "-INF" }.to_string();
        }
        match self {
            NumericType::Integer if value.fract() == 0.0 && value.abs() < 9.0e15 => {
                format!("{}", value as i64)
            }
            NumericType::Integer => format!("{}", value),
            NumericType::Decimal => {
                let s = format!("{}", value);
                if s.contains('.') {
                    s
                } else {
                    format!("{}.0", s)
                }
            }
            NumericType::Float | NumericType::Double => format!("{:E}", value),
        }
    }

    fn parse(self, lexical: &str) -> Option<f64> {
        let s = lexical.trim();
        match self {
            NumericType::Integer => {
                let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                s.parse().ok()
            }
            NumericType::Decimal => {
                let body = s.strip_prefix(['+', '-']).unwrap_or(s);
                let valid = body.bytes().any(|b| b.is_ascii_digit())
                    && body.bytes().all(|b| b.is_ascii_digit() || b == b'.')
                    && body.bytes().filter(|&b| b == b'.').count() <= 1;
                if !valid {
                    return None;
                }
                s.parse().ok()
            }
            NumericType::Float | NumericType::Double => match s {
                "INF" | "+INF" => Some(f64::INFINITY),
                "-INF" => Some(f64::NEG_INFINITY),
                "NaN" => Some(f64::NAN),
                _ => {
                    let valid = s.bytes().any(|b| b.is_ascii_digit())
                        && s.bytes().all(|b| {
                            b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-')
                        });
                    if valid {
                        s.parse().ok()
                    } else {
                        None
                    }
                }
            },
        }
    }
}

/// Source encoding of a binary literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryEncoding {
    Hex,
    Base64,
}

/// Decoded literal kind
#[derive(Debug, Clone)]
pub enum LiteralKind {
    Numeric {
        value: f64,
        numeric_type: NumericType,
    },
    String,
    Boolean(bool),
    Date(DateTime<FixedOffset>),
    Buffer {
        bytes: Vec<u8>,
        encoding: BinaryEncoding,
    },
}

/// RDF literal value
#[derive(Debug, Clone)]
pub struct Literal {
    lexical: String,
    datatype: Option<NamedNode>,
    language: Option<String>,
    kind: LiteralKind,
}

impl Literal {
    /// Build a literal from its lexical form and optional datatype or language tag.
    ///
    /// A language tag wins over a datatype. Fails when the lexical form is not
    /// valid for a dispatched datatype or the language tag is malformed.
    pub fn new(
        lexical: impl Into<String>,
        datatype: Option<NamedNode>,
        language: Option<&str>,
    ) -> RdfResult<Self> {
        let lexical = lexical.into();
        if let Some(language) = language {
            return Self::new_language_tagged_literal(lexical, language);
        }
        match datatype {
            Some(datatype) => {
                let kind = decode(&lexical, datatype.as_str())?;
                Ok(Self {
                    lexical,
                    datatype: Some(datatype),
                    language: None,
                    kind,
                })
            }
            None => Ok(Self::new_simple_literal(lexical)),
        }
    }

    /// Create a typed literal from a datatype IRI string
    pub fn new_typed_literal(lexical: impl Into<String>, datatype: &str) -> RdfResult<Self> {
        Self::new(lexical, Some(NamedNode::new(datatype)?), None)
    }

    /// Create a simple literal (plain string)
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self {
            lexical: value.into(),
            datatype: None,
            language: None,
            kind: LiteralKind::String,
        }
    }

    /// Create a literal with language tag
    pub fn new_language_tagged_literal(
        value: impl Into<String>,
        language: &str,
    ) -> RdfResult<Self> {
        let value = value.into();
        let checked = oxrdf::Literal::new_language_tagged_literal(value.clone(), language)
            .map_err(|e| RdfError::InvalidLanguageTag(format!("{}: {}", language, e)))?;
        Ok(Self {
            lexical: value,
            datatype: None,
            language: checked.language().map(str::to_string),
            kind: LiteralKind::String,
        })
    }

    /// Numeric literal of the given promotion class
    pub fn numeric(value: f64, numeric_type: NumericType) -> Self {
        Self {
            lexical: numeric_type.format(value),
            datatype: Some(NamedNode::new_unchecked(numeric_type.datatype())),
            language: None,
            kind: LiteralKind::Numeric {
                value,
                numeric_type,
            },
        }
    }

    /// `xsd:integer` literal
    pub fn integer(value: i64) -> Self {
        Self::numeric(value as f64, NumericType::Integer)
    }

    /// `xsd:decimal` literal
    pub fn decimal(value: f64) -> Self {
        Self::numeric(value, NumericType::Decimal)
    }

    /// `xsd:double` literal
    pub fn double(value: f64) -> Self {
        Self::numeric(value, NumericType::Double)
    }

    /// `xsd:boolean` literal
    pub fn boolean(value: bool) -> Self {
        Self {
            lexical: value.to_string(),
            datatype: Some(NamedNode::new_unchecked(xsd::BOOLEAN)),
            language: None,
            kind: LiteralKind::Boolean(value),
        }
    }

    /// `xsd:dateTime` literal
    pub fn date_time(value: DateTime<FixedOffset>) -> Self {
        Self {
            lexical: value.to_rfc3339(),
            datatype: Some(NamedNode::new_unchecked(xsd::DATE_TIME)),
            language: None,
            kind: LiteralKind::Date(value),
        }
    }

    /// `xsd:hexBinary` literal
    pub fn hex_binary(bytes: &[u8]) -> Self {
        Self {
            lexical: hex::encode(bytes),
            datatype: Some(NamedNode::new_unchecked(xsd::HEX_BINARY)),
            language: None,
            kind: LiteralKind::Buffer {
                bytes: bytes.to_vec(),
                encoding: BinaryEncoding::Hex,
            },
        }
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        &self.lexical
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Get the explicit datatype, if one was given
    pub fn datatype(&self) -> Option<&NamedNode> {
        self.datatype.as_ref()
    }

    /// Effective datatype IRI: the explicit one, else `rdf:langString` for
    /// tagged literals, else `xsd:string`
    pub fn datatype_iri(&self) -> &str {
        match (&self.datatype, &self.language) {
            (Some(datatype), _) => datatype.as_str(),
            (None, Some(_)) => rdf::LANG_STRING,
            (None, None) => xsd::STRING,
        }
    }

    /// Get the decoded kind
    pub fn kind(&self) -> &LiteralKind {
        &self.kind
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, LiteralKind::Numeric { .. })
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind, LiteralKind::String)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.kind, LiteralKind::Boolean(_))
    }

    pub fn is_date(&self) -> bool {
        matches!(self.kind, LiteralKind::Date(_))
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self.kind, LiteralKind::Buffer { .. })
    }

    /// Numeric value, if this is a Numeric literal
    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            LiteralKind::Numeric { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Numeric value with its promotion class
    pub fn as_numeric(&self) -> Option<(f64, NumericType)> {
        match self.kind {
            LiteralKind::Numeric {
                value,
                numeric_type,
            } => Some((value, numeric_type)),
            _ => None,
        }
    }

    /// Boolean value, if this is a Boolean literal
    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            LiteralKind::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Point in time, if this is a Date literal
    pub fn as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match &self.kind {
            LiteralKind::Date(d) => Some(d),
            _ => None,
        }
    }

    /// A String literal with the same language tag / datatype and a new lexical form.
    /// Non-string literals produce a simple literal.
    pub fn with_lexical(&self, lexical: impl Into<String>) -> Literal {
        match self.kind {
            LiteralKind::String => Literal {
                lexical: lexical.into(),
                datatype: self.datatype.clone(),
                language: self.language.clone(),
                kind: LiteralKind::String,
            },
            _ => Literal::new_simple_literal(lexical),
        }
    }

    /// RDF text serialization (N-Triples style)
    pub fn to_rdf(&self) -> String {
        let escaped = escape_lexical(&self.lexical);
        match (&self.language, &self.datatype) {
            (Some(lang), _) => format!("\"{}\"@{}", escaped, lang),
            (None, Some(datatype)) => format!("\"{}\"^^<{}>", escaped, datatype.as_str()),
            (None, None) => format!("\"{}\"", escaped),
        }
    }

    /// Coerced host value
    pub fn to_native(&self) -> NativeValue {
        match &self.kind {
            LiteralKind::Numeric { value, .. } => NativeValue::Number(*value),
            LiteralKind::String => NativeValue::String(self.lexical.clone()),
            LiteralKind::Boolean(b) => NativeValue::Boolean(*b),
            LiteralKind::Date(d) => NativeValue::Date(*d),
            LiteralKind::Buffer { bytes, .. } => NativeValue::Bytes(bytes.clone()),
        }
    }

    /// SPARQL effective boolean value; `None` for kinds that have none
    pub fn effective_boolean_value(&self) -> Option<bool> {
        match &self.kind {
            LiteralKind::Boolean(b) => Some(*b),
            LiteralKind::Numeric { value, .. } => Some(*value != 0.0 && !value.is_nan()),
            LiteralKind::String => Some(!self.lexical.is_empty()),
            LiteralKind::Date(_) | LiteralKind::Buffer { .. } => None,
        }
    }

    /// Kind-aware equality; literals of different kinds compare by RDF text
    pub fn equals(&self, other: &Literal) -> bool {
        match (&self.kind, &other.kind) {
            (LiteralKind::Numeric { value: a, .. }, LiteralKind::Numeric { value: b, .. }) => a == b,
            (LiteralKind::String, LiteralKind::String) => {
                self.lexical == other.lexical
                    && self.language == other.language
                    && self.datatype_iri() == other.datatype_iri()
            }
            (LiteralKind::Boolean(a), LiteralKind::Boolean(b)) => a == b,
            (LiteralKind::Date(a), LiteralKind::Date(b)) => a == b,
            (LiteralKind::Buffer { bytes: a, .. }, LiteralKind::Buffer { bytes: b, .. }) => a == b,
            _ => self.to_rdf() == other.to_rdf(),
        }
    }

    /// Kind-aware ordering; literals of different kinds compare by RDF text
    pub fn compare(&self, other: &Literal) -> Ordering {
        match (&self.kind, &other.kind) {
            (LiteralKind::Numeric { value: a, .. }, LiteralKind::Numeric { value: b, .. }) => {
                a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b))
            }
            (LiteralKind::String, LiteralKind::String) => self
                .lexical
                .cmp(&other.lexical)
                .then_with(|| self.language.cmp(&other.language))
                .then_with(|| self.datatype_iri().cmp(other.datatype_iri())),
            (LiteralKind::Boolean(a), LiteralKind::Boolean(b)) => a.cmp(b),
            (LiteralKind::Date(a), LiteralKind::Date(b)) => a.cmp(b),
            (LiteralKind::Buffer { bytes: a, .. }, LiteralKind::Buffer { bytes: b, .. }) => a.cmp(b),
            _ => self.to_rdf().cmp(&other.to_rdf()),
        }
    }

    pub fn add(&self, other: &Literal) -> Result<Literal, LiteralOperationError> {
        self.apply(ArithmeticOp::Add, other)
    }

    pub fn subtract(&self, other: &Literal) -> Result<Literal, LiteralOperationError> {
        self.apply(ArithmeticOp::Subtract, other)
    }

    pub fn multiply(&self, other: &Literal) -> Result<Literal, LiteralOperationError> {
        self.apply(ArithmeticOp::Multiply, other)
    }

    pub fn divide(&self, other: &Literal) -> Result<Literal, LiteralOperationError> {
        self.apply(ArithmeticOp::Divide, other)
    }

    /// Apply an arithmetic operator following the literal coercion table
    pub fn apply(&self, op: ArithmeticOp, other: &Literal) -> Result<Literal, LiteralOperationError> {
        match &self.kind {
            LiteralKind::Numeric {
                value,
                numeric_type,
            } => self.numeric_op(*value, *numeric_type, op, other),
            LiteralKind::String => match (op, &other.kind) {
                (ArithmeticOp::Add, LiteralKind::String) => Ok(Literal::new_simple_literal(
                    format!("{}{}", self.lexical, other.lexical),
                )),
                _ => Err(self.operation_error(op, other)),
            },
            LiteralKind::Boolean(b) => self.boolean_op(*b, op, other),
            LiteralKind::Date(d) => self.date_op(d, op, other),
            LiteralKind::Buffer { .. } => Err(self.operation_error(op, other)),
        }
    }

    fn numeric_op(
        &self,
        left: f64,
        left_type: NumericType,
        op: ArithmeticOp,
        other: &Literal,
    ) -> Result<Literal, LiteralOperationError> {
        let (right, right_type) = match other.kind {
            LiteralKind::Numeric {
                value,
                numeric_type,
            } => (value, numeric_type),
            LiteralKind::Boolean(b) => (if b { 1.0 } else { 0.0 }, NumericType::Integer),
            _ => return Err(self.operation_error(op, other)),
        };

        let widest = left_type.max(right_type);
        let result_type = match op {
            ArithmeticOp::Divide if widest == NumericType::Integer => NumericType::Decimal,
            _ => widest,
        };
        if op == ArithmeticOp::Divide && right == 0.0 && result_type <= NumericType::Decimal {
            return Err(self.operation_error(op, other));
        }

        let value = match op {
            ArithmeticOp::Add => left + right,
            ArithmeticOp::Subtract => left - right,
            ArithmeticOp::Multiply => left * right,
            ArithmeticOp::Divide => left / right,
        };
        Ok(Literal::numeric(value, result_type))
    }

    fn boolean_op(
        &self,
        left: bool,
        op: ArithmeticOp,
        other: &Literal,
    ) -> Result<Literal, LiteralOperationError> {
        let (right, right_number) = match other.kind {
            LiteralKind::Boolean(b) => (b, if b { 1.0 } else { 0.0 }),
            LiteralKind::Numeric { value, .. } => (value == 1.0, value),
            _ => return Err(self.operation_error(op, other)),
        };
        let left_number = if left { 1.0 } else { 0.0 };

        let result = match op {
            ArithmeticOp::Add => left && right,
            ArithmeticOp::Subtract => left || right,
            ArithmeticOp::Multiply => left_number * right_number == 1.0,
            ArithmeticOp::Divide => left_number / right_number == 1.0,
        };
        Ok(Literal::boolean(result))
    }

    fn date_op(
        &self,
        left: &DateTime<FixedOffset>,
        op: ArithmeticOp,
        other: &Literal,
    ) -> Result<Literal, LiteralOperationError> {
        let left_ms = left.timestamp_millis() as f64;
        let right_ms = match (&other.kind, op) {
            (LiteralKind::Date(d), _) => d.timestamp_millis() as f64,
            (LiteralKind::Numeric { value, .. }, _) => *value,
            (LiteralKind::Boolean(b), ArithmeticOp::Add | ArithmeticOp::Subtract) => {
                if *b {
                    1000.0
                } else {
                    0.0
                }
            }
            _ => return Err(self.operation_error(op, other)),
        };

        let millis = match op {
            ArithmeticOp::Add => left_ms + right_ms,
            ArithmeticOp::Subtract => left_ms - right_ms,
            ArithmeticOp::Multiply => left_ms * right_ms,
            ArithmeticOp::Divide => left_ms / right_ms,
        };
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return Err(self.operation_error(op, other));
        }

        Utc.timestamp_millis_opt(millis.round() as i64)
            .single()
            .map(|dt| Literal::date_time(dt.with_timezone(left.offset())))
            .ok_or_else(|| self.operation_error(op, other))
    }

    fn operation_error(&self, operator: ArithmeticOp, other: &Literal) -> LiteralOperationError {
        LiteralOperationError {
            left: self.to_rdf(),
            right: other.to_rdf(),
            operator,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rdf())
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

/// Escape a lexical form for the quoted RDF text syntax
pub(crate) fn escape_lexical(lexical: &str) -> String {
    let mut escaped = String::with_capacity(lexical.len());
    for c in lexical.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn decode(lexical: &str, datatype: &str) -> RdfResult<LiteralKind> {
    let invalid = || RdfError::InvalidLiteral(format!("\"{}\" is not a valid <{}>", lexical, datatype));

    if let Some(numeric_type) = NumericType::from_datatype(datatype) {
        let value = numeric_type.parse(lexical).ok_or_else(invalid)?;
        return Ok(LiteralKind::Numeric {
            value,
            numeric_type,
        });
    }

    match datatype {
        xsd::BOOLEAN => match lexical.trim() {
            "true" | "1" => Ok(LiteralKind::Boolean(true)),
            "false" | "0" => Ok(LiteralKind::Boolean(false)),
            _ => Err(invalid()),
        },
        xsd::DATE_TIME | xsd::DATE_TIME_STAMP => {
            parse_date_time(lexical.trim()).map(LiteralKind::Date).ok_or_else(invalid)
        }
        xsd::DATE => parse_date(lexical.trim()).map(LiteralKind::Date).ok_or_else(invalid),
        xsd::TIME => parse_time(lexical.trim()).map(LiteralKind::Date).ok_or_else(invalid),
        xsd::DURATION => parse_duration_millis(lexical.trim())
            .and_then(|ms| Utc.timestamp_millis_opt(ms.round() as i64).single())
            .map(|dt| LiteralKind::Date(dt.fixed_offset()))
            .ok_or_else(invalid),
        xsd::HEX_BINARY => hex::decode(lexical.trim())
            .map(|bytes| LiteralKind::Buffer {
                bytes,
                encoding: BinaryEncoding::Hex,
            })
            .map_err(|_| invalid()),
        xsd::BASE64_BINARY => BASE64
            .decode(lexical.trim())
            .map(|bytes| LiteralKind::Buffer {
                bytes,
                encoding: BinaryEncoding::Base64,
            })
            .map_err(|_| invalid()),
        _ => Ok(LiteralKind::String),
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    match s {
        "" | "Z" => FixedOffset::east_opt(0),
        _ => {
            let sign = match s.as_bytes().first()? {
                b'+' => 1,
                b'-' => -1,
                _ => return None,
            };
            let (hours, minutes) = s.get(1..)?.split_once(':')?;
            let seconds = hours.parse::<i32>().ok()? * 3600 + minutes.parse::<i32>().ok()? * 60;
            FixedOffset::east_opt(sign * seconds)
        }
    }
}

fn parse_date_time(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Some(FixedOffset::east_opt(0)?.from_utc_datetime(&naive))
}

fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let date = NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()?;
    let offset = parse_offset(s.get(10..)?)?;
    offset.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single()
}

fn parse_time(s: &str) -> Option<DateTime<FixedOffset>> {
    let split = s
        .char_indices()
        .skip(8)
        .find(|(_, c)| matches!(c, 'Z' | '+' | '-'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let time = NaiveTime::parse_from_str(&s[..split], "%H:%M:%S%.f").ok()?;
    let offset = parse_offset(&s[split..])?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    offset.from_local_datetime(&epoch.and_time(time)).single()
}

/// Approximate an ISO 8601 duration as milliseconds (year = 365 days, month = 30 days)
fn parse_duration_millis(s: &str) -> Option<f64> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let body = body.strip_prefix('P')?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    let mut millis = 0.0;
    let mut seen = false;
    let mut number = String::new();
    for c in date_part.chars() {
        let unit = match c {
            '0'..='9' | '.' => {
                number.push(c);
                continue;
            }
            'Y' => 365.0 * MILLIS_PER_DAY,
            'M' => 30.0 * MILLIS_PER_DAY,
            'D' => MILLIS_PER_DAY,
            _ => return None,
        };
        millis += number.parse::<f64>().ok()? * unit;
        number.clear();
        seen = true;
    }
    if !number.is_empty() {
        return None;
    }

    if let Some(time_part) = time_part {
        if time_part.is_empty() {
            return None;
        }
        for c in time_part.chars() {
            let unit = match c {
                '0'..='9' | '.' => {
                    number.push(c);
                    continue;
                }
                'H' => 3_600_000.0,
                'M' => 60_000.0,
                'S' => 1000.0,
                _ => return None,
            };
            millis += number.parse::<f64>().ok()? * unit;
            number.clear();
            seen = true;
        }
        if !number.is_empty() {
            return None;
        }
    }

    if !seen {
        return None;
    }
    Some(if negative { -millis } else { millis })
}

//! Term text syntax
//!
//! Parses the compact forms used by expression trees and result files:
//!
//! - `?name` / `$name` variables and `_:label` blank labels (interned as variables)
//! - `<http://...>` IRIs, prefixed names (`xsd:integer`) and bare absolute IRIs
//! - `"lexical"`, `"lexical"@lang`, `"lexical"^^<datatype>`, `"lexical"^^prefix:local`
//! - bare numbers (`42`, `4.2`, `4.2e1`) and `true` / `false`
//!
//! Anything [`Term::to_rdf`] produces parses back to an equal term.

use super::literal::Literal;
use super::namespace::{xsd, NamespaceManager, PrefixError};
use super::types::{NamedNode, RdfError, Term};
use super::variable::VariableRegistry;
use thiserror::Error;

/// Term syntax errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Input matches no term form
    #[error("Unrecognized term syntax: {0}")]
    Syntax(String),

    /// Well-formed syntax with an invalid IRI, literal or language tag
    #[error(transparent)]
    Rdf(#[from] RdfError),

    /// Prefixed name with an unknown prefix
    #[error("{0}")]
    Prefix(String),
}

impl From<PrefixError> for ParseError {
    fn from(err: PrefixError) -> Self {
        ParseError::Prefix(err.to_string())
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses term strings against a variable registry and prefix table
pub struct TermParser<'a> {
    variables: &'a VariableRegistry,
    namespaces: &'a NamespaceManager,
}

impl<'a> TermParser<'a> {
    pub fn new(variables: &'a VariableRegistry, namespaces: &'a NamespaceManager) -> Self {
        Self {
            variables,
            namespaces,
        }
    }

    /// Parse one term
    pub fn parse(&self, input: &str) -> ParseResult<Term> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ParseError::Syntax(input.to_string()));
        }

        if let Some(name) = s.strip_prefix('?').or_else(|| s.strip_prefix('$')) {
            if name.is_empty() {
                return Err(ParseError::Syntax(input.to_string()));
            }
            return Ok(Term::Variable(self.variables.get_or_insert(name)));
        }
        if s.starts_with("_:") && s.len() > 2 {
            return Ok(Term::Variable(self.variables.get_or_insert(s)));
        }
        if let Some(iri) = s.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
            return Ok(Term::Iri(NamedNode::new(iri)?));
        }
        if s.starts_with('"') {
            return self.parse_literal(s).map(Term::Literal);
        }
        match s {
            "true" => return Ok(Term::Literal(Literal::boolean(true))),
            "false" => return Ok(Term::Literal(Literal::boolean(false))),
            _ => {}
        }
        if let Some(datatype) = numeric_datatype(s) {
            return Ok(Term::Literal(Literal::new_typed_literal(s, datatype)?));
        }
        self.parse_iri_name(s).map(Term::Iri)
    }

    /// Parse a literal in quoted form
    pub fn parse_literal(&self, s: &str) -> ParseResult<Literal> {
        let (lexical, rest) = split_quoted(s).ok_or_else(|| ParseError::Syntax(s.to_string()))?;

        if rest.is_empty() {
            return Ok(Literal::new_simple_literal(lexical));
        }
        if let Some(language) = rest.strip_prefix('@') {
            return Ok(Literal::new_language_tagged_literal(lexical, language)?);
        }
        if let Some(datatype) = rest.strip_prefix("^^") {
            let datatype = match datatype.strip_prefix('<').and_then(|d| d.strip_suffix('>')) {
                Some(iri) => NamedNode::new(iri)?,
                None => self.parse_iri_name(datatype)?,
            };
            return Ok(Literal::new(lexical, Some(datatype), None)?);
        }
        Err(ParseError::Syntax(s.to_string()))
    }

    /// Prefixed name, or an absolute IRI written without angle brackets
    fn parse_iri_name(&self, s: &str) -> ParseResult<NamedNode> {
        let (prefix, _) = s
            .split_once(':')
            .ok_or_else(|| ParseError::Syntax(s.to_string()))?;
        if self.namespaces.has_prefix(prefix) {
            let expanded = self.namespaces.expand(s)?;
            return Ok(NamedNode::new(&expanded)?);
        }
        NamedNode::new(s).map_err(|_| PrefixError::UnknownPrefix(prefix.to_string()).into())
    }
}

/// Split `"..."rest` into the unescaped lexical form and the suffix
fn split_quoted(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('"')?;
    let mut lexical = String::with_capacity(body.len());
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((lexical, &body[i + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    'n' => lexical.push('\n'),
                    'r' => lexical.push('\r'),
                    't' => lexical.push('\t'),
                    '"' => lexical.push('"'),
                    '\'' => lexical.push('\''),
                    '\\' => lexical.push('\\'),
                    'u' => {
                        let hex: String = (0..4).filter_map(|_| chars.next().map(|(_, h)| h)).collect();
                        let code = u32::from_str_radix(&hex, 16).ok()?;
                        lexical.push(char::from_u32(code)?);
                    }
                    _ => return None,
                }
            }
            c => lexical.push(c),
        }
    }
    None
}

/// Datatype of a bare numeric token, if it is one
fn numeric_datatype(s: &str) -> Option<&'static str> {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let first = body.chars().next()?;
    if !(first.is_ascii_digit() || first == '.') {
        return None;
    }
    if body.contains(['e', 'E']) {
        Some(xsd::DOUBLE)
    } else if body.contains('.') {
        Some(xsd::DECIMAL)
    } else {
        Some(xsd::INTEGER)
    }
}

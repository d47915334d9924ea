//! RDF namespace and prefix management
//!
//! This module handles namespace prefixes for compact IRI notation and
//! carries the vocabulary IRIs the literal model dispatches on.

use std::collections::HashMap;
use thiserror::Error;

/// XML Schema datatype IRIs
pub mod xsd {
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const BYTE: &str = "http://www.w3.org/2001/XMLSchema#byte";
    pub const SHORT: &str = "http://www.w3.org/2001/XMLSchema#short";
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    pub const UNSIGNED_BYTE: &str = "http://www.w3.org/2001/XMLSchema#unsignedByte";
    pub const UNSIGNED_SHORT: &str = "http://www.w3.org/2001/XMLSchema#unsignedShort";
    pub const UNSIGNED_INT: &str = "http://www.w3.org/2001/XMLSchema#unsignedInt";
    pub const UNSIGNED_LONG: &str = "http://www.w3.org/2001/XMLSchema#unsignedLong";
    pub const POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";
    pub const NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#negativeInteger";
    pub const NON_POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonPositiveInteger";
    pub const NON_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";

    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const DATE_TIME_STAMP: &str = "http://www.w3.org/2001/XMLSchema#dateTimeStamp";
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    pub const TIME: &str = "http://www.w3.org/2001/XMLSchema#time";
    pub const DURATION: &str = "http://www.w3.org/2001/XMLSchema#duration";

    pub const HEX_BINARY: &str = "http://www.w3.org/2001/XMLSchema#hexBinary";
    pub const BASE64_BINARY: &str = "http://www.w3.org/2001/XMLSchema#base64Binary";
}

/// RDF vocabulary IRIs
pub mod rdf {
    pub const NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

/// Prefix errors
#[derive(Error, Debug)]
pub enum PrefixError {
    /// Unknown prefix
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    /// Invalid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),
}

pub type PrefixResult<T> = Result<T, PrefixError>;

/// Namespace (prefix → IRI mapping)
#[derive(Debug, Clone)]
pub struct Namespace {
    /// Prefix
    pub prefix: String,
    /// IRI
    pub iri: String,
}

impl Namespace {
    /// Create a new namespace
    pub fn new(prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            iri: iri.into(),
        }
    }
}

/// Namespace manager with common prefixes
#[derive(Debug, Clone)]
pub struct NamespaceManager {
    /// Prefix → IRI mappings
    prefixes: HashMap<String, String>,
}

impl NamespaceManager {
    /// Create a new namespace manager with common prefixes
    pub fn new() -> Self {
        let mut mgr = Self {
            prefixes: HashMap::new(),
        };

        mgr.add_prefix("rdf", rdf::NAMESPACE);
        mgr.add_prefix("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        mgr.add_prefix("xsd", xsd::NAMESPACE);
        mgr.add_prefix("owl", "http://www.w3.org/2002/07/owl#");
        mgr.add_prefix("foaf", "http://xmlns.com/foaf/0.1/");
        mgr.add_prefix("dc", "http://purl.org/dc/elements/1.1/");
        mgr.add_prefix("dcterms", "http://purl.org/dc/terms/");

        mgr
    }

    /// Add a prefix
    pub fn add_prefix(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    /// Get IRI for a prefix
    pub fn get_iri(&self, prefix: &str) -> PrefixResult<&str> {
        self.prefixes
            .get(prefix)
            .map(|s| s.as_str())
            .ok_or_else(|| PrefixError::UnknownPrefix(prefix.to_string()))
    }

    /// Check whether a prefix is registered
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefixes.contains_key(prefix)
    }

    /// Expand a compact IRI (prefix:local) to full IRI
    pub fn expand(&self, compact_iri: &str) -> PrefixResult<String> {
        if let Some(pos) = compact_iri.find(':') {
            let prefix = &compact_iri[..pos];
            let local = &compact_iri[pos + 1..];
            let iri = self.get_iri(prefix)?;
            Ok(format!("{}{}", iri, local))
        } else {
            Err(PrefixError::InvalidIri(compact_iri.to_string()))
        }
    }

    /// Compact an IRI using the longest matching namespace
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.prefixes
            .iter()
            .filter(|(_, namespace_iri)| iri.starts_with(namespace_iri.as_str()))
            .max_by_key(|(_, namespace_iri)| namespace_iri.len())
            .map(|(prefix, namespace_iri)| format!("{}:{}", prefix, &iri[namespace_iri.len()..]))
    }

    /// Get all registered prefixes
    pub fn prefixes(&self) -> Vec<Namespace> {
        self.prefixes
            .iter()
            .map(|(prefix, iri)| Namespace::new(prefix.clone(), iri.clone()))
            .collect()
    }
}

impl Default for NamespaceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_prefixes() {
        let mgr = NamespaceManager::new();

        assert_eq!(mgr.get_iri("rdf").unwrap(), rdf::NAMESPACE);
        assert_eq!(mgr.get_iri("xsd").unwrap(), xsd::NAMESPACE);
        assert!(mgr.has_prefix("foaf"));
        assert!(!mgr.has_prefix("ex"));
    }

    #[test]
    fn test_expand_datatype() {
        let mgr = NamespaceManager::new();

        assert_eq!(mgr.expand("xsd:integer").unwrap(), xsd::INTEGER);
        assert_eq!(mgr.expand("rdf:langString").unwrap(), rdf::LANG_STRING);
        assert!(matches!(mgr.expand("nope:x"), Err(PrefixError::UnknownPrefix(_))));
        assert!(matches!(mgr.expand("no-colon"), Err(PrefixError::InvalidIri(_))));
    }

    #[test]
    fn test_compact_prefers_longest_namespace() {
        let mut mgr = NamespaceManager::new();
        mgr.add_prefix("ex", "http://example.org/");
        mgr.add_prefix("people", "http://example.org/people/");

        assert_eq!(
            mgr.compact("http://example.org/people/alice"),
            Some("people:alice".to_string())
        );
        assert_eq!(mgr.compact(xsd::DOUBLE), Some("xsd:double".to_string()));
        assert_eq!(mgr.compact("urn:isbn:123"), None);
    }
}

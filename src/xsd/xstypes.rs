use super::error::SchemaError;
use std::fmt;

pub type NCName = String;
pub type AnyURI = String;
pub type Prefix = String;

/// An expanded name: namespace URI plus local part.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace_name: Option<AnyURI>,
    pub local_name: NCName,
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace_name) = self.namespace_name.as_ref() {
            write!(f, "{{{}}}:{}", namespace_name, self.local_name)
        } else {
            write!(f, "{}", self.local_name)
        }
    }
}

impl QName {
    pub fn with_namespace(
        namespace_name: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Self {
        Self::with_optional_namespace(Some(namespace_name), local_name)
    }

    pub fn with_optional_namespace(
        namespace_name: Option<impl Into<String>>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace_name: namespace_name.map(Into::into),
            local_name: local_name.into(),
        }
    }

    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace_name: None,
            local_name: local_name.into(),
        }
    }

    pub fn qualified(
        prefix: impl AsRef<str>,
        local_name: impl Into<String>,
        context: roxmltree::Node,
    ) -> Result<Self, SchemaError> {
        let prefix = prefix.as_ref();
        let resolved_prefix = if prefix == "xml" {
            // The prefix xml is by definition bound to the namespace name
            // http://www.w3.org/XML/1998/namespace.
            // (Namespaces in XML 1.0, §3, Reserved Prefixes and Namespace Names)
            super::builtins::XML_NAMESPACE
        } else {
            context
                .lookup_namespace_uri(Some(prefix))
                .ok_or_else(|| SchemaError::NamePrefixNotResolved(prefix.into()))?
        };
        Ok(Self::with_namespace(resolved_prefix, local_name))
    }

    pub fn unqualified(local_name: impl Into<String>, context: roxmltree::Node) -> Self {
        // If there is a default namespace declaration in scope, the expanded name corresponding to
        // an unprefixed element name has the URI of the default namespace as its namespace name.
        // If there is no default namespace declaration in scope, the namespace name has no value.
        // (Namespaces in XML 1.0, §6.2)
        let namespace_name = context.lookup_namespace_uri(None);
        QName::with_optional_namespace(namespace_name, local_name)
    }

    pub fn parse(source: &str, context: roxmltree::Node) -> Result<Self, SchemaError> {
        if let Some((prefix, local)) = source.rsplit_once(':') {
            Self::qualified(prefix, local, context)
        } else {
            Ok(Self::unqualified(source, context))
        }
    }
}

/// A name as written in an instance document or address, e.g. `dc:title`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrefixedName {
    pub prefix: Option<Prefix>,
    pub local_name: NCName,
}

impl PrefixedName {
    pub fn new(prefix: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.map(Into::into).filter(|p: &String| !p.is_empty()),
            local_name: local_name.into(),
        }
    }

    pub fn unprefixed(local_name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
        }
    }

    /// Splits `prefix:local`; a name without a colon is unprefixed.
    pub fn parse(source: &str) -> Self {
        match source.split_once(':') {
            Some((prefix, local)) => Self::new(Some(prefix), local),
            None => Self::unprefixed(source),
        }
    }

    /// The name with the colon dropped, as used to derive identifiers.
    pub fn flattened(&self) -> String {
        match self.prefix.as_deref() {
            Some(prefix) => format!("{prefix}{}", self.local_name),
            None => self.local_name.clone(),
        }
    }
}

impl fmt::Display for PrefixedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix.as_deref() {
            Some(prefix) => write!(f, "{prefix}:{}", self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_name_parses_both_forms() {
        let name = PrefixedName::parse("dc:title");
        assert_eq!(name.prefix.as_deref(), Some("dc"));
        assert_eq!(name.local_name, "title");
        assert_eq!(name.to_string(), "dc:title");

        let name = PrefixedName::parse("title");
        assert_eq!(name.prefix, None);
        assert_eq!(name.to_string(), "title");
    }

    #[test]
    fn empty_prefix_is_dropped() {
        let name = PrefixedName::new(Some(""), "record");
        assert_eq!(name, PrefixedName::unprefixed("record"));
    }

    #[test]
    fn flattened_removes_colon() {
        assert_eq!(PrefixedName::parse("dc:title").flattened(), "dctitle");
    }

    #[test]
    fn qname_resolves_prefix_from_context() {
        let xml = r#"<root xmlns:dc="http://purl.org/dc/elements/1.1/"><child/></root>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let child = doc.root_element().first_element_child().unwrap();
        let name = QName::parse("dc:title", child).unwrap();
        assert_eq!(
            name,
            QName::with_namespace("http://purl.org/dc/elements/1.1/", "title")
        );
        assert!(matches!(
            QName::parse("nope:title", child),
            Err(SchemaError::NamePrefixNotResolved(prefix)) if prefix == "nope"
        ));
    }
}

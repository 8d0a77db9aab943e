use lazy_static::lazy_static;

use super::xstypes::QName;

// Namespaces used by XML Schema (pt. 1, §1.3.1)
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix used for the wildcard address segment when the schema binds none.
pub const DEFAULT_XS_PREFIX: &str = "xs";

lazy_static! {
    /// The `xs:anyType` qualified name
    pub static ref XS_ANY_TYPE_NAME: QName = QName::with_namespace(XS_NAMESPACE, "anyType");
    /// The `xs:anySimpleType` qualified name
    pub static ref XS_ANY_SIMPLE_TYPE_NAME: QName =
        QName::with_namespace(XS_NAMESPACE, "anySimpleType");
    pub static ref XS_BOOLEAN_NAME: QName = QName::with_namespace(XS_NAMESPACE, "boolean");
    pub static ref XS_LANGUAGE_NAME: QName = QName::with_namespace(XS_NAMESPACE, "language");
    pub static ref XS_STRING_NAME: QName = QName::with_namespace(XS_NAMESPACE, "string");
}

/// Built-in names live in the XSD namespace and never resolve to a user definition.
pub fn is_builtin_name(name: &QName) -> bool {
    name.namespace_name.as_deref() == Some(XS_NAMESPACE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_detection() {
        assert!(is_builtin_name(&XS_STRING_NAME));
        assert!(!is_builtin_name(&QName::with_namespace("urn:x", "string")));
        assert!(!is_builtin_name(&QName::local("string")));
    }
}

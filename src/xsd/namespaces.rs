//! Prefix ↔ namespace bindings and the two-level name resolution used to turn schema
//! names into instance names.

use super::builtins::{is_builtin_name, XML_NAMESPACE};
use super::error::SchemaError;
use super::xstypes::{AnyURI, Prefix, PrefixedName, QName};

/// Prefix bindings of one scope, in declaration order. The empty prefix is the default
/// namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceRegistry {
    bindings: Vec<(Prefix, AnyURI)>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the namespace declarations in scope at `node`.
    pub fn from_node(node: roxmltree::Node) -> Self {
        let mut registry = Self::new();
        for namespace in node.namespaces() {
            registry.register(namespace.name().unwrap_or(""), namespace.uri());
        }
        registry
    }

    /// Binds `prefix`, replacing an earlier binding of the same prefix.
    pub fn register(&mut self, prefix: impl Into<Prefix>, namespace: impl Into<AnyURI>) {
        let prefix = prefix.into();
        let namespace = namespace.into();
        match self.bindings.iter_mut().find(|(p, _)| *p == prefix) {
            Some(binding) => binding.1 = namespace,
            None => self.bindings.push((prefix, namespace)),
        }
    }

    pub fn namespace_for_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.bindings
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, ns)| ns.as_str())
    }

    /// The first prefix bound to `namespace`. An explicit prefix wins over the default
    /// binding of the same namespace.
    pub fn prefix_for_namespace(&self, namespace: &str) -> Option<&str> {
        if namespace == XML_NAMESPACE {
            return Some("xml");
        }
        let mut found = None;
        for (prefix, ns) in &self.bindings {
            if ns == namespace {
                if !prefix.is_empty() {
                    return Some(prefix.as_str());
                }
                found = Some(prefix.as_str());
            }
        }
        found
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.namespace_for_prefix("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }
}

/// The top-level bindings used for instance addresses.
#[derive(Clone, Debug)]
pub struct InstanceNamespaces {
    registry: NamespaceRegistry,
    named_default_prefix: Prefix,
    enabled: bool,
}

impl InstanceNamespaces {
    pub fn new(registry: NamespaceRegistry, named_default_prefix: impl Into<Prefix>) -> Self {
        Self {
            registry,
            named_default_prefix: named_default_prefix.into(),
            enabled: true,
        }
    }

    /// Instance names carry no prefixes at all.
    pub fn disabled() -> Self {
        Self {
            registry: NamespaceRegistry::new(),
            named_default_prefix: Prefix::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    pub fn named_default_prefix(&self) -> &str {
        &self.named_default_prefix
    }

    /// The instance prefix for `namespace`. A namespace that is only bound as the default
    /// namespace answers with the named default prefix.
    pub fn instance_prefix(&self, namespace: &str) -> Option<&str> {
        if namespace == XML_NAMESPACE {
            return Some("xml");
        }
        if !self.enabled {
            return None;
        }
        match self.registry.prefix_for_namespace(namespace)? {
            "" => Some(self.named_default_prefix.as_str()),
            prefix => Some(prefix),
        }
    }

    /// Inverse of [`Self::instance_prefix`]; used when matching instance documents.
    pub fn namespace_for_instance_prefix(&self, prefix: Option<&str>) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        match prefix {
            None => None,
            Some(prefix) if prefix == self.named_default_prefix => self
                .registry
                .namespace_for_prefix(prefix)
                .or_else(|| self.registry.default_namespace()),
            Some(prefix) => self.registry.namespace_for_prefix(prefix),
        }
    }

    /// The instance spelling of an expanded name.
    pub fn prefixed_name(&self, name: &QName) -> PrefixedName {
        let prefix = name
            .namespace_name
            .as_deref()
            .and_then(|ns| self.instance_prefix(ns));
        PrefixedName::new(prefix, name.local_name.as_str())
    }

    /// Two-level resolution of a name written inside a schema document: the prefix is looked
    /// up in `scope` (the declaring document), and the namespace found there is mapped back to
    /// the instance prefix.
    pub fn resolve_qualified_name(
        &self,
        written: &str,
        scope: &NamespaceRegistry,
    ) -> Result<PrefixedName, SchemaError> {
        let Some((prefix, local_name)) = written.split_once(':') else {
            return Ok(PrefixedName::unprefixed(written));
        };
        let namespace = scope
            .namespace_for_prefix(prefix)
            .ok_or_else(|| SchemaError::NamePrefixNotResolved(prefix.into()))?;
        let name = QName::with_namespace(namespace, local_name);
        if is_builtin_name(&name) {
            // Built-ins keep their written spelling.
            return Ok(PrefixedName::parse(written));
        }
        Ok(self.prefixed_name(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DC: &str = "http://purl.org/dc/elements/1.1/";
    const REC: &str = "urn:example:record";

    fn instance() -> InstanceNamespaces {
        let mut registry = NamespaceRegistry::new();
        registry.register("", REC);
        registry.register("dc", DC);
        InstanceNamespaces::new(registry, "rec")
    }

    #[test]
    fn default_namespace_gets_named_prefix() {
        let namespaces = instance();
        assert_eq!(namespaces.instance_prefix(REC), Some("rec"));
        assert_eq!(namespaces.instance_prefix(DC), Some("dc"));
        assert_eq!(namespaces.instance_prefix("urn:unknown"), None);
    }

    #[test]
    fn two_level_resolution_maps_schema_prefix_to_instance_prefix() {
        let mut scope = NamespaceRegistry::new();
        scope.register("elements", DC);
        let name = instance()
            .resolve_qualified_name("elements:title", &scope)
            .unwrap();
        assert_eq!(name.to_string(), "dc:title");
    }

    #[test]
    fn unresolved_schema_prefix_is_an_error() {
        let scope = NamespaceRegistry::new();
        assert!(matches!(
            instance().resolve_qualified_name("nope:title", &scope),
            Err(SchemaError::NamePrefixNotResolved(_))
        ));
    }

    #[test]
    fn builtins_are_not_requalified() {
        let mut scope = NamespaceRegistry::new();
        scope.register("xsd", super::super::builtins::XS_NAMESPACE);
        let name = instance().resolve_qualified_name("xsd:string", &scope).unwrap();
        assert_eq!(name.to_string(), "xsd:string");
    }

    #[test]
    fn disabled_namespaces_never_prefix() {
        let namespaces = InstanceNamespaces::disabled();
        let name = namespaces.prefixed_name(&QName::with_namespace(DC, "title"));
        assert_eq!(name.to_string(), "title");
    }

    #[test]
    fn explicit_prefix_wins_over_default_binding() {
        let mut registry = NamespaceRegistry::new();
        registry.register("", DC);
        registry.register("dc", DC);
        assert_eq!(registry.prefix_for_namespace(DC), Some("dc"));
    }
}

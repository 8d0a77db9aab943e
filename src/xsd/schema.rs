use std::collections::HashMap;

use roxmltree::Node;

use super::builtins::{
    is_builtin_name, XML_NAMESPACE, XS_ANY_TYPE_NAME, XS_BOOLEAN_NAME, XS_LANGUAGE_NAME,
    XS_NAMESPACE,
};
use super::components::{
    AttributeDeclaration, AttributeGroupDefinition, DocumentId, ElementDeclaration,
    ModelGroupDefinition, SchemaDocument, SimpleVariety, TypeDefinition, TypeId, TypeRef,
};
use super::error::SchemaError;
use super::import::{Import, ImportError, ImportResolver, SchemaSource};
use super::mapping_context::MappingContext;
use super::namespaces::NamespaceRegistry;
use super::xstypes::QName;

/// Bound on base-type chains followed when classifying simple types.
const MAX_DERIVATION_DEPTH: usize = 32;

/// All components of the loaded schema documents.
#[derive(Debug, Default)]
pub struct SchemaSet {
    documents: Vec<SchemaDocument>,
    types: Vec<TypeDefinition>,
    named_types: HashMap<QName, TypeId>,
    elements: HashMap<QName, ElementDeclaration>,
    element_order: Vec<QName>,
    attributes: HashMap<QName, AttributeDeclaration>,
    attribute_groups: HashMap<QName, AttributeGroupDefinition>,
    model_groups: HashMap<QName, ModelGroupDefinition>,
    substitution_groups: HashMap<QName, Vec<QName>>,
}

impl SchemaSet {
    pub fn document(&self, id: DocumentId) -> &SchemaDocument {
        &self.documents[id]
    }

    pub fn documents(&self) -> &[SchemaDocument] {
        &self.documents
    }

    pub fn type_definition(&self, id: TypeId) -> &TypeDefinition {
        &self.types[id.index()]
    }

    pub fn resolve_type_ref(&self, type_ref: &TypeRef) -> Option<TypeId> {
        match type_ref {
            TypeRef::Named(name) => self.named_types.get(name).copied(),
            TypeRef::Anonymous(id) => Some(*id),
        }
    }

    pub fn named_type(&self, name: &QName) -> Option<TypeId> {
        self.named_types.get(name).copied()
    }

    pub fn global_element(&self, name: &QName) -> Option<&ElementDeclaration> {
        self.elements.get(name)
    }

    /// Global elements in registration order.
    pub fn global_elements(&self) -> impl Iterator<Item = &ElementDeclaration> {
        self.element_order
            .iter()
            .filter_map(|name| self.elements.get(name))
    }

    pub fn global_attribute(&self, name: &QName) -> Option<&AttributeDeclaration> {
        self.attributes.get(name)
    }

    pub fn attribute_group(&self, name: &QName) -> Option<&AttributeGroupDefinition> {
        self.attribute_groups.get(name)
    }

    pub fn model_group(&self, name: &QName) -> Option<&ModelGroupDefinition> {
        self.model_groups.get(name)
    }

    /// Members registered for `head`, in registration order.
    pub fn substitution_members(&self, head: &QName) -> &[QName] {
        self.substitution_groups
            .get(head)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The type of an attribute use. References take the type of the global declaration;
    /// `xml:lang` is a language even when `xml.xsd` is not loaded.
    pub fn attribute_type(&self, attribute: &AttributeDeclaration) -> Option<TypeId> {
        if attribute.reference {
            if let Some(global) = self.global_attribute(&attribute.name) {
                return self.resolve_type_ref(&global.type_ref);
            }
            if attribute.name.namespace_name.as_deref() == Some(XML_NAMESPACE)
                && attribute.name.local_name == "lang"
            {
                return self.named_type(&XS_LANGUAGE_NAME);
            }
        }
        self.resolve_type_ref(&attribute.type_ref)
    }

    /// The enumeration facets in effect for `id`, following restriction bases.
    pub fn enumeration_of(&self, id: TypeId) -> &[String] {
        let mut current = id;
        for _ in 0..MAX_DERIVATION_DEPTH {
            let TypeDefinition::Simple(simple) = self.type_definition(current) else {
                break;
            };
            let SimpleVariety::Restriction { base, enumeration } = &simple.variety else {
                break;
            };
            if !enumeration.is_empty() {
                return enumeration;
            }
            match self.resolve_type_ref(base) {
                Some(base) => current = base,
                None => break,
            }
        }
        &[]
    }

    pub fn is_enumeration(&self, id: TypeId) -> bool {
        !self.enumeration_of(id).is_empty()
    }

    /// A union mixing enumerated and free-text members.
    pub fn is_combo_union(&self, id: TypeId) -> bool {
        let TypeDefinition::Simple(simple) = self.type_definition(id) else {
            return false;
        };
        let SimpleVariety::Union { members } = &simple.variety else {
            return false;
        };
        let members = members
            .iter()
            .filter_map(|member| self.resolve_type_ref(member))
            .collect::<Vec<_>>();
        members.iter().any(|m| self.is_enumeration(*m))
            && members.iter().any(|m| !self.is_enumeration(*m))
    }

    /// Whether `id` is, or restricts, the built-in named `builtin`.
    pub fn derives_from_builtin(&self, id: TypeId, builtin: &QName) -> bool {
        let mut current = id;
        for _ in 0..MAX_DERIVATION_DEPTH {
            match self.type_definition(current) {
                TypeDefinition::Builtin(name) => return name == builtin,
                TypeDefinition::Simple(simple) => match &simple.variety {
                    SimpleVariety::Restriction { base, .. } => match self.resolve_type_ref(base) {
                        Some(base) => current = base,
                        None => return false,
                    },
                    _ => return false,
                },
                TypeDefinition::Complex(_) => return false,
            }
        }
        false
    }

    pub fn is_language(&self, id: TypeId) -> bool {
        self.derives_from_builtin(id, &XS_LANGUAGE_NAME)
    }

    pub fn is_boolean(&self, id: TypeId) -> bool {
        matches!(
            self.type_definition(id),
            TypeDefinition::Builtin(name) if *name == *XS_BOOLEAN_NAME
        )
    }

    pub(super) fn push_type(&mut self, definition: TypeDefinition) -> TypeId {
        let id = TypeId::from_index(self.types.len());
        self.types.push(definition);
        id
    }

    pub(super) fn intern_builtin(&mut self, name: &QName) -> TypeId {
        if let Some(id) = self.named_types.get(name) {
            return *id;
        }
        let id = self.push_type(TypeDefinition::Builtin(name.clone()));
        self.named_types.insert(name.clone(), id);
        id
    }

    fn register_named_type(&mut self, name: QName, id: TypeId) {
        if self.named_types.insert(name.clone(), id).is_some() {
            tracing::warn!(%name, "type defined more than once; the last definition wins");
        }
    }

    fn register_element(&mut self, element: ElementDeclaration) {
        if let Some(head) = element.substitution_group.clone() {
            let members = self.substitution_groups.entry(head).or_default();
            if !members.contains(&element.name) {
                members.push(element.name.clone());
            }
        }
        if !self.elements.contains_key(&element.name) {
            self.element_order.push(element.name.clone());
        }
        self.elements.insert(element.name.clone(), element);
    }
}

/// Reads schema documents, following imports through the configured resolvers.
pub struct SchemaLoader<'r> {
    resolvers: &'r [Box<dyn ImportResolver>],
    allow_dtd: bool,
    set: SchemaSet,
    loaded: HashMap<String, DocumentId>,
}

impl<'r> SchemaLoader<'r> {
    pub fn new(resolvers: &'r [Box<dyn ImportResolver>]) -> Self {
        let mut set = SchemaSet::default();
        // referenced implicitly by `xml:lang` and wildcards
        set.intern_builtin(&XS_LANGUAGE_NAME);
        set.intern_builtin(&XS_ANY_TYPE_NAME);
        Self {
            resolvers,
            allow_dtd: false,
            set,
            loaded: HashMap::new(),
        }
    }

    /// Allow a XML Document Type Definition (DTD) to occur
    pub fn allow_dtd(mut self, allow_dtd: bool) -> Self {
        self.allow_dtd = allow_dtd;
        self
    }

    pub fn load(&mut self, source: SchemaSource) -> Result<DocumentId, SchemaError> {
        self.load_str(&source.text, &source.location)
    }

    pub fn load_str(&mut self, text: &str, location: &str) -> Result<DocumentId, SchemaError> {
        if let Some(id) = self.loaded.get(location) {
            return Ok(*id);
        }

        let options = roxmltree::ParsingOptions {
            allow_dtd: self.allow_dtd,
            ..roxmltree::ParsingOptions::default()
        };
        let document = roxmltree::Document::parse_with_options(text, options)?;
        let schema = document.root_element();
        let tag = schema.tag_name();
        if tag.name() != "schema" || tag.namespace() != Some(XS_NAMESPACE) {
            return Err(SchemaError::NotASchema(schema.tag_name().name().into()));
        }

        let id = self.set.documents.len();
        self.set.documents.push(SchemaDocument {
            location: location.into(),
            target_namespace: schema.attribute("targetNamespace").map(String::from),
            namespaces: NamespaceRegistry::from_node(schema),
            element_form_qualified: schema.attribute("elementFormDefault") == Some("qualified"),
        });
        self.loaded.insert(location.into(), id);
        tracing::debug!(location, "loading schema document");

        for child in schema.children().filter(Node::is_element) {
            let tag = child.tag_name().name();
            if Import::TAG_NAMES.contains(&tag) {
                self.import(child, schema, location)?;
                continue;
            }
            match tag {
                "element" => {
                    let element = MappingContext::new(&mut self.set, id).map_global_element(child)?;
                    self.set.register_element(element);
                }
                "complexType" | "simpleType" => {
                    let name = QName::with_optional_namespace(
                        self.set.documents[id].target_namespace.clone(),
                        child.attribute("name").ok_or(SchemaError::MissingAttribute {
                            element: tag.into(),
                            attribute: "name",
                        })?,
                    );
                    if is_builtin_name(&name) {
                        tracing::warn!(%name, "schema redefines a built-in type");
                    }
                    let mut context = MappingContext::new(&mut self.set, id);
                    let definition = if tag == "complexType" {
                        context.map_complex_type(child, Some(name.clone()))?
                    } else {
                        context.map_simple_type(child, Some(name.clone()))?
                    };
                    let type_id = context.register_type(definition);
                    self.set.register_named_type(name, type_id);
                }
                "attributeGroup" => {
                    let group = MappingContext::new(&mut self.set, id).map_attribute_group(child)?;
                    self.set.attribute_groups.insert(group.name.clone(), group);
                }
                "group" => {
                    let group = MappingContext::new(&mut self.set, id).map_model_group(child)?;
                    self.set.model_groups.insert(group.name.clone(), group);
                }
                "attribute" => {
                    let attribute = MappingContext::new(&mut self.set, id).map_attribute(child)?;
                    self.set.attributes.insert(attribute.name.clone(), attribute);
                }
                "annotation" | "notation" => {}
                other => tracing::debug!(tag = other, "ignoring top-level schema item"),
            }
        }

        Ok(id)
    }

    fn import(&mut self, node: Node, schema: Node, location: &str) -> Result<(), SchemaError> {
        let import = Import::map_from_xml(node, schema, location)?;
        let Some(target) = import.resolved_location() else {
            tracing::debug!(namespace = ?import.namespace, "import without schemaLocation");
            return Ok(());
        };
        if self.loaded.contains_key(&target) {
            return Ok(());
        }

        for resolver in self.resolvers {
            match resolver.resolve_import(&import) {
                Ok(source) => {
                    self.load(source)?;
                    return Ok(());
                }
                Err(ImportError::UnsupportedImport) => continue,
                Err(source) => {
                    return Err(SchemaError::Import {
                        location: target,
                        source,
                    })
                }
            }
        }
        tracing::warn!(location = %target, "no resolver supports import; skipping");
        Ok(())
    }

    pub fn finish(self) -> SchemaSet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xsd::components::{Construct, ContentModel, ElementRef};

    const RECORD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        targetNamespace="urn:record" xmlns="urn:record" elementFormDefault="qualified">
      <xs:element name="record" type="recordType"/>
      <xs:complexType name="recordType">
        <xs:sequence>
          <xs:element name="title" type="xs:string"/>
          <xs:element ref="shape" maxOccurs="unbounded"/>
        </xs:sequence>
        <xs:attribute name="id" type="xs:ID" use="required"/>
      </xs:complexType>
      <xs:element name="shape" abstract="true"/>
      <xs:element name="circle" substitutionGroup="shape" type="xs:string"/>
      <xs:element name="square" substitutionGroup="shape" type="xs:string"/>
      <xs:simpleType name="colorType">
        <xs:restriction base="xs:string">
          <xs:enumeration value="red"/>
          <xs:enumeration value="blue"/>
        </xs:restriction>
      </xs:simpleType>
      <xs:simpleType name="darkColorType">
        <xs:restriction base="colorType"/>
      </xs:simpleType>
      <xs:simpleType name="comboType">
        <xs:union memberTypes="colorType xs:string"/>
      </xs:simpleType>
    </xs:schema>"#;

    fn load() -> SchemaSet {
        let resolvers = Vec::new();
        let mut loader = SchemaLoader::new(&resolvers);
        loader.load_str(RECORD, "record.xsd").unwrap();
        loader.finish()
    }

    fn name(local: &str) -> QName {
        QName::with_namespace("urn:record", local)
    }

    #[test]
    fn loads_global_components() {
        let set = load();
        let record = set.global_element(&name("record")).unwrap();
        let type_id = set.resolve_type_ref(&record.type_ref).unwrap();
        let complex = set.type_definition(type_id).as_complex().unwrap();
        let ContentModel::Constructs(constructs) = complex.content_model() else {
            panic!("expected plain content");
        };
        assert_eq!(constructs.len(), 2);
        let Construct::Compositor(sequence) = &constructs[0] else {
            panic!("expected a sequence");
        };
        let Construct::Element(title) = &sequence.children[0] else {
            panic!("expected an element");
        };
        assert!(matches!(&title.element, ElementRef::Local(decl) if decl.name == name("title")));
    }

    #[test]
    fn substitution_members_keep_registration_order() {
        let set = load();
        assert_eq!(
            set.substitution_members(&name("shape")),
            &[name("circle"), name("square")]
        );
        assert!(set.global_element(&name("shape")).unwrap().is_abstract);
    }

    #[test]
    fn enumeration_is_inherited_through_restriction() {
        let set = load();
        let dark = set.named_type(&name("darkColorType")).unwrap();
        assert_eq!(set.enumeration_of(dark), &["red".to_string(), "blue".to_string()]);
        let combo = set.named_type(&name("comboType")).unwrap();
        assert!(set.is_combo_union(combo));
        assert!(!set.is_enumeration(combo));
    }

    #[test]
    fn rejects_non_schema_documents() {
        let resolvers = Vec::new();
        let mut loader = SchemaLoader::new(&resolvers);
        assert!(matches!(
            loader.load_str("<record/>", "bad.xsd"),
            Err(SchemaError::NotASchema(_))
        ));
    }

    #[test]
    fn same_location_loads_once() {
        let resolvers = Vec::new();
        let mut loader = SchemaLoader::new(&resolvers);
        let first = loader.load_str(RECORD, "record.xsd").unwrap();
        let second = loader.load_str(RECORD, "record.xsd").unwrap();
        assert_eq!(first, second);
        assert_eq!(loader.finish().documents().len(), 1);
    }

    struct InlineResolver;

    impl ImportResolver for InlineResolver {
        fn resolve_import(&self, import: &Import) -> Result<SchemaSource, ImportError> {
            if import.schema_location.as_deref() != Some("dc.xsd") {
                return Err(ImportError::UnsupportedImport);
            }
            Ok(SchemaSource {
                location: "dc.xsd".into(),
                text: r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                    targetNamespace="urn:dc">
                    <xs:element name="title" type="xs:string"/>
                  </xs:schema>"#
                    .into(),
            })
        }
    }

    #[test]
    fn imports_go_through_resolvers() {
        let schema = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
            targetNamespace="urn:record">
          <xs:import namespace="urn:dc" schemaLocation="dc.xsd"/>
          <xs:import namespace="urn:other" schemaLocation="other.xsd"/>
        </xs:schema>"#;
        let resolvers: Vec<Box<dyn ImportResolver>> = vec![Box::new(InlineResolver)];
        let mut loader = SchemaLoader::new(&resolvers);
        loader.load_str(schema, "record.xsd").unwrap();
        let set = loader.finish();
        assert_eq!(set.documents().len(), 2);
        assert!(set
            .global_element(&QName::with_namespace("urn:dc", "title"))
            .is_some());
    }
}

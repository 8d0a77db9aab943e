//! Mapping of XSD element information items onto the component model.

use roxmltree::Node;

use super::builtins::{is_builtin_name, XS_ANY_SIMPLE_TYPE_NAME, XS_ANY_TYPE_NAME, XS_NAMESPACE};
use super::components::{
    AttributeDeclaration, AttributeGroupDefinition, ComplexTypeDefinition, Compositor,
    CompositorDeclaration, Construct, Derivation, DerivationMethod, DocumentId,
    ElementDeclaration, ElementParticle, ElementRef, GroupReference, ModelGroupDefinition,
    SimpleTypeDefinition, SimpleVariety, TypeDefinition, TypeId, TypeRef,
};
use super::error::SchemaError;
use super::particle::Occurs;
use super::schema::SchemaSet;
use super::values::actual_value;
use super::xstypes::QName;

pub(super) struct MappingContext<'a> {
    set: &'a mut SchemaSet,
    document: DocumentId,
}

fn xs_children<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|child| child.is_element() && child.tag_name().namespace() == Some(XS_NAMESPACE))
}

fn xs_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    xs_children(node).find(|child| child.tag_name().name() == name)
}

fn required_attribute<'a>(
    node: Node<'a, '_>,
    attribute: &'static str,
) -> Result<&'a str, SchemaError> {
    node.attribute(attribute)
        .ok_or_else(|| SchemaError::MissingAttribute {
            element: node.tag_name().name().into(),
            attribute,
        })
}

impl<'a> MappingContext<'a> {
    pub(super) fn new(set: &'a mut SchemaSet, document: DocumentId) -> Self {
        Self { set, document }
    }

    fn target_namespace(&self) -> Option<String> {
        self.set.document(self.document).target_namespace.clone()
    }

    /// A named type reference; built-ins are interned so they always resolve.
    fn named_type(&mut self, name: QName) -> TypeRef {
        if is_builtin_name(&name) {
            self.set.intern_builtin(&name);
        }
        TypeRef::Named(name)
    }

    fn anonymous(&mut self, definition: TypeDefinition) -> TypeRef {
        TypeRef::Anonymous(self.set.push_type(definition))
    }

    /// Map a top-level `<element>` (§3.3.2.1)
    pub(super) fn map_global_element(
        &mut self,
        element: Node,
    ) -> Result<ElementDeclaration, SchemaError> {
        // {name}
        //   The ·actual value· of the name [attribute].
        // {target namespace}
        //   The ·actual value· of the targetNamespace [attribute] of the <schema> ancestor
        //   element information item if present, otherwise ·absent·.
        let name = QName::with_optional_namespace(
            self.target_namespace(),
            required_attribute(element, "name")?,
        );

        // {substitution group affiliations}
        //   A set of the element declarations ·resolved· to by the items in the ·actual value·
        //   of the substitutionGroup [attribute], if present, otherwise the empty set.
        let substitution_group = element
            .attribute("substitutionGroup")
            .map(|heads| actual_value::<Vec<QName>>(heads, element))
            .transpose()?
            .and_then(|heads| heads.into_iter().next());

        // {abstract}
        //   The ·actual value· of the abstract [attribute], if present, otherwise false.
        let is_abstract = element
            .attribute("abstract")
            .map(|v| actual_value::<bool>(v, element))
            .transpose()?
            .unwrap_or(false);

        let type_ref = self.map_element_type(element)?;

        Ok(ElementDeclaration {
            name,
            document: self.document,
            type_ref,
            is_abstract,
            substitution_group,
        })
    }

    /// Map a local `<element name=...>` (§3.3.2.3)
    fn map_local_element(&mut self, element: Node) -> Result<ElementDeclaration, SchemaError> {
        // {target namespace}
        //   If form is present and its ·actual value· is qualified, or if form is absent and the
        //   ·actual value· of elementFormDefault on the <schema> ancestor is qualified, then the
        //   ·actual value· of the targetNamespace [attribute] of the ancestor <schema>.
        let qualified = match element.attribute("form") {
            Some(form) => form == "qualified",
            None => self.set.document(self.document).element_form_qualified,
        };
        let namespace = if qualified {
            self.target_namespace()
        } else {
            None
        };
        let name = QName::with_optional_namespace(namespace, required_attribute(element, "name")?);
        let type_ref = self.map_element_type(element)?;

        Ok(ElementDeclaration {
            name,
            document: self.document,
            type_ref,
            is_abstract: false,
            substitution_group: None,
        })
    }

    fn map_element_type(&mut self, element: Node) -> Result<TypeRef, SchemaError> {
        // {type definition}
        //   The first of the following that applies:
        //   1 The type definition corresponding to the <simpleType> or <complexType> element
        //     information item in the [children], if either is present.
        //   2 The type definition ·resolved· to by the ·actual value· of the type [attribute],
        //     if it is present.
        //   3 [...] ·xs:anyType·.
        if let Some(complex) = xs_child(element, "complexType") {
            let definition = self.map_complex_type(complex, None)?;
            return Ok(self.anonymous(definition));
        }
        if let Some(simple) = xs_child(element, "simpleType") {
            let definition = self.map_simple_type(simple, None)?;
            return Ok(self.anonymous(definition));
        }
        if let Some(type_name) = element.attribute("type") {
            let name = actual_value::<QName>(type_name, element)?;
            return Ok(self.named_type(name));
        }
        Ok(self.named_type(XS_ANY_TYPE_NAME.clone()))
    }

    pub(super) fn map_complex_type(
        &mut self,
        complex: Node,
        name: Option<QName>,
    ) -> Result<TypeDefinition, SchemaError> {
        let is_abstract = complex
            .attribute("abstract")
            .map(|v| actual_value::<bool>(v, complex))
            .transpose()?
            .unwrap_or(false);
        let mixed = complex
            .attribute("mixed")
            .map(|v| actual_value::<bool>(v, complex))
            .transpose()?
            .unwrap_or(false);
        let content = self.map_constructs(complex)?;

        Ok(TypeDefinition::Complex(ComplexTypeDefinition {
            name,
            document: self.document,
            is_abstract,
            mixed,
            content,
        }))
    }

    pub(super) fn map_simple_type(
        &mut self,
        simple: Node,
        name: Option<QName>,
    ) -> Result<TypeDefinition, SchemaError> {
        let variety = if let Some(restriction) = xs_child(simple, "restriction") {
            // {base type definition}
            //   The type definition ·resolved· to by the ·actual value· of the base [attribute]
            //   or the <simpleType> [children], whichever is present.
            let base = self.map_simple_base(restriction, "base")?;
            let enumeration = xs_children(restriction)
                .filter(|facet| facet.tag_name().name() == "enumeration")
                .map(|facet| required_attribute(facet, "value").map(String::from))
                .collect::<Result<Vec<_>, _>>()?;
            SimpleVariety::Restriction { base, enumeration }
        } else if let Some(list) = xs_child(simple, "list") {
            SimpleVariety::List {
                item: self.map_simple_base(list, "itemType")?,
            }
        } else if let Some(union) = xs_child(simple, "union") {
            // {member type definitions}
            //   The sequence of the type definitions ·resolved· to by the items in the ·actual
            //   value· of the memberTypes [attribute], if any, followed by the type definitions
            //   corresponding to the <simpleType>s among the [children] of <union>, if any.
            let mut members = Vec::new();
            if let Some(member_types) = union.attribute("memberTypes") {
                for name in actual_value::<Vec<QName>>(member_types, union)? {
                    members.push(self.named_type(name));
                }
            }
            for inline in xs_children(union).filter(|c| c.tag_name().name() == "simpleType") {
                let definition = self.map_simple_type(inline, None)?;
                members.push(self.anonymous(definition));
            }
            SimpleVariety::Union { members }
        } else {
            return Err(SchemaError::InvalidValue {
                value: simple.tag_name().name().into(),
                expected: "a simpleType with restriction, list or union",
            });
        };

        Ok(TypeDefinition::Simple(SimpleTypeDefinition {
            name,
            document: self.document,
            variety,
        }))
    }

    fn map_simple_base(&mut self, node: Node, attribute: &str) -> Result<TypeRef, SchemaError> {
        if let Some(base) = node.attribute(attribute) {
            let name = actual_value::<QName>(base, node)?;
            return Ok(self.named_type(name));
        }
        if let Some(inline) = xs_child(node, "simpleType") {
            let definition = self.map_simple_type(inline, None)?;
            return Ok(self.anonymous(definition));
        }
        Ok(self.named_type(XS_ANY_SIMPLE_TYPE_NAME.clone()))
    }

    fn map_constructs(&mut self, parent: Node) -> Result<Vec<Construct>, SchemaError> {
        xs_children(parent)
            .filter(|child| child.tag_name().name() != "annotation")
            .map(|child| self.map_construct(child))
            .collect()
    }

    fn map_construct(&mut self, node: Node) -> Result<Construct, SchemaError> {
        Ok(match node.tag_name().name() {
            "attribute" => Construct::Attribute(self.map_attribute(node)?),
            "attributeGroup" => {
                let name = actual_value::<QName>(required_attribute(node, "ref")?, node)?;
                Construct::AttributeGroup(name)
            }
            "simpleContent" => Construct::SimpleContent(self.map_derivation(node)?),
            "complexContent" => Construct::ComplexContent(self.map_derivation(node)?),
            "all" | "choice" | "sequence" => Construct::Compositor(self.map_compositor(node)?),
            "group" => Construct::Group(GroupReference {
                name: actual_value::<QName>(required_attribute(node, "ref")?, node)?,
                occurs: Occurs::map_from_xml(node)?,
            }),
            "element" => Construct::Element(self.map_element_particle(node)?),
            "any" => Construct::Any(Occurs::map_from_xml(node)?),
            other => Construct::Other(other.into()),
        })
    }

    fn map_element_particle(&mut self, element: Node) -> Result<ElementParticle, SchemaError> {
        let occurs = Occurs::map_from_xml(element)?;
        let element = match element.attribute("ref") {
            Some(reference) => ElementRef::Global {
                name: actual_value::<QName>(reference, element)?,
                written_name: reference.trim().into(),
                document: self.document,
            },
            None => ElementRef::Local(self.map_local_element(element)?),
        };
        Ok(ElementParticle { element, occurs })
    }

    /// Map an `<attribute>`, local or top-level (§3.2.2)
    pub(super) fn map_attribute(
        &mut self,
        attribute: Node,
    ) -> Result<AttributeDeclaration, SchemaError> {
        // {required}
        //   true if use = required, otherwise false.
        let required = attribute.attribute("use") == Some("required");

        if let Some(reference) = attribute.attribute("ref") {
            return Ok(AttributeDeclaration {
                name: actual_value::<QName>(reference, attribute)?,
                written_name: reference.trim().into(),
                document: self.document,
                reference: true,
                type_ref: self.named_type(XS_ANY_SIMPLE_TYPE_NAME.clone()),
                required,
            });
        }

        let written_name = required_attribute(attribute, "name")?;
        let is_global = attribute
            .parent_element()
            .is_some_and(|parent| parent.tag_name().name() == "schema");
        let namespace = if is_global || attribute.attribute("form") == Some("qualified") {
            self.target_namespace()
        } else {
            None
        };

        let type_ref = if let Some(simple) = xs_child(attribute, "simpleType") {
            let definition = self.map_simple_type(simple, None)?;
            self.anonymous(definition)
        } else if let Some(type_name) = attribute.attribute("type") {
            let name = actual_value::<QName>(type_name, attribute)?;
            self.named_type(name)
        } else {
            self.named_type(XS_ANY_SIMPLE_TYPE_NAME.clone())
        };

        Ok(AttributeDeclaration {
            name: QName::with_optional_namespace(namespace, written_name),
            written_name: written_name.into(),
            document: self.document,
            reference: false,
            type_ref,
            required,
        })
    }

    fn map_derivation(&mut self, content: Node) -> Result<Derivation, SchemaError> {
        let (derivation, method) = if let Some(extension) = xs_child(content, "extension") {
            (extension, DerivationMethod::Extension)
        } else if let Some(restriction) = xs_child(content, "restriction") {
            (restriction, DerivationMethod::Restriction)
        } else {
            return Err(SchemaError::InvalidValue {
                value: content.tag_name().name().into(),
                expected: "an extension or restriction child",
            });
        };

        // {base type definition}
        //   The type definition ·resolved· to by the ·actual value· of the base [attribute]
        let base = actual_value::<QName>(required_attribute(derivation, "base")?, derivation)?;
        let base = self.named_type(base);
        let children = self.map_constructs(derivation)?;

        Ok(Derivation {
            method,
            base,
            children,
        })
    }

    fn map_compositor(&mut self, node: Node) -> Result<CompositorDeclaration, SchemaError> {
        // {compositor}
        //   One of all, choice, sequence depending on the element information item.
        let compositor = match node.tag_name().name() {
            "all" => Compositor::All,
            "choice" => Compositor::Choice,
            _ => Compositor::Sequence,
        };

        // {particles}
        //   A sequence of particles corresponding to all the <all>, <choice>, <sequence>,
        //   <any>, <group> or <element> items among the [children], in order.
        Ok(CompositorDeclaration {
            compositor,
            occurs: Occurs::map_from_xml(node)?,
            children: self.map_constructs(node)?,
        })
    }

    pub(super) fn map_attribute_group(
        &mut self,
        group: Node,
    ) -> Result<AttributeGroupDefinition, SchemaError> {
        let name = QName::with_optional_namespace(
            self.target_namespace(),
            required_attribute(group, "name")?,
        );
        let attributes = self
            .map_constructs(group)?
            .into_iter()
            .filter(Construct::is_attribute)
            .collect();
        Ok(AttributeGroupDefinition {
            name,
            document: self.document,
            attributes,
        })
    }

    pub(super) fn map_model_group(
        &mut self,
        group: Node,
    ) -> Result<ModelGroupDefinition, SchemaError> {
        let name = QName::with_optional_namespace(
            self.target_namespace(),
            required_attribute(group, "name")?,
        );
        let compositor = xs_children(group)
            .find(|c| matches!(c.tag_name().name(), "all" | "choice" | "sequence"))
            .ok_or_else(|| SchemaError::MissingAttribute {
                element: "group".into(),
                attribute: "sequence|choice|all",
            })?;
        Ok(ModelGroupDefinition {
            name,
            document: self.document,
            compositor: self.map_compositor(compositor)?,
        })
    }

    pub(super) fn register_type(&mut self, definition: TypeDefinition) -> TypeId {
        self.set.push_type(definition)
    }
}

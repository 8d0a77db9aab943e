use crate::address::Address;

use super::builtins::is_builtin_name;
use super::components::{
    AttributeDeclaration, Compositor, ElementDeclaration, ElementRef, TypeDefinition, TypeId,
};
use super::error::SchemaError;
use super::namespaces::InstanceNamespaces;
use super::particle::Occurs;
use super::schema::SchemaSet;
use super::xstypes::{PrefixedName, QName};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchemaNodeKind {
    Element,
    Attribute,
    /// An `any` wildcard
    Wildcard,
}

/// The compositor directly enclosing an element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CompositorContext {
    pub compositor: Compositor,
    pub occurs: Occurs,
    /// The element is the compositor's only particle
    pub is_singleton: bool,
}

/// What the schema says about one schema address.
#[derive(Clone, Debug)]
pub struct SchemaNode {
    pub address: Address,
    pub kind: SchemaNodeKind,
    pub name: QName,
    pub type_id: TypeId,
    pub occurs: Occurs,
    pub required: bool,
    pub compositor: Option<CompositorContext>,
    /// The node's complex type already occurs among its ancestors; children are not indexed.
    pub is_recursive: bool,
    pub is_abstract: bool,
    /// Concrete elements that may stand in for this one, in registration order
    pub substitution_members: Vec<PrefixedName>,
    pub children: Vec<Address>,
    pub repeating_complex_singleton: Option<Address>,
}

impl SchemaNode {
    pub fn is_element(&self) -> bool {
        self.kind == SchemaNodeKind::Element
    }

    pub fn is_attribute(&self) -> bool {
        self.kind == SchemaNodeKind::Attribute
    }

    pub fn is_substitution_head(&self) -> bool {
        self.is_element() && (self.is_abstract || !self.substitution_members.is_empty())
    }
}

/// Read-only view of the schema used by the compiler. Implementations must be shareable
/// between threads compiling different templates.
pub trait SchemaQuery: Sync {
    fn schema_node(&self, address: &Address) -> Option<&SchemaNode>;

    fn schema_set(&self) -> &SchemaSet;

    fn namespaces(&self) -> &InstanceNamespaces;

    fn type_definition(&self, id: TypeId) -> &TypeDefinition {
        self.schema_set().type_definition(id)
    }

    fn resolve_type(&self, address: &Address) -> Option<TypeId> {
        self.schema_node(&address.to_schema_address())
            .map(|node| node.type_id)
    }

    fn is_repeating(&self, address: &Address) -> bool {
        self.schema_node(&address.to_schema_address())
            .is_some_and(|node| is_repeating_node(self.schema_set(), node))
    }

    fn is_required(&self, address: &Address) -> bool {
        self.schema_node(&address.to_schema_address())
            .is_some_and(|node| node.required)
    }

    fn is_choice_element(&self, address: &Address) -> bool {
        self.schema_node(&address.to_schema_address())
            .and_then(|node| node.compositor)
            .is_some_and(|c| c.compositor == Compositor::Choice)
    }

    fn is_recursive(&self, address: &Address) -> bool {
        self.schema_node(&address.to_schema_address())
            .is_some_and(|node| node.is_recursive)
    }

    fn substitution_group_members_of(&self, head: &Address) -> &[PrefixedName] {
        self.schema_node(&head.to_schema_address())
            .map(|node| node.substitution_members.as_slice())
            .unwrap_or_default()
    }

    fn repeating_complex_singleton_child_of(&self, address: &Address) -> Option<&Address> {
        self.schema_node(&address.to_schema_address())?
            .repeating_complex_singleton
            .as_ref()
    }

    /// A required element of complex type.
    fn is_required_branch(&self, address: &Address) -> bool {
        self.schema_node(&address.to_schema_address())
            .is_some_and(|node| {
                node.is_element()
                    && node.required
                    && self.type_definition(node.type_id).is_complex()
            })
    }

    /// A repeating enumeration, edited as one multi-select field.
    fn is_multi_select(&self, address: &Address) -> bool {
        self.schema_node(&address.to_schema_address())
            .is_some_and(|node| is_multi_select_node(self.schema_set(), node))
    }

    fn has_multi_select(&self, address: &Address) -> bool {
        self.schema_node(&address.to_schema_address())
            .is_some_and(|node| node.children.iter().any(|child| self.is_multi_select(child)))
    }

    fn qualify_element_name(&self, element: &ElementRef) -> Result<PrefixedName, SchemaError> {
        qualify_element_name(self.schema_set(), self.namespaces(), element)
    }

    fn qualify_attribute_name(
        &self,
        attribute: &AttributeDeclaration,
    ) -> Result<PrefixedName, SchemaError> {
        qualify_attribute_name(self.schema_set(), self.namespaces(), attribute)
    }

    /// The address segment name used for `any` wildcards.
    fn wildcard_name(&self) -> PrefixedName {
        wildcard_name(self.schema_set())
    }
}

pub(crate) fn is_repeating_node(set: &SchemaSet, node: &SchemaNode) -> bool {
    if node.is_attribute() {
        return false;
    }
    let own = node.occurs.is_many() && !set.is_enumeration(node.type_id);
    let through_compositor = node
        .compositor
        .is_some_and(|c| c.is_singleton && c.occurs.is_many());
    own || through_compositor
}

pub(crate) fn is_multi_select_node(set: &SchemaSet, node: &SchemaNode) -> bool {
    node.is_element() && node.occurs.is_many() && set.is_enumeration(node.type_id)
}

pub(crate) fn element_declaration<'s>(
    set: &'s SchemaSet,
    element: &'s ElementRef,
) -> Option<&'s ElementDeclaration> {
    match element {
        ElementRef::Local(decl) => Some(decl),
        ElementRef::Global { name, .. } => set.global_element(name),
    }
}

pub(crate) fn qualify_element_name(
    set: &SchemaSet,
    namespaces: &InstanceNamespaces,
    element: &ElementRef,
) -> Result<PrefixedName, SchemaError> {
    match element {
        ElementRef::Local(decl) => Ok(namespaces.prefixed_name(&decl.name)),
        ElementRef::Global {
            name,
            written_name,
            document,
        } => {
            // Built-in names are left as written.
            if is_builtin_name(name) {
                return Ok(PrefixedName::parse(written_name));
            }
            if written_name.contains(':') {
                namespaces.resolve_qualified_name(written_name, &set.document(*document).namespaces)
            } else {
                Ok(namespaces.prefixed_name(name))
            }
        }
    }
}

/// Attribute names are only qualified when written with a prefix.
pub(crate) fn qualify_attribute_name(
    set: &SchemaSet,
    namespaces: &InstanceNamespaces,
    attribute: &AttributeDeclaration,
) -> Result<PrefixedName, SchemaError> {
    if attribute.written_name.contains(':') {
        namespaces.resolve_qualified_name(
            &attribute.written_name,
            &set.document(attribute.document).namespaces,
        )
    } else {
        Ok(PrefixedName::unprefixed(attribute.written_name.as_str()))
    }
}

pub(crate) fn wildcard_name(set: &SchemaSet) -> PrefixedName {
    let prefix = set
        .documents()
        .first()
        .map_or(super::builtins::DEFAULT_XS_PREFIX, |document| document.xs_prefix());
    PrefixedName::new(Some(prefix), "any")
}

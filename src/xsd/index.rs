//! A precomputed map from schema addresses to [`SchemaNode`]s.
//!
//! The index walks the declarations reachable from the chosen global elements once, so the
//! compiler can answer address queries without revisiting the component model. Walking stops
//! at any element whose complex type is already being walked higher up the same path; such
//! nodes are marked recursive.

use std::collections::HashMap;

use crate::address::Address;

use super::builtins::XS_ANY_TYPE_NAME;
use super::components::{
    AttributeDeclaration, ComplexTypeDefinition, Construct, Derivation,
    DerivationMethod, ElementDeclaration, TypeId,
};
use super::error::SchemaError;
use super::namespaces::InstanceNamespaces;
use super::particle::Occurs;
use super::query::{
    element_declaration, is_repeating_node, qualify_attribute_name, qualify_element_name,
    wildcard_name, CompositorContext, SchemaNode, SchemaNodeKind, SchemaQuery,
};
use super::schema::SchemaSet;
use super::xstypes::{PrefixedName, QName};

#[derive(Debug)]
pub struct SchemaIndex {
    set: SchemaSet,
    namespaces: InstanceNamespaces,
    nodes: HashMap<Address, SchemaNode>,
    roots: Vec<Address>,
}

impl SchemaIndex {
    /// Indexes the trees below each of `roots`, which must name global elements.
    pub fn build<'q>(
        set: SchemaSet,
        namespaces: InstanceNamespaces,
        roots: impl IntoIterator<Item = &'q QName>,
    ) -> Result<Self, SchemaError> {
        let mut builder = IndexBuilder {
            set: &set,
            namespaces: &namespaces,
            wildcard: wildcard_name(&set),
            nodes: HashMap::new(),
            type_stack: Vec::new(),
            group_stack: Vec::new(),
        };
        let mut root_addresses = Vec::new();
        for name in roots {
            let decl = set
                .global_element(name)
                .ok_or_else(|| SchemaError::UnknownComponent {
                    kind: "element",
                    name: name.clone(),
                })?;
            let address = Address::root(namespaces.prefixed_name(name));
            builder.walk_element(&address, decl, Occurs::ONCE, None);
            root_addresses.push(address);
        }
        let nodes = builder.nodes;
        tracing::debug!(nodes = nodes.len(), roots = root_addresses.len(), "schema indexed");
        Ok(Self {
            set,
            namespaces,
            nodes,
            roots: root_addresses,
        })
    }

    pub fn roots(&self) -> &[Address] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SchemaQuery for SchemaIndex {
    fn schema_node(&self, address: &Address) -> Option<&SchemaNode> {
        self.nodes.get(address)
    }

    fn schema_set(&self) -> &SchemaSet {
        &self.set
    }

    fn namespaces(&self) -> &InstanceNamespaces {
        &self.namespaces
    }
}

struct IndexBuilder<'s> {
    set: &'s SchemaSet,
    namespaces: &'s InstanceNamespaces,
    wildcard: PrefixedName,
    nodes: HashMap<Address, SchemaNode>,
    /// Complex types being walked along the current path
    type_stack: Vec<TypeId>,
    /// Attribute and model groups being expanded along the current path
    group_stack: Vec<QName>,
}

impl<'s> IndexBuilder<'s> {
    fn walk_element(
        &mut self,
        address: &Address,
        decl: &'s ElementDeclaration,
        occurs: Occurs,
        compositor: Option<CompositorContext>,
    ) {
        // The first declaration seen for an address wins.
        if self.nodes.contains_key(address) {
            return;
        }
        let Some(type_id) = self.set.resolve_type_ref(&decl.type_ref) else {
            tracing::warn!(%address, element = %decl.name, "element type is not defined; skipping");
            return;
        };
        let members = self.substitution_members(decl);
        let mut member_names: Vec<PrefixedName> =
            members.iter().map(|(name, _)| name.clone()).collect();
        if !member_names.is_empty() && !decl.is_abstract {
            member_names.insert(0, self.namespaces.prefixed_name(&decl.name));
        }

        let complex = self.set.type_definition(type_id).as_complex();
        let is_recursive = complex.is_some() && self.type_stack.contains(&type_id);
        self.nodes.insert(
            address.clone(),
            SchemaNode {
                address: address.clone(),
                kind: SchemaNodeKind::Element,
                name: decl.name.clone(),
                type_id,
                occurs,
                required: occurs.min >= 1,
                compositor,
                is_recursive,
                is_abstract: decl.is_abstract,
                substitution_members: member_names,
                children: Vec::new(),
                repeating_complex_singleton: None,
            },
        );

        if let (Some(complex), false) = (complex, is_recursive) {
            self.type_stack.push(type_id);
            let children = self.walk_complex(address, complex);
            self.type_stack.pop();
            let singleton = self.repeating_complex_singleton(&children);
            if let Some(node) = self.nodes.get_mut(address) {
                node.children = children;
                node.repeating_complex_singleton = singleton;
            }
        }

        // Members stand beside their head.
        if let Some(parent) = address.parent() {
            for (name, member) in members {
                self.walk_element(&parent.child(name), member, occurs, compositor);
            }
        }
    }

    fn substitution_members(
        &self,
        head: &ElementDeclaration,
    ) -> Vec<(PrefixedName, &'s ElementDeclaration)> {
        self.set
            .substitution_members(&head.name)
            .iter()
            .filter_map(|name| {
                let member = self.set.global_element(name)?;
                Some((self.namespaces.prefixed_name(name), member))
            })
            .collect()
    }

    fn walk_complex(
        &mut self,
        address: &Address,
        complex: &'s ComplexTypeDefinition,
    ) -> Vec<Address> {
        let mut children = Vec::new();
        self.walk_constructs(address, &complex.content, None, &mut children);
        children
    }

    fn walk_constructs(
        &mut self,
        parent: &Address,
        constructs: &'s [Construct],
        compositor: Option<CompositorContext>,
        children: &mut Vec<Address>,
    ) {
        for construct in constructs {
            match construct {
                Construct::Attribute(attribute) => self.walk_attribute(parent, attribute, children),
                Construct::AttributeGroup(name) => {
                    let Some(group) = self.set.attribute_group(name) else {
                        tracing::warn!(%parent, group = %name, "attribute group is not defined");
                        continue;
                    };
                    if self.group_stack.contains(name) {
                        continue;
                    }
                    self.group_stack.push(name.clone());
                    self.walk_constructs(parent, &group.attributes, None, children);
                    self.group_stack.pop();
                }
                Construct::SimpleContent(derivation) | Construct::ComplexContent(derivation) => {
                    self.walk_derivation(parent, derivation, children)
                }
                Construct::Compositor(decl) => {
                    let context = CompositorContext {
                        compositor: decl.compositor,
                        occurs: decl.occurs,
                        is_singleton: decl.children.len() == 1,
                    };
                    self.walk_constructs(parent, &decl.children, Some(context), children);
                }
                Construct::Group(reference) => {
                    let Some(group) = self.set.model_group(&reference.name) else {
                        tracing::warn!(
                            %parent,
                            group = %reference.name,
                            "model group is not defined"
                        );
                        continue;
                    };
                    if self.group_stack.contains(&reference.name) {
                        continue;
                    }
                    let context = CompositorContext {
                        compositor: group.compositor.compositor,
                        occurs: group.effective_occurs(reference),
                        is_singleton: group.compositor.children.len() == 1,
                    };
                    self.group_stack.push(reference.name.clone());
                    let members = &group.compositor.children;
                    self.walk_constructs(parent, members, Some(context), children);
                    self.group_stack.pop();
                }
                Construct::Element(particle) => {
                    let qualified =
                        qualify_element_name(self.set, self.namespaces, &particle.element);
                    let name = match qualified {
                        Ok(name) => name,
                        Err(error) => {
                            tracing::warn!(%parent, %error, "element name cannot be qualified");
                            continue;
                        }
                    };
                    let Some(decl) = element_declaration(self.set, &particle.element) else {
                        tracing::warn!(
                            %parent,
                            element = %name,
                            "referenced element is not declared"
                        );
                        continue;
                    };
                    let address = parent.child(name);
                    children.push(address.clone());
                    self.walk_element(&address, decl, particle.occurs, compositor);
                }
                Construct::Any(occurs) => self.walk_wildcard(parent, *occurs, compositor, children),
                Construct::Other(_) => {}
            }
        }
    }

    fn walk_attribute(
        &mut self,
        parent: &Address,
        attribute: &AttributeDeclaration,
        children: &mut Vec<Address>,
    ) {
        let name = match qualify_attribute_name(self.set, self.namespaces, attribute) {
            Ok(name) => name,
            Err(error) => {
                tracing::warn!(%parent, %error, "attribute name cannot be qualified");
                return;
            }
        };
        let Some(type_id) = self.set.attribute_type(attribute) else {
            tracing::warn!(%parent, attribute = %name, "attribute type is not defined; skipping");
            return;
        };
        let address = parent.attribute(name);
        if self.nodes.contains_key(&address) {
            return;
        }
        children.push(address.clone());
        self.nodes.insert(
            address.clone(),
            SchemaNode {
                address,
                kind: SchemaNodeKind::Attribute,
                name: attribute.name.clone(),
                type_id,
                occurs: if attribute.required { Occurs::ONCE } else { Occurs::OPTIONAL },
                required: attribute.required,
                compositor: None,
                is_recursive: false,
                is_abstract: false,
                substitution_members: Vec::new(),
                children: Vec::new(),
                repeating_complex_singleton: None,
            },
        );
    }

    fn walk_wildcard(
        &mut self,
        parent: &Address,
        occurs: Occurs,
        compositor: Option<CompositorContext>,
        children: &mut Vec<Address>,
    ) {
        let Some(type_id) = self.set.named_type(&XS_ANY_TYPE_NAME) else {
            return;
        };
        let address = parent.child(self.wildcard.clone());
        if self.nodes.contains_key(&address) {
            return;
        }
        children.push(address.clone());
        self.nodes.insert(
            address.clone(),
            SchemaNode {
                address,
                kind: SchemaNodeKind::Wildcard,
                name: XS_ANY_TYPE_NAME.clone(),
                type_id,
                occurs,
                required: occurs.min >= 1,
                compositor,
                is_recursive: false,
                is_abstract: false,
                substitution_members: Vec::new(),
                children: Vec::new(),
                repeating_complex_singleton: None,
            },
        );
    }

    /// Extensions inherit the base type's content ahead of their own; restrictions restate
    /// everything they keep.
    fn walk_derivation(
        &mut self,
        parent: &Address,
        derivation: &'s Derivation,
        children: &mut Vec<Address>,
    ) {
        if derivation.method == DerivationMethod::Extension {
            if let Some(base) = self.set.resolve_type_ref(&derivation.base) {
                if let Some(complex) = self.set.type_definition(base).as_complex() {
                    if !self.type_stack.contains(&base) {
                        self.type_stack.push(base);
                        self.walk_constructs(parent, &complex.content, None, children);
                        self.type_stack.pop();
                    }
                }
            }
        }
        self.walk_constructs(parent, &derivation.children, None, children);
    }

    /// Attributes do not count as children here.
    fn repeating_complex_singleton(&self, children: &[Address]) -> Option<Address> {
        let mut elements = children.iter().filter(|child| !child.is_attribute());
        let (Some(only), None) = (elements.next(), elements.next()) else {
            return None;
        };
        let node = self.nodes.get(only)?;
        let qualifies = node.is_element()
            && self.set.type_definition(node.type_id).is_complex()
            && is_repeating_node(self.set, node);
        qualifies.then(|| only.clone())
    }
}

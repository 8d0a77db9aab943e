use std::collections::HashSet;

use crate::template::{GroupClass, TemplateNode};
use crate::xsd::components::{AttributeDeclaration, CompositorDeclaration};
use crate::xsd::{Compositor, Construct, Occurs, PrefixedName, QName};

use super::classify::{classify_construct, ConstructKind};
use super::context::RenderContext;
use super::error::CompileError;

impl<'e> RenderContext<'e, '_> {
    /// Renders `constructs` into the current container, attributes first. Constructs that
    /// fail are logged and skipped; their siblings still render.
    pub(super) fn render_constructs(&mut self, constructs: &'e [Construct]) {
        let (attributes, rest): (Vec<&Construct>, Vec<&Construct>) =
            constructs.iter().partition(|construct| construct.is_attribute());
        for construct in attributes.into_iter().chain(rest) {
            if let Err(error) = self.render_construct(construct) {
                self.skipped(&error);
            }
        }
    }

    fn render_construct(&mut self, construct: &'e Construct) -> Result<(), CompileError> {
        match classify_construct(construct) {
            ConstructKind::Attribute(attribute) => self.render_attribute(attribute),
            ConstructKind::AttributeGroup(name) => {
                for attribute in self.flatten_attribute_group(name)? {
                    if let Err(error) = self.render_attribute(attribute) {
                        self.skipped(&error);
                    }
                }
                Ok(())
            }
            ConstructKind::SimpleContent(derivation) => self.render_text_only(derivation, None),
            ConstructKind::ComplexContent(derivation) => self.render_derivation(derivation),
            ConstructKind::Sequence(decl) => {
                let mut children = Vec::new();
                self.at(self.address.clone(), &mut children)
                    .render_constructs(&decl.children);
                if !children.is_empty() {
                    self.emit(TemplateNode::group(GroupClass::Compositor).with_children(children));
                }
                Ok(())
            }
            ConstructKind::Choice(decl) => self.render_choice(decl, decl.occurs),
            ConstructKind::MultiChoice(decl) => self.render_multi_choice(decl, decl.occurs),
            ConstructKind::ModelGroup(reference) => {
                let group = self
                    .schema()
                    .schema_set()
                    .model_group(&reference.name)
                    .ok_or_else(|| {
                        CompileError::inconsistency(
                            &self.address,
                            format!("model group {} is not defined", reference.name),
                        )
                    })?;
                self.render_group_compositor(&group.compositor, group.effective_occurs(reference))
            }
            ConstructKind::Element(particle) => {
                let name = self.schema().qualify_element_name(&particle.element)?;
                let address = self.address.child(name);
                let mut children = Vec::new();
                self.child(address, &mut children).render();
                self.emit_all(children);
                Ok(())
            }
            ConstructKind::Any => {
                let address = self.address.child(self.schema().wildcard_name());
                let mut children = Vec::new();
                self.child(address, &mut children).render();
                self.emit_all(children);
                Ok(())
            }
            ConstructKind::Unrecognized(tag) => Err(CompileError::UnrecognizedConstruct {
                address: self.address.clone(),
                tag: tag.into(),
            }),
        }
    }

    /// A referenced group's compositor attaches its children to the current container.
    fn render_group_compositor(
        &mut self,
        decl: &'e CompositorDeclaration,
        occurs: Occurs,
    ) -> Result<(), CompileError> {
        match decl.compositor {
            Compositor::All | Compositor::Sequence => {
                self.render_constructs(&decl.children);
                Ok(())
            }
            Compositor::Choice if occurs.max.is_many() => self.render_multi_choice(decl, occurs),
            Compositor::Choice => self.render_choice(decl, occurs),
        }
    }

    fn render_attribute(&mut self, attribute: &AttributeDeclaration) -> Result<(), CompileError> {
        let name = self.schema().qualify_attribute_name(attribute)?;
        let address = self.address.attribute(name);
        let mut children = Vec::new();
        self.child(address, &mut children).render();
        self.emit_all(children);
        Ok(())
    }

    /// The attribute declarations of a group, with nested group references expanded.
    pub(super) fn flatten_attribute_group(
        &self,
        name: &QName,
    ) -> Result<Vec<&'e AttributeDeclaration>, CompileError> {
        let mut attributes = Vec::new();
        let mut seen = HashSet::new();
        self.collect_group_attributes(name, &mut seen, &mut attributes)?;
        Ok(attributes)
    }

    fn collect_group_attributes(
        &self,
        name: &QName,
        seen: &mut HashSet<QName>,
        attributes: &mut Vec<&'e AttributeDeclaration>,
    ) -> Result<(), CompileError> {
        if !seen.insert(name.clone()) {
            return Ok(());
        }
        let group = self
            .schema()
            .schema_set()
            .attribute_group(name)
            .ok_or_else(|| {
                CompileError::inconsistency(
                    &self.address,
                    format!("attribute group {name} is not defined"),
                )
            })?;
        for construct in &group.attributes {
            match construct {
                Construct::Attribute(attribute) => attributes.push(attribute),
                Construct::AttributeGroup(nested) => {
                    self.collect_group_attributes(nested, seen, attributes)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Terminal element names reachable inside `constructs`, with nested compositors and
    /// group references flattened and substitution heads replaced by their members.
    pub(super) fn leaf_member_names(
        &self,
        constructs: &'e [Construct],
    ) -> Result<Vec<PrefixedName>, CompileError> {
        let mut names = Vec::new();
        let mut groups = HashSet::new();
        self.collect_leaf_names(constructs, &mut groups, &mut names)?;
        Ok(names)
    }

    fn collect_leaf_names(
        &self,
        constructs: &'e [Construct],
        groups: &mut HashSet<QName>,
        names: &mut Vec<PrefixedName>,
    ) -> Result<(), CompileError> {
        let schema = self.schema();
        for construct in constructs {
            match construct {
                Construct::Element(particle) => {
                    let name = schema.qualify_element_name(&particle.element)?;
                    let address = self.address.child(name.clone());
                    let head = schema
                        .schema_node(&address.to_schema_address())
                        .filter(|node| node.is_substitution_head());
                    match head {
                        Some(head) => names.extend(head.substitution_members.iter().cloned()),
                        None => names.push(name),
                    }
                }
                Construct::Compositor(decl) => {
                    self.collect_leaf_names(&decl.children, groups, names)?
                }
                Construct::Group(reference) => {
                    if !groups.insert(reference.name.clone()) {
                        continue;
                    }
                    let group = schema.schema_set().model_group(&reference.name).ok_or_else(|| {
                        CompileError::inconsistency(
                            &self.address,
                            format!("model group {} is not defined", reference.name),
                        )
                    })?;
                    self.collect_leaf_names(&group.compositor.children, groups, names)?;
                }
                Construct::Any(_) => names.push(schema.wildcard_name()),
                _ => {}
            }
        }
        let mut seen = HashSet::new();
        names.retain(|name| seen.insert(name.clone()));
        Ok(())
    }
}

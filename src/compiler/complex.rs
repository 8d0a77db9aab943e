use crate::template::{AffordanceKind, GroupClass, GuardTest, Label, TemplateNode};
use crate::xsd::MaxOccurs;

use super::classify::NodeKind;
use super::context::RenderContext;
use super::error::CompileError;

impl<'e> RenderContext<'e, '_> {
    /// A header followed by the node's content. The root opens the level-0 group; deeper
    /// nodes nest their content in a sub-elements group.
    pub(super) fn render_complex(
        &mut self,
        kind: NodeKind<'e>,
        index_id: Option<&str>,
        collapsible: bool,
    ) -> Result<(), CompileError> {
        let node = self.node()?;
        let mut label = Label::for_address(&self.address).required(node.required);
        if let Some(index_id) = index_id {
            label = label.indexed(index_id);
        }
        let mut header = TemplateNode::header(label);
        if self.is_edit() {
            for control in self.complex_controls(index_id.is_some()) {
                header.push(control);
            }
        }

        let mut content = Vec::new();
        {
            let mut body = self.at(self.address.clone(), &mut content);
            match kind {
                NodeKind::ComplexType(complex) => body.render_constructs(&complex.content),
                NodeKind::DerivedContentModel(derivation) => body.render_derivation(derivation)?,
                other => {
                    return Err(CompileError::inconsistency(
                        &self.address,
                        format!("{} has no element content", other.name()),
                    ))
                }
            }
        }

        let group = if self.address.is_root() {
            TemplateNode::group(GroupClass::Level(0))
                .with_child(header)
                .with_children(content)
        } else {
            TemplateNode::group(GroupClass::Level(self.depth))
                .with_child(header)
                .with_child(
                    TemplateNode::group(GroupClass::SubElements { collapsible })
                        .with_children(content),
                )
        };
        self.emit(group);
        Ok(())
    }

    /// The header control group. Items always carry their delete control.
    fn complex_controls(&self, is_item: bool) -> Vec<TemplateNode> {
        let schema = self.schema();
        let mut controls = Vec::new();
        if is_item {
            controls.push(TemplateNode::affordance(
                AffordanceKind::Delete,
                self.address.clone(),
                "delete",
            ));
        }
        let is_choice_member = schema.is_choice_element(&self.address);

        if let Some(singleton) = schema.repeating_complex_singleton_child_of(&self.address) {
            if is_choice_member && !is_item {
                controls.push(self.choice_delete());
            }
            if let Some(name) = singleton.leaf_name() {
                let child = self.address.child(name.clone());
                controls.push(
                    TemplateNode::guard(GuardTest::CountBelow(MaxOccurs::Count(1)), child.clone())
                        .with_child(TemplateNode::affordance(
                            AffordanceKind::AddChild,
                            child,
                            format!("add {}", name.local_name),
                        )),
                );
            }
            return controls;
        }
        if is_item {
            return controls;
        }
        if is_choice_member {
            controls.push(self.choice_delete());
        } else if !self.address.is_root() && !schema.is_required_branch(&self.address) {
            controls.extend(self.optional_item_controls());
        } else if !self.address.is_root() && schema.has_multi_select(&self.address) {
            let name = Label::for_address(&self.address).text;
            controls.push(
                TemplateNode::guard(GuardTest::HasNoChildren, self.address.clone()).with_child(
                    TemplateNode::affordance(
                        AffordanceKind::Choose,
                        self.address.clone(),
                        format!("choose {name}"),
                    ),
                ),
            );
        }
        controls
    }

    fn choice_delete(&self) -> TemplateNode {
        TemplateNode::affordance(
            AffordanceKind::ChoiceDelete,
            self.address.clone(),
            "delete choice",
        )
    }
}

use crate::address::Index;
use crate::template::{AffordanceKind, GuardTest, Label, TemplateNode};
use crate::xsd::MaxOccurs;

use super::classify::NodeKind;
use super::context::RenderContext;
use super::error::CompileError;

impl<'e> RenderContext<'e, '_> {
    /// A repeating node: the populated branch iterates the existing occurrences and offers an
    /// "add sibling" control while the limit allows; the empty branch offers "add" for the
    /// first occurrence. The two branches are guarded by opposite tests on the sibling path.
    pub(super) fn render_repeating(&mut self, item: NodeKind<'e>) -> Result<(), CompileError> {
        let sibling_path = self.address.sibling_path();
        let limit = self.occurrence_limit()?;
        let name = Label::for_address(&self.address).text;

        let mut populated = TemplateNode::guard(GuardTest::Exists, sibling_path.clone());
        populated.push(self.iteration(item, false)?);
        if self.is_edit() {
            populated.push(
                TemplateNode::guard(GuardTest::CountBelow(limit), sibling_path.clone()).with_child(
                    TemplateNode::affordance(
                        AffordanceKind::AddSibling,
                        sibling_path.clone(),
                        format!("add {name}"),
                    ),
                ),
            );
        }
        self.emit(populated);

        if self.is_edit() && !self.add_is_hoisted() {
            let header = TemplateNode::header(Label::for_address(&self.address)).with_child(
                TemplateNode::affordance(
                    AffordanceKind::AddFirst,
                    sibling_path.clone(),
                    format!("add {name}"),
                ),
            );
            self.emit(TemplateNode::guard(GuardTest::NotExists, sibling_path).with_child(header));
        }
        Ok(())
    }

    /// An iteration over the occurrences at the sibling path, each rendered as `item`.
    pub(super) fn iteration(
        &self,
        item: NodeKind<'e>,
        collapsible: bool,
    ) -> Result<TemplateNode, CompileError> {
        let sibling_path = self.address.sibling_path();
        let index_id = sibling_path.encode_index_id();
        let item_path = sibling_path.with_index(Index::Var(index_id.clone()));

        let mut body = Vec::new();
        self.at(item_path.clone(), &mut body)
            .render_item(item, &index_id, collapsible)?;
        Ok(TemplateNode::iteration(sibling_path, index_id, item_path).with_children(body))
    }

    /// The most occurrences allowed: the node's own bound, or that of the compositor it is
    /// the only member of.
    fn occurrence_limit(&self) -> Result<MaxOccurs, CompileError> {
        let node = self.node()?;
        if node.occurs.is_many() {
            return Ok(node.occurs.max);
        }
        Ok(node
            .compositor
            .filter(|context| context.is_singleton)
            .map_or(node.occurs.max, |context| context.occurs.max))
    }

    /// A required parent whose only child is this repeating complex node already offers
    /// "add" in its header.
    fn add_is_hoisted(&self) -> bool {
        let schema = self.schema();
        let Some(parent) = self.address.parent() else {
            return false;
        };
        let schema_address = self.address.to_schema_address();
        schema.repeating_complex_singleton_child_of(&parent) == Some(&schema_address)
            && schema.is_required(&parent)
    }
}

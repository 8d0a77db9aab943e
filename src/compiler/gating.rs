use crate::template::{GuardTest, Mode, TemplateNode};

use super::context::RenderContext;

impl RenderContext<'_, '_> {
    /// Renders the node behind the presence guard of the current mode. A failure is logged
    /// and leaves the node's subtree out.
    pub(super) fn render(&mut self) {
        let mut body = Vec::new();
        if let Err(error) = self.at(self.address.clone(), &mut body).render_node() {
            self.skipped(&error);
            return;
        }
        if body.is_empty() {
            return;
        }
        match self.presence_guard() {
            Some(guard) => self.emit(guard.with_children(body)),
            None => self.emit_all(body),
        }
    }

    /// Edit mode shows a node wherever its parent exists. Display mode shows only what is
    /// present; repeated and substitutable nodes check presence per occurrence instead.
    fn presence_guard(&self) -> Option<TemplateNode> {
        let parent = self.address.parent()?;
        let target = match self.mode() {
            Mode::Edit => parent,
            Mode::Display => {
                let per_occurrence = self.schema().is_repeating(&self.address)
                    || self.node().is_ok_and(|node| node.is_substitution_head());
                if per_occurrence {
                    parent
                } else {
                    self.address.clone()
                }
            }
        };
        Some(TemplateNode::guard(GuardTest::Exists, target))
    }
}

use crate::template::{AffordanceKind, GuardTest, Label, TemplateNode};

use super::context::RenderContext;
use super::error::CompileError;

impl RenderContext<'_, '_> {
    /// A substitution head renders its members, grouped by member name in registration order,
    /// followed by an "add" control offering the members while the head's bound allows.
    pub(super) fn render_substitution_group(&mut self) -> Result<(), CompileError> {
        let node = self.node()?;
        let parent = self.address.parent().ok_or_else(|| {
            CompileError::inconsistency(&self.address, "substitution head at the document root")
        })?;
        let members = self.schema().substitution_group_members_of(&self.address).to_vec();

        for name in &members {
            let address = parent.child(name.clone());
            let mut scratch = Vec::new();
            let member = self.at(address.clone(), &mut scratch);
            let iteration = member
                .classify()
                .and_then(|kind| member.iteration(kind.item(), true));
            match iteration {
                Ok(iteration) => self.emit(
                    TemplateNode::guard(GuardTest::Exists, address).with_child(iteration),
                ),
                Err(error) => self.skipped(&error),
            }
        }

        if self.is_edit() && !members.is_empty() {
            let head = Label::for_address(&self.address).text;
            let add = TemplateNode::affordance(
                AffordanceKind::AddMember,
                parent.clone(),
                format!("add {head}"),
            )
            .with_candidates(members.clone());
            self.emit(
                TemplateNode::guard(
                    GuardTest::MembersBelow {
                        members,
                        limit: node.occurs.max,
                    },
                    parent,
                )
                .with_child(add),
            );
        }
        Ok(())
    }
}

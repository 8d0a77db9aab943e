use crate::template::{GuardTest, TemplateNode};
use crate::xsd::components::CompositorDeclaration;
use crate::xsd::{Occurs, PrefixedName};

use super::context::RenderContext;
use super::error::CompileError;

impl<'e> RenderContext<'e, '_> {
    /// A choice allowing one member: each candidate renders where it exists, and while none
    /// does the edit form asks which one to create.
    pub(super) fn render_choice(
        &mut self,
        decl: &'e CompositorDeclaration,
        occurs: Occurs,
    ) -> Result<(), CompileError> {
        let members = self.leaf_member_names(&decl.children)?;
        for name in &members {
            let address = self.address.child(name.clone());
            let mut body = Vec::new();
            if let Err(error) = self.child(address.clone(), &mut body).render_node() {
                self.skipped(&error);
                continue;
            }
            self.emit(TemplateNode::guard(GuardTest::Exists, address).with_children(body));
        }
        if self.is_edit() {
            let prompt = self.choice_prompt(&members, occurs);
            self.emit(
                TemplateNode::guard(GuardTest::Exists, self.address.clone()).with_child(
                    TemplateNode::guard(GuardTest::HasNoneOf(members), self.address.clone())
                        .with_child(prompt),
                ),
            );
        }
        Ok(())
    }

    /// A choice that may be made repeatedly: each candidate iterates its occurrences. The
    /// prompt shows inline while nothing is chosen and behind an "add new child" toggle
    /// afterwards.
    pub(super) fn render_multi_choice(
        &mut self,
        decl: &'e CompositorDeclaration,
        occurs: Occurs,
    ) -> Result<(), CompileError> {
        let members = self.leaf_member_names(&decl.children)?;
        for name in &members {
            let address = self.address.child(name.clone());
            let mut scratch = Vec::new();
            let member = self.child(address.clone(), &mut scratch);
            let iteration = member
                .classify()
                .and_then(|kind| member.iteration(kind.item(), false));
            match iteration {
                Ok(iteration) => self.emit(
                    TemplateNode::guard(GuardTest::Exists, address).with_child(iteration),
                ),
                Err(error) => self.skipped(&error),
            }
        }
        if self.is_edit() {
            let empty =
                TemplateNode::guard(GuardTest::HasNoneOf(members.clone()), self.address.clone())
                    .with_child(self.choice_prompt(&members, occurs));
            let more =
                TemplateNode::guard(GuardTest::HasAnyOf(members.clone()), self.address.clone())
                    .with_child(
                    TemplateNode::guard(
                        GuardTest::MembersBelow {
                            members: members.clone(),
                            limit: occurs.max,
                        },
                        self.address.clone(),
                    )
                    .with_child(
                        TemplateNode::toggle("add new child")
                            .with_child(self.choice_prompt(&members, occurs)),
                    ),
                );
            self.emit(
                TemplateNode::guard(GuardTest::Exists, self.address.clone())
                    .with_child(empty)
                    .with_child(more),
            );
        }
        Ok(())
    }

    fn choice_prompt(&self, members: &[PrefixedName], occurs: Occurs) -> TemplateNode {
        TemplateNode::ChoicePrompt {
            target: self.address.clone(),
            required: occurs.min >= 1,
            candidates: members.to_vec(),
        }
    }
}

//! The recursive template compiler.
//!
//! [`Compiler::compile`] walks the schema below an address and produces a [`Template`]. The
//! walk is driven by [`NodeKind`](classify::NodeKind): each address is classified once and
//! dispatched to the renderer for its kind, which in turn recurses into children with fresh
//! [`RenderContext`](context::RenderContext)s. Failures below the root are logged through the
//! injected [`CompileLog`] and leave the failing subtree out.

mod choice;
mod classify;
mod complex;
mod compositor;
mod context;
mod derived;
mod diagnostics;
mod error;
mod gating;
mod repeat;
mod simple;
mod substitution;

#[cfg(test)]
mod tests;

use crate::address::Address;
use crate::template::{Mode, Template, TemplateNode};
use crate::xsd::SchemaQuery;

use classify::NodeKind;
use context::RenderContext;
use simple::SimpleRole;

pub use diagnostics::{CollectingLog, CompileLog, LogEntry, Severity, TracingLog};
pub use error::CompileError;

pub struct Compiler<'s> {
    schema: &'s dyn SchemaQuery,
    log: &'s dyn CompileLog,
    mode: Mode,
}

impl<'s> Compiler<'s> {
    pub fn new(schema: &'s dyn SchemaQuery, log: &'s dyn CompileLog, mode: Mode) -> Self {
        Self { schema, log, mode }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Compiles the template for the node at `address`. Only an address the schema does not
    /// know is an error; everything below it degrades to missing subtrees.
    pub fn compile(&self, address: &Address) -> Result<Template, CompileError> {
        if self.schema.schema_node(&address.to_schema_address()).is_none() {
            return Err(CompileError::UnknownAddress(address.clone()));
        }
        let mut nodes = Vec::new();
        let mut context = RenderContext::root(self, address.clone(), &mut nodes);
        context.render();
        Ok(Template {
            root: address.clone(),
            mode: self.mode,
            nodes,
        })
    }
}

impl<'e> RenderContext<'e, '_> {
    /// Classifies the node and renders it into the container, without gating.
    pub(super) fn render_node(&mut self) -> Result<(), CompileError> {
        let kind = self.classify()?;
        self.debug(format!("classified as {}", kind.name()));
        match kind {
            NodeKind::Recursive => {
                self.emit(TemplateNode::Recursive {
                    address: self.address.clone(),
                });
                Ok(())
            }
            NodeKind::Attribute | NodeKind::SimpleType => self.render_simple(SimpleRole::Plain),
            NodeKind::AnyType => self.render_any(None),
            NodeKind::ComplexType(_) | NodeKind::DerivedContentModel(_) => {
                self.render_complex(kind, None, false)
            }
            NodeKind::DerivedTextOnlyModel(derivation) => self.render_text_only(derivation, None),
            NodeKind::SubstitutionGroup | NodeKind::RepeatingSubstitutionGroup => {
                self.render_substitution_group()
            }
            NodeKind::RepeatingSimpleType
            | NodeKind::RepeatingAnyType
            | NodeKind::RepeatingComplexType(_)
            | NodeKind::RepeatingDerivedContentModel(_)
            | NodeKind::RepeatingDerivedTextOnlyModel(_) => self.render_repeating(kind.item()),
        }
    }

    /// Renders one occurrence of a node at an indexed address.
    pub(super) fn render_item(
        &mut self,
        kind: NodeKind<'e>,
        index_id: &str,
        collapsible: bool,
    ) -> Result<(), CompileError> {
        match kind.item() {
            NodeKind::Recursive => {
                self.emit(TemplateNode::Recursive {
                    address: self.address.clone(),
                });
                Ok(())
            }
            NodeKind::Attribute | NodeKind::SimpleType => {
                self.render_simple(SimpleRole::Item(index_id))
            }
            NodeKind::AnyType => self.render_any(Some(index_id)),
            item @ (NodeKind::ComplexType(_) | NodeKind::DerivedContentModel(_)) => {
                self.render_complex(item, Some(index_id), collapsible)
            }
            NodeKind::DerivedTextOnlyModel(derivation) => {
                self.render_text_only(derivation, Some(index_id))
            }
            NodeKind::SubstitutionGroup => {
                // A concrete head listed among its own members renders as its declared type.
                let type_id = self.node()?.type_id;
                let mut body = Vec::new();
                let mut own = self.with_type(type_id, &mut body);
                let kind = own.classify()?;
                own.render_item(kind, index_id, collapsible)?;
                self.emit_all(body);
                Ok(())
            }
            repeating => Err(CompileError::inconsistency(
                &self.address,
                format!("{} is not a single occurrence", repeating.name()),
            )),
        }
    }
}

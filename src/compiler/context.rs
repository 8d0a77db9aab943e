use crate::address::Address;
use crate::template::{Mode, TemplateNode};
use crate::xsd::{SchemaNode, SchemaQuery, TypeId};

use super::diagnostics::{LogEntry, Severity};
use super::error::CompileError;
use super::Compiler;

/// State of one step of the walk. Each recursive step gets a fresh context that owns a
/// borrow of the container its output goes to; ancestors' contexts are never changed.
pub(crate) struct RenderContext<'e, 'c> {
    pub(super) compiler: &'e Compiler<'e>,
    pub(super) address: Address,
    /// Renders the node as if it had this type; set when a derived model renders its base
    pub(super) type_override: Option<TypeId>,
    pub(super) depth: usize,
    container: &'c mut Vec<TemplateNode>,
}

impl<'e, 'c> RenderContext<'e, 'c> {
    pub(super) fn root(
        compiler: &'e Compiler<'e>,
        address: Address,
        container: &'c mut Vec<TemplateNode>,
    ) -> Self {
        Self {
            compiler,
            address,
            type_override: None,
            depth: 0,
            container,
        }
    }

    /// A context for a child node one level down.
    pub(super) fn child<'d>(
        &self,
        address: Address,
        container: &'d mut Vec<TemplateNode>,
    ) -> RenderContext<'e, 'd> {
        RenderContext {
            compiler: self.compiler,
            address,
            type_override: None,
            depth: self.depth + 1,
            container,
        }
    }

    /// A context for another occurrence of the same node, e.g. an indexed item.
    pub(super) fn at<'d>(
        &self,
        address: Address,
        container: &'d mut Vec<TemplateNode>,
    ) -> RenderContext<'e, 'd> {
        RenderContext {
            compiler: self.compiler,
            address,
            type_override: self.type_override,
            depth: self.depth,
            container,
        }
    }

    /// The same node rendered as `type_id`.
    pub(super) fn with_type<'d>(
        &self,
        type_id: TypeId,
        container: &'d mut Vec<TemplateNode>,
    ) -> RenderContext<'e, 'd> {
        RenderContext {
            compiler: self.compiler,
            address: self.address.clone(),
            type_override: Some(type_id),
            depth: self.depth,
            container,
        }
    }

    pub(super) fn schema(&self) -> &'e dyn SchemaQuery {
        self.compiler.schema
    }

    pub(super) fn mode(&self) -> Mode {
        self.compiler.mode
    }

    pub(super) fn is_edit(&self) -> bool {
        self.compiler.mode == Mode::Edit
    }

    pub(super) fn node(&self) -> Result<&'e SchemaNode, CompileError> {
        self.schema()
            .schema_node(&self.address.to_schema_address())
            .ok_or_else(|| CompileError::UnknownAddress(self.address.clone()))
    }

    pub(super) fn type_id(&self) -> Result<TypeId, CompileError> {
        match self.type_override {
            Some(type_id) => Ok(type_id),
            None => Ok(self.node()?.type_id),
        }
    }

    pub(super) fn emit(&mut self, node: TemplateNode) {
        self.container.push(node);
    }

    pub(super) fn emit_all(&mut self, nodes: impl IntoIterator<Item = TemplateNode>) {
        self.container.extend(nodes);
    }

    pub(super) fn debug(&self, message: impl Into<String>) {
        self.compiler.log.log(LogEntry {
            severity: Severity::Debug,
            address: self.address.clone(),
            message: message.into(),
        });
    }

    /// Records a failure whose subtree is left out.
    pub(super) fn skipped(&self, error: &CompileError) {
        self.compiler.log.log(LogEntry {
            severity: Severity::Warning,
            address: self.address.clone(),
            message: format!("skipping subtree: {error}"),
        });
    }
}

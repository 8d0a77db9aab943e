use crate::template::{GroupClass, TemplateNode};
use crate::xsd::{ContentModel, Derivation, DerivationMethod, TypeDefinition, TypeId};

use super::classify::NodeKind;
use super::context::RenderContext;
use super::error::CompileError;
use super::simple::SimpleRole;

/// Bound on extension chains, which a malformed schema can make circular.
const MAX_BASE_DEPTH: usize = 32;

impl<'e> RenderContext<'e, '_> {
    /// `complexContent`: an extension renders its base inline at the same address, then its
    /// own children. A restriction restates everything it keeps, so only its children render.
    pub(super) fn render_derivation(
        &mut self,
        derivation: &'e Derivation,
    ) -> Result<(), CompileError> {
        self.render_derivation_at_depth(derivation, 0)
    }

    fn render_derivation_at_depth(
        &mut self,
        derivation: &'e Derivation,
        base_depth: usize,
    ) -> Result<(), CompileError> {
        match derivation.method {
            DerivationMethod::Extension => {
                if base_depth >= MAX_BASE_DEPTH {
                    return Err(CompileError::inconsistency(
                        &self.address,
                        "extension chain does not terminate",
                    ));
                }
                let base = self.base_type(derivation)?;
                match self.schema().type_definition(base) {
                    TypeDefinition::Complex(complex) => match complex.content_model() {
                        ContentModel::Constructs(constructs) => self.render_constructs(constructs),
                        ContentModel::Derived(inner) => {
                            self.render_derivation_at_depth(inner, base_depth + 1)?
                        }
                        ContentModel::TextOnly(inner) => self.render_text_only(inner, None)?,
                    },
                    // Extending anyType or a simple type adds nothing to inline.
                    TypeDefinition::Builtin(_) | TypeDefinition::Simple(_) => {}
                }
            }
            DerivationMethod::Restriction => {
                self.debug("complex restriction renders its declared children only");
            }
        }
        self.render_constructs(&derivation.children);
        Ok(())
    }

    /// `simpleContent`: the base type's input as the text value, then the declared
    /// attributes, inside one box.
    pub(super) fn render_text_only(
        &mut self,
        derivation: &'e Derivation,
        index_id: Option<&str>,
    ) -> Result<(), CompileError> {
        self.render_text_only_at_depth(derivation, index_id, 0)
    }

    fn render_text_only_at_depth(
        &mut self,
        derivation: &'e Derivation,
        index_id: Option<&str>,
        base_depth: usize,
    ) -> Result<(), CompileError> {
        if base_depth >= MAX_BASE_DEPTH {
            return Err(CompileError::inconsistency(
                &self.address,
                "extension chain does not terminate",
            ));
        }
        if derivation.method == DerivationMethod::Restriction {
            self.skipped(&CompileError::UnsupportedDerivation {
                address: self.address.clone(),
                method: "restriction",
            });
            return Ok(());
        }
        let base = self.base_type(derivation)?;

        let node = self.node()?;
        let role = match index_id {
            Some(index_id) => SimpleRole::Item(index_id),
            None if node.occurs.is_optional() && !self.schema().is_repeating(&self.address) => {
                SimpleRole::OptionalValue
            }
            None => SimpleRole::Plain,
        };

        let mut content = Vec::new();
        {
            let mut value = self.with_type(base, &mut content);
            match value.classify()? {
                NodeKind::DerivedTextOnlyModel(inner) => {
                    value.render_text_only_at_depth(inner, index_id, base_depth + 1)?
                }
                _ => value.render_simple(role)?,
            }
        }
        self.at(self.address.clone(), &mut content)
            .render_constructs(&derivation.children);
        self.emit(TemplateNode::group(GroupClass::Box).with_children(content));
        Ok(())
    }

    fn base_type(&self, derivation: &Derivation) -> Result<TypeId, CompileError> {
        self.schema()
            .schema_set()
            .resolve_type_ref(&derivation.base)
            .ok_or_else(|| CompileError::inconsistency(&self.address, "base type is not defined"))
    }
}

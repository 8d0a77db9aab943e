use crate::template::{AffordanceKind, GuardTest, InputKind, Label, Mode, TemplateNode};
use crate::xsd::{SchemaNode, TypeId};

use super::context::RenderContext;
use super::error::CompileError;

/// Where a scalar field sits, which decides its controls.
#[derive(Copy, Clone, Debug)]
pub(crate) enum SimpleRole<'i> {
    Plain,
    /// The text value of an optional, non-repeating derived model
    OptionalValue,
    /// One occurrence of a repeated node, numbered by the iteration variable
    Item(&'i str),
}

impl RenderContext<'_, '_> {
    pub(super) fn render_simple(&mut self, role: SimpleRole<'_>) -> Result<(), CompileError> {
        let node = self.node()?;
        let type_id = self.type_id()?;
        let input = self.input_kind(node, type_id);

        let mut label = Label::for_address(&self.address).required(node.required);
        if let SimpleRole::Item(index_id) = role {
            label = label.indexed(index_id);
        }
        let options = match input {
            InputKind::Select | InputKind::MultiSelect => {
                self.schema().schema_set().enumeration_of(type_id).to_vec()
            }
            _ => Vec::new(),
        };
        let mut field =
            TemplateNode::field(self.address.clone(), input, label).with_options(options);

        if self.is_edit() {
            match role {
                SimpleRole::Item(_) => field.push(TemplateNode::affordance(
                    AffordanceKind::Delete,
                    self.address.clone(),
                    "delete",
                )),
                SimpleRole::OptionalValue => {
                    for control in self.optional_item_controls() {
                        field.push(control);
                    }
                }
                SimpleRole::Plain if self.schema().is_choice_element(&self.address) => {
                    for control in self.optional_item_controls() {
                        field.push(control);
                    }
                }
                SimpleRole::Plain => {}
            }
        }
        self.emit(field);
        Ok(())
    }

    /// Wildcard content: free text while editing, escaped markup for display.
    pub(super) fn render_any(&mut self, index_id: Option<&str>) -> Result<(), CompileError> {
        let node = self.node()?;
        let input = match self.mode() {
            Mode::Edit => InputKind::FreeText,
            Mode::Display => InputKind::EscapedMarkup,
        };
        let mut label = Label::for_address(&self.address).required(node.required);
        if let Some(index_id) = index_id {
            label = label.indexed(index_id);
        }
        let mut field = TemplateNode::field(self.address.clone(), input, label);
        if self.is_edit() && index_id.is_some() {
            field.push(TemplateNode::affordance(
                AffordanceKind::Delete,
                self.address.clone(),
                "delete",
            ));
        }
        self.emit(field);
        Ok(())
    }

    /// "choose" while the node is absent, "remove" once it exists.
    pub(super) fn optional_item_controls(&self) -> [TemplateNode; 2] {
        let name = Label::for_address(&self.address).text;
        [
            TemplateNode::guard(GuardTest::NotExists, self.address.clone()).with_child(
                TemplateNode::affordance(
                    AffordanceKind::Choose,
                    self.address.clone(),
                    format!("choose {name}"),
                ),
            ),
            TemplateNode::guard(GuardTest::Exists, self.address.clone()).with_child(
                TemplateNode::affordance(
                    AffordanceKind::Remove,
                    self.address.clone(),
                    format!("remove {name}"),
                ),
            ),
        ]
    }

    fn input_kind(&self, node: &SchemaNode, type_id: TypeId) -> InputKind {
        let set = self.schema().schema_set();
        if self.mode() == Mode::Display {
            return InputKind::Display;
        }
        if set.is_language(type_id) {
            return InputKind::LanguageSelect;
        }
        if set.is_boolean(type_id) {
            return InputKind::BooleanSelect;
        }
        if node.name.local_name.starts_with("description") {
            return InputKind::TextArea;
        }
        if set.is_enumeration(type_id) {
            return if node.occurs.max.is_many() {
                InputKind::MultiSelect
            } else {
                InputKind::Select
            };
        }
        if set.is_combo_union(type_id) {
            return InputKind::Combo;
        }
        InputKind::Text
    }
}

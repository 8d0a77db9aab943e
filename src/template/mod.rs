//! The output template tree.
//!
//! A template is independent of any instance document: every decision that depends on what a
//! record actually contains is carried as a [`TemplateNode::Guard`] or
//! [`TemplateNode::Iteration`] and resolved later by a binder.

use std::fmt;

use crate::address::Address;
use crate::xsd::{MaxOccurs, PrefixedName};

mod xml;

pub use xml::SerializeError;
pub(crate) use xml::prompt_label;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Mode {
    /// Fields are inputs and carry add/delete/choose controls
    Edit,
    /// Read-only rendering of present values
    Display,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Display => "display",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub root: Address,
    pub mode: Mode,
    pub nodes: Vec<TemplateNode>,
}

impl Template {
    pub fn to_xml(&self) -> Result<String, SerializeError> {
        xml::write_template(self)
    }

    /// All nodes in document order.
    pub fn walk(&self) -> impl Iterator<Item = &TemplateNode> {
        let mut stack: Vec<&TemplateNode> = self.nodes.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GroupClass {
    /// Container for the fields of a complex node at the given nesting depth
    Level(usize),
    SubElements { collapsible: bool },
    Compositor,
    /// Text value and attributes of a text-only derived model
    Box,
}

impl fmt::Display for GroupClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(depth) => write!(f, "level-{depth}"),
            Self::SubElements { collapsible: true } => f.write_str("sub-elements collapsible"),
            Self::SubElements { collapsible: false } => f.write_str("sub-elements"),
            Self::Compositor => f.write_str("compositor"),
            Self::Box => f.write_str("box"),
        }
    }
}

/// A condition evaluated against the bound instance. The address it applies to is kept on
/// the enclosing guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardTest {
    Exists,
    NotExists,
    HasNoChildren,
    /// At least one of `members` occurs below the target
    HasAnyOf(Vec<PrefixedName>),
    HasNoneOf(Vec<PrefixedName>),
    /// Fewer occurrences of the target than `limit`
    CountBelow(MaxOccurs),
    /// Fewer occurrences of all `members` below the target than `limit`
    MembersBelow {
        members: Vec<PrefixedName>,
        limit: MaxOccurs,
    },
}

impl GuardTest {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::NotExists => "not-exists",
            Self::HasNoChildren => "has-no-children",
            Self::HasAnyOf(_) => "has-any-of",
            Self::HasNoneOf(_) => "has-none-of",
            Self::CountBelow(_) => "count-below",
            Self::MembersBelow { .. } => "members-below",
        }
    }

    pub fn limit(&self) -> Option<MaxOccurs> {
        match self {
            Self::CountBelow(limit) | Self::MembersBelow { limit, .. } => Some(*limit),
            _ => None,
        }
    }

    /// The element names a membership test counts.
    pub fn members(&self) -> &[PrefixedName] {
        match self {
            Self::HasAnyOf(members)
            | Self::HasNoneOf(members)
            | Self::MembersBelow { members, .. } => members,
            _ => &[],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    Text,
    TextArea,
    Select,
    MultiSelect,
    BooleanSelect,
    Combo,
    LanguageSelect,
    FreeText,
    Display,
    EscapedMarkup,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TextArea => "textarea",
            Self::Select => "select",
            Self::MultiSelect => "multi-select",
            Self::BooleanSelect => "boolean-select",
            Self::Combo => "combo",
            Self::LanguageSelect => "language-select",
            Self::FreeText => "free-text",
            Self::Display => "display",
            Self::EscapedMarkup => "escaped-markup",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AffordanceKind {
    /// Create the first occurrence of an empty repeating node
    AddFirst,
    AddSibling,
    AddChild,
    Delete,
    ChoiceDelete,
    /// Create an optional node
    Choose,
    /// Remove an optional node
    Remove,
    AddMember,
}

impl AffordanceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddFirst => "add-first",
            Self::AddSibling => "add-sibling",
            Self::AddChild => "add-child",
            Self::Delete => "delete",
            Self::ChoiceDelete => "choice-delete",
            Self::Choose => "choose",
            Self::Remove => "remove",
            Self::AddMember => "add-member",
        }
    }
}

/// A field or header caption. Labels of repeated items are numbered by their iteration
/// variable once bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub index_id: Option<String>,
    pub required: bool,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            index_id: None,
            required: false,
        }
    }

    /// The caption for the leaf of `address`.
    pub fn for_address(address: &Address) -> Self {
        Self::new(
            address
                .leaf_name()
                .map(|name| name.local_name.clone())
                .unwrap_or_default(),
        )
    }

    pub fn indexed(mut self, index_id: impl Into<String>) -> Self {
        self.index_id = Some(index_id.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateNode {
    Group {
        class: GroupClass,
        children: Vec<TemplateNode>,
    },
    Header {
        label: Label,
        controls: Vec<TemplateNode>,
    },
    Field {
        address: Address,
        input: InputKind,
        label: Label,
        /// Enumerated values offered by select inputs
        options: Vec<String>,
        controls: Vec<TemplateNode>,
    },
    Guard {
        test: GuardTest,
        target: Address,
        children: Vec<TemplateNode>,
    },
    Iteration {
        sibling_path: Address,
        index_id: String,
        /// `sibling_path` indexed by `index_id`
        item_path: Address,
        children: Vec<TemplateNode>,
    },
    Affordance {
        kind: AffordanceKind,
        target: Address,
        label: String,
        candidates: Vec<PrefixedName>,
    },
    /// Selector shown while no member of a choice has been created
    ChoicePrompt {
        target: Address,
        required: bool,
        candidates: Vec<PrefixedName>,
    },
    Toggle {
        label: String,
        children: Vec<TemplateNode>,
    },
    /// A recursive element that is not expanded further
    Recursive { address: Address },
}

impl TemplateNode {
    pub fn group(class: GroupClass) -> Self {
        Self::Group {
            class,
            children: Vec::new(),
        }
    }

    pub fn header(label: Label) -> Self {
        Self::Header {
            label,
            controls: Vec::new(),
        }
    }

    pub fn field(address: Address, input: InputKind, label: Label) -> Self {
        Self::Field {
            address,
            input,
            label,
            options: Vec::new(),
            controls: Vec::new(),
        }
    }

    pub fn guard(test: GuardTest, target: Address) -> Self {
        Self::Guard {
            test,
            target,
            children: Vec::new(),
        }
    }

    pub fn iteration(sibling_path: Address, index_id: String, item_path: Address) -> Self {
        Self::Iteration {
            sibling_path,
            index_id,
            item_path,
            children: Vec::new(),
        }
    }

    pub fn affordance(kind: AffordanceKind, target: Address, label: impl Into<String>) -> Self {
        Self::Affordance {
            kind,
            target,
            label: label.into(),
            candidates: Vec::new(),
        }
    }

    pub fn toggle(label: impl Into<String>) -> Self {
        Self::Toggle {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn with_candidates(mut self, names: Vec<PrefixedName>) -> Self {
        if let Self::Affordance { candidates, .. } | Self::ChoicePrompt { candidates, .. } =
            &mut self
        {
            *candidates = names;
        }
        self
    }

    pub fn with_options(mut self, values: Vec<String>) -> Self {
        if let Self::Field { options, .. } = &mut self {
            *options = values;
        }
        self
    }

    /// Appends a child. Headers and fields take their children as controls; leaves ignore
    /// the call.
    pub fn push(&mut self, child: TemplateNode) {
        if let Some(children) = self.children_mut() {
            children.push(child);
        }
    }

    pub fn with_child(mut self, child: TemplateNode) -> Self {
        self.push(child);
        self
    }

    pub fn with_children(mut self, nodes: impl IntoIterator<Item = TemplateNode>) -> Self {
        if let Some(children) = self.children_mut() {
            children.extend(nodes);
        }
        self
    }

    pub fn children(&self) -> &[TemplateNode] {
        match self {
            Self::Group { children, .. }
            | Self::Guard { children, .. }
            | Self::Iteration { children, .. }
            | Self::Toggle { children, .. }
            | Self::Header {
                controls: children, ..
            }
            | Self::Field {
                controls: children, ..
            } => children,
            Self::Affordance { .. } | Self::ChoicePrompt { .. } | Self::Recursive { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<TemplateNode>> {
        match self {
            Self::Group { children, .. }
            | Self::Guard { children, .. }
            | Self::Iteration { children, .. }
            | Self::Toggle { children, .. }
            | Self::Header {
                controls: children, ..
            }
            | Self::Field {
                controls: children, ..
            } => Some(children),
            Self::Affordance { .. } | Self::ChoicePrompt { .. } | Self::Recursive { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_visits_in_document_order() {
        let root = Address::parse("/record").unwrap();
        let title = root.child(PrefixedName::unprefixed("title"));
        let template = Template {
            root: root.clone(),
            mode: Mode::Edit,
            nodes: vec![TemplateNode::group(GroupClass::Level(0))
                .with_child(TemplateNode::header(Label::for_address(&root)))
                .with_child(
                    TemplateNode::guard(GuardTest::Exists, root.clone()).with_child(
                        TemplateNode::field(
                            title.clone(),
                            InputKind::Text,
                            Label::for_address(&title),
                        ),
                    ),
                )],
        };
        let kinds: Vec<&str> = template
            .walk()
            .map(|node| match node {
                TemplateNode::Group { .. } => "group",
                TemplateNode::Header { .. } => "header",
                TemplateNode::Guard { .. } => "guard",
                TemplateNode::Field { .. } => "field",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["group", "header", "guard", "field"]);
    }

    #[test]
    fn leaves_ignore_children() {
        let target = Address::parse("/record").unwrap();
        let mut node = TemplateNode::affordance(AffordanceKind::Delete, target, "delete");
        node.push(TemplateNode::toggle("ignored"));
        assert!(node.children().is_empty());
    }

    #[test]
    fn limits_are_exposed() {
        assert_eq!(
            GuardTest::CountBelow(MaxOccurs::Count(3)).limit(),
            Some(MaxOccurs::Count(3))
        );
        assert_eq!(GuardTest::Exists.limit(), None);
    }
}

//! Evaluates a compiled [`Template`] against an instance document.
//!
//! Binding resolves every guard, expands iterations into numbered rows and reads field
//! values. It needs no schema access: names are matched through the same
//! [`InstanceNamespaces`] the template was compiled with, and cardinality limits travel in
//! the guards.

use std::collections::HashMap;
use std::fmt;

use roxmltree::{Document, Node};
use thiserror::Error;

use crate::address::{Address, Index, Segment};
use crate::template::{
    prompt_label, AffordanceKind, GroupClass, GuardTest, InputKind, Label, Template, TemplateNode,
};
use crate::xsd::builtins::XS_NAMESPACE;
use crate::xsd::{InstanceNamespaces, PrefixedName};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("instance root <{found}> does not match template root {expected}")]
    RootMismatch { expected: String, found: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundNode {
    Group {
        class: GroupClass,
        children: Vec<BoundNode>,
    },
    Header {
        label: String,
        controls: Vec<BoundNode>,
    },
    Field {
        address: Address,
        input: InputKind,
        label: String,
        value: Option<String>,
        controls: Vec<BoundNode>,
    },
    /// One occurrence of an iteration
    Row {
        index: usize,
        address: Address,
        children: Vec<BoundNode>,
    },
    Affordance {
        kind: AffordanceKind,
        target: Address,
        label: String,
        candidates: Vec<PrefixedName>,
    },
    ChoicePrompt {
        target: Address,
        label: &'static str,
        candidates: Vec<PrefixedName>,
    },
    Toggle {
        label: String,
        children: Vec<BoundNode>,
    },
    Recursive {
        address: Address,
    },
}

impl BoundNode {
    pub fn children(&self) -> &[BoundNode] {
        match self {
            Self::Group { children, .. }
            | Self::Row { children, .. }
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
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundForm {
    pub nodes: Vec<BoundNode>,
}

impl BoundForm {
    /// All nodes in document order.
    pub fn walk(&self) -> impl Iterator<Item = &BoundNode> {
        let mut stack: Vec<&BoundNode> = self.nodes.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = (usize, &Address)> {
        self.walk().filter_map(|node| match node {
            BoundNode::Row { index, address, .. } => Some((*index, address)),
            _ => None,
        })
    }

    pub fn affordances(&self, kind: AffordanceKind) -> usize {
        self.walk()
            .filter(|node| matches!(node, BoundNode::Affordance { kind: k, .. } if *k == kind))
            .count()
    }
}

impl fmt::Display for BoundForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write_outline(f, node, 0)?;
        }
        Ok(())
    }
}

fn write_outline(f: &mut fmt::Formatter<'_>, node: &BoundNode, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    match node {
        BoundNode::Group { class, .. } => writeln!(f, "{indent}[{class}]")?,
        BoundNode::Header { label, .. } => writeln!(f, "{indent}# {label}")?,
        BoundNode::Field {
            label,
            value,
            input,
            ..
        } => match value {
            Some(value) => writeln!(f, "{indent}{label} ({}) = {value:?}", input.as_str())?,
            None => writeln!(f, "{indent}{label} ({})", input.as_str())?,
        },
        BoundNode::Row { index, address, .. } => writeln!(f, "{indent}{index}. {address}")?,
        BoundNode::Affordance { label, target, .. } => writeln!(f, "{indent}<{label}> {target}")?,
        BoundNode::ChoicePrompt {
            label, candidates, ..
        } => {
            let candidates: Vec<String> = candidates.iter().map(ToString::to_string).collect();
            writeln!(f, "{indent}{label}: {}", candidates.join(" | "))?
        }
        BoundNode::Toggle { label, .. } => writeln!(f, "{indent}+ {label}")?,
        BoundNode::Recursive { address } => writeln!(f, "{indent}... {address}")?,
    }
    for child in node.children() {
        write_outline(f, child, depth + 1)?;
    }
    Ok(())
}

pub fn bind(
    template: &Template,
    instance: &Document,
    namespaces: &InstanceNamespaces,
) -> Result<BoundForm, BindError> {
    let binder = Binder {
        root: instance.root_element(),
        namespaces,
    };
    let expected = template.root.segments().first();
    if !expected.is_some_and(|segment| binder.matches_element(binder.root, segment.name())) {
        return Err(BindError::RootMismatch {
            expected: template.root.to_string(),
            found: binder.root.tag_name().name().into(),
        });
    }
    let mut bindings = HashMap::new();
    Ok(BoundForm {
        nodes: binder.bind_all(&template.nodes, &mut bindings),
    })
}

struct Binder<'a, 'input> {
    root: Node<'a, 'input>,
    namespaces: &'a InstanceNamespaces,
}

impl<'a, 'input> Binder<'a, 'input> {
    fn bind_all(
        &self,
        nodes: &[TemplateNode],
        bindings: &mut HashMap<String, usize>,
    ) -> Vec<BoundNode> {
        let mut bound = Vec::new();
        for node in nodes {
            self.bind_node(node, bindings, &mut bound);
        }
        bound
    }

    fn bind_node(
        &self,
        node: &TemplateNode,
        bindings: &mut HashMap<String, usize>,
        out: &mut Vec<BoundNode>,
    ) {
        match node {
            TemplateNode::Group { class, children } => out.push(BoundNode::Group {
                class: *class,
                children: self.bind_all(children, bindings),
            }),
            TemplateNode::Header { label, controls } => out.push(BoundNode::Header {
                label: bind_label(label, bindings),
                controls: self.bind_all(controls, bindings),
            }),
            TemplateNode::Field {
                address,
                input,
                label,
                controls,
                ..
            } => {
                let address = address.bind(bindings);
                out.push(BoundNode::Field {
                    value: self.value(&address),
                    address,
                    input: *input,
                    label: bind_label(label, bindings),
                    controls: self.bind_all(controls, bindings),
                })
            }
            TemplateNode::Guard {
                test,
                target,
                children,
            } => {
                if self.holds(test, &target.bind(bindings)) {
                    out.extend(self.bind_all(children, bindings));
                }
            }
            TemplateNode::Iteration {
                sibling_path,
                index_id,
                item_path,
                children,
            } => {
                let count = self.count(&sibling_path.bind(bindings));
                for index in 1..=count {
                    bindings.insert(index_id.clone(), index);
                    out.push(BoundNode::Row {
                        index,
                        address: item_path.bind(bindings),
                        children: self.bind_all(children, bindings),
                    });
                }
                bindings.remove(index_id);
            }
            TemplateNode::Affordance {
                kind,
                target,
                label,
                candidates,
            } => out.push(BoundNode::Affordance {
                kind: *kind,
                target: target.bind(bindings),
                label: label.clone(),
                candidates: candidates.clone(),
            }),
            TemplateNode::ChoicePrompt {
                target,
                required,
                candidates,
            } => out.push(BoundNode::ChoicePrompt {
                target: target.bind(bindings),
                label: prompt_label(*required),
                candidates: candidates.clone(),
            }),
            TemplateNode::Toggle { label, children } => out.push(BoundNode::Toggle {
                label: label.clone(),
                children: self.bind_all(children, bindings),
            }),
            TemplateNode::Recursive { address } => out.push(BoundNode::Recursive {
                address: address.bind(bindings),
            }),
        }
    }

    fn holds(&self, test: &GuardTest, target: &Address) -> bool {
        match test {
            GuardTest::Exists => self.count(target) > 0,
            GuardTest::NotExists => self.count(target) == 0,
            GuardTest::HasNoChildren => self.child_count(target) == 0,
            GuardTest::HasAnyOf(members) => self.member_count(target, members) > 0,
            GuardTest::HasNoneOf(members) => self.member_count(target, members) == 0,
            GuardTest::CountBelow(limit) => limit.admits_more(self.count(target)),
            GuardTest::MembersBelow { members, limit } => {
                limit.admits_more(self.member_count(target, members))
            }
        }
    }

    /// Occurrences of an element or attribute address.
    fn count(&self, address: &Address) -> usize {
        match address.leaf() {
            Some(Segment::Attribute { name }) => self
                .elements(&address.parent().unwrap_or_default())
                .iter()
                .filter(|element| self.attribute(**element, name).is_some())
                .count(),
            _ => self.elements(address).len(),
        }
    }

    fn child_count(&self, address: &Address) -> usize {
        self.elements(address)
            .first()
            .map_or(0, |element| element.children().filter(Node::is_element).count())
    }

    fn member_count(&self, address: &Address, members: &[PrefixedName]) -> usize {
        self.elements(address).first().map_or(0, |element| {
            element
                .children()
                .filter(|child| {
                    child.is_element()
                        && members.iter().any(|name| self.matches_element(*child, name))
                })
                .count()
        })
    }

    fn value(&self, address: &Address) -> Option<String> {
        match address.leaf()? {
            Segment::Attribute { name } => {
                let parent = address.parent()?;
                let element = *self.elements(&parent).first()?;
                self.attribute(element, name).map(Into::into)
            }
            Segment::Element { .. } => {
                let element = *self.elements(address).first()?;
                let text: String = element
                    .children()
                    .filter(Node::is_text)
                    .filter_map(|text| text.text())
                    .collect();
                Some(text.trim().to_string()).filter(|text| !text.is_empty())
            }
        }
    }

    /// Elements selected by the element segments of `address`. Unbound variables select
    /// every occurrence.
    fn elements(&self, address: &Address) -> Vec<Node<'a, 'input>> {
        let mut segments = address.segments().iter();
        let Some(first) = segments.next() else {
            return Vec::new();
        };
        if !self.matches_element(self.root, first.name()) {
            return Vec::new();
        }
        let mut current = vec![self.root];
        for segment in segments {
            let Segment::Element { name, index } = segment else {
                break;
            };
            let mut next = Vec::new();
            for parent in &current {
                let matching = parent
                    .children()
                    .filter(|child| child.is_element() && self.matches_element(*child, name));
                match index {
                    Some(Index::Position(position)) => {
                        next.extend(matching.skip(position.saturating_sub(1)).take(1))
                    }
                    _ => next.extend(matching),
                }
            }
            current = next;
        }
        current
    }

    fn matches_element(&self, element: Node, name: &PrefixedName) -> bool {
        if !self.namespaces.is_enabled() {
            return name.local_name == "any" && name.prefix.is_some()
                || element.tag_name().name() == name.local_name;
        }
        let namespace = self.namespaces.namespace_for_instance_prefix(name.prefix.as_deref());
        if namespace == Some(XS_NAMESPACE) && name.local_name == "any" {
            return true;
        }
        element.tag_name().name() == name.local_name && element.tag_name().namespace() == namespace
    }

    fn attribute(&self, element: Node<'a, 'input>, name: &PrefixedName) -> Option<&'a str> {
        let namespace = match name.prefix.as_deref() {
            Some("xml") => Some(crate::xsd::builtins::XML_NAMESPACE),
            prefix => self.namespaces.namespace_for_instance_prefix(prefix),
        };
        element
            .attributes()
            .find(|attribute| {
                attribute.name() == name.local_name
                    && (!self.namespaces.is_enabled() || attribute.namespace() == namespace)
            })
            .map(|attribute| attribute.value())
    }
}

fn bind_label(label: &Label, bindings: &HashMap<String, usize>) -> String {
    match label
        .index_id
        .as_ref()
        .and_then(|index_id| bindings.get(index_id))
    {
        Some(index) => format!("{} {index}", label.text),
        None => label.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Mode;
    use crate::xsd::{MaxOccurs, NamespaceRegistry};

    fn addr(source: &str) -> Address {
        Address::parse(source).unwrap()
    }

    fn keywords_template() -> Template {
        let keyword = addr("/record/keyword");
        let item = addr("/record/keyword[$keywordIndex]");
        Template {
            root: addr("/record"),
            mode: Mode::Edit,
            nodes: vec![
                TemplateNode::guard(GuardTest::Exists, keyword.clone())
                    .with_child(
                        TemplateNode::iteration(
                            keyword.clone(),
                            "keywordIndex".into(),
                            item.clone(),
                        )
                        .with_child(TemplateNode::field(
                            item,
                            InputKind::Text,
                            Label::new("keyword").indexed("keywordIndex"),
                        )),
                    )
                    .with_child(
                        TemplateNode::guard(
                            GuardTest::CountBelow(MaxOccurs::Count(2)),
                            keyword.clone(),
                        )
                        .with_child(TemplateNode::affordance(
                            AffordanceKind::AddSibling,
                            keyword.clone(),
                            "add keyword",
                        )),
                    ),
                TemplateNode::guard(GuardTest::NotExists, keyword.clone()).with_child(
                    TemplateNode::affordance(AffordanceKind::AddFirst, keyword, "add keyword"),
                ),
            ],
        }
    }

    #[test]
    fn iterations_bind_positions_and_values() {
        let doc =
            Document::parse("<record><keyword>alpha</keyword><keyword> beta </keyword></record>")
                .unwrap();
        let form = bind(&keywords_template(), &doc, &InstanceNamespaces::disabled()).unwrap();
        let rows: Vec<String> = form.rows().map(|(_, address)| address.to_string()).collect();
        assert_eq!(rows, ["/record/keyword[1]", "/record/keyword[2]"]);
        let values: Vec<(String, Option<String>)> = form
            .walk()
            .filter_map(|node| match node {
                BoundNode::Field { label, value, .. } => Some((label.clone(), value.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            values,
            [
                ("keyword 1".to_string(), Some("alpha".to_string())),
                ("keyword 2".to_string(), Some("beta".to_string()))
            ]
        );
        // the limit of two is reached
        assert_eq!(form.affordances(AffordanceKind::AddSibling), 0);
        assert_eq!(form.affordances(AffordanceKind::AddFirst), 0);
    }

    #[test]
    fn empty_branch_binds_without_occurrences() {
        let doc = Document::parse("<record/>").unwrap();
        let form = bind(&keywords_template(), &doc, &InstanceNamespaces::disabled()).unwrap();
        assert_eq!(form.rows().count(), 0);
        assert_eq!(form.affordances(AffordanceKind::AddFirst), 1);
        assert!(form.to_string().contains("<add keyword> /record/keyword"));
    }

    #[test]
    fn root_must_match() {
        let doc = Document::parse("<other/>").unwrap();
        assert!(matches!(
            bind(&keywords_template(), &doc, &InstanceNamespaces::disabled()),
            Err(BindError::RootMismatch { .. })
        ));
    }

    #[test]
    fn names_match_through_instance_prefixes() {
        let mut registry = NamespaceRegistry::new();
        registry.register("", "urn:record");
        registry.register("xs", XS_NAMESPACE);
        let namespaces = InstanceNamespaces::new(registry, "rec");
        let doc = Document::parse(
            r#"<record xmlns="urn:record" xml:lang="en">
                 <title>A</title><title xmlns="urn:other">B</title>
               </record>"#,
        )
        .unwrap();
        let binder = Binder {
            root: doc.root_element(),
            namespaces: &namespaces,
        };
        assert_eq!(binder.count(&addr("/rec:record/rec:title")), 1);
        assert_eq!(binder.value(&addr("/rec:record/@xml:lang")).as_deref(), Some("en"));
        // wildcards match any child element
        assert_eq!(binder.count(&addr("/rec:record/xs:any")), 2);
    }
}

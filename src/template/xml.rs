use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use super::{Label, Template, TemplateNode};

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error("serialized template is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

type XmlWriter = Writer<Vec<u8>>;

pub(super) fn write_template(template: &Template) -> Result<String, SerializeError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let root = template.root.to_string();
    let start = BytesStart::new("template")
        .with_attributes([("root", root.as_str()), ("mode", template.mode.as_str())]);
    writer.write_event(Event::Start(start))?;
    for node in &template.nodes {
        write_node(&mut writer, node)?;
    }
    writer.write_event(Event::End(BytesEnd::new("template")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_node(writer: &mut XmlWriter, node: &TemplateNode) -> Result<(), SerializeError> {
    match node {
        TemplateNode::Group { class, children } => {
            let class = class.to_string();
            let start = BytesStart::new("group").with_attributes([("class", class.as_str())]);
            write_container(writer, start, children)
        }
        TemplateNode::Header { label, controls } => {
            writer.write_event(Event::Start(BytesStart::new("header")))?;
            write_label(writer, label)?;
            for control in controls {
                write_node(writer, control)?;
            }
            writer.write_event(Event::End(BytesEnd::new("header")))?;
            Ok(())
        }
        TemplateNode::Field {
            address,
            input,
            label,
            options,
            controls,
        } => {
            let path = address.to_string();
            let start = BytesStart::new("field")
                .with_attributes([("path", path.as_str()), ("input", input.as_str())]);
            writer.write_event(Event::Start(start))?;
            write_label(writer, label)?;
            for value in options {
                write_text_element(writer, "option", value)?;
            }
            for control in controls {
                write_node(writer, control)?;
            }
            writer.write_event(Event::End(BytesEnd::new("field")))?;
            Ok(())
        }
        TemplateNode::Guard {
            test,
            target,
            children,
        } => {
            let path = target.to_string();
            let mut start = BytesStart::new("guard")
                .with_attributes([("test", test.as_str()), ("path", path.as_str())]);
            if let Some(limit) = test.limit() {
                start.push_attribute(("limit", limit.to_string().as_str()));
            }
            if !test.members().is_empty() {
                start.push_attribute(("members", join_names(test.members()).as_str()));
            }
            write_container(writer, start, children)
        }
        TemplateNode::Iteration {
            sibling_path,
            index_id,
            item_path,
            children,
        } => {
            let sibling_path = sibling_path.to_string();
            let item_path = item_path.to_string();
            let start = BytesStart::new("iterate").with_attributes([
                ("sibling-path", sibling_path.as_str()),
                ("index-id", index_id.as_str()),
                ("item-path", item_path.as_str()),
            ]);
            write_container(writer, start, children)
        }
        TemplateNode::Affordance {
            kind,
            target,
            label,
            candidates,
        } => {
            let target = target.to_string();
            let mut start = BytesStart::new("affordance")
                .with_attributes([("kind", kind.as_str()), ("target", target.as_str())]);
            if !candidates.is_empty() {
                start.push_attribute(("candidates", join_names(candidates).as_str()));
            }
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(label)))?;
            writer.write_event(Event::End(BytesEnd::new("affordance")))?;
            Ok(())
        }
        TemplateNode::ChoicePrompt {
            target,
            required,
            candidates,
        } => {
            let target = target.to_string();
            let start = BytesStart::new("choice-prompt").with_attributes([
                ("target", target.as_str()),
                ("required", if *required { "true" } else { "false" }),
            ]);
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Empty(
                BytesStart::new("marker").with_attributes([("path", target.as_str())]),
            ))?;
            write_text_element(writer, "label", prompt_label(*required))?;
            writer.write_event(Event::Start(BytesStart::new("select")))?;
            // Unselected sentinel
            writer.write_event(Event::Empty(
                BytesStart::new("option").with_attributes([("value", "")]),
            ))?;
            for name in candidates {
                write_text_element(writer, "option", &name.to_string())?;
            }
            writer.write_event(Event::End(BytesEnd::new("select")))?;
            writer.write_event(Event::End(BytesEnd::new("choice-prompt")))?;
            Ok(())
        }
        TemplateNode::Toggle { label, children } => {
            let start = BytesStart::new("toggle").with_attributes([("label", label.as_str())]);
            write_container(writer, start, children)
        }
        TemplateNode::Recursive { address } => {
            let path = address.to_string();
            writer.write_event(Event::Empty(
                BytesStart::new("recursive").with_attributes([("path", path.as_str())]),
            ))?;
            Ok(())
        }
    }
}

fn write_container(
    writer: &mut XmlWriter,
    start: BytesStart,
    children: &[TemplateNode],
) -> Result<(), SerializeError> {
    if children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    for child in children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn write_label(writer: &mut XmlWriter, label: &Label) -> Result<(), SerializeError> {
    let mut start = BytesStart::new("label");
    if let Some(index_id) = &label.index_id {
        start.push_attribute(("index-id", index_id.as_str()));
    }
    if label.required {
        start.push_attribute(("required", "true"));
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(&label.text)))?;
    writer.write_event(Event::End(BytesEnd::new("label")))?;
    Ok(())
}

fn write_text_element(
    writer: &mut XmlWriter,
    name: &str,
    text: &str,
) -> Result<(), SerializeError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn join_names(names: &[crate::xsd::PrefixedName]) -> String {
    names
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn prompt_label(required: bool) -> &'static str {
    if required {
        "required choice"
    } else {
        "optional choice"
    }
}

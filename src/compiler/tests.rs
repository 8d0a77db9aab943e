use roxmltree::Document;

use super::*;
use crate::bind::{bind, BoundForm, BoundNode};
use crate::template::{AffordanceKind, GroupClass, GuardTest, InputKind};
use crate::xsd::{InstanceNamespaces, MaxOccurs, QName, SchemaIndex, SchemaLoader};

const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="record" type="recordType"/>
  <xs:element name="collection">
    <xs:complexType>
      <xs:sequence>
        <xs:element ref="record" maxOccurs="unbounded"/>
      </xs:sequence>
      <xs:attribute name="name" type="xs:string"/>
    </xs:complexType>
  </xs:element>
  <xs:complexType name="recordType">
    <xs:sequence>
      <xs:element name="title" type="xs:string"/>
      <xs:group ref="dates"/>
      <xs:element name="description" type="xs:string" minOccurs="0"/>
      <xs:element name="public" type="xs:boolean" minOccurs="0"/>
      <xs:element name="color" type="colorType" minOccurs="0"/>
      <xs:element name="colors" type="colorType" minOccurs="0" maxOccurs="unbounded"/>
      <xs:element name="contributors">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="contributor" type="xs:string" minOccurs="0" maxOccurs="unbounded"/>
          </xs:sequence>
        </xs:complexType>
      </xs:element>
      <xs:element name="creator">
        <xs:complexType>
          <xs:choice>
            <xs:element name="person" type="xs:string"/>
            <xs:element name="organization" type="xs:string"/>
            <xs:sequence>
              <xs:element name="alias" type="xs:string"/>
            </xs:sequence>
          </xs:choice>
        </xs:complexType>
      </xs:element>
      <xs:element name="rights" minOccurs="0">
        <xs:complexType>
          <xs:choice minOccurs="0">
            <xs:element name="license" type="xs:string"/>
            <xs:element name="statement" type="xs:string"/>
          </xs:choice>
        </xs:complexType>
      </xs:element>
      <xs:element name="notes" minOccurs="0">
        <xs:complexType>
          <xs:choice maxOccurs="unbounded">
            <xs:element name="note" type="xs:string"/>
            <xs:element name="link" type="xs:anyURI"/>
          </xs:choice>
        </xs:complexType>
      </xs:element>
      <xs:element ref="shape" minOccurs="0" maxOccurs="unbounded"/>
      <xs:element name="section" type="sectionType" minOccurs="0"/>
      <xs:element name="measure" type="measureType" minOccurs="0"/>
      <xs:element name="measures" type="measureType" minOccurs="0" maxOccurs="unbounded"/>
      <xs:element name="ids" minOccurs="0">
        <xs:complexType>
          <xs:group ref="idChoice" maxOccurs="unbounded"/>
        </xs:complexType>
      </xs:element>
      <xs:element name="extended" type="extendedType" minOccurs="0"/>
      <xs:element name="short" type="shortType" minOccurs="0"/>
      <xs:element name="limit" type="restrictedMeasure" minOccurs="0"/>
      <xs:element name="broken" type="brokenType" minOccurs="0"/>
      <xs:any minOccurs="0"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:ID"/>
    <xs:attribute name="version" type="xs:string"/>
    <xs:attribute ref="xml:lang"/>
    <xs:attributeGroup ref="audit"/>
  </xs:complexType>
  <xs:attributeGroup name="audit">
    <xs:attribute name="created" type="xs:date"/>
    <xs:attributeGroup ref="stamp"/>
  </xs:attributeGroup>
  <xs:attributeGroup name="stamp">
    <xs:attribute name="modified" type="xs:date"/>
  </xs:attributeGroup>
  <xs:group name="dates">
    <xs:sequence>
      <xs:element name="issued" type="xs:date" minOccurs="0"/>
    </xs:sequence>
  </xs:group>
  <xs:group name="idChoice">
    <xs:choice>
      <xs:element name="isbn" type="xs:string"/>
      <xs:element name="issn" type="xs:string"/>
    </xs:choice>
  </xs:group>
  <xs:complexType name="sectionType">
    <xs:sequence>
      <xs:element name="heading" type="xs:string"/>
      <xs:element name="section" type="sectionType" minOccurs="0"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="measureType">
    <xs:simpleContent>
      <xs:extension base="xs:decimal">
        <xs:attribute name="unit" type="xs:string"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:complexType name="restrictedMeasure">
    <xs:simpleContent>
      <xs:restriction base="measureType">
        <xs:maxInclusive value="10"/>
      </xs:restriction>
    </xs:simpleContent>
  </xs:complexType>
  <xs:complexType name="baseType">
    <xs:sequence>
      <xs:element name="label" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="extendedType">
    <xs:complexContent>
      <xs:extension base="baseType">
        <xs:sequence>
          <xs:element name="detail" type="xs:string"/>
        </xs:sequence>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="shortType">
    <xs:complexContent>
      <xs:restriction base="extendedType">
        <xs:sequence>
          <xs:element name="label" type="xs:string"/>
        </xs:sequence>
      </xs:restriction>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="brokenType">
    <xs:sequence>
      <xs:element name="kept" type="xs:string"/>
    </xs:sequence>
    <xs:attributeGroup ref="missing"/>
    <xs:anyAttribute/>
  </xs:complexType>
  <xs:element name="shape" abstract="true" type="xs:string"/>
  <xs:element name="circle" substitutionGroup="shape" type="xs:string"/>
  <xs:element name="square" substitutionGroup="shape" type="xs:string"/>
  <xs:simpleType name="colorType">
    <xs:restriction base="xs:string">
      <xs:enumeration value="red"/>
      <xs:enumeration value="blue"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

fn index() -> SchemaIndex {
    let resolvers = Vec::new();
    let mut loader = SchemaLoader::new(&resolvers);
    loader.load_str(SCHEMA, "record.xsd").unwrap();
    let set = loader.finish();
    SchemaIndex::build(
        set,
        InstanceNamespaces::disabled(),
        [&QName::local("record"), &QName::local("collection")],
    )
    .unwrap()
}

fn addr(source: &str) -> Address {
    Address::parse(source).unwrap()
}

fn compile(index: &SchemaIndex, mode: Mode, root: &str) -> Template {
    let log = CollectingLog::new();
    Compiler::new(index, &log, mode).compile(&addr(root)).unwrap()
}

fn bind_str(template: &Template, instance: &str) -> BoundForm {
    let doc = Document::parse(instance).unwrap();
    bind(template, &doc, &InstanceNamespaces::disabled()).unwrap()
}

/// The group whose header carries `text`.
fn group_labelled<'t>(template: &'t Template, text: &str) -> &'t TemplateNode {
    template
        .walk()
        .find(|node| match node {
            TemplateNode::Group { children, .. } => matches!(
                children.first(),
                Some(TemplateNode::Header { label, .. }) if label.text == text
            ),
            _ => false,
        })
        .unwrap()
}

fn field_addresses(template: &Template) -> Vec<String> {
    template
        .walk()
        .filter_map(|node| match node {
            TemplateNode::Field { address, .. } => Some(address.to_string()),
            _ => None,
        })
        .collect()
}

fn field(template: &Template, address: &str) -> (InputKind, Vec<String>) {
    template
        .walk()
        .find_map(|node| match node {
            TemplateNode::Field {
                address: at,
                input,
                options,
                ..
            } if at.to_string() == address => Some((*input, options.clone())),
            _ => None,
        })
        .unwrap()
}

fn rows_named(form: &BoundForm, name: &str) -> Vec<String> {
    form.rows()
        .filter(|(_, address)| address.leaf_name().is_some_and(|leaf| leaf.local_name == name))
        .map(|(_, address)| address.to_string())
        .collect()
}

fn affordances_at(form: &BoundForm, kind: AffordanceKind, target: &str) -> usize {
    form.walk()
        .filter(|node| {
            matches!(node, BoundNode::Affordance { kind: k, target: t, .. }
                if *k == kind && t.to_string() == target)
        })
        .count()
}

const POPULATED: &str = r#"<record id="r1" xml:lang="en">
  <title>Atlas</title>
  <contributors><contributor>Ada</contributor><contributor>Grace</contributor></contributors>
  <creator><person>Ada</person></creator>
  <notes><note>a</note><link>http://example.org</link><note>b</note></notes>
  <circle>1</circle><square>2</square><circle>3</circle>
</record>"#;

const SPARSE: &str = r#"<record><title>Atlas</title><contributors/><creator/><rights/></record>"#;

#[test]
fn attributes_render_before_elements() {
    let template = compile(&index(), Mode::Edit, "/record");
    let top: Vec<String> = field_addresses(&template)
        .into_iter()
        .filter(|address| address.matches('/').count() == 2)
        .collect();
    assert_eq!(
        &top[..7],
        [
            "/record/@id",
            "/record/@version",
            "/record/@xml:lang",
            "/record/@created",
            "/record/@modified",
            "/record/title",
            "/record/issued"
        ]
    );
}

#[test]
fn inputs_follow_value_types() {
    let template = compile(&index(), Mode::Edit, "/record");
    assert_eq!(field(&template, "/record/title").0, InputKind::Text);
    assert_eq!(field(&template, "/record/description").0, InputKind::TextArea);
    assert_eq!(field(&template, "/record/public").0, InputKind::BooleanSelect);
    assert_eq!(field(&template, "/record/@xml:lang").0, InputKind::LanguageSelect);
    assert_eq!(
        field(&template, "/record/color"),
        (InputKind::Select, vec!["red".to_string(), "blue".to_string()])
    );
    assert_eq!(field(&template, "/record/colors").0, InputKind::MultiSelect);
    assert_eq!(field(&template, "/record/xs:any").0, InputKind::FreeText);
}

#[test]
fn empty_repetition_offers_only_the_first_add() {
    let template = compile(&index(), Mode::Edit, "/record");
    let contributor = "/record/contributors/contributor";

    let form = bind_str(&template, SPARSE);
    assert!(rows_named(&form, "contributor").is_empty());
    assert_eq!(affordances_at(&form, AffordanceKind::AddFirst, contributor), 1);
    assert_eq!(affordances_at(&form, AffordanceKind::AddSibling, contributor), 0);

    let form = bind_str(&template, POPULATED);
    assert_eq!(
        rows_named(&form, "contributor"),
        ["/record/contributors/contributor[1]", "/record/contributors/contributor[2]"]
    );
    assert_eq!(affordances_at(&form, AffordanceKind::AddFirst, contributor), 0);
    assert_eq!(affordances_at(&form, AffordanceKind::AddSibling, contributor), 1);
    let labels: Vec<&str> = form
        .walk()
        .filter_map(|node| match node {
            BoundNode::Field { label, value, .. } if label.starts_with("contributor") => {
                assert!(value.is_some());
                Some(label.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(labels, ["contributor 1", "contributor 2"]);
}

#[test]
fn single_choice_guards_each_member_and_prompts_once() {
    let template = compile(&index(), Mode::Edit, "/record");
    let creator = group_labelled(&template, "creator");
    let content = creator.children()[1].children();
    assert_eq!(content.len(), 4);

    let targets: Vec<String> = content[..3]
        .iter()
        .map(|node| match node {
            TemplateNode::Guard {
                test: GuardTest::Exists,
                target,
                ..
            } => target.to_string(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(
        targets,
        [
            "/record/creator/person",
            "/record/creator/organization",
            "/record/creator/alias"
        ]
    );

    let prompts: Vec<&TemplateNode> = content[3]
        .children()
        .iter()
        .filter(|node| matches!(node, TemplateNode::Guard { test: GuardTest::HasNoneOf(_), .. }))
        .flat_map(|guard| guard.children())
        .collect();
    assert!(matches!(
        prompts.as_slice(),
        [TemplateNode::ChoicePrompt { required: true, candidates, .. }] if candidates.len() == 3
    ));
}

#[test]
fn choice_prompt_shows_until_a_member_exists() {
    let template = compile(&index(), Mode::Edit, "/record");

    let form = bind_str(&template, SPARSE);
    let labels: Vec<(String, &str)> = form
        .walk()
        .filter_map(|node| match node {
            BoundNode::ChoicePrompt { target, label, .. } => Some((target.to_string(), *label)),
            _ => None,
        })
        .collect();
    assert_eq!(
        labels,
        [
            ("/record/creator".to_string(), "required choice"),
            ("/record/rights".to_string(), "optional choice")
        ]
    );

    let form = bind_str(&template, POPULATED);
    assert!(!form.walk().any(|node| matches!(
        node,
        BoundNode::ChoicePrompt { target, .. } if target.to_string() == "/record/creator"
    )));
    let person = form.walk().find_map(|node| match node {
        BoundNode::Field { address, value, .. }
            if address.to_string() == "/record/creator/person" =>
        {
            value.clone()
        }
        _ => None,
    });
    assert_eq!(person.as_deref(), Some("Ada"));
}

#[test]
fn repeated_choice_iterates_members_and_hides_prompt_behind_toggle() {
    let template = compile(&index(), Mode::Edit, "/record");
    let form = bind_str(&template, POPULATED);
    assert_eq!(
        rows_named(&form, "note"),
        ["/record/notes/note[1]", "/record/notes/note[2]"]
    );
    assert_eq!(rows_named(&form, "link"), ["/record/notes/link[1]"]);
    let toggles: Vec<&BoundNode> = form
        .walk()
        .filter(|node| matches!(node, BoundNode::Toggle { .. }))
        .collect();
    assert_eq!(toggles.len(), 1);
    assert!(matches!(
        toggles[0].children(),
        [BoundNode::ChoicePrompt { label: "required choice", .. }]
    ));

    let form = bind_str(
        &template,
        "<record><title/><contributors/><creator/><notes/></record>",
    );
    assert!(!form.walk().any(|node| matches!(node, BoundNode::Toggle { .. })));
    assert!(form.walk().any(|node| matches!(
        node,
        BoundNode::ChoicePrompt { target, .. } if target.to_string() == "/record/notes"
    )));
}

#[test]
fn substitution_members_group_by_name() {
    let template = compile(&index(), Mode::Edit, "/record");
    let form = bind_str(&template, POPULATED);
    let rows: Vec<String> = form
        .rows()
        .map(|(_, address)| address.to_string())
        .filter(|address| address.contains("circle") || address.contains("square"))
        .collect();
    assert_eq!(rows, ["/record/circle[1]", "/record/circle[2]", "/record/square[1]"]);
    assert_eq!(affordances_at(&form, AffordanceKind::AddMember, "/record"), 1);
    let candidates = form.walk().find_map(|node| match node {
        BoundNode::Affordance {
            kind: AffordanceKind::AddMember,
            candidates,
            ..
        } => Some(candidates.iter().map(ToString::to_string).collect::<Vec<_>>()),
        _ => None,
    });
    assert_eq!(candidates.unwrap(), ["circle", "square"]);
}

#[test]
fn recursion_stops_with_a_marker() {
    let template = compile(&index(), Mode::Edit, "/record");
    let recursive: Vec<String> = template
        .walk()
        .filter_map(|node| match node {
            TemplateNode::Recursive { address } => Some(address.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(recursive, ["/record/section/section"]);
    assert!(field_addresses(&template).contains(&"/record/section/heading".to_string()));
}

#[test]
fn derived_models_render_base_content_first() {
    let template = compile(&index(), Mode::Edit, "/record");
    let fields = field_addresses(&template);
    let position = |address: &str| fields.iter().position(|field| field == address).unwrap();
    assert!(position("/record/extended/label") < position("/record/extended/detail"));

    let boxed = template
        .walk()
        .find(|node| matches!(node, TemplateNode::Group { class: GroupClass::Box, .. }))
        .unwrap();
    let inside: Vec<String> = boxed
        .children()
        .iter()
        .flat_map(|node| std::iter::once(node).chain(node.children()))
        .filter_map(|node| match node {
            TemplateNode::Field { address, .. } => Some(address.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(inside, ["/record/measure", "/record/measure/@unit"]);
}

#[test]
fn broken_constructs_are_logged_and_skipped() {
    let index = index();
    let log = CollectingLog::new();
    let template = Compiler::new(&index, &log, Mode::Edit)
        .compile(&addr("/record"))
        .unwrap();
    let warnings: Vec<String> = log.warnings().into_iter().map(|entry| entry.message).collect();
    assert!(warnings.iter().any(|message| message.contains("attribute group")));
    assert!(warnings.iter().any(|message| message.contains("<anyAttribute>")));
    assert!(warnings.iter().any(|message| message.contains("restriction")));
    // siblings of the failing constructs still render
    assert!(field_addresses(&template).contains(&"/record/broken/kept".to_string()));
    assert!(!field_addresses(&template).iter().any(|field| field.starts_with("/record/limit")));
}

#[test]
fn display_mode_has_no_editing_controls() {
    let template = compile(&index(), Mode::Display, "/record");
    assert!(!template.walk().any(|node| matches!(
        node,
        TemplateNode::Affordance { .. }
            | TemplateNode::ChoicePrompt { .. }
            | TemplateNode::Toggle { .. }
    )));
    assert!(template.walk().all(|node| match node {
        TemplateNode::Field { input, .. } => {
            matches!(input, InputKind::Display | InputKind::EscapedMarkup)
        }
        _ => true,
    }));

    let form = bind_str(&template, SPARSE);
    assert_eq!(form.affordances(AffordanceKind::AddFirst), 0);
    let labels: Vec<&str> = form
        .walk()
        .filter_map(|node| match node {
            BoundNode::Field {
                label,
                input: InputKind::Display,
                ..
            } => Some(label.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, ["title"]);
}

#[test]
fn hoisted_add_replaces_the_empty_state() {
    let template = compile(&index(), Mode::Edit, "/collection");
    let record = "/collection/record";

    let form = bind_str(&template, "<collection/>");
    assert_eq!(affordances_at(&form, AffordanceKind::AddFirst, record), 0);
    assert_eq!(affordances_at(&form, AffordanceKind::AddChild, record), 1);

    let form = bind_str(
        &template,
        "<collection><record><title/><contributors/><creator/></record></collection>",
    );
    assert_eq!(rows_named(&form, "record"), ["/collection/record[1]"]);
    assert_eq!(affordances_at(&form, AffordanceKind::AddChild, record), 0);
    assert_eq!(affordances_at(&form, AffordanceKind::AddSibling, record), 1);
}

#[test]
fn unknown_root_is_an_error() {
    let index = index();
    let log = CollectingLog::new();
    let result = Compiler::new(&index, &log, Mode::Edit).compile(&addr("/nothing"));
    assert!(matches!(result, Err(CompileError::UnknownAddress(_))));
}

#[test]
fn concurrent_compiles_share_one_index() {
    let index = index();
    let (record, collection) = std::thread::scope(|scope| {
        let record = scope.spawn(|| compile(&index, Mode::Edit, "/record"));
        let collection = scope.spawn(|| compile(&index, Mode::Display, "/collection"));
        (record.join().unwrap(), collection.join().unwrap())
    });
    assert_eq!(record, compile(&index, Mode::Edit, "/record"));
    assert_eq!(collection, compile(&index, Mode::Display, "/collection"));
    let xml = record.to_xml().unwrap();
    assert!(xml.starts_with(r#"<template root="/record" mode="edit">"#));
}

#[test]
fn model_groups_attach_to_the_current_container() {
    let template = compile(&index(), Mode::Edit, "/record");

    // `dates` is a sequence group: its member sits beside `title`, not in a group of its own
    let outer = template
        .walk()
        .find(|node| {
            matches!(node, TemplateNode::Group { class: GroupClass::Compositor, .. })
                && guarded_fields(node).contains(&"/record/title".to_string())
        })
        .unwrap();
    assert!(guarded_fields(outer).contains(&"/record/issued".to_string()));

    // `idChoice` is a single choice, repeated by the reference's maxOccurs
    let ids = group_labelled(&template, "ids");
    let content = ids.children()[1].children();
    assert!(!content
        .iter()
        .any(|node| matches!(node, TemplateNode::Group { class: GroupClass::Compositor, .. })));
    assert!(matches!(
        content[0].children(),
        [TemplateNode::Iteration { .. }]
    ));
    assert!(ids.children()[1].children().iter().any(|node| node
        .children()
        .iter()
        .flat_map(TemplateNode::children)
        .any(|guard| matches!(
            guard,
            TemplateNode::Guard {
                test: GuardTest::MembersBelow {
                    limit: MaxOccurs::Unbounded,
                    ..
                },
                ..
            }
        ))));

    let form = bind_str(
        &template,
        "<record><title/><contributors/><creator/><ids><isbn>1</isbn><isbn>2</isbn></ids></record>",
    );
    assert_eq!(rows_named(&form, "isbn"), ["/record/ids/isbn[1]", "/record/ids/isbn[2]"]);
    assert!(form.walk().any(|node| matches!(node, BoundNode::Toggle { .. })));
}

#[test]
fn nested_attribute_groups_are_flattened() {
    let template = compile(&index(), Mode::Edit, "/record");
    let fields = field_addresses(&template);
    assert!(fields.contains(&"/record/@created".to_string()));
    assert!(fields.contains(&"/record/@modified".to_string()));
}

#[test]
fn complex_restriction_renders_declared_children_only() {
    let template = compile(&index(), Mode::Edit, "/record");
    let short: Vec<String> = field_addresses(&template)
        .into_iter()
        .filter(|field| field.starts_with("/record/short/"))
        .collect();
    assert_eq!(short, ["/record/short/label"]);
}

#[test]
fn repeated_items_carry_a_delete_control() {
    let template = compile(&index(), Mode::Edit, "/record");
    let measure_controls = template
        .walk()
        .find_map(|node| match node {
            TemplateNode::Field {
                address, controls, ..
            } if address.to_string().starts_with("/record/measures[$") => Some(controls),
            _ => None,
        })
        .unwrap();
    assert!(measure_controls.iter().any(|control| matches!(
        control,
        TemplateNode::Affordance {
            kind: AffordanceKind::Delete,
            ..
        }
    )));

    let template = compile(&index(), Mode::Edit, "/collection");
    let header = template
        .walk()
        .find_map(|node| match node {
            TemplateNode::Header { label, controls } if label.text == "record" => Some(controls),
            _ => None,
        })
        .unwrap();
    assert!(header.iter().any(|control| matches!(
        control,
        TemplateNode::Affordance {
            kind: AffordanceKind::Delete,
            target,
            ..
        } if target.to_string().starts_with("/collection/record[$")
    )));
}

#[test]
fn cyclic_text_only_bases_are_logged_and_skipped() {
    let resolvers = Vec::new();
    let mut loader = SchemaLoader::new(&resolvers);
    loader
        .load_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
              <xs:element name="r">
                <xs:complexType>
                  <xs:sequence>
                    <xs:element name="m" type="a"/>
                    <xs:element name="n" type="xs:string"/>
                  </xs:sequence>
                </xs:complexType>
              </xs:element>
              <xs:complexType name="a">
                <xs:simpleContent><xs:extension base="b"/></xs:simpleContent>
              </xs:complexType>
              <xs:complexType name="b">
                <xs:simpleContent><xs:extension base="a"/></xs:simpleContent>
              </xs:complexType>
            </xs:schema>"#,
            "cycle.xsd",
        )
        .unwrap();
    let index = SchemaIndex::build(
        loader.finish(),
        InstanceNamespaces::disabled(),
        [&QName::local("r")],
    )
    .unwrap();
    let log = CollectingLog::new();
    let template = Compiler::new(&index, &log, Mode::Edit)
        .compile(&addr("/r"))
        .unwrap();
    assert_eq!(field_addresses(&template), ["/r/n"]);
    assert!(log
        .warnings()
        .iter()
        .any(|entry| entry.message.contains("extension chain does not terminate")));
}

/// Fields sitting directly below the guards that are children of `node`.
fn guarded_fields(node: &TemplateNode) -> Vec<String> {
    node.children()
        .iter()
        .filter(|child| matches!(child, TemplateNode::Guard { .. }))
        .flat_map(TemplateNode::children)
        .filter_map(|child| match child {
            TemplateNode::Field { address, .. } => Some(address.to_string()),
            _ => None,
        })
        .collect()
}

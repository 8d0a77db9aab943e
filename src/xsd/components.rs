use std::fmt;
use std::num::NonZeroU32;

use super::namespaces::NamespaceRegistry;
use super::builtins::{DEFAULT_XS_PREFIX, XS_NAMESPACE};
use super::particle::Occurs;
use super::xstypes::{AnyURI, QName};

/// Index of a loaded schema document in its [`SchemaSet`](super::SchemaSet).
pub type DocumentId = usize;

/// A reference to a [`TypeDefinition`] stored in a [`SchemaSet`](super::SchemaSet)
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct TypeId(NonZeroU32);

impl TypeId {
    pub(super) fn from_index(index: usize) -> Self {
        let inner = u32::try_from(index + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .unwrap_or(NonZeroU32::MAX);
        Self(inner)
    }

    pub(super) fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<TypeDefinition #{}>", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct SchemaDocument {
    pub location: String,
    pub target_namespace: Option<AnyURI>,
    pub namespaces: NamespaceRegistry,
    pub element_form_qualified: bool,
}

impl SchemaDocument {
    /// The prefix this document uses for the XSD namespace.
    pub fn xs_prefix(&self) -> &str {
        self.namespaces
            .prefix_for_namespace(XS_NAMESPACE)
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or(DEFAULT_XS_PREFIX)
    }
}

/// A type named by a `type`/`base` attribute, or an anonymous inline definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    Named(QName),
    Anonymous(TypeId),
}

#[derive(Clone, Debug)]
pub enum TypeDefinition {
    Builtin(QName),
    Simple(SimpleTypeDefinition),
    Complex(ComplexTypeDefinition),
}

impl TypeDefinition {
    pub fn name(&self) -> Option<&QName> {
        match self {
            Self::Builtin(name) => Some(name),
            Self::Simple(simple) => simple.name.as_ref(),
            Self::Complex(complex) => complex.name.as_ref(),
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexTypeDefinition> {
        match self {
            Self::Complex(complex) => Some(complex),
            _ => None,
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex(_))
    }
}

#[derive(Clone, Debug)]
pub struct SimpleTypeDefinition {
    pub name: Option<QName>,
    pub document: DocumentId,
    pub variety: SimpleVariety,
}

#[derive(Clone, Debug)]
pub enum SimpleVariety {
    Restriction {
        base: TypeRef,
        enumeration: Vec<String>,
    },
    List {
        item: TypeRef,
    },
    Union {
        members: Vec<TypeRef>,
    },
}

#[derive(Clone, Debug)]
pub struct ComplexTypeDefinition {
    pub name: Option<QName>,
    pub document: DocumentId,
    pub is_abstract: bool,
    pub mixed: bool,
    pub content: Vec<Construct>,
}

/// How a complex type's content is modelled.
#[derive(Copy, Clone, Debug)]
pub enum ContentModel<'a> {
    /// `simpleContent`: a text value plus attributes
    TextOnly(&'a Derivation),
    /// `complexContent`: derived from another complex type
    Derived(&'a Derivation),
    Constructs(&'a [Construct]),
}

impl ComplexTypeDefinition {
    pub fn content_model(&self) -> ContentModel<'_> {
        for construct in &self.content {
            match construct {
                Construct::SimpleContent(derivation) => return ContentModel::TextOnly(derivation),
                Construct::ComplexContent(derivation) => return ContentModel::Derived(derivation),
                _ => {}
            }
        }
        ContentModel::Constructs(&self.content)
    }
}

/// One child of a complex type, compositor or derivation, as declared.
#[derive(Clone, Debug)]
pub enum Construct {
    Attribute(AttributeDeclaration),
    AttributeGroup(QName),
    SimpleContent(Derivation),
    ComplexContent(Derivation),
    Compositor(CompositorDeclaration),
    Group(GroupReference),
    Element(ElementParticle),
    Any(Occurs),
    /// A tag with no form rendering, e.g. `anyAttribute` or `assert`
    Other(String),
}

impl Construct {
    pub fn tag_name(&self) -> &str {
        match self {
            Self::Attribute(_) => "attribute",
            Self::AttributeGroup(_) => "attributeGroup",
            Self::SimpleContent(_) => "simpleContent",
            Self::ComplexContent(_) => "complexContent",
            Self::Compositor(compositor) => compositor.compositor.tag_name(),
            Self::Group(_) => "group",
            Self::Element(_) => "element",
            Self::Any(_) => "any",
            Self::Other(tag) => tag,
        }
    }

    /// Attributes and attribute group references.
    pub fn is_attribute(&self) -> bool {
        matches!(self, Self::Attribute(_) | Self::AttributeGroup(_))
    }
}

#[derive(Clone, Debug)]
pub struct AttributeDeclaration {
    pub name: QName,
    /// The `name` or `ref` attribute as written
    pub written_name: String,
    pub document: DocumentId,
    /// Declared by `ref`; the type comes from the global declaration
    pub reference: bool,
    pub type_ref: TypeRef,
    pub required: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DerivationMethod {
    Extension,
    Restriction,
}

#[derive(Clone, Debug)]
pub struct Derivation {
    pub method: DerivationMethod,
    pub base: TypeRef,
    pub children: Vec<Construct>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compositor {
    All,
    Choice,
    Sequence,
}

impl Compositor {
    pub fn tag_name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Choice => "choice",
            Self::Sequence => "sequence",
        }
    }
}

#[derive(Clone, Debug)]
pub struct CompositorDeclaration {
    pub compositor: Compositor,
    pub occurs: Occurs,
    pub children: Vec<Construct>,
}

#[derive(Clone, Debug)]
pub struct GroupReference {
    pub name: QName,
    pub occurs: Occurs,
}

#[derive(Clone, Debug)]
pub struct ElementParticle {
    pub element: ElementRef,
    pub occurs: Occurs,
}

#[derive(Clone, Debug)]
pub enum ElementRef {
    Local(ElementDeclaration),
    Global {
        name: QName,
        written_name: String,
        document: DocumentId,
    },
}

impl ElementRef {
    pub fn name(&self) -> &QName {
        match self {
            Self::Local(decl) => &decl.name,
            Self::Global { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ElementDeclaration {
    pub name: QName,
    pub document: DocumentId,
    pub type_ref: TypeRef,
    pub is_abstract: bool,
    pub substitution_group: Option<QName>,
}

#[derive(Clone, Debug)]
pub struct AttributeGroupDefinition {
    pub name: QName,
    pub document: DocumentId,
    /// `attribute` and nested `attributeGroup` constructs
    pub attributes: Vec<Construct>,
}

#[derive(Clone, Debug)]
pub struct ModelGroupDefinition {
    pub name: QName,
    pub document: DocumentId,
    pub compositor: CompositorDeclaration,
}

impl ModelGroupDefinition {
    /// Occurrence bounds of the group's compositor as used through `reference`. Bounds
    /// written on the reference replace those of the definition.
    pub fn effective_occurs(&self, reference: &GroupReference) -> Occurs {
        if reference.occurs == Occurs::ONCE {
            self.compositor.occurs
        } else {
            reference.occurs
        }
    }
}

use crate::xsd::builtins::XS_ANY_TYPE_NAME;
use crate::xsd::components::{
    AttributeDeclaration, ComplexTypeDefinition, CompositorDeclaration, ElementParticle,
    GroupReference,
};
use crate::xsd::{
    Compositor, Construct, ContentModel, Derivation, QName, SchemaNodeKind, TypeDefinition,
};

use super::context::RenderContext;
use super::error::CompileError;

/// How a node at an address is rendered.
#[derive(Copy, Clone, Debug)]
pub(crate) enum NodeKind<'s> {
    Attribute,
    SimpleType,
    AnyType,
    ComplexType(&'s ComplexTypeDefinition),
    DerivedTextOnlyModel(&'s Derivation),
    DerivedContentModel(&'s Derivation),
    SubstitutionGroup,
    RepeatingSimpleType,
    RepeatingAnyType,
    RepeatingComplexType(&'s ComplexTypeDefinition),
    RepeatingSubstitutionGroup,
    RepeatingDerivedContentModel(&'s Derivation),
    RepeatingDerivedTextOnlyModel(&'s Derivation),
    /// Already expanded higher up; not expanded again
    Recursive,
}

impl<'s> NodeKind<'s> {
    fn repeating(self) -> Self {
        match self {
            Self::SimpleType => Self::RepeatingSimpleType,
            Self::AnyType => Self::RepeatingAnyType,
            Self::ComplexType(complex) => Self::RepeatingComplexType(complex),
            Self::SubstitutionGroup => Self::RepeatingSubstitutionGroup,
            Self::DerivedContentModel(derivation) => Self::RepeatingDerivedContentModel(derivation),
            Self::DerivedTextOnlyModel(derivation) => {
                Self::RepeatingDerivedTextOnlyModel(derivation)
            }
            other => other,
        }
    }

    /// The kind of a single occurrence.
    pub(crate) fn item(self) -> Self {
        match self {
            Self::RepeatingSimpleType => Self::SimpleType,
            Self::RepeatingAnyType => Self::AnyType,
            Self::RepeatingComplexType(complex) => Self::ComplexType(complex),
            Self::RepeatingSubstitutionGroup => Self::SubstitutionGroup,
            Self::RepeatingDerivedContentModel(derivation) => Self::DerivedContentModel(derivation),
            Self::RepeatingDerivedTextOnlyModel(derivation) => {
                Self::DerivedTextOnlyModel(derivation)
            }
            other => other,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::SimpleType => "simple type",
            Self::AnyType => "any type",
            Self::ComplexType(_) => "complex type",
            Self::DerivedTextOnlyModel(_) => "derived text-only model",
            Self::DerivedContentModel(_) => "derived content model",
            Self::SubstitutionGroup => "substitution group",
            Self::RepeatingSimpleType => "repeating simple type",
            Self::RepeatingAnyType => "repeating any type",
            Self::RepeatingComplexType(_) => "repeating complex type",
            Self::RepeatingSubstitutionGroup => "repeating substitution group",
            Self::RepeatingDerivedContentModel(_) => "repeating derived content model",
            Self::RepeatingDerivedTextOnlyModel(_) => "repeating derived text-only model",
            Self::Recursive => "recursive",
        }
    }
}

/// A child construct of a complex type, compositor or derivation.
#[derive(Copy, Clone, Debug)]
pub(crate) enum ConstructKind<'s> {
    Attribute(&'s AttributeDeclaration),
    AttributeGroup(&'s QName),
    SimpleContent(&'s Derivation),
    ComplexContent(&'s Derivation),
    /// `all` or `sequence`
    Sequence(&'s CompositorDeclaration),
    Choice(&'s CompositorDeclaration),
    MultiChoice(&'s CompositorDeclaration),
    ModelGroup(&'s GroupReference),
    Element(&'s ElementParticle),
    Any,
    Unrecognized(&'s str),
}

pub(crate) fn classify_construct(construct: &Construct) -> ConstructKind<'_> {
    match construct {
        Construct::Attribute(attribute) => ConstructKind::Attribute(attribute),
        Construct::AttributeGroup(name) => ConstructKind::AttributeGroup(name),
        Construct::SimpleContent(derivation) => ConstructKind::SimpleContent(derivation),
        Construct::ComplexContent(derivation) => ConstructKind::ComplexContent(derivation),
        Construct::Compositor(decl) => match decl.compositor {
            Compositor::All | Compositor::Sequence => ConstructKind::Sequence(decl),
            Compositor::Choice if decl.occurs.max.is_many() => ConstructKind::MultiChoice(decl),
            Compositor::Choice => ConstructKind::Choice(decl),
        },
        Construct::Group(reference) => ConstructKind::ModelGroup(reference),
        Construct::Element(particle) => ConstructKind::Element(particle),
        Construct::Any(_) => ConstructKind::Any,
        Construct::Other(tag) => ConstructKind::Unrecognized(tag),
    }
}

impl<'e> RenderContext<'e, '_> {
    /// Selects the node kind for the context's address.
    pub(super) fn classify(&self) -> Result<NodeKind<'e>, CompileError> {
        let node = self.node()?;
        if node.is_recursive {
            return Ok(NodeKind::Recursive);
        }
        let schema = self.schema();
        let kind = match node.kind {
            SchemaNodeKind::Attribute => return Ok(NodeKind::Attribute),
            SchemaNodeKind::Wildcard => NodeKind::AnyType,
            SchemaNodeKind::Element
                if self.type_override.is_none() && node.is_substitution_head() =>
            {
                NodeKind::SubstitutionGroup
            }
            SchemaNodeKind::Element => match schema.type_definition(self.type_id()?) {
                TypeDefinition::Builtin(name) if *name == *XS_ANY_TYPE_NAME => NodeKind::AnyType,
                TypeDefinition::Builtin(_) | TypeDefinition::Simple(_) => NodeKind::SimpleType,
                TypeDefinition::Complex(complex) => match complex.content_model() {
                    ContentModel::TextOnly(derivation) => {
                        NodeKind::DerivedTextOnlyModel(derivation)
                    }
                    ContentModel::Derived(derivation) => NodeKind::DerivedContentModel(derivation),
                    ContentModel::Constructs(_) => NodeKind::ComplexType(complex),
                },
            },
        };
        // An overridden type renders one occurrence of the node it stands in for.
        if self.type_override.is_none() && schema.is_repeating(&self.address) {
            Ok(kind.repeating())
        } else {
            Ok(kind)
        }
    }
}

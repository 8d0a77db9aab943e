//! Addresses of nodes in schema and instance documents.
//!
//! An address is a list of element segments, each with an optional repetition index, that
//! may end in an attribute segment. With all indices removed it is a *schema address*;
//! with indices it is an *instance address*. Indices are either 1-based positions or
//! iteration variables that a binder substitutes later.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::xsd::xstypes::PrefixedName;

lazy_static! {
    static ref SEGMENT: Regex = Regex::new(
        r"^(@)?((?:[A-Za-z_][\w.-]*:)?[A-Za-z_][\w.-]*)(?:\[(?:(\d+)|\$([A-Za-z_][\w]*))\])?$"
    )
    .expect("segment pattern is valid");
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address {0:?} is not absolute")]
    NotAbsolute(String),
    #[error("invalid address segment {0:?}")]
    InvalidSegment(String),
    #[error("attribute segment {0:?} must be last")]
    AttributeNotLast(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Index {
    /// 1-based position among same-named siblings
    Position(usize),
    /// Iteration variable bound when the template is evaluated
    Var(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Element {
        name: PrefixedName,
        index: Option<Index>,
    },
    Attribute {
        name: PrefixedName,
    },
}

impl Segment {
    pub fn name(&self) -> &PrefixedName {
        match self {
            Self::Element { name, .. } | Self::Attribute { name } => name,
        }
    }

    pub fn index(&self) -> Option<&Index> {
        match self {
            Self::Element { index, .. } => index.as_ref(),
            Self::Attribute { .. } => None,
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, Self::Attribute { .. })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element { name, index: None } => write!(f, "{name}"),
            Self::Element {
                name,
                index: Some(Index::Position(position)),
            } => write!(f, "{name}[{position}]"),
            Self::Element {
                name,
                index: Some(Index::Var(var)),
            } => write!(f, "{name}[${var}]"),
            Self::Attribute { name } => write!(f, "@{name}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Address {
    segments: Vec<Segment>,
}

impl Address {
    pub fn root(name: PrefixedName) -> Self {
        Self {
            segments: vec![Segment::Element { name, index: None }],
        }
    }

    pub fn parse(source: &str) -> Result<Self, AddressError> {
        let Some(rest) = source.strip_prefix('/') else {
            return Err(AddressError::NotAbsolute(source.into()));
        };
        let mut segments = Vec::new();
        for raw in rest.split('/') {
            if segments.last().is_some_and(Segment::is_attribute) {
                return Err(AddressError::AttributeNotLast(source.into()));
            }
            let captures = SEGMENT
                .captures(raw)
                .ok_or_else(|| AddressError::InvalidSegment(raw.into()))?;
            let name = PrefixedName::parse(&captures[2]);
            if captures.get(1).is_some() {
                if captures.get(3).is_some() || captures.get(4).is_some() {
                    return Err(AddressError::InvalidSegment(raw.into()));
                }
                segments.push(Segment::Attribute { name });
                continue;
            }
            let index = if let Some(position) = captures.get(3) {
                let position = position
                    .as_str()
                    .parse::<usize>()
                    .ok()
                    .filter(|p| *p > 0)
                    .ok_or_else(|| AddressError::InvalidSegment(raw.into()))?;
                Some(Index::Position(position))
            } else {
                captures.get(4).map(|var| Index::Var(var.as_str().into()))
            };
            segments.push(Segment::Element { name, index });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The document element (or nothing).
    pub fn is_root(&self) -> bool {
        self.segments.len() <= 1
    }

    pub fn leaf(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn leaf_name(&self) -> Option<&PrefixedName> {
        self.leaf().map(Segment::name)
    }

    pub fn is_attribute(&self) -> bool {
        self.leaf().is_some_and(Segment::is_attribute)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn child(&self, name: PrefixedName) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Element { name, index: None });
        Self { segments }
    }

    pub fn attribute(&self, name: PrefixedName) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Attribute { name });
        Self { segments }
    }

    /// Replaces the index of the last element segment.
    pub fn with_index(&self, index: Index) -> Self {
        let mut segments = self.segments.clone();
        if let Some(Segment::Element { index: slot, .. }) = segments.last_mut() {
            *slot = Some(index);
        }
        Self { segments }
    }

    /// The index-free projection used to query the schema.
    pub fn to_schema_address(&self) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Element { name, .. } => Segment::Element {
                    name: name.clone(),
                    index: None,
                },
                attribute => attribute.clone(),
            })
            .collect();
        Self { segments }
    }

    pub fn is_schema_address(&self) -> bool {
        self.segments.iter().all(|segment| segment.index().is_none())
    }

    /// The path shared by all occurrences of the leaf: only the trailing index is dropped,
    /// ancestors keep theirs.
    pub fn sibling_path(&self) -> Self {
        let mut segments = self.segments.clone();
        if let Some(Segment::Element { index, .. }) = segments.last_mut() {
            *index = None;
        }
        Self { segments }
    }

    /// A fresh iteration variable for this sibling path.
    ///
    /// The first variable for a leaf name is `{leaf}Index`; when an ancestor segment already
    /// iterates under such a variable, the next numeric suffix is used (`{leaf}Index1`,
    /// `{leaf}Index2`, ...). Ancestors are matched by variable, not by name, since flattened
    /// names such as `a:bc` and `ab:c` coincide.
    pub fn encode_index_id(&self) -> String {
        let Some(leaf) = self.leaf_name() else {
            return "Index".into();
        };
        let root = format!("{}Index", leaf.flattened());

        let mut last_suffix: Option<usize> = None;
        for segment in &self.segments {
            let Some(Index::Var(var)) = segment.index() else {
                continue;
            };
            let Some(suffix) = var.strip_prefix(root.as_str()) else {
                continue;
            };
            let n = if suffix.is_empty() {
                0
            } else if let Ok(n) = suffix.parse::<usize>() {
                n
            } else {
                continue;
            };
            last_suffix = last_suffix.max(Some(n));
        }

        match last_suffix {
            None => root,
            Some(n) => format!("{root}{}", n + 1),
        }
    }

    /// Substitutes bound iteration variables with positions. Unbound variables stay.
    pub fn bind(&self, bindings: &HashMap<String, usize>) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Element {
                    name,
                    index: Some(Index::Var(var)),
                } => Segment::Element {
                    name: name.clone(),
                    index: Some(
                        bindings
                            .get(var)
                            .map_or_else(|| Index::Var(var.clone()), |p| Index::Position(*p)),
                    ),
                },
                other => other.clone(),
            })
            .collect();
        Self { segments }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

use super::error::SchemaError;
use super::values::actual_value;
use roxmltree::Node;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaxOccurs {
    Unbounded,
    Count(u64),
}

impl MaxOccurs {
    /// More than one occurrence is allowed.
    pub fn is_many(&self) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Count(n) => *n > 1,
        }
    }

    /// Whether `count` occurrences still leave room for one more.
    pub fn admits_more(&self, count: usize) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Count(n) => (count as u64) < *n,
        }
    }
}

impl std::fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

/// The `{min occurs}` and `{max occurs}` of a particle (§3.9)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Occurs {
    pub min: u64,
    pub max: MaxOccurs,
}

impl Default for Occurs {
    fn default() -> Self {
        Self::ONCE
    }
}

impl Occurs {
    pub const ONCE: Self = Self {
        min: 1,
        max: MaxOccurs::Count(1),
    };

    pub const OPTIONAL: Self = Self {
        min: 0,
        max: MaxOccurs::Count(1),
    };

    pub fn map_from_xml(particle: Node) -> Result<Self, SchemaError> {
        // {min occurs}
        //   The ·actual value· of the minOccurs [attribute], if present, otherwise 1.
        let min = particle
            .attribute("minOccurs")
            .map(|min_occurs| actual_value::<u64>(min_occurs, particle))
            .transpose()?
            .unwrap_or(1);

        // {max occurs}
        //   unbounded, if the maxOccurs [attribute] equals unbounded, otherwise the
        //   ·actual value· of the maxOccurs [attribute], if present, otherwise 1.
        let max = particle
            .attribute("maxOccurs")
            .map(|max_occurs| actual_value::<MaxOccurs>(max_occurs, particle))
            .transpose()?
            .unwrap_or(MaxOccurs::Count(1));

        Ok(Self { min, max })
    }

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    pub fn is_many(&self) -> bool {
        self.max.is_many()
    }
}

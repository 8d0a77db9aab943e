use super::error::SchemaError;
use super::particle::MaxOccurs;
use super::xstypes::QName;
use roxmltree::Node;

pub trait ActualValue<'a>: Sized {
    fn convert(src: &'a str, parent: Node) -> Result<Self, SchemaError>;
}

impl ActualValue<'_> for String {
    fn convert(src: &'_ str, _parent: Node) -> Result<Self, SchemaError> {
        Ok(src.to_string())
    }
}

impl ActualValue<'_> for QName {
    fn convert(src: &'_ str, parent: Node) -> Result<Self, SchemaError> {
        QName::parse(src.trim(), parent)
    }
}

impl<'a, T: ActualValue<'a>> ActualValue<'a> for Vec<T> {
    fn convert(src: &'a str, parent: Node) -> Result<Self, SchemaError> {
        // NOTE: This assumes a list with whiteSpace="collapse"
        src.split_ascii_whitespace()
            .map(|a| ActualValue::convert(a, parent))
            .collect()
    }
}

impl ActualValue<'_> for bool {
    fn convert(src: &str, _parent: Node) -> Result<Self, SchemaError> {
        match src.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(SchemaError::InvalidValue {
                value: src.into(),
                expected: "xs:boolean",
            }),
        }
    }
}

impl ActualValue<'_> for u64 {
    fn convert(src: &str, _parent: Node) -> Result<Self, SchemaError> {
        src.trim().parse().map_err(|_| SchemaError::InvalidValue {
            value: src.into(),
            expected: "xs:nonNegativeInteger",
        })
    }
}

impl ActualValue<'_> for MaxOccurs {
    fn convert(src: &str, parent: Node) -> Result<Self, SchemaError> {
        // unbounded, if the maxOccurs [attribute] equals unbounded, otherwise the ·actual value·
        // of the maxOccurs [attribute]
        if src.trim() == "unbounded" {
            Ok(MaxOccurs::Unbounded)
        } else {
            actual_value::<u64>(src, parent).map(MaxOccurs::Count)
        }
    }
}

pub fn actual_value<'a, T: ActualValue<'a>>(x: &'a str, parent: Node) -> Result<T, SchemaError> {
    T::convert(x, parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_occurs_accepts_unbounded_and_counts() {
        let doc = roxmltree::Document::parse("<a/>").unwrap();
        let node = doc.root_element();
        assert_eq!(
            actual_value::<MaxOccurs>("unbounded", node).unwrap(),
            MaxOccurs::Unbounded
        );
        assert_eq!(
            actual_value::<MaxOccurs>(" 3 ", node).unwrap(),
            MaxOccurs::Count(3)
        );
        assert!(actual_value::<MaxOccurs>("many", node).is_err());
    }

    #[test]
    fn boolean_lexical_forms() {
        let doc = roxmltree::Document::parse("<a/>").unwrap();
        let node = doc.root_element();
        assert!(actual_value::<bool>("1", node).unwrap());
        assert!(!actual_value::<bool>("false", node).unwrap());
        assert!(actual_value::<bool>("yes", node).is_err());
    }
}

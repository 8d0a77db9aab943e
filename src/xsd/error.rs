use thiserror::Error;

use super::import::ImportError;
use super::xstypes::QName;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema document: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("expected a <schema> root element, found <{0}>")]
    NotASchema(String),
    #[error("failed to resolve prefix {0:?} to a namespace URI")]
    NamePrefixNotResolved(String),
    #[error("<{element}> is missing the required {attribute:?} attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("invalid value {value:?} for {expected}")]
    InvalidValue { value: String, expected: &'static str },
    #[error("no {kind} named {name}")]
    UnknownComponent { kind: &'static str, name: QName },
    #[error("failed to import {location:?}: {source}")]
    Import {
        location: String,
        #[source]
        source: ImportError,
    },
}

use thiserror::Error;

use crate::address::AddressError;
use crate::bind::BindError;
use crate::compiler::CompileError;
use crate::template::SerializeError;
use crate::xsd::{ImportError, SchemaError};

/// Everything the command line pipeline can fail with.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error("failed to load schema: {0}")]
    Import(#[from] ImportError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("failed to write template: {0}")]
    Serialize(#[from] SerializeError),
    #[error("failed to read instance document {path:?}: {source}")]
    ReadInstance {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse instance document: {0}")]
    ParseInstance(#[from] roxmltree::Error),
    #[error("the schema declares no global element to compile")]
    NoRootElement,
}

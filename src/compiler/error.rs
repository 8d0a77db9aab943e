use thiserror::Error;

use crate::address::Address;
use crate::xsd::SchemaError;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("no schema node at {0}")]
    UnknownAddress(Address),
    #[error("schema inconsistency at {address}: {reason}")]
    SchemaInconsistency { address: Address, reason: String },
    #[error("unrecognized construct <{tag}> at {address}")]
    UnrecognizedConstruct { address: Address, tag: String },
    #[error("{method} of text-only content at {address} is not supported")]
    UnsupportedDerivation {
        address: Address,
        method: &'static str,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl CompileError {
    pub(crate) fn inconsistency(address: &Address, reason: impl Into<String>) -> Self {
        Self::SchemaInconsistency {
            address: address.clone(),
            reason: reason.into(),
        }
    }
}

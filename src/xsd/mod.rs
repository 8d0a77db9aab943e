//! The XSD component model the form compiler reads, the loader that builds it from schema
//! documents, and the address index queried while compiling.

pub mod builtins;
pub mod components;
pub mod error;
pub mod import;
pub mod index;
pub mod namespaces;
pub mod particle;
pub mod query;
pub mod schema;
pub mod xstypes;

mod mapping_context;
mod values;

pub use components::{
    Compositor, Construct, ContentModel, Derivation, DerivationMethod, TypeDefinition, TypeId,
};
pub use error::SchemaError;
pub use import::{default_resolvers, fetch_url, ImportError, ImportResolver, SchemaSource};
pub use index::SchemaIndex;
pub use namespaces::{InstanceNamespaces, NamespaceRegistry};
pub use particle::{MaxOccurs, Occurs};
pub use query::{SchemaNode, SchemaNodeKind, SchemaQuery};
pub use schema::{SchemaLoader, SchemaSet};
pub use xstypes::{PrefixedName, QName};

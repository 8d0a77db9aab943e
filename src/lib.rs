//! Compiles XSD schemas into conditional form templates for metadata records.
//!
//! A [`SchemaIndex`](xsd::SchemaIndex) maps every element and attribute address below the
//! chosen root elements to its declaration. The [`Compiler`](compiler::Compiler) walks that
//! index and produces a [`Template`](template::Template): a tree of fields, headers and
//! controls whose parts are guarded by presence tests on instance addresses. Binding a
//! template to an instance document with [`bind`](bind::bind) evaluates the guards and
//! expands repetitions into numbered rows.

pub mod address;
pub mod bind;
pub mod cli;
pub mod compiler;
pub mod error;
pub mod template;
pub mod xsd;

pub use error::Error;

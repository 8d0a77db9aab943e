use std::path::{Path, PathBuf};

use roxmltree::Node;
use thiserror::Error;

use super::{error::SchemaError, values::actual_value};

/// This structure represents the `import`, `include` and `redefine` elements; they are not
/// schema components.
///
/// Note that an import is allowed to have neither a `schemaLocation` nor a `namespace` attribute.
#[derive(Clone, Debug)]
pub struct Import {
    pub namespace: Option<String>,
    pub schema_location: Option<String>,
    /// Location of the document containing the import, used for relative locations.
    pub base_location: String,
}

impl Import {
    pub const TAG_NAMES: [&'static str; 3] = ["import", "include", "redefine"];

    pub fn map_from_xml(
        import: Node,
        schema: Node,
        base_location: &str,
    ) -> Result<Self, SchemaError> {
        let namespace = import
            .attribute("namespace")
            .map(|ns| actual_value::<String>(ns, import))
            .transpose()?;
        let schema_location = import
            .attribute("schemaLocation")
            .map(|sl| actual_value::<String>(sl, import))
            .transpose()?;

        // § 4.2.6 Schema Representation Constraint: Import Constraints and Semantics
        // 1.1 If the namespace [attribute] is present, then its ·actual value· does not match
        //   the ·actual value· of the enclosing <schema>'s targetNamespace [attribute].
        if let (Some(namespace), Some(target_namespace)) =
            (namespace.as_deref(), schema.attribute("targetNamespace"))
        {
            if import.tag_name().name() == "import" && namespace == target_namespace {
                return Err(SchemaError::InvalidValue {
                    value: namespace.into(),
                    expected: "an import namespace other than the targetNamespace",
                });
            }
        }

        Ok(Import {
            namespace,
            schema_location,
            base_location: base_location.into(),
        })
    }

    /// The schema location resolved against the importing document.
    pub fn resolved_location(&self) -> Option<String> {
        let location = self.schema_location.as_deref()?;
        if is_url(location) || Path::new(location).is_absolute() {
            return Some(location.into());
        }
        if is_url(&self.base_location) {
            let base = self
                .base_location
                .rsplit_once('/')
                .map_or(self.base_location.as_str(), |(dir, _)| dir);
            return Some(format!("{base}/{location}"));
        }
        let base = Path::new(&self.base_location)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Some(base.join(location).to_string_lossy().into_owned())
    }
}

pub(crate) fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// The text and canonical location of a resolved schema document.
#[derive(Clone, Debug)]
pub struct SchemaSource {
    pub location: String,
    pub text: String,
}

impl SchemaSource {
    /// Reads a schema from a file path or an `http(s)` URL.
    pub fn open(location: &str) -> Result<Self, ImportError> {
        if is_url(location) {
            return fetch_url(location);
        }
        Ok(Self {
            location: location.into(),
            text: std::fs::read_to_string(location)?,
        })
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("the resolver does not support the import")]
    UnsupportedImport,
    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to fetch schema: {0}")]
    Http(#[from] reqwest::Error),
}

pub trait ImportResolver {
    fn resolve_import(&self, import: &Import) -> Result<SchemaSource, ImportError>;
}

/// Resolves relative and absolute file locations.
#[derive(Clone, Debug, Default)]
pub struct FileImportResolver;

impl ImportResolver for FileImportResolver {
    fn resolve_import(&self, import: &Import) -> Result<SchemaSource, ImportError> {
        let location = import
            .resolved_location()
            .filter(|location| !is_url(location))
            .ok_or(ImportError::UnsupportedImport)?;
        let text = std::fs::read_to_string(&location)?;
        let location = PathBuf::from(&location)
            .canonicalize()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or(location);
        Ok(SchemaSource { location, text })
    }
}

/// Fetches `http(s)` locations.
#[derive(Clone, Debug, Default)]
pub struct UrlImportResolver;

impl ImportResolver for UrlImportResolver {
    fn resolve_import(&self, import: &Import) -> Result<SchemaSource, ImportError> {
        let location = import
            .resolved_location()
            .filter(|location| is_url(location))
            .ok_or(ImportError::UnsupportedImport)?;
        fetch_url(&location)
    }
}

pub fn fetch_url(location: &str) -> Result<SchemaSource, ImportError> {
    let text = reqwest::blocking::get(location)?
        .error_for_status()?
        .text()?;
    Ok(SchemaSource {
        location: location.into(),
        text,
    })
}

/// The resolvers used by the command line tool.
pub fn default_resolvers() -> Vec<Box<dyn ImportResolver>> {
    vec![Box::new(FileImportResolver), Box::new(UrlImportResolver)]
}

//! IATI Schemas
//!
//! A [`Schema`] pairs an XSD document with the Codelists whose values the
//! datasets it describes are checked against. The XSD is compiled lazily,
//! once, the first time a structural validator is needed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::codelists::Codelist;
use crate::error::SchemaError;
use crate::limits::Limits;
use crate::validators::{ValidationMode, XsdSchema, XsdValidator};

/// The two document types of the IATI Standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// `iati-activities` documents
    Activity,
    /// `iati-organisations` documents
    Organisation,
}

impl SchemaKind {
    /// Name of the schema, which is also its file stem
    pub fn schema_name(&self) -> &'static str {
        match self {
            SchemaKind::Activity => "iati-activities-schema",
            SchemaKind::Organisation => "iati-organisations-schema",
        }
    }

    /// Root element of documents of this kind
    pub fn root_element(&self) -> &'static str {
        match self {
            SchemaKind::Activity => "iati-activities",
            SchemaKind::Organisation => "iati-organisations",
        }
    }

    /// Kind for a schema name, if it is one of the standard ones
    pub fn from_schema_name(name: &str) -> Option<Self> {
        [SchemaKind::Activity, SchemaKind::Organisation]
            .into_iter()
            .find(|kind| kind.schema_name() == name)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_name())
    }
}

#[derive(Debug, Clone)]
enum SchemaSource {
    Text {
        text: String,
        base_dir: Option<PathBuf>,
    },
    File(PathBuf),
}

/// An XSD together with its Codelists
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    source: SchemaSource,
    codelists: IndexMap<String, Arc<Codelist>>,
    limits: Limits,
    compiled: OnceCell<Result<Arc<XsdSchema>, SchemaError>>,
}

impl Schema {
    /// Schema from XSD text. Includes and imports are resolved against the
    /// working directory unless [`with_base_dir`](Self::with_base_dir) is used.
    pub fn from_string(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_source(
            name.into(),
            SchemaSource::Text {
                text: text.into(),
                base_dir: None,
            },
        )
    }

    /// Schema from an XSD file, named after the file stem
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::with_source(name, SchemaSource::File(path.to_path_buf()))
    }

    fn with_source(name: String, source: SchemaSource) -> Self {
        Self {
            name,
            source,
            codelists: IndexMap::new(),
            limits: Limits::default(),
            compiled: OnceCell::new(),
        }
    }

    /// Directory that relative include and import locations resolve against
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        if let SchemaSource::Text { base_dir, .. } = &mut self.source {
            *base_dir = Some(dir.into());
        }
        self.compiled = OnceCell::new();
        self
    }

    /// Limits applied when compiling
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self.compiled = OnceCell::new();
        self
    }

    /// Schema name, e.g. `iati-activities-schema`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Which standard document type this schema describes, if known
    pub fn kind(&self) -> Option<SchemaKind> {
        SchemaKind::from_schema_name(&self.name)
    }

    /// Path of the XSD file, for file-backed schemas
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            SchemaSource::File(path) => Some(path),
            SchemaSource::Text { .. } => None,
        }
    }

    /// Attach a codelist. A codelist with the same name as one already
    /// attached is ignored; returns whether it was added.
    pub fn add_codelist(&mut self, codelist: impl Into<Arc<Codelist>>) -> bool {
        let codelist = codelist.into();
        if self.codelists.contains_key(codelist.name()) {
            tracing::trace!(codelist = codelist.name(), schema = %self.name, "codelist already attached");
            return false;
        }
        self.codelists.insert(codelist.name().to_string(), codelist);
        true
    }

    /// Attached codelists, in the order they were added
    pub fn codelists(&self) -> impl Iterator<Item = &Arc<Codelist>> {
        self.codelists.values()
    }

    /// Attached codelist by name
    pub fn codelist(&self, name: &str) -> Option<&Arc<Codelist>> {
        self.codelists.get(name)
    }

    /// The compiled XSD. Compilation happens on first use; its outcome,
    /// success or failure, is kept for later calls.
    pub fn compiled(&self) -> Result<Arc<XsdSchema>, SchemaError> {
        self.compiled
            .get_or_init(|| {
                let result = match &self.source {
                    SchemaSource::Text { text, base_dir } => {
                        XsdSchema::compile(text, base_dir.as_deref(), &self.limits)
                    }
                    SchemaSource::File(path) => XsdSchema::from_file(path, &self.limits),
                };
                match &result {
                    Ok(_) => tracing::debug!(schema = %self.name, "compiled schema"),
                    Err(e) => tracing::debug!(schema = %self.name, error = %e, "schema failed to compile"),
                }
                result.map(Arc::new)
            })
            .clone()
    }

    /// Structural validator bound to the compiled XSD
    pub fn validator(&self) -> Result<XsdValidator, SchemaError> {
        self.validator_with_mode(ValidationMode::default())
    }

    /// Structural validator using `mode`
    pub fn validator_with_mode(&self, mode: ValidationMode) -> Result<XsdValidator, SchemaError> {
        Ok(XsdValidator::new(self.compiled()?).with_mode(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use std::fs;
    use tempfile::TempDir;

    const XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:element name="iati-activities">
            <xs:complexType>
                <xs:sequence>
                    <xs:element name="iati-activity" minOccurs="0" maxOccurs="unbounded"/>
                </xs:sequence>
                <xs:attribute name="version" type="xs:string" use="required"/>
            </xs:complexType>
        </xs:element>
    </xs:schema>"#;

    #[test]
    fn test_codelists_first_wins() {
        let mut schema = Schema::from_string("iati-activities-schema", XSD);
        assert!(schema.add_codelist(Codelist::new("Vocabulary", ["1"], true)));
        assert!(schema.add_codelist(Codelist::new("Sector", ["A"], false)));
        assert!(!schema.add_codelist(Codelist::new("Vocabulary", ["2"], false)));

        let names: Vec<_> = schema.codelists().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["Vocabulary", "Sector"]);
        assert!(schema.codelist("Vocabulary").unwrap().contains("1"));
        assert!(schema.codelist("Vocabulary").unwrap().complete());
    }

    #[test]
    fn test_shared_codelist() {
        let shared = Arc::new(Codelist::new("Vocabulary", ["1"], true));
        let mut a = Schema::from_string("a", XSD);
        let mut b = Schema::from_string("b", XSD);
        a.add_codelist(shared.clone());
        b.add_codelist(shared.clone());
        assert!(Arc::ptr_eq(a.codelist("Vocabulary").unwrap(), b.codelist("Vocabulary").unwrap()));
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            Schema::from_string("iati-activities-schema", XSD).kind(),
            Some(SchemaKind::Activity)
        );
        assert_eq!(SchemaKind::Organisation.root_element(), "iati-organisations");
        assert_eq!(Schema::from_string("custom", XSD).kind(), None);
    }

    #[test]
    fn test_validator() {
        let schema = Schema::from_string("iati-activities-schema", XSD);
        let validator = schema.validator().unwrap();
        let valid = Document::from_string(r#"<iati-activities version="2.02"><iati-activity/></iati-activities>"#).unwrap();
        let invalid = Document::from_string("<iati-activities/>").unwrap();
        assert!(validator.is_valid(&valid));
        assert!(!validator.is_valid(&invalid));
    }

    #[test]
    fn test_compiled_once() {
        let schema = Schema::from_string("s", XSD);
        let first = schema.compiled().unwrap();
        let second = schema.compiled().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_invalid_schema() {
        let schema = Schema::from_string("broken", "<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\"><xs:element name=\"a\" type=\"nope\"/></xs:schema>");
        assert!(schema.validator().is_err());
        assert!(schema.compiled().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("iati-activities-schema.xsd");
        fs::write(&path, XSD).unwrap();
        let schema = Schema::from_file(&path);
        assert_eq!(schema.name(), "iati-activities-schema");
        assert_eq!(schema.path(), Some(path.as_path()));
        assert!(schema.validator().is_ok());
    }
}

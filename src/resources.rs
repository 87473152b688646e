//! Default IATI resources
//!
//! A [`ResourceStore`] reads the reference data shipped for each version of
//! the IATI Standard from a directory laid out as
//!
//! ```text
//! <root>/202/codelists/*.xml
//! <root>/202/schemas/iati-activities-schema.xsd
//! <root>/202/schemas/iati-organisations-schema.xsd
//! <root>/202/codelist-mapping.xml
//! ```
//!
//! where `202` is the version number without its dot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::codelists::Codelist;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::mappings::CodelistMapping;
use crate::schemas::{Schema, SchemaKind};

const VERSION_COUNT: usize = 4;

/// Versions of the IATI Standard, oldest first
pub const STANDARD_VERSIONS: [&str; VERSION_COUNT] = ["1.04", "1.05", "2.01", "2.02"];

/// The version used when none is given
pub const STANDARD_VERSION_LATEST: &str = "2.02";

/// Environment variable naming the resource root
pub const RESOURCES_DIR_ENV: &str = "IATI_RESOURCES_DIR";

const CODELIST_DIR: &str = "codelists";
const SCHEMA_DIR: &str = "schemas";
const CODELIST_MAPPING_FILE: &str = "codelist-mapping.xml";

type CodelistSet = IndexMap<String, Arc<Codelist>>;

/// Resolve an optional version to a valid one; `None` means the latest
pub fn resolve_version(version: Option<&str>) -> Result<&'static str> {
    let wanted = version.unwrap_or(STANDARD_VERSION_LATEST);
    STANDARD_VERSIONS
        .iter()
        .copied()
        .find(|v| *v == wanted)
        .ok_or_else(|| {
            Error::Value(format!(
                "Version {} is not a valid version of the IATI Standard.",
                wanted
            ))
        })
}

/// Directory name for a version, e.g. `202` for `2.02`
pub fn version_dir(version: &str) -> String {
    version.replace('.', "")
}

/// Reference data for the versions of the IATI Standard
#[derive(Debug)]
pub struct ResourceStore {
    root: PathBuf,
    loader: Loader,
    // One cache slot per entry of STANDARD_VERSIONS
    codelists: [OnceCell<Arc<CodelistSet>>; VERSION_COUNT],
}

impl ResourceStore {
    /// Store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loader: Loader::new(),
            codelists: Default::default(),
        }
    }

    /// Store rooted at the directory named by `IATI_RESOURCES_DIR`, if set
    pub fn from_env() -> Option<Self> {
        std::env::var_os(RESOURCES_DIR_ENV).map(Self::new)
    }

    /// Limits applied to every resource read
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.loader = Loader::new().with_limits(limits);
        self.codelists = Default::default();
        self
    }

    /// Resource root
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_path(&self, version: &str) -> PathBuf {
        self.root.join(version_dir(version))
    }

    /// Every codelist of a version, keyed by name in file-name order.
    ///
    /// Files that cannot be read or parsed are skipped with a warning. The
    /// result is cached, so every caller shares the same codelists.
    pub fn codelists(&self, version: Option<&str>) -> Result<Arc<CodelistSet>> {
        let version = resolve_version(version)?;
        let slot = STANDARD_VERSIONS
            .iter()
            .position(|v| *v == version)
            .and_then(|i| self.codelists.get(i))
            .ok_or_else(|| Error::Value(format!("no cache slot for version {}", version)))?;
        slot.get_or_try_init(|| self.load_codelists(version).map(Arc::new))
            .cloned()
    }

    fn load_codelists(&self, version: &str) -> Result<CodelistSet> {
        let dir = self.version_path(version).join(CODELIST_DIR);
        let mut codelists = CodelistSet::new();
        for path in self.loader.list(&dir, "xml")? {
            let parsed = self
                .loader
                .load(&path)
                .and_then(|xml| Codelist::from_xml_with_limits(&xml, self.loader.limits()));
            match parsed {
                Ok(codelist) => {
                    codelists
                        .entry(codelist.name().to_string())
                        .or_insert_with(|| Arc::new(codelist));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable codelist");
                }
            }
        }
        tracing::debug!(version, count = codelists.len(), "loaded codelists");
        Ok(codelists)
    }

    /// One codelist of a version
    pub fn codelist(&self, name: &str, version: Option<&str>) -> Result<Arc<Codelist>> {
        let resolved = resolve_version(version)?;
        self.codelists(Some(resolved))?
            .get(name)
            .cloned()
            .ok_or_else(|| {
                let msg = format!(
                    "There is no default Codelist in version {} of the Standard with the name {}.",
                    resolved, name
                );
                tracing::warn!("{}", msg);
                Error::Value(msg)
            })
    }

    /// The codelist mapping of a version
    pub fn codelist_mapping(&self, version: Option<&str>) -> Result<CodelistMapping> {
        let version = resolve_version(version)?;
        CodelistMapping::from_file(self.version_path(version).join(CODELIST_MAPPING_FILE), &self.loader)
    }

    /// Path of a standard schema
    pub fn schema_path(&self, kind: SchemaKind, version: Option<&str>) -> Result<PathBuf> {
        let version = resolve_version(version)?;
        let path = self
            .version_path(version)
            .join(SCHEMA_DIR)
            .join(format!("{}.xsd", kind.schema_name()));
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::Value(format!(
                "There is no default Schema in version {} of the Standard with the name {}.",
                version,
                kind.schema_name()
            )))
        }
    }

    /// A standard schema, with every codelist of the version attached when
    /// `populate` is set
    pub fn schema(&self, kind: SchemaKind, version: Option<&str>, populate: bool) -> Result<Schema> {
        let version = resolve_version(version)?;
        let path = self.schema_path(kind, Some(version))?;
        let mut schema = Schema::from_file(path).with_limits(self.loader.limits().clone());
        if populate {
            for codelist in self.codelists(Some(version))?.values() {
                schema.add_codelist(codelist.clone());
            }
        }
        Ok(schema)
    }

    /// The activity schema of a version
    pub fn activity_schema(&self, version: Option<&str>, populate: bool) -> Result<Schema> {
        self.schema(SchemaKind::Activity, version, populate)
    }

    /// The organisation schema of a version
    pub fn organisation_schema(&self, version: Option<&str>, populate: bool) -> Result<Schema> {
        self.schema(SchemaKind::Organisation, version, populate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:element name="iati-activities"/>
    </xs:schema>"#;

    fn store() -> (TempDir, ResourceStore) {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("202");
        fs::create_dir_all(base.join("codelists")).unwrap();
        fs::create_dir_all(base.join("schemas")).unwrap();
        fs::write(
            base.join("codelists/Vocabulary.xml"),
            r#"<codelist name="Vocabulary" complete="1"><codelist-items>
                <codelist-item><code>1</code></codelist-item>
                <codelist-item><code>2</code></codelist-item>
            </codelist-items></codelist>"#,
        )
        .unwrap();
        fs::write(
            base.join("codelists/Sector.xml"),
            r#"<codelist name="Sector"><codelist-items>
                <codelist-item><code>111</code></codelist-item>
            </codelist-items></codelist>"#,
        )
        .unwrap();
        fs::write(base.join("codelists/Broken.xml"), "<codelist").unwrap();
        fs::write(base.join("schemas/iati-activities-schema.xsd"), XSD).unwrap();
        fs::write(
            base.join("codelist-mapping.xml"),
            "<mappings><mapping><path>//sector/@vocabulary</path><codelist ref=\"Vocabulary\"/></mapping></mappings>",
        )
        .unwrap();
        let store = ResourceStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_resolve_version() {
        assert_eq!(resolve_version(None).unwrap(), STANDARD_VERSION_LATEST);
        assert_eq!(resolve_version(Some("1.05")).unwrap(), "1.05");
        let err = resolve_version(Some("3.00")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "value error: Version 3.00 is not a valid version of the IATI Standard."
        );
        assert_eq!(version_dir("2.02"), "202");
    }

    #[test]
    fn test_codelists() {
        let (_dir, store) = store();
        let codelists = store.codelists(None).unwrap();
        // Broken.xml is skipped
        assert_eq!(codelists.keys().collect::<Vec<_>>(), vec!["Sector", "Vocabulary"]);
        assert!(codelists["Vocabulary"].complete());
        assert!(!codelists["Sector"].complete());
    }

    #[test]
    fn test_codelists_cached() {
        let (_dir, store) = store();
        let a = store.codelist("Vocabulary", None).unwrap();
        let b = store.codelist("Vocabulary", Some("2.02")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unknown_codelist() {
        let (_dir, store) = store();
        let err = store.codelist("Currency", None).unwrap_err();
        assert!(err
            .to_string()
            .contains("There is no default Codelist in version 2.02 of the Standard with the name Currency."));
    }

    #[test]
    fn test_codelist_mapping() {
        let (_dir, store) = store();
        let mapping = store.codelist_mapping(None).unwrap();
        assert_eq!(mapping.rules_for("Vocabulary").unwrap().len(), 1);
    }

    #[test]
    fn test_activity_schema() {
        let (_dir, store) = store();
        let populated = store.activity_schema(None, true).unwrap();
        assert_eq!(populated.name(), "iati-activities-schema");
        assert_eq!(populated.codelists().count(), 2);
        assert!(populated.validator().is_ok());

        let bare = store.activity_schema(None, false).unwrap();
        assert_eq!(bare.codelists().count(), 0);
    }

    #[test]
    fn test_missing_schema() {
        let (_dir, store) = store();
        let err = store.organisation_schema(None, false).unwrap_err();
        assert!(err.to_string().contains("There is no default Schema in version 2.02"));
        assert!(store.activity_schema(Some("9.99"), false).is_err());
    }
}

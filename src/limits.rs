//! Resource limits
//!
//! Datasets come from publishers the validator does not control. Every
//! parse of a dataset, codelist, mapping or schema checks its input against
//! a [`Limits`] value before and while building the tree.

use crate::error::{Error, Result};

const MIB: usize = 1024 * 1024;

/// Bounds on the inputs the validator accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Deepest element nesting allowed in a document
    pub max_xml_depth: usize,
    /// Largest input, in bytes
    pub max_xml_size: usize,
    /// Most attributes allowed on one element
    pub max_attributes: usize,
    /// Deepest chain of schema includes and imports
    pub max_schema_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_depth: 1000,
            // large IATI publishers ship activity files of tens of MB
            max_xml_size: 100 * MIB,
            max_attributes: 1000,
            max_schema_depth: 100,
        }
    }
}

impl Limits {
    /// Default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Tighter limits for untrusted uploads
    pub fn strict() -> Self {
        Self {
            max_xml_depth: 100,
            max_xml_size: 10 * MIB,
            max_attributes: 100,
            max_schema_depth: 20,
        }
    }

    /// Looser limits for trusted bulk processing
    pub fn permissive() -> Self {
        Self {
            max_xml_depth: 10_000,
            max_xml_size: 1024 * MIB,
            max_attributes: 10_000,
            max_schema_depth: 1000,
        }
    }

    /// Set the largest accepted input
    pub fn with_max_xml_size(mut self, bytes: usize) -> Self {
        self.max_xml_size = bytes;
        self
    }

    /// Fail if `depth` exceeds the nesting limit
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        within("element nesting depth", depth, self.max_xml_depth)
    }

    /// Fail if `size` exceeds the input size limit
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        within("input size in bytes", size, self.max_xml_size)
    }

    /// Fail if `count` exceeds the per-element attribute limit
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        within("attributes on one element", count, self.max_attributes)
    }

    /// Fail if `depth` exceeds the include depth limit
    pub fn check_schema_depth(&self, depth: usize) -> Result<()> {
        within("schema include depth", depth, self.max_schema_depth)
    }
}

fn within(what: &str, value: usize, max: usize) -> Result<()> {
    if value > max {
        return Err(Error::LimitExceeded(format!("{} is {}, the maximum is {}", what, value, max)));
    }
    Ok(())
}

/// Line codec for registry records.
///
/// Each descriptor is one compact JSON object. JSON string escaping keeps the
/// line free of raw newlines and makes every value self-delimiting, so no
/// field can be confused with the structure around it.
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ParseError, RegistryError};
use crate::ident::{validate_identifier, IdentifierKind};

/// One table as recorded in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Unique table name.
    pub name: String,
    /// Directory holding the table's data, derived from the database root and `name`.
    pub folder: String,
    /// Field names in schema order.
    #[serde(rename = "fieldnames")]
    pub fields: Vec<String>,
}

impl TableDescriptor {
    /// Returns the table folder as a path.
    #[must_use]
    pub fn folder_path(&self) -> &Path {
        Path::new(&self.folder)
    }
}

/// Serializes a descriptor into a single line (no terminator).
pub fn encode_line(descriptor: &TableDescriptor) -> Result<String, RegistryError> {
    Ok(serde_json::to_string(descriptor)?)
}

/// Parses one registry line.
///
/// A trailing `\r` is ignored. Besides JSON syntax, the name and every field
/// must satisfy the identifier rule and the folder must be non-empty.
pub fn decode_line(line: &str) -> Result<TableDescriptor, ParseError> {
    let trimmed = line.trim_end_matches('\r');

    let descriptor: TableDescriptor =
        serde_json::from_str(trimmed).map_err(|e| ParseError::new(trimmed, e.to_string()))?;

    validate_identifier(IdentifierKind::Table, &descriptor.name)
        .map_err(|e| ParseError::new(trimmed, e.to_string()))?;
    for field in &descriptor.fields {
        validate_identifier(IdentifierKind::Field, field)
            .map_err(|e| ParseError::new(trimmed, e.to_string()))?;
    }
    if descriptor.folder.is_empty() {
        return Err(ParseError::new(trimmed, "empty folder"));
    }

    Ok(descriptor)
}

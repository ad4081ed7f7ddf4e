//! # Catalog - Table Management
//!
//! The façade the shell talks to. It ties the [`registry`] file and the
//! on-disk table folders together so that, once an operation returns, every
//! registry entry points at an existing folder.
//!
//! ## Layout
//!
//! ```text
//! <root>/<database>/
//! ├── auth/
//! │   ├── username        encoded blob
//! │   └── password        encoded blob
//! ├── tables/
//! │   ├── orders/
//! │   └── users/
//! ├── table.info          one registry line per table
//! └── database.mdb        path of auth/ as plain text
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                               |
//! |-------------|-------------------------------------------------------|
//! | [`lib.rs`]  | `TableCatalog`, `CatalogError`, create/delete/list    |
//! | [`folders`] | `TableDirectoryManager`: table folder create/remove   |
//! | [`layout`]  | Database directory setup and credential files         |
//!
//! ## Ordering
//!
//! `create_table` makes the folder, then appends the registry line.
//! `delete_table` removes the registry line, then the folder. Either way the
//! registry never names a table whose folder is missing; the worst leftover
//! after a failure is a folder nothing points at.

pub mod folders;
pub mod layout;

use std::io;
use std::path::{Path, PathBuf};

use auth::AuthError;
use config::Config;
use registry::{
    validate_identifier, IdentifierKind, InvalidIdentifier, ParseError, RegistryError,
    RegistryLine, RegistryStore, TableDescriptor,
};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use folders::{TableDirectoryManager, TABLES_DIRNAME};

/// Errors reported at the catalog boundary.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A table or field name breaks the identifier rule. Nothing was changed.
    #[error(transparent)]
    Validation(#[from] InvalidIdentifier),

    /// Zero fields under [`FieldPolicy::RequireAtLeastOne`]. Nothing was changed.
    #[error("table must have at least one field")]
    EmptyFields,

    /// A table with this name is already registered. Nothing was changed.
    #[error("table {0:?} already exists")]
    Conflict(String),

    /// No table with this name is registered.
    #[error("table {0:?} does not exist")]
    NotFound(String),

    /// Registry file failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Filesystem failure outside the registry file.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Credential validation or decoding failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A derived path that cannot be stored as UTF-8 text.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// Database name outside `[A-Za-z0-9_-]`.
    #[error("database name must be alphanumeric: {0:?}")]
    InvalidDatabaseName(String),
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Whether a table may be created without fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPolicy {
    #[default]
    RequireAtLeastOne,
    AllowEmpty,
}

/// Tunables for a [`TableCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOptions {
    pub field_policy: FieldPolicy,
    /// fsync registry writes.
    pub sync: bool,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            field_policy: FieldPolicy::default(),
            sync: true,
        }
    }
}

impl From<&Config> for CatalogOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            field_policy: if cfg.require_fields {
                FieldPolicy::RequireAtLeastOne
            } else {
                FieldPolicy::AllowEmpty
            },
            sync: cfg.sync,
        }
    }
}

/// A registry line skipped while listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineWarning {
    /// Zero-based line index in the registry file.
    pub line_index: usize,
    pub error: ParseError,
}

/// Result of [`TableCatalog::list_tables`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    /// Well-formed descriptors in registry line order.
    pub tables: Vec<TableDescriptor>,
    /// Malformed lines that were skipped.
    pub warnings: Vec<LineWarning>,
}

/// Table-level operations on one database directory.
#[derive(Debug, Clone)]
pub struct TableCatalog {
    database_dir: PathBuf,
    registry: RegistryStore,
    folders: TableDirectoryManager,
    options: CatalogOptions,
}

impl TableCatalog {
    /// Opens the catalog rooted at `database_dir`, creating the directory and
    /// its `tables/` subdirectory if they are missing.
    pub fn open<P: AsRef<Path>>(database_dir: P, options: CatalogOptions) -> Result<Self, CatalogError> {
        let database_dir = database_dir.as_ref().to_path_buf();
        let tables_dir = database_dir.join(TABLES_DIRNAME);
        std::fs::create_dir_all(&tables_dir).map_err(CatalogError::io(&tables_dir))?;

        Ok(Self {
            registry: RegistryStore::in_dir(&database_dir, options.sync),
            folders: TableDirectoryManager::new(tables_dir),
            database_dir,
            options,
        })
    }

    #[must_use]
    pub fn database_dir(&self) -> &Path {
        &self.database_dir
    }

    #[must_use]
    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    #[must_use]
    pub fn options(&self) -> CatalogOptions {
        self.options
    }

    /// Registers a new table and creates its folder.
    ///
    /// # Steps
    ///
    /// 1. Validate the name and every field; reject zero fields if the policy
    ///    requires one.
    /// 2. Fail with [`CatalogError::Conflict`] if the name is registered.
    /// 3. Create `tables/<name>`.
    /// 4. Append the registry line. If this fails and step 3 created the
    ///    folder, the empty folder is removed again (best effort).
    ///
    /// Steps 2-4 are not atomic with respect to other processes writing the
    /// same registry.
    pub fn create_table<S: AsRef<str>>(
        &self,
        name: &str,
        fields: &[S],
    ) -> Result<TableDescriptor, CatalogError> {
        validate_identifier(IdentifierKind::Table, name)?;
        for field in fields {
            validate_identifier(IdentifierKind::Field, field.as_ref())?;
        }
        if fields.is_empty() && self.options.field_policy == FieldPolicy::RequireAtLeastOne {
            return Err(CatalogError::EmptyFields);
        }

        if self.registry.find_entry(name)?.is_some() {
            return Err(CatalogError::Conflict(name.to_string()));
        }

        let folder = self.folders.folder_for(name);
        let folder_str = folder
            .to_str()
            .ok_or_else(|| CatalogError::NonUtf8Path(folder.clone()))?
            .to_string();
        let descriptor = TableDescriptor {
            name: name.to_string(),
            folder: folder_str,
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
        };

        let created = self.folders.create_table_folder(&folder)?;
        if let Err(e) = self.registry.append_entry(&descriptor) {
            if created {
                self.folders.discard_new_folder(&folder);
            }
            return Err(e.into());
        }

        info!(table = name, fields = descriptor.fields.len(), "table created");
        Ok(descriptor)
    }

    /// Unregisters a table and removes its folder, returning the descriptor
    /// that was removed.
    ///
    /// The registry line goes first: if the folder removal then fails, the
    /// table is already unreachable and the error reports the leftover path.
    ///
    /// The folder removed is always `tables/<name>`, never the path stored in
    /// the registry line, so an edited or legacy line cannot point the
    /// recursive removal elsewhere.
    pub fn delete_table(&self, name: &str) -> Result<TableDescriptor, CatalogError> {
        let entry = self
            .registry
            .find_entry(name)?
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;

        self.registry.remove_entry_at_line(entry.line_index)?;
        debug!(table = name, line = entry.line_index + 1, "registry entry removed");

        let folder = self.folders.folder_for(name);
        if entry.descriptor.folder_path() != folder {
            warn!(
                table = name,
                stored = %entry.descriptor.folder,
                removing = %folder.display(),
                "registry folder differs from table folder, ignoring stored path"
            );
        }

        if let Err(e) = self.folders.delete_table_folder(&folder) {
            warn!(table = name, error = %e, "table unregistered but folder removal failed");
            return Err(e);
        }

        info!(table = name, "table deleted");
        Ok(entry.descriptor)
    }

    /// Looks up one table by name.
    pub fn describe_table(&self, name: &str) -> Result<TableDescriptor, CatalogError> {
        self.registry
            .find_entry(name)?
            .map(|entry| entry.descriptor)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// Returns every well-formed table in registry order, plus a warning per
    /// malformed line.
    pub fn list_tables(&self) -> Result<Listing, CatalogError> {
        let mut listing = Listing::default();
        for line in self.registry.list_entries()? {
            match line? {
                RegistryLine::Entry(entry) => listing.tables.push(entry.descriptor),
                RegistryLine::Malformed { line_index, error } => {
                    warn!(line = line_index + 1, %error, "skipping malformed registry line");
                    listing.warnings.push(LineWarning { line_index, error });
                }
            }
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests;

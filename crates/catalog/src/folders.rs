/// On-disk table folders.
///
/// Folder creation and removal are kept separate from the registry so the
/// catalog decides the order in which the two are mutated.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::CatalogError;

/// Name of the directory holding every table folder.
pub const TABLES_DIRNAME: &str = "tables";

/// Creates and removes table folders under one `tables/` directory.
#[derive(Debug, Clone)]
pub struct TableDirectoryManager {
    tables_dir: PathBuf,
}

impl TableDirectoryManager {
    pub fn new<P: AsRef<Path>>(tables_dir: P) -> Self {
        Self {
            tables_dir: tables_dir.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn tables_dir(&self) -> &Path {
        &self.tables_dir
    }

    /// Deterministic folder for a table name.
    #[must_use]
    pub fn folder_for(&self, name: &str) -> PathBuf {
        self.tables_dir.join(name)
    }

    /// Creates `path` (and missing parents). Returns `true` if the folder did
    /// not exist before the call.
    ///
    /// An existing folder is not an error; duplicate detection belongs to the
    /// registry.
    pub fn create_table_folder(&self, path: &Path) -> Result<bool, CatalogError> {
        let existed = path.is_dir();
        fs::create_dir_all(path).map_err(CatalogError::io(path))?;
        debug!(path = %path.display(), existed, "table folder ready");
        Ok(!existed)
    }

    /// Recursively removes `path`.
    ///
    /// A folder that is already gone counts as removed. If removal stops
    /// partway, the error is returned and whatever was not deleted stays.
    pub fn delete_table_folder(&self, path: &Path) -> Result<(), CatalogError> {
        match fs::remove_dir_all(path) {
            Ok(()) => {
                debug!(path = %path.display(), "table folder removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "table folder already missing");
                Ok(())
            }
            Err(e) => Err(CatalogError::io(path)(e)),
        }
    }

    /// Best-effort removal of a folder this process just created and left
    /// empty. Never touches a folder with contents.
    pub(crate) fn discard_new_folder(&self, path: &Path) {
        if let Err(e) = fs::remove_dir(path) {
            warn!(path = %path.display(), error = %e, "left orphaned table folder");
        }
    }
}

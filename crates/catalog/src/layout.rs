/// Database directory setup.
///
/// Creates the directory skeleton of a new database and stores its
/// credentials. `database.mdb` holds nothing but the path of `auth/`, which
/// is how other tools find the credential files.
use std::fs;
use std::path::{Path, PathBuf};

use auth::{Cipher, Credentials};
use config::{is_valid_database_name, DEFAULT_DATABASE_NAME};
use tracing::info;

use crate::folders::TABLES_DIRNAME;
use crate::CatalogError;

pub const AUTH_DIRNAME: &str = "auth";
pub const USERNAME_FILENAME: &str = "username";
pub const PASSWORD_FILENAME: &str = "password";
pub const POINTER_FILENAME: &str = "database.mdb";

/// Paths inside one database directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseLayout {
    dir: PathBuf,
}

impl DatabaseLayout {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn auth_dir(&self) -> PathBuf {
        self.dir.join(AUTH_DIRNAME)
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.dir.join(TABLES_DIRNAME)
    }

    pub fn pointer_file(&self) -> PathBuf {
        self.dir.join(POINTER_FILENAME)
    }

    /// `true` once [`setup_database`] has written the pointer file.
    pub fn is_initialized(&self) -> bool {
        self.pointer_file().is_file()
    }
}

/// Creates `<parent>/<name>/{auth,tables}`, writes both encoded credential
/// blobs, and writes `database.mdb`.
///
/// An empty `name` selects [`DEFAULT_DATABASE_NAME`]. `parent` must already be
/// a directory. Existing credentials are overwritten.
pub fn setup_database(
    parent: &Path,
    name: &str,
    credentials: &Credentials,
    cipher: &dyn Cipher,
) -> Result<DatabaseLayout, CatalogError> {
    let name = if name.is_empty() { DEFAULT_DATABASE_NAME } else { name };
    if !is_valid_database_name(name) {
        return Err(CatalogError::InvalidDatabaseName(name.to_string()));
    }
    if !parent.is_dir() {
        return Err(CatalogError::Io {
            path: parent.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let layout = DatabaseLayout::new(parent.join(name));
    let auth_dir = layout.auth_dir();
    let tables_dir = layout.tables_dir();
    fs::create_dir_all(&auth_dir).map_err(CatalogError::io(&auth_dir))?;
    fs::create_dir_all(&tables_dir).map_err(CatalogError::io(&tables_dir))?;

    write_blob(&auth_dir.join(USERNAME_FILENAME), &cipher.encode(credentials.username()))?;
    write_blob(&auth_dir.join(PASSWORD_FILENAME), &cipher.encode(credentials.password()))?;

    let pointer = layout.pointer_file();
    fs::write(&pointer, auth_dir.to_string_lossy().as_bytes()).map_err(CatalogError::io(&pointer))?;

    info!(database = %layout.dir().display(), "database initialized");
    Ok(layout)
}

/// Reads the credentials of the database at `database_dir`, locating the
/// auth directory through `database.mdb`.
pub fn read_credentials(database_dir: &Path, cipher: &dyn Cipher) -> Result<Credentials, CatalogError> {
    let pointer = DatabaseLayout::new(database_dir).pointer_file();
    let auth_dir = fs::read_to_string(&pointer).map_err(CatalogError::io(&pointer))?;
    let auth_dir = PathBuf::from(auth_dir.trim_end_matches(['\r', '\n']));

    let username = read_blob(&auth_dir.join(USERNAME_FILENAME), cipher)?;
    let password = read_blob(&auth_dir.join(PASSWORD_FILENAME), cipher)?;
    Ok(Credentials::from_stored(username, password))
}

fn write_blob(path: &Path, blob: &[u8]) -> Result<(), CatalogError> {
    fs::write(path, blob).map_err(CatalogError::io(path))
}

fn read_blob(path: &Path, cipher: &dyn Cipher) -> Result<String, CatalogError> {
    let blob = fs::read(path).map_err(CatalogError::io(path))?;
    Ok(cipher.decode(&blob)?)
}

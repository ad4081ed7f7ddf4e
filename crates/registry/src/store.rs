/// # RegistryStore - the `table.info` file
///
/// The file is the single source of truth for which tables exist. Lines are
/// addressed by their zero-based index, counting every line including blank
/// and malformed ones, so an index from a scan addresses the same bytes in a
/// subsequent rewrite.
///
/// ## Atomic Removal
///
/// Removal writes the surviving lines to `table.info.tmp`, fsyncs, and renames
/// over the registry. If the rename fails (Windows can refuse to replace a
/// file another process has open), the tmp file is read back and compared
/// before the original is truncated and rewritten from it. Any failure while
/// producing the tmp file leaves the original untouched.
///
/// The store assumes a single writer: an index obtained from
/// [`RegistryStore::find_entry`] is only valid until the next mutation.
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Split, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::codec::{decode_line, encode_line, TableDescriptor};
use crate::error::{ParseError, RegistryError};

/// Name of the registry file within a database directory.
pub const REGISTRY_FILENAME: &str = "table.info";

/// Suffix appended to the registry file name for the rewrite scratch file.
const TMP_SUFFIX: &str = ".tmp";

/// A decoded registry line together with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub line_index: usize,
    pub descriptor: TableDescriptor,
}

/// One non-blank line yielded by [`RegistryStore::list_entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryLine {
    Entry(RegistryEntry),
    Malformed { line_index: usize, error: ParseError },
}

/// Lazy line-by-line scan over the registry file.
pub struct RegistryEntries {
    path: PathBuf,
    lines: Option<Split<BufReader<File>>>,
    next_index: usize,
}

impl Iterator for RegistryEntries {
    type Item = Result<RegistryLine, RegistryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = match self.lines.as_mut()?.next()? {
                Ok(raw) => raw,
                Err(e) => {
                    self.lines = None;
                    return Some(Err(RegistryError::io(&self.path)(e)));
                }
            };
            let line_index = self.next_index;
            self.next_index += 1;

            let line = match String::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    let content = String::from_utf8_lossy(e.as_bytes()).into_owned();
                    return Some(Ok(RegistryLine::Malformed {
                        line_index,
                        error: ParseError::new(content, "invalid utf-8"),
                    }));
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            return Some(Ok(match decode_line(&line) {
                Ok(descriptor) => RegistryLine::Entry(RegistryEntry {
                    line_index,
                    descriptor,
                }),
                Err(error) => RegistryLine::Malformed { line_index, error },
            }));
        }
    }
}

/// Owns the path of one registry file.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
    /// If `true`, every write is followed by `sync_all()`.
    sync: bool,
}

impl RegistryStore {
    /// Creates a store for the registry file at `path`. The file need not exist.
    pub fn new<P: AsRef<Path>>(path: P, sync: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync,
        }
    }

    /// Creates a store for `dir/table.info`.
    pub fn in_dir<P: AsRef<Path>>(dir: P, sync: bool) -> Self {
        Self::new(dir.as_ref().join(REGISTRY_FILENAME), sync)
    }

    /// Path of the registry file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from(REGISTRY_FILENAME));
        name.push(TMP_SUFFIX);
        self.path.with_file_name(name)
    }

    /// Appends one encoded descriptor plus a line terminator.
    ///
    /// If the file's last line is unterminated (a hand edit), a terminator is
    /// written first so the new record stays on its own line.
    pub fn append_entry(&self, descriptor: &TableDescriptor) -> Result<(), RegistryError> {
        let line = encode_line(descriptor)?;

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&self.path)
            .map_err(RegistryError::io(&self.path))?;

        let mut buf = Vec::with_capacity(line.len() + 2);
        if !ends_with_newline(&mut f).map_err(RegistryError::io(&self.path))? {
            buf.push(b'\n');
        }
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        f.write_all(&buf).map_err(RegistryError::io(&self.path))?;
        f.flush().map_err(RegistryError::io(&self.path))?;
        if self.sync {
            f.sync_all().map_err(RegistryError::io(&self.path))?;
        }

        debug!(table = %descriptor.name, path = %self.path.display(), "appended registry entry");
        Ok(())
    }

    /// Starts a lazy scan over every non-blank line.
    ///
    /// A missing registry file scans as empty.
    pub fn list_entries(&self) -> Result<RegistryEntries, RegistryError> {
        let lines = match File::open(&self.path) {
            Ok(f) => Some(BufReader::new(f).split(b'\n')),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(RegistryError::io(&self.path)(e)),
        };
        Ok(RegistryEntries {
            path: self.path.clone(),
            lines,
            next_index: 0,
        })
    }

    /// Finds the first line whose descriptor has the given name.
    ///
    /// Malformed lines are logged and skipped.
    pub fn find_entry(&self, name: &str) -> Result<Option<RegistryEntry>, RegistryError> {
        for line in self.list_entries()? {
            match line? {
                RegistryLine::Entry(entry) if entry.descriptor.name == name => {
                    return Ok(Some(entry));
                }
                RegistryLine::Entry(_) => {}
                RegistryLine::Malformed { line_index, error } => {
                    warn!(line = line_index + 1, %error, "skipping malformed registry line");
                }
            }
        }
        Ok(None)
    }

    /// Rewrites the registry without the line at `line_index`, returning the
    /// removed line (without its terminator).
    ///
    /// Every other line keeps its exact bytes and relative order.
    pub fn remove_entry_at_line(&self, line_index: usize) -> Result<String, RegistryError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(RegistryError::io(&self.path)(e)),
        };

        let lines: Vec<&[u8]> = data.split_inclusive(|b| *b == b'\n').collect();
        if line_index >= lines.len() {
            return Err(RegistryError::LineOutOfRange {
                index: line_index,
                len: lines.len(),
            });
        }

        let removed = String::from_utf8_lossy(lines[line_index])
            .trim_end_matches(['\n', '\r'])
            .to_string();

        let mut contents = Vec::with_capacity(data.len());
        for (i, line) in lines.iter().enumerate() {
            if i != line_index {
                contents.extend_from_slice(line);
            }
        }

        self.replace_contents(&contents)?;
        debug!(line = line_index + 1, path = %self.path.display(), "removed registry line");
        Ok(removed)
    }

    /// Atomically replaces the registry with `contents`.
    fn replace_contents(&self, contents: &[u8]) -> Result<(), RegistryError> {
        self.replace_contents_with(contents, |from, to| fs::rename(from, to))
    }

    /// [`Self::replace_contents`] with the rename step supplied by the caller.
    pub(crate) fn replace_contents_with<F>(&self, contents: &[u8], rename: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&Path, &Path) -> io::Result<()>,
    {
        let tmp_path = self.tmp_path();

        if let Err(e) = self.write_file(&tmp_path, contents) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // Try atomic rename first; fall back to copying the verified tmp file.
        if let Err(rename_err) = rename(&tmp_path, &self.path) {
            warn!(
                error = %rename_err,
                path = %self.path.display(),
                "rename over registry failed, falling back to copy"
            );
            let result = self.copy_verified(&tmp_path, contents);
            let _ = fs::remove_file(&tmp_path);
            result?;
        }

        Ok(())
    }

    /// Truncates the registry and writes `contents`, but only after the tmp
    /// file reads back identical to it.
    fn copy_verified(&self, tmp_path: &Path, contents: &[u8]) -> Result<(), RegistryError> {
        let written = fs::read(tmp_path).map_err(RegistryError::io(tmp_path))?;
        if written != contents {
            return Err(RegistryError::Io {
                path: tmp_path.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    "temporary registry copy does not match",
                ),
            });
        }
        self.write_file(&self.path, &written)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), RegistryError> {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(RegistryError::io(path))?;
        f.write_all(contents).map_err(RegistryError::io(path))?;
        f.flush().map_err(RegistryError::io(path))?;
        if self.sync {
            f.sync_all().map_err(RegistryError::io(path))?;
        }
        Ok(())
    }
}

/// Returns `true` for an empty file or one whose last byte is `\n`.
fn ends_with_newline(f: &mut File) -> io::Result<bool> {
    if f.metadata()?.len() == 0 {
        return Ok(true);
    }
    f.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    f.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Command dispatch for the interactive shell.
///
/// Generic over input and output so the same loop serves a terminal, a pipe,
/// and the unit tests.
use anyhow::Result;
use std::io::{BufRead, Lines, Write};

use auth::{Credentials, ShiftCipher};
use catalog::layout::setup_database;
use catalog::{CatalogError, TableCatalog};
use config::Config;
use registry::{validate_identifier, IdentifierKind, TableDescriptor};
use tracing::debug;

/// Sentinel that finishes interactive field entry.
pub const FIELDS_DONE: &str = ":d";
/// Sentinel that abandons interactive field entry.
pub const FIELDS_QUIT: &str = ":q";

pub const HELP: &str = "\
Commands:
  CREATE name [field ...]   Create a table (no fields: enter them one per line)
  DELETE name [name ...]    Delete one or more tables
  LIST                      List all tables
  DESCRIBE name             Show one table
  SETUP user pass confirm   Write credentials and database.mdb
  HELP                      Show this text
  EXIT / QUIT               Leave the shell";

/// One line of human-readable output for a descriptor.
pub fn describe(d: &TableDescriptor) -> String {
    format!("{} ({}) -> {}", d.name, d.fields.join(", "), d.folder)
}

pub struct Shell<'a> {
    catalog: TableCatalog,
    config: &'a Config,
    failures: usize,
}

impl<'a> Shell<'a> {
    pub fn new(catalog: TableCatalog, config: &'a Config) -> Self {
        Self {
            catalog,
            config,
            failures: 0,
        }
    }

    /// Number of commands that reported `ERR` so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Reads commands until `EXIT` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        let mut lines = input.lines();
        prompt(out, "> ")?;

        while let Some(line) = lines.next() {
            let line = line?;
            let mut parts = line.split_whitespace();
            if let Some(cmd) = parts.next() {
                let args: Vec<&str> = parts.collect();
                debug!(command = cmd, args = args.len(), "dispatching");
                match cmd.to_uppercase().as_str() {
                    "CREATE" => self.create(&args, &mut lines, out)?,
                    "DELETE" | "DROP" => self.delete(&args, out)?,
                    "LIST" => self.list(out)?,
                    "DESCRIBE" => self.describe(&args, out)?,
                    "SETUP" => self.setup(&args, out)?,
                    "HELP" => writeln!(out, "{HELP}")?,
                    "EXIT" | "QUIT" => {
                        writeln!(out, "bye")?;
                        return Ok(());
                    }
                    other => self.fail(out, format_args!("unknown command: {other}"))?,
                }
            }
            prompt(out, "> ")?;
        }

        Ok(())
    }

    fn fail<W: Write>(&mut self, out: &mut W, msg: std::fmt::Arguments<'_>) -> Result<()> {
        self.failures += 1;
        writeln!(out, "ERR {msg}")?;
        Ok(())
    }

    fn create<R: BufRead, W: Write>(
        &mut self,
        args: &[&str],
        lines: &mut Lines<R>,
        out: &mut W,
    ) -> Result<()> {
        let Some((name, inline)) = args.split_first() else {
            return self.fail(out, format_args!("usage: CREATE name [field ...]"));
        };

        // Reject a bad table name before asking for fields.
        if let Err(e) = validate_identifier(IdentifierKind::Table, name) {
            return self.fail(out, format_args!("{e}"));
        }

        let fields: Vec<String> = if inline.is_empty() {
            // Report a taken name before asking for fields.
            if self.catalog.describe_table(name).is_ok() {
                let conflict = CatalogError::Conflict(name.to_string());
                return self.fail(out, format_args!("create failed: {conflict}"));
            }
            match read_fields(lines, out)? {
                Some(fields) => fields,
                None => {
                    writeln!(out, "aborted")?;
                    return Ok(());
                }
            }
        } else {
            inline.iter().map(|f| f.to_string()).collect()
        };

        match self.catalog.create_table(name, &fields) {
            Ok(d) => writeln!(out, "OK {}", describe(&d))?,
            Err(e) => self.fail(out, format_args!("create failed: {e}"))?,
        }
        Ok(())
    }

    fn delete<W: Write>(&mut self, names: &[&str], out: &mut W) -> Result<()> {
        if names.is_empty() {
            return self.fail(out, format_args!("usage: DELETE name [name ...]"));
        }
        for name in names {
            writeln!(out, "Deleting table \"{name}\" ...")?;
            match self.catalog.delete_table(name) {
                Ok(_) => writeln!(out, "Done")?,
                Err(e) => self.fail(out, format_args!("delete failed: {e}"))?,
            }
        }
        Ok(())
    }

    fn list<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let listing = match self.catalog.list_tables() {
            Ok(listing) => listing,
            Err(e) => return self.fail(out, format_args!("list failed: {e}")),
        };
        for warning in &listing.warnings {
            writeln!(out, "WARN line {}: {}", warning.line_index + 1, warning.error)?;
        }
        if listing.tables.is_empty() {
            writeln!(out, "(empty)")?;
        } else {
            for table in &listing.tables {
                writeln!(out, "{}", describe(table))?;
            }
            writeln!(out, "({} tables)", listing.tables.len())?;
        }
        Ok(())
    }

    fn describe<W: Write>(&mut self, args: &[&str], out: &mut W) -> Result<()> {
        let [name] = args else {
            return self.fail(out, format_args!("usage: DESCRIBE name"));
        };
        match self.catalog.describe_table(name) {
            Ok(d) => writeln!(out, "{}", describe(&d))?,
            Err(e) => self.fail(out, format_args!("{e}"))?,
        }
        Ok(())
    }

    fn setup<W: Write>(&mut self, args: &[&str], out: &mut W) -> Result<()> {
        let [username, password, confirm] = args else {
            return self.fail(out, format_args!("usage: SETUP username password confirm"));
        };
        let credentials = match Credentials::new(username, password, confirm) {
            Ok(c) => c,
            Err(e) => return self.fail(out, format_args!("{e}")),
        };
        match setup_database(&self.config.root, &self.config.database, &credentials, &ShiftCipher) {
            Ok(layout) => writeln!(out, "OK database initialized at {}", layout.dir().display())?,
            Err(e) => self.fail(out, format_args!("setup failed: {e}"))?,
        }
        Ok(())
    }
}

/// Collects field names one per line until [`FIELDS_DONE`].
///
/// Returns `None` on [`FIELDS_QUIT`] or end of input. Invalid names are
/// reported and skipped.
fn read_fields<R: BufRead, W: Write>(lines: &mut Lines<R>, out: &mut W) -> Result<Option<Vec<String>>> {
    writeln!(out, "Enter '{FIELDS_QUIT}' to quit or '{FIELDS_DONE}' to finish adding fields")?;
    let mut fields = Vec::new();
    loop {
        prompt(out, "field> ")?;
        let Some(line) = lines.next() else {
            return Ok(None);
        };
        let line = line?;
        let field = line.trim();
        match field {
            "" => continue,
            FIELDS_QUIT => return Ok(None),
            FIELDS_DONE => return Ok(Some(fields)),
            _ => match validate_identifier(IdentifierKind::Field, field) {
                Ok(()) => fields.push(field.to_string()),
                Err(e) => writeln!(out, "{e}")?,
            },
        }
    }
}

fn prompt<W: Write>(out: &mut W, text: &str) -> Result<()> {
    write!(out, "{text}")?;
    out.flush()?;
    Ok(())
}

//! # Registry - Table Metadata Index
//!
//! The registry is a single append-only text file (`table.info`) inside the
//! database directory. Every line describes one table:
//!
//! ```text
//! {"name":"orders","folder":"./MDBL/tables/orders","fieldnames":["id","total"]}
//! {"name":"users","folder":"./MDBL/tables/users","fieldnames":["id","email"]}
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module      | Purpose                                                 |
//! |------------|---------------------------------------------------------|
//! | [`codec`]  | `TableDescriptor` <-> one line of JSON                  |
//! | [`ident`]  | The `[A-Za-z0-9_]+` rule for table and field names      |
//! | [`store`]  | Append, scan, and line-stable removal on the file       |
//! | [`error`]  | `RegistryError` and `ParseError`                        |
//!
//! ## Crash Safety
//!
//! Appends are a single `write_all` of one terminated line. Removal rewrites
//! the file into `table.info.tmp`, fsyncs it, then renames it over the
//! registry, so readers see either the old or the new file, never a mix.
//!
//! Lines that fail to decode are never dropped: scans skip them with a
//! warning and rewrites copy them byte for byte.

pub mod codec;
pub mod error;
pub mod ident;
pub mod store;

pub use codec::{decode_line, encode_line, TableDescriptor};
pub use error::{ParseError, RegistryError};
pub use ident::{validate_identifier, IdentifierKind, InvalidIdentifier};
pub use store::{RegistryEntries, RegistryEntry, RegistryLine, RegistryStore, REGISTRY_FILENAME};

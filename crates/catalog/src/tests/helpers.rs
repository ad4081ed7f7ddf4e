use crate::*;
use std::fs;
use std::path::Path;

pub const NO_FIELDS: [&str; 0] = [];

pub fn open_catalog(dir: &Path) -> TableCatalog {
    TableCatalog::open(dir.join("MDBL"), CatalogOptions::default()).unwrap()
}

pub fn open_catalog_with(dir: &Path, field_policy: FieldPolicy) -> TableCatalog {
    let options = CatalogOptions {
        field_policy,
        sync: false,
    };
    TableCatalog::open(dir.join("MDBL"), options).unwrap()
}

pub fn registry_text(catalog: &TableCatalog) -> String {
    fs::read_to_string(catalog.registry().path()).unwrap_or_default()
}

pub fn count_table_folders(catalog: &TableCatalog) -> usize {
    fs::read_dir(catalog.database_dir().join(TABLES_DIRNAME))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .count()
}

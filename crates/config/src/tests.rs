use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_when_nothing_set() {
    let cfg = Config::from_lookup(|_| None);
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.database_dir(), PathBuf::from(".").join("MDBL"));
}

#[test]
fn reads_every_key() {
    let cfg = Config::from_lookup(lookup_from(&[
        ("MDBL_ROOT", "/srv/data"),
        ("MDBL_DATABASE", "shop"),
        ("MDBL_REQUIRE_FIELDS", "false"),
        ("MDBL_SYNC", "false"),
        ("MDBL_LOG", "debug"),
    ]));
    assert_eq!(cfg.root(), Path::new("/srv/data"));
    assert_eq!(cfg.database, "shop");
    assert!(!cfg.require_fields);
    assert!(!cfg.sync);
    assert_eq!(cfg.log_filter, "debug");
    assert_eq!(cfg.database_dir(), PathBuf::from("/srv/data/shop"));
}

#[test]
fn unparseable_booleans_fall_back() {
    let cfg = Config::from_lookup(lookup_from(&[
        ("MDBL_REQUIRE_FIELDS", "yes please"),
        ("MDBL_SYNC", "1"),
    ]));
    assert!(cfg.require_fields);
    assert!(cfg.sync);
}

#[test]
fn empty_values_use_defaults() {
    let cfg = Config::from_lookup(lookup_from(&[("MDBL_DATABASE", "  "), ("MDBL_ROOT", "")]));
    assert_eq!(cfg.database, DEFAULT_DATABASE_NAME);
    assert_eq!(cfg.root(), Path::new("."));
}

#[test]
fn rust_log_is_a_fallback_for_log_filter() {
    let cfg = Config::from_lookup(lookup_from(&[("RUST_LOG", "trace")]));
    assert_eq!(cfg.log_filter, "trace");

    let cfg = Config::from_lookup(lookup_from(&[("RUST_LOG", "trace"), ("MDBL_LOG", "info")]));
    assert_eq!(cfg.log_filter, "info");
}

#[test]
fn invalid_database_name_falls_back() {
    for bad in ["../escape", "a/b", "with space", "dot.name", "..", "/abs"] {
        let cfg = Config::from_lookup(lookup_from(&[("MDBL_DATABASE", bad)]));
        assert_eq!(cfg.database, DEFAULT_DATABASE_NAME, "{bad}");
        assert_eq!(cfg.database_dir(), PathBuf::from(".").join(DEFAULT_DATABASE_NAME));
    }
}

#[test]
fn database_name_rule() {
    assert!(is_valid_database_name("MDBL"));
    assert!(is_valid_database_name("shop_2-eu"));
    assert!(!is_valid_database_name(""));
    assert!(!is_valid_database_name("../escape"));
}
